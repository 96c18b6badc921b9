//! api error handling for http handlers

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use quadscale_types::Error;

/// api error type for handler responses
#[derive(Debug)]
pub enum ApiError {
    /// malformed or invalid request (400)
    BadRequest(String),
    /// unauthorized error (401)
    Unauthorized(String),
    /// not found error (404)
    NotFound(String),
    /// upstream realm unreachable (502)
    BadGateway(String),
    /// internal server error (500)
    Internal(String),
}

impl ApiError {
    /// create a bad request error
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    /// create unauthorized error
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    /// create not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// create internal server error from any error type
    pub fn internal(e: impl std::fmt::Display) -> Self {
        Self::Internal(e.to_string())
    }
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        match e {
            Error::Validation(msg) => Self::BadRequest(msg),
            Error::NotFound(msg) => Self::NotFound(msg),
            Error::Expired(msg) => Self::Unauthorized(msg),
            Error::Unreachable(msg) => Self::BadGateway(msg),
            Error::Config(msg) => Self::Internal(msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, message).into_response()
    }
}

/// extension trait for converting results to apierror
pub trait ResultExt<T> {
    /// convert error to internal server error
    fn map_internal(self) -> Result<T, ApiError>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for Result<T, E> {
    fn map_internal(self) -> Result<T, ApiError> {
        self.map_err(ApiError::internal)
    }
}

/// extension trait for converting options to apierror
pub trait OptionExt<T> {
    /// convert none to unauthorized error
    fn or_unauthorized(self, msg: &str) -> Result<T, ApiError>;
    /// convert none to not found error
    fn or_not_found(self, msg: &str) -> Result<T, ApiError>;
}

impl<T> OptionExt<T> for Option<T> {
    fn or_unauthorized(self, msg: &str) -> Result<T, ApiError> {
        self.ok_or_else(|| ApiError::unauthorized(msg))
    }

    fn or_not_found(self, msg: &str) -> Result<T, ApiError> {
        self.ok_or_else(|| ApiError::not_found(msg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_map_to_status_codes() {
        let cases = [
            (Error::validation("bad"), StatusCode::BAD_REQUEST),
            (Error::not_found("missing"), StatusCode::NOT_FOUND),
            (Error::expired("old"), StatusCode::UNAUTHORIZED),
            (Error::unreachable("peer"), StatusCode::BAD_GATEWAY),
        ];
        for (error, expected) in cases {
            let response = ApiError::from(error).into_response();
            assert_eq!(response.status(), expected);
        }
    }
}
