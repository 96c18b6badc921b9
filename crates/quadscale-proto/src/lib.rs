//! typed federation wire contract for quadscale.
//!
//! request/response pairs for the peer-to-peer federation operations:
//! join, leave, sync, resolve, exchange-trust and ping. encoding is
//! json over http; these types are the contract, the transport lives in
//! `quadscale-federation`.

#![warn(missing_docs)]

mod messages;
mod service;

pub use messages::{
    AccessKind, JoinRequest, JoinResponse, LeaveRequest, LeaveResponse, PeerInfo, PingResponse,
    ResolveRequest, ResolveResponse, SyncRequest, SyncResponse, TrustExchangeRequest,
    TrustExchangeResponse,
};
pub use service::ServiceSummary;
