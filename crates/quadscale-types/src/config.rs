//! configuration types for quadscale.

use serde::{Deserialize, Serialize};

/// main configuration for a quadscale realm.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// unique identifier of this realm.
    pub realm_id: String,

    /// human-readable realm name.
    pub realm_name: String,

    /// address to bind the http server to.
    pub listen_addr: String,

    /// externally reachable endpoint advertised to federation peers.
    pub endpoint: String,

    /// role assigned when no ssid mapping matches.
    pub default_role: String,

    /// realm monitor tuning.
    #[serde(default)]
    pub monitor: MonitorConfig,

    /// federation client tuning.
    #[serde(default)]
    pub federation: FederationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            realm_id: "realm-local".to_string(),
            realm_name: "local realm".to_string(),
            listen_addr: "0.0.0.0:8080".to_string(),
            endpoint: "http://127.0.0.1:8080".to_string(),
            default_role: "guest".to_string(),
            monitor: MonitorConfig::default(),
            federation: FederationConfig::default(),
        }
    }
}

/// realm monitor tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// seconds between health-check sweeps.
    pub interval_secs: u64,

    /// per-ping timeout in seconds.
    pub ping_timeout_secs: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval_secs: 30,
            ping_timeout_secs: 5,
        }
    }
}

/// federation client tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FederationConfig {
    /// per-call timeout for federation rpcs, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for FederationConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_complete() {
        let config = Config::default();
        assert_eq!(config.default_role, "guest");
        assert_eq!(config.monitor.interval_secs, 30);
        assert_eq!(config.federation.request_timeout_secs, 10);
    }

    #[test]
    fn config_roundtrips_through_toml() {
        let config = Config::default();
        let toml = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.realm_id, config.realm_id);
        assert_eq!(parsed.monitor.interval_secs, config.monitor.interval_secs);
    }

    #[test]
    fn partial_toml_uses_section_defaults() {
        let toml = r#"
            realm_id = "realm-a"
            realm_name = "Realm A"
            listen_addr = "0.0.0.0:9090"
            endpoint = "http://realm-a.campus:9090"
            default_role = "student"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.realm_id, "realm-a");
        assert_eq!(config.monitor.interval_secs, 30);
    }
}
