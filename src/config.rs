//! Session profile parsing and defaults
//!
//! A session profile is a JSON document with a required opaque tunnel
//! configuration blob and optional auth / certificate / connection / proxy /
//! settings blocks. Missing optional fields take documented defaults; a
//! missing or empty tunnel blob is a hard failure.

use crate::error::{VpnmgrError, VpnmgrResult};
use crate::validation;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Immutable-after-creation configuration for one session.
///
/// The session table stores its own clone; later queries return copies, never
/// references into the caller's original.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Profile identifier shown in logs and listings
    #[serde(default)]
    pub profile_name: String,
    /// Opaque tunnel configuration handed to the engine verbatim
    pub tunnel_config: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthSection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificates: Option<CertificateSection>,
    #[serde(default)]
    pub connection: ConnectionSection,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy: Option<ProxySection>,
    #[serde(default)]
    pub settings: SettingsSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificateSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cert_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ca_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionSection {
    pub auto_reconnect: bool,
    /// Seconds to wait before an automatic reconnect attempt
    pub reconnect_interval: u32,
    /// Seconds between latency probes while connected
    pub ping_interval: u32,
    pub mtu_size: u32,
}

impl Default for ConnectionSection {
    fn default() -> Self {
        Self {
            auto_reconnect: false,
            reconnect_interval: 30,
            ping_interval: 10,
            mtu_size: 1500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxySection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsSection {
    pub enable_compression: bool,
    pub log_verbose: bool,
    /// Seconds between statistics-update events while connected
    pub stats_interval: u32,
}

impl Default for SettingsSection {
    fn default() -> Self {
        Self {
            enable_compression: false,
            log_verbose: false,
            stats_interval: 5,
        }
    }
}

impl SessionConfig {
    /// Parse and validate a profile from a JSON document
    pub fn from_json(raw: &str) -> VpnmgrResult<Self> {
        let config: SessionConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and parse a profile file
    pub async fn from_file(path: &Path) -> VpnmgrResult<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| VpnmgrError::ConfigError(format!("Failed to read profile {:?}: {}", path, e)))?;
        Self::from_json(&raw)
    }

    /// Validate field contents beyond what deserialization enforces
    pub fn validate(&self) -> VpnmgrResult<()> {
        if self.tunnel_config.trim().is_empty() {
            return Err(VpnmgrError::ConfigError(
                "tunnel_config must not be empty".to_string()
            ));
        }

        if !self.profile_name.is_empty() {
            validation::sanitize_profile_value(&self.profile_name)?;
        }

        validation::validate_mtu(self.connection.mtu_size)?;

        if let Some(proxy) = &self.proxy {
            if let Some(host) = &proxy.host {
                validation::validate_hostname(host)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_applied_for_missing_blocks() {
        let config = SessionConfig::from_json(
            r#"{"tunnel_config": "remote vpn.example.com 1194"}"#,
        )
        .unwrap();

        assert_eq!(config.profile_name, "");
        assert!(config.auth.is_none());
        assert!(config.certificates.is_none());
        assert!(config.proxy.is_none());
        assert!(!config.connection.auto_reconnect);
        assert_eq!(config.connection.reconnect_interval, 30);
        assert_eq!(config.connection.ping_interval, 10);
        assert_eq!(config.connection.mtu_size, 1500);
        assert!(!config.settings.enable_compression);
        assert!(!config.settings.log_verbose);
        assert_eq!(config.settings.stats_interval, 5);
    }

    #[test]
    fn test_partial_blocks_fill_remaining_defaults() {
        let config = SessionConfig::from_json(
            r#"{
                "tunnel_config": "remote vpn.example.com 1194",
                "connection": {"auto_reconnect": true, "reconnect_interval": 5},
                "settings": {"stats_interval": 1}
            }"#,
        )
        .unwrap();

        assert!(config.connection.auto_reconnect);
        assert_eq!(config.connection.reconnect_interval, 5);
        assert_eq!(config.connection.ping_interval, 10);
        assert_eq!(config.settings.stats_interval, 1);
        assert!(!config.settings.log_verbose);
    }

    #[test]
    fn test_full_profile_parses() {
        let config = SessionConfig::from_json(
            r#"{
                "profile_name": "corp-vpn",
                "tunnel_config": "remote vpn.corp.example 1194\nproto udp",
                "auth": {"username": "alice", "password": "secret"},
                "certificates": {"cert_path": "/etc/vpn/client.crt", "key_path": "/etc/vpn/client.key", "ca_path": "/etc/vpn/ca.crt"},
                "connection": {"auto_reconnect": true, "reconnect_interval": 15, "ping_interval": 5, "mtu_size": 1400},
                "proxy": {"host": "proxy.corp.example", "port": 3128},
                "settings": {"enable_compression": true, "log_verbose": true, "stats_interval": 2}
            }"#,
        )
        .unwrap();

        assert_eq!(config.profile_name, "corp-vpn");
        assert_eq!(config.auth.as_ref().unwrap().username.as_deref(), Some("alice"));
        assert_eq!(config.certificates.as_ref().unwrap().ca_path.as_deref(), Some("/etc/vpn/ca.crt"));
        assert_eq!(config.proxy.as_ref().unwrap().port, Some(3128));
        assert_eq!(config.connection.mtu_size, 1400);
    }

    #[test]
    fn test_missing_tunnel_config_is_parse_failure() {
        let result = SessionConfig::from_json(r#"{"profile_name": "broken"}"#);
        assert!(matches!(result, Err(VpnmgrError::ParseError(_))));
    }

    #[test]
    fn test_empty_tunnel_config_rejected() {
        let result = SessionConfig::from_json(r#"{"tunnel_config": "   "}"#);
        assert!(matches!(result, Err(VpnmgrError::ConfigError(_))));
    }

    #[test]
    fn test_bad_mtu_rejected() {
        let result = SessionConfig::from_json(
            r#"{"tunnel_config": "remote x", "connection": {"mtu_size": 12}}"#,
        );
        assert!(matches!(result, Err(VpnmgrError::InvalidParameter(_))));
    }

    #[test]
    fn test_bad_proxy_host_rejected() {
        let result = SessionConfig::from_json(
            r#"{"tunnel_config": "remote x", "proxy": {"host": "proxy;rm -rf /"}}"#,
        );
        assert!(result.is_err());
    }
}
