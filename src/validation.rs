//! Input validation and sanitization
//!
//! Checks applied to session profiles before they enter the session table,
//! so that malformed values are rejected synchronously at create/update time
//! rather than surfacing later inside a worker.

use crate::error::{VpnmgrError, VpnmgrResult};

/// Maximum length for free-text profile fields
const MAX_PROFILE_VALUE_LEN: usize = 255;

/// Validate MTU value
pub fn validate_mtu(mtu: u32) -> VpnmgrResult<()> {
    // Ethernet minimum is 68, maximum is typically 9000 (jumbo frames)
    if mtu < 68 {
        return Err(VpnmgrError::InvalidParameter(
            "MTU must be at least 68 bytes".to_string()
        ));
    }
    if mtu > 9000 {
        return Err(VpnmgrError::InvalidParameter(
            "MTU cannot exceed 9000 bytes".to_string()
        ));
    }
    Ok(())
}

/// Validate a proxy or server hostname
///
/// Accepts a literal IP address or a DNS hostname (alphanumeric, dash, dot)
pub fn validate_hostname(host: &str) -> VpnmgrResult<()> {
    if host.is_empty() {
        return Err(VpnmgrError::InvalidParameter(
            "Hostname cannot be empty".to_string()
        ));
    }

    if host.len() > 253 {
        return Err(VpnmgrError::InvalidParameter(
            "Hostname too long".to_string()
        ));
    }

    // Try parsing as IP address first
    if host.parse::<std::net::IpAddr>().is_ok() {
        return Ok(());
    }

    for c in host.chars() {
        if !c.is_ascii_alphanumeric() && c != '-' && c != '.' {
            return Err(VpnmgrError::InvalidParameter(
                format!("Invalid hostname character: {}", c)
            ));
        }
    }

    // No leading/trailing dashes or dots
    if host.starts_with('-') || host.starts_with('.') ||
       host.ends_with('-') || host.ends_with('.') {
        return Err(VpnmgrError::InvalidParameter(
            "Invalid hostname format".to_string()
        ));
    }

    Ok(())
}

/// Sanitize free-text profile values (profile name, proxy username, ...)
///
/// Rejects control characters, null bytes, and oversized values
pub fn sanitize_profile_value(value: &str) -> VpnmgrResult<()> {
    if value.chars().any(|c| c.is_control() && c != '\t') {
        return Err(VpnmgrError::InvalidParameter(
            "Profile value contains invalid control characters".to_string()
        ));
    }

    if value.contains('\0') {
        return Err(VpnmgrError::InvalidParameter(
            "Profile value contains null byte".to_string()
        ));
    }

    if value.len() > MAX_PROFILE_VALUE_LEN {
        return Err(VpnmgrError::InvalidParameter(
            format!("Profile value too long (max {} characters)", MAX_PROFILE_VALUE_LEN)
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mtu_validation() {
        assert!(validate_mtu(1500).is_ok());
        assert!(validate_mtu(68).is_ok());
        assert!(validate_mtu(9000).is_ok());

        assert!(validate_mtu(67).is_err());
        assert!(validate_mtu(9001).is_err());
        assert!(validate_mtu(0).is_err());
    }

    #[test]
    fn test_hostname_validation() {
        // Valid hostnames
        assert!(validate_hostname("proxy.example.com").is_ok());
        assert!(validate_hostname("vpn-gw1").is_ok());
        assert!(validate_hostname("192.168.1.1").is_ok());
        assert!(validate_hostname("fe80::1").is_ok());

        // Invalid
        assert!(validate_hostname("").is_err());
        assert!(validate_hostname("-invalid").is_err());
        assert!(validate_hostname("invalid.").is_err());
        assert!(validate_hostname("host name").is_err());
        assert!(validate_hostname("host;name").is_err());
    }

    #[test]
    fn test_profile_value_sanitization() {
        assert!(sanitize_profile_value("corp-vpn").is_ok());
        assert!(sanitize_profile_value("Home Office (backup)").is_ok());

        assert!(sanitize_profile_value("name\nwith\nnewlines").is_err());
        assert!(sanitize_profile_value("null\0byte").is_err());
        let long = "a".repeat(256);
        assert!(sanitize_profile_value(&long).is_err());
    }
}
