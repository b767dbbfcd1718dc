//! Responder configuration

use crate::error::{ResponderError, Result};
use crate::DEFAULT_PORT;
use sampreset_shared::utils::parse_duration;
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_MAX_REQUEST_BYTES: usize = 8 * 1024;

/// Longest read or write timeout accepted by `validate`
pub const MAX_TIMEOUT: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponderConfig {
    /// Listen address for the sampling responder
    pub listen_addr: SocketAddr,

    /// Admin HTTP listen address (health checks + metrics); disabled when unset
    pub admin_addr: Option<SocketAddr>,

    /// How long to wait for the request head before answering anyway
    pub read_timeout: Duration,

    /// Upper bound on writing the response to a slow client
    pub write_timeout: Duration,

    /// Request bytes read before answering; anything past this is ignored
    pub max_request_bytes: usize,
}

impl ResponderConfig {
    /// Built-in defaults, ignoring the environment
    pub fn builtin() -> Self {
        Self {
            listen_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
            admin_addr: None,
            read_timeout: DEFAULT_READ_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            max_request_bytes: DEFAULT_MAX_REQUEST_BYTES,
        }
    }

    /// Built-in defaults overridden by whatever `lookup` returns for the
    /// `SAMPRESET_*` variables. Unparseable values fall back to the default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::builtin();
        let duration = |key: &str, default: Duration| {
            lookup(key)
                .and_then(|s| parse_duration(&s).ok())
                .unwrap_or(default)
        };

        Self {
            listen_addr: lookup("SAMPRESET_LISTEN")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.listen_addr),
            admin_addr: lookup("SAMPRESET_ADMIN_LISTEN").and_then(|s| s.parse().ok()),
            read_timeout: duration("SAMPRESET_READ_TIMEOUT", defaults.read_timeout),
            write_timeout: duration("SAMPRESET_WRITE_TIMEOUT", defaults.write_timeout),
            max_request_bytes: lookup("SAMPRESET_MAX_REQUEST_BYTES")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_request_bytes),
        }
    }

    /// Replace the port of the listen address, keeping its IP
    pub fn with_port(mut self, port: u16) -> Self {
        self.listen_addr.set_port(port);
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.read_timeout.is_zero() {
            return Err(ResponderError::Config(
                "read timeout must be greater than 0".to_string(),
            ));
        }
        if self.write_timeout.is_zero() {
            return Err(ResponderError::Config(
                "write timeout must be greater than 0".to_string(),
            ));
        }
        if self.read_timeout > MAX_TIMEOUT || self.write_timeout > MAX_TIMEOUT {
            return Err(ResponderError::Config(format!(
                "timeouts must not exceed {:?}",
                MAX_TIMEOUT
            )));
        }
        if self.max_request_bytes == 0 {
            return Err(ResponderError::Config(
                "max request bytes must be greater than 0".to_string(),
            ));
        }
        if self.admin_addr == Some(self.listen_addr) && self.listen_addr.port() != 0 {
            return Err(ResponderError::Config(format!(
                "admin address {} collides with the responder address",
                self.listen_addr
            )));
        }
        Ok(())
    }
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_builtin_defaults() {
        let config = ResponderConfig::builtin();
        assert_eq!(config.listen_addr.to_string(), "0.0.0.0:5778");
        assert!(config.admin_addr.is_none());
        assert_eq!(config.read_timeout, Duration::from_secs(5));
        assert_eq!(config.max_request_bytes, 8192);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let config = ResponderConfig::from_lookup(lookup_from(&[
            ("SAMPRESET_LISTEN", "127.0.0.1:6000"),
            ("SAMPRESET_ADMIN_LISTEN", "127.0.0.1:9090"),
            ("SAMPRESET_READ_TIMEOUT", "250ms"),
            ("SAMPRESET_MAX_REQUEST_BYTES", "1024"),
        ]));
        assert_eq!(config.listen_addr.to_string(), "127.0.0.1:6000");
        assert_eq!(config.admin_addr.unwrap().port(), 9090);
        assert_eq!(config.read_timeout, Duration::from_millis(250));
        assert_eq!(config.write_timeout, DEFAULT_WRITE_TIMEOUT);
        assert_eq!(config.max_request_bytes, 1024);
    }

    #[test]
    fn test_bad_env_values_fall_back() {
        let config = ResponderConfig::from_lookup(lookup_from(&[
            ("SAMPRESET_LISTEN", "not-an-address"),
            ("SAMPRESET_READ_TIMEOUT", "soon"),
        ]));
        assert_eq!(config.listen_addr.port(), DEFAULT_PORT);
        assert_eq!(config.read_timeout, DEFAULT_READ_TIMEOUT);
    }

    #[test]
    fn test_rejects_timeouts_beyond_cap() {
        let mut config = ResponderConfig::from_lookup(lookup_from(&[(
            "SAMPRESET_READ_TIMEOUT",
            "18446744073709551615",
        )]));
        assert_eq!(config.read_timeout, Duration::from_secs(u64::MAX));
        assert!(config.validate().is_err());

        config.read_timeout = MAX_TIMEOUT;
        assert!(config.validate().is_ok());

        config.write_timeout = MAX_TIMEOUT + Duration::from_millis(1);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_with_port_keeps_ip() {
        let config = ResponderConfig::from_lookup(lookup_from(&[(
            "SAMPRESET_LISTEN",
            "127.0.0.1:5778",
        )]))
        .with_port(15778);
        assert_eq!(config.listen_addr.to_string(), "127.0.0.1:15778");
    }

    #[test]
    fn test_config_validation() {
        let mut config = ResponderConfig::builtin();
        config.read_timeout = Duration::ZERO;
        assert!(config.validate().is_err());

        let mut config = ResponderConfig::builtin();
        config.write_timeout = Duration::ZERO;
        assert!(config.validate().is_err());

        let mut config = ResponderConfig::builtin();
        config.max_request_bytes = 0;
        assert!(config.validate().is_err());

        let mut config = ResponderConfig::builtin();
        config.admin_addr = Some(config.listen_addr);
        assert!(config.validate().is_err());
    }
}
