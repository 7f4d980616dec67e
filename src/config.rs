//! Client configuration: which server to talk to and how much to trust it.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::CowmailError;

/// DEFAULT_PORT is used when a server string has no port
pub const DEFAULT_PORT: u16 = 1337;

/// DEFAULT_MAX_RESPONSE bounds a GET response (64 KiB)
pub const DEFAULT_MAX_RESPONSE: usize = 65536;

/// ServerAddr is a `host[:port]` pair. IPv6 literals need brackets when a port is given (`[::1]:1337`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerAddr {
    pub host: String,
    pub port: u16,
}

impl ServerAddr {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl FromStr for ServerAddr {
    type Err = CowmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || CowmailError::InvalidServerAddress(s.to_string());
        if s.is_empty() {
            return Err(invalid());
        }
        // [v6]:port or [v6]
        if let Some(rest) = s.strip_prefix('[') {
            let (host, tail) = rest.split_once(']').ok_or_else(invalid)?;
            if host.is_empty() {
                return Err(invalid());
            }
            let port = match tail {
                "" => DEFAULT_PORT,
                _ => tail
                    .strip_prefix(':')
                    .and_then(|p| p.parse().ok())
                    .ok_or_else(invalid)?,
            };
            return Ok(Self::new(host, port));
        }
        match s.matches(':').count() {
            0 => Ok(Self::new(s, DEFAULT_PORT)),
            1 => {
                let (host, port) = s.split_once(':').ok_or_else(invalid)?;
                if host.is_empty() {
                    return Err(invalid());
                }
                Ok(Self::new(host, port.parse().map_err(|_| invalid())?))
            }
            // bare IPv6 literal, no port
            _ => Ok(Self::new(s, DEFAULT_PORT)),
        }
    }
}

impl fmt::Display for ServerAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// ClientConfig is everything one PUT/LIST/GET exchange needs.
///
/// Timeouts are off unless set; deciding how long to wait is up to the caller.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub server: ServerAddr,
    /// Largest GET response accepted.
    pub max_response: usize,
    /// Applied to connect, read and write when set.
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(server: ServerAddr) -> Self {
        Self {
            server,
            max_response: DEFAULT_MAX_RESPONSE,
            timeout: None,
        }
    }

    pub fn with_max_response(mut self, max_response: usize) -> Self {
        self.max_response = max_response;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_without_port_gets_default() {
        let addr: ServerAddr = "mail.example.org".parse().unwrap();
        assert_eq!(addr, ServerAddr::new("mail.example.org", 1337));
    }

    #[test]
    fn host_with_port() {
        let addr: ServerAddr = "localhost:4000".parse().unwrap();
        assert_eq!(addr, ServerAddr::new("localhost", 4000));
        assert_eq!(addr.to_string(), "localhost:4000");
    }

    #[test]
    fn ipv6_forms() {
        let addr: ServerAddr = "[::1]:9000".parse().unwrap();
        assert_eq!(addr, ServerAddr::new("::1", 9000));
        assert_eq!(addr.to_string(), "[::1]:9000");
        let addr: ServerAddr = "[::1]".parse().unwrap();
        assert_eq!(addr.port, DEFAULT_PORT);
        let addr: ServerAddr = "fe80::1".parse().unwrap();
        assert_eq!(addr, ServerAddr::new("fe80::1", DEFAULT_PORT));
    }

    #[test]
    fn bad_addresses_are_rejected() {
        for bad in ["", "   ", "host:", ":80", "host:notaport", "host:99999", "[::1", "[]:80", "[::1]80"] {
            assert!(
                matches!(bad.parse::<ServerAddr>(), Err(CowmailError::InvalidServerAddress(_))),
                "{:?} should not parse",
                bad
            );
        }
    }

    #[test]
    fn config_builders() {
        let config = ClientConfig::new(ServerAddr::new("h", 1))
            .with_max_response(10)
            .with_timeout(Duration::from_secs(3));
        assert_eq!(config.max_response, 10);
        assert_eq!(config.timeout, Some(Duration::from_secs(3)));
        assert_eq!(ClientConfig::new(ServerAddr::new("h", 1)).max_response, 65536);
    }
}
