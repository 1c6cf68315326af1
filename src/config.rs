//! Application configuration.

use std::net::SocketAddr;

use crate::error::Error;

/// Address the sample application listens on.
pub const DEFAULT_ADDR: &str = "0.0.0.0:3000";

/// Largest request body the server buffers, 1 MiB. Larger bodies get a 413.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Log filter used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Settings for one running application.
#[derive(Clone, Debug)]
pub struct AppConfig {
    addr: SocketAddr,
    body_limit: usize,
}

impl AppConfig {
    /// Parses `addr` as `host:port`.
    pub fn with_addr(addr: &str) -> Result<Self, Error> {
        let parsed = addr.parse().map_err(|source| Error::Addr { addr: addr.to_owned(), source })?;
        Ok(Self { addr: parsed, ..Self::default() })
    }

    /// Caps buffered request bodies at `bytes`.
    pub fn with_body_limit(mut self, bytes: usize) -> Self {
        self.body_limit = bytes;
        self
    }

    pub fn addr(&self) -> SocketAddr { self.addr }
    pub fn body_limit(&self) -> usize { self.body_limit }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self { addr: SocketAddr::from(([0, 0, 0, 0], 3000)), body_limit: MAX_BODY_BYTES }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_the_documented_address() {
        assert_eq!(AppConfig::default().addr(), AppConfig::with_addr(DEFAULT_ADDR).unwrap().addr());
    }

    #[test]
    fn body_limit_defaults_to_one_mebibyte() {
        assert_eq!(AppConfig::default().body_limit(), 1 << 20);
        assert_eq!(AppConfig::default().with_body_limit(16).body_limit(), 16);
    }

    #[test]
    fn rejects_bad_addresses() {
        let err = AppConfig::with_addr("localhost").unwrap_err();
        assert!(err.to_string().contains("localhost"));
    }
}
