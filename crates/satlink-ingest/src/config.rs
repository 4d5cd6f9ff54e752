use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use satlink_transport::{SocketOptions, DEFAULT_RECV_TIMEOUT};

/// Default UDP port for telemetry ingestion.
pub const DEFAULT_PORT: u16 = 5005;

/// Largest UDP payload.
pub const DEFAULT_MAX_DATAGRAM: usize = 65_535;

/// Ingestion service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestConfig {
    /// Address the listener binds. Default: `0.0.0.0:5005`.
    pub bind: SocketAddr,
    /// Bound on one blocking receive; also the worst-case stop latency.
    pub recv_timeout: Duration,
    /// Receive buffer size. Longer datagrams are truncated.
    pub max_datagram: usize,
    /// Enable `SO_REUSEADDR` on the listening socket. On Linux a second
    /// service with this set can bind the same address while the first runs.
    pub reuse_address: bool,
}

impl IngestConfig {
    /// Listen on `bind` with every other setting at its default.
    pub fn new(bind: SocketAddr) -> Self {
        Self {
            bind,
            ..Self::default()
        }
    }

    pub fn with_recv_timeout(mut self, recv_timeout: Duration) -> Self {
        self.recv_timeout = recv_timeout;
        self
    }

    pub fn with_max_datagram(mut self, max_datagram: usize) -> Self {
        self.max_datagram = max_datagram;
        self
    }

    pub fn with_reuse_address(mut self, reuse_address: bool) -> Self {
        self.reuse_address = reuse_address;
        self
    }

    pub(crate) fn socket_options(&self) -> SocketOptions {
        SocketOptions {
            reuse_address: self.reuse_address,
            recv_timeout: self.recv_timeout,
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
            recv_timeout: DEFAULT_RECV_TIMEOUT,
            max_datagram: DEFAULT_MAX_DATAGRAM,
            reuse_address: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_ground_station_setup() {
        let config = IngestConfig::default();
        assert_eq!(config.bind.to_string(), "0.0.0.0:5005");
        assert_eq!(config.recv_timeout, Duration::from_secs(1));
        assert!(config.reuse_address);
    }

    #[test]
    fn builder_overrides() {
        let config = IngestConfig::new("127.0.0.1:0".parse().unwrap())
            .with_recv_timeout(Duration::from_millis(200))
            .with_max_datagram(512)
            .with_reuse_address(false);
        assert_eq!(config.bind.port(), 0);
        assert_eq!(config.max_datagram, 512);
        assert_eq!(
            config.socket_options(),
            SocketOptions {
                reuse_address: false,
                recv_timeout: Duration::from_millis(200),
            }
        );
    }
}
