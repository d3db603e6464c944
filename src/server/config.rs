use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use log::warn;

/// Port the API listens on unless configured otherwise
pub const DEFAULT_PORT: u16 = 44443;

/// Lowest port accepted; lower ports need root
pub const MIN_PORT: u16 = 1024;

/// Largest accepted request body
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Default limit for answering one request
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for the HTTP server
///
/// Controls where the server listens and how long it may take to answer a
/// request.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Address to bind the listener to
    pub bind_addr: SocketAddr,

    /// Time allowed to produce a response before answering 503
    pub request_timeout: Duration,

    /// Number of tokio worker threads
    pub worker_threads: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            worker_threads: num_cpus::get(),
        }
    }
}

impl ServerConfig {
    /// Create a ServerConfig with custom values
    ///
    /// Invalid values fall back to their defaults with a warning: ports below
    /// [`MIN_PORT`], zero worker threads and a zero timeout.
    pub fn new(host: IpAddr, port: u16, worker_threads: usize, request_timeout: Duration) -> Self {
        let default = Self::default();

        let port = if port < MIN_PORT {
            warn!(
                "config: port {} is unacceptable, using default ({})",
                port, DEFAULT_PORT
            );
            DEFAULT_PORT
        } else {
            port
        };

        let worker_threads = if worker_threads == 0 {
            warn!(
                "config: invalid worker_threads ({}), using default ({})",
                worker_threads, default.worker_threads
            );
            default.worker_threads
        } else {
            worker_threads
        };

        let request_timeout = if request_timeout.is_zero() {
            warn!(
                "config: invalid request timeout (0ms), using default ({}ms)",
                DEFAULT_REQUEST_TIMEOUT.as_millis()
            );
            DEFAULT_REQUEST_TIMEOUT
        } else {
            request_timeout
        };

        Self {
            bind_addr: SocketAddr::new(host, port),
            request_timeout,
            worker_threads,
        }
    }
}
