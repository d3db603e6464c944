use crate::core::RegistryConfig;
use crate::server::config::{ServerConfig, DEFAULT_PORT};
use clap::{Parser, ValueEnum};
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

/// Serve the payment transaction API
#[derive(Parser, Debug)]
#[command(name = "transaction-gateway")]
#[command(about = "Serve the payment transaction API", long_about = None)]
pub struct CliArgs {
    /// Address to listen on
    #[arg(
        long = "bind",
        value_name = "ADDR",
        default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        help = "IP address to listen on"
    )]
    pub bind: IpAddr,

    /// Port to listen on
    #[arg(
        long = "port",
        value_name = "PORT",
        default_value_t = DEFAULT_PORT,
        help = "Port to listen on (1024-65535, default: 44443)"
    )]
    pub port: u16,

    /// Number of runtime worker threads
    #[arg(
        long = "worker-threads",
        value_name = "COUNT",
        help = "Number of worker threads (default: CPU cores)"
    )]
    pub worker_threads: Option<usize>,

    /// How transactions get their outcome
    #[arg(
        long = "authorizer",
        value_name = "MODE",
        default_value = "manual",
        help = "Authorization mode: 'manual' (operator console), 'approve' or 'decline' after a delay"
    )]
    pub authorizer: AuthorizerMode,

    /// Delay before a scheduled authorizer answers
    #[arg(
        long = "authorization-delay-ms",
        value_name = "MS",
        default_value_t = 2000,
        help = "Delay before the approve/decline authorizers answer"
    )]
    pub authorization_delay_ms: u64,

    /// Maximum transactions in progress at once
    #[arg(
        long = "max-in-progress",
        value_name = "COUNT",
        help = "Refuse new transactions while this many are in progress (default: unlimited)"
    )]
    pub max_in_progress: Option<usize>,

    /// Per-request read and response deadline
    #[arg(
        long = "request-timeout-ms",
        value_name = "MS",
        default_value_t = 5000,
        help = "Time allowed to read a request and to answer it"
    )]
    pub request_timeout_ms: u64,
}

/// Available authorization modes
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum AuthorizerMode {
    Manual,
    Approve,
    Decline,
}

impl CliArgs {
    /// Create a ServerConfig from CLI arguments
    ///
    /// Invalid values fall back to defaults with a warning.
    pub fn to_server_config(&self) -> ServerConfig {
        let default = ServerConfig::default();
        ServerConfig::new(
            self.bind,
            self.port,
            self.worker_threads.unwrap_or(default.worker_threads),
            Duration::from_millis(self.request_timeout_ms),
        )
    }

    /// Create a RegistryConfig from CLI arguments
    ///
    /// A limit of zero means unlimited.
    pub fn to_registry_config(&self) -> RegistryConfig {
        RegistryConfig {
            max_in_progress: self.max_in_progress.filter(|max| *max > 0),
        }
    }

    pub fn authorization_delay(&self) -> Duration {
        Duration::from_millis(self.authorization_delay_ms)
    }
}
