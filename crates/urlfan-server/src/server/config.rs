use anyhow::bail;
use clap::Parser;
use core::time::Duration;
use urlfan_core::{
    DEFAULT_FETCH_TIMEOUT, DEFAULT_MAX_CLIENTS, DEFAULT_NUM_WORKERS, DEFAULT_REQUEST_TIMEOUT,
    MAX_GATE_CAPACITY,
};

/// Runtime configuration for the `urlfan-server` binary.
///
/// These settings control admission, fan-out width and the timeouts applied
/// to each fetch and to each request. All values are parsed from CLI arguments
/// or environment variables, with defaults matching the engine's constants.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "urlfan-server",
    version,
    about = "An HTTP service that fetches batches of URLs concurrently"
)]
pub struct CliArgs {
    /// Address to listen on.
    ///
    /// Environment variable: `SERVER_ADDR`
    #[arg(long, env = "SERVER_ADDR", default_value_t = String::from("0.0.0.0:6969"))]
    pub server_addr: String,

    /// Maximum number of batches processed at the same time.
    ///
    /// Requests arriving while this many batches are in flight are refused
    /// with `429 Too Many Requests`; they are never queued.
    ///
    /// Environment variable: `MAX_CLIENTS`
    #[arg(long, env = "MAX_CLIENTS", default_value_t = DEFAULT_MAX_CLIENTS)]
    pub max_clients: usize,

    /// Number of concurrent fetches per batch.
    ///
    /// Small batches use fewer workers: a batch of `n` URLs runs
    /// `min(n, NUM_WORKERS)` fetches at once.
    ///
    /// Environment variable: `NUM_WORKERS`
    #[arg(long, env = "NUM_WORKERS", default_value_t = DEFAULT_NUM_WORKERS)]
    pub num_workers: usize,

    /// Timeout for a single outbound fetch, in milliseconds.
    ///
    /// Environment variable: `FETCH_TIMEOUT_MS`
    #[arg(long, env = "FETCH_TIMEOUT_MS", default_value_t = DEFAULT_FETCH_TIMEOUT.as_millis() as u64)]
    pub fetch_timeout_ms: u64,

    /// Timeout for a whole batch request, in milliseconds.
    ///
    /// Environment variable: `REQUEST_TIMEOUT_MS`
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value_t = DEFAULT_REQUEST_TIMEOUT.as_millis() as u64)]
    pub request_timeout_ms: u64,

    /// Seconds to wait for in-flight batches to finish during shutdown before
    /// cancelling them.
    ///
    /// Environment variable: `SHUTDOWN_TIMEOUT`
    #[arg(long, env = "SHUTDOWN_TIMEOUT", default_value_t = 5)]
    pub shutdown_timeout: u64,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub server_addr: String,
    pub max_clients: usize,
    pub num_workers: usize,
    pub fetch_timeout: Duration,
    pub request_timeout: Duration,
    pub shutdown_timeout: Duration,
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.max_clients == 0 {
            bail!("MAX_CLIENTS must be greater than 0");
        }

        if args.max_clients > MAX_GATE_CAPACITY {
            bail!("MAX_CLIENTS must not exceed {MAX_GATE_CAPACITY}");
        }

        if args.num_workers == 0 {
            bail!("NUM_WORKERS must be greater than 0");
        }

        if args.fetch_timeout_ms == 0 || args.request_timeout_ms == 0 {
            bail!("FETCH_TIMEOUT_MS and REQUEST_TIMEOUT_MS must be greater than 0");
        }

        if args.fetch_timeout_ms >= args.request_timeout_ms {
            bail!(
                "FETCH_TIMEOUT_MS ({}) must be shorter than REQUEST_TIMEOUT_MS ({})",
                args.fetch_timeout_ms,
                args.request_timeout_ms
            );
        }

        Ok(Self {
            server_addr: args.server_addr,
            max_clients: args.max_clients,
            num_workers: args.num_workers,
            fetch_timeout: Duration::from_millis(args.fetch_timeout_ms),
            request_timeout: Duration::from_millis(args.request_timeout_ms),
            shutdown_timeout: Duration::from_secs(args.shutdown_timeout),
        })
    }
}
