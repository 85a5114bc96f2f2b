//! trace-relay
//!
//! A small HTTP service that shows trace context propagation at work.
//!
//! ```text
//!   caller ──X-Cloud-Trace-Context──▶ TraceHandler ──▶ GET /       span as JSON
//!                                                  └─▶ GET /relay  via TraceTransport
//! ```
//!
//! Chain two relays (A's upstream pointing at B's `/`) to watch one trace id
//! cross both processes.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use cloudtrace_http::config::{load_config, RelayConfig};
use cloudtrace_http::lifecycle::{wait_for_termination, Shutdown};
use cloudtrace_http::observability::{init_logging, init_stats};
use cloudtrace_http::trace::{LocalTracer, Sampler, Tracer};
use cloudtrace_http::RelayServer;

#[derive(Parser, Debug)]
#[command(name = "trace-relay", version, about = "Trace context relay")]
struct Cli {
    /// Path to a TOML config file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => RelayConfig::default(),
    };

    init_logging(&config.observability)?;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = ?cli.config,
        "trace-relay starting"
    );

    init_stats(&config.observability)?;

    let tracer: Arc<dyn Tracer> =
        Arc::new(LocalTracer::new(Sampler::from_ratio(config.tracing.sample_ratio)));

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let shutdown = Shutdown::new();
    let stop = shutdown.signal();
    tokio::spawn(async move {
        wait_for_termination().await;
        shutdown.trigger();
    });

    RelayServer::new(config, tracer).run(listener, stop).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
