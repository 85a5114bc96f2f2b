//! Metrics collection and exposition.
//!
//! # Metrics
//! - `net/http/client/*`: outgoing request counts, sizes, round trip latency
//! - `net/http/server/*`: incoming request counts, sizes, elapsed time
//!
//! The catalog itself lives in `stats::measures`.

use std::net::{AddrParseError, SocketAddr};

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use thiserror::Error;

use crate::config::ObservabilityConfig;
use crate::stats::{self, Measures};

/// Error type for metrics startup.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("invalid metrics address: {0}")]
    Address(#[from] AddrParseError),

    #[error("cannot install Prometheus exporter: {0}")]
    Exporter(#[from] BuildError),
}

/// Install the Prometheus recorder with an HTTP listener on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;

    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Start the exporter when enabled, then register the measure catalog.
///
/// The catalog is built even with metrics disabled so that a conflict
/// aborts startup instead of the first request.
pub fn init_stats(config: &ObservabilityConfig) -> Result<&'static Measures, MetricsError> {
    if config.metrics_enabled {
        init_metrics(config.metrics_address.parse()?)?;
    }

    let catalog = stats::measures();
    tracing::debug!(
        client_latency = catalog.client.latency.name(),
        server_latency = catalog.server.latency.name(),
        "Measure catalog registered"
    );
    Ok(catalog)
}
