//! Catalog of HTTP client and server measures.
//!
//! The catalog is registered once per process. A registration failure means
//! two entries collide, which is a build-time mistake, so [`measures`]
//! panics instead of returning an error.

use std::collections::HashSet;
use std::fmt;
use std::sync::OnceLock;

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use thiserror::Error;

use self::MeasureKind::{Float64, Int64};
use self::MeasureUnit::{Bytes, Count, Milliseconds};

/// Unit attached to a measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasureUnit {
    Count,
    Bytes,
    Milliseconds,
}

impl MeasureUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeasureUnit::Count => "1",
            MeasureUnit::Bytes => "By",
            MeasureUnit::Milliseconds => "ms",
        }
    }

    fn metrics_unit(&self) -> Unit {
        match self {
            MeasureUnit::Count => Unit::Count,
            MeasureUnit::Bytes => Unit::Bytes,
            MeasureUnit::Milliseconds => Unit::Milliseconds,
        }
    }
}

impl fmt::Display for MeasureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value type recorded against a measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasureKind {
    Int64,
    Float64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MeasureError {
    #[error("measure name must not be empty")]
    EmptyName,

    #[error("measure {0:?} is already registered")]
    Duplicate(&'static str),
}

/// A registered measure.
///
/// Count measures are exported as counters; sizes and latencies as
/// histograms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Measure {
    name: &'static str,
    description: &'static str,
    unit: MeasureUnit,
    kind: MeasureKind,
}

impl Measure {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn description(&self) -> &'static str {
        self.description
    }

    pub fn unit(&self) -> MeasureUnit {
        self.unit
    }

    pub fn kind(&self) -> MeasureKind {
        self.kind
    }

    /// Add to a count measure.
    pub fn increment(&self, value: u64) {
        counter!(self.name).increment(value);
    }

    /// Record one observation of a size or latency measure.
    pub fn record(&self, value: f64) {
        histogram!(self.name).record(value);
    }
}

/// Tracks registered names and describes each measure to the installed
/// `metrics` recorder.
#[derive(Debug, Default)]
pub struct MeasureRegistry {
    names: HashSet<&'static str>,
}

impl MeasureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        name: &'static str,
        description: &'static str,
        unit: MeasureUnit,
        kind: MeasureKind,
    ) -> Result<Measure, MeasureError> {
        if name.is_empty() {
            return Err(MeasureError::EmptyName);
        }
        if !self.names.insert(name) {
            return Err(MeasureError::Duplicate(name));
        }

        match unit {
            MeasureUnit::Count => describe_counter!(name, unit.metrics_unit(), description),
            _ => describe_histogram!(name, unit.metrics_unit(), description),
        }

        Ok(Measure {
            name,
            description,
            unit,
            kind,
        })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Measures for one side of an HTTP exchange.
#[derive(Debug, Clone)]
pub struct RoleMeasures {
    pub error_count: Measure,
    /// Client round trip latency or server elapsed time.
    pub latency: Measure,
    pub request_bytes: Measure,
    pub response_bytes: Measure,
    pub started_count: Measure,
    pub finished_count: Measure,
    pub request_count: Measure,
    pub response_count: Measure,
}

/// The full client and server catalog.
#[derive(Debug, Clone)]
pub struct Measures {
    pub client: RoleMeasures,
    pub server: RoleMeasures,
}

/// `(name, description, unit, kind)` in [`RoleMeasures`] field order.
type MeasureSpec = (&'static str, &'static str, MeasureUnit, MeasureKind);

const CLIENT_MEASURES: [MeasureSpec; 8] = [
    ("net/http/client/error_count", "HTTP client error count", Count, Int64),
    ("net/http/client/roundtrip_latency", "HTTP client round trip latency", Milliseconds, Float64),
    ("net/http/client/request_bytes", "HTTP client request size", Bytes, Int64),
    ("net/http/client/response_bytes", "HTTP client response size", Bytes, Int64),
    ("net/http/client/started_count", "Number of started requests at HTTP client", Count, Int64),
    ("net/http/client/finished_count", "Number of finished requests at HTTP client", Count, Int64),
    ("net/http/client/request_count", "Number of requests at HTTP client", Count, Int64),
    ("net/http/client/response_count", "Number of responses at HTTP client", Count, Int64),
];

const SERVER_MEASURES: [MeasureSpec; 8] = [
    ("net/http/server/error_count", "HTTP server error count", Count, Int64),
    ("net/http/server/elapsed_time", "HTTP server elapsed time", Milliseconds, Float64),
    ("net/http/server/request_bytes", "HTTP server request size", Bytes, Int64),
    ("net/http/server/response_bytes", "HTTP server response size", Bytes, Int64),
    ("net/http/server/started_count", "Number of started requests at HTTP server", Count, Int64),
    ("net/http/server/finished_count", "Number of finished requests at HTTP server", Count, Int64),
    ("net/http/server/request_count", "Number of requests at HTTP server", Count, Int64),
    ("net/http/server/response_count", "Number of responses at HTTP server", Count, Int64),
];

impl RoleMeasures {
    fn register(
        registry: &mut MeasureRegistry,
        table: &[MeasureSpec; 8],
    ) -> Result<Self, MeasureError> {
        let mut register = |&(name, description, unit, kind): &MeasureSpec| {
            registry.register(name, description, unit, kind)
        };
        let [
            error_count,
            latency,
            request_bytes,
            response_bytes,
            started,
            finished,
            requests,
            responses,
        ] = table;

        Ok(Self {
            error_count: register(error_count)?,
            latency: register(latency)?,
            request_bytes: register(request_bytes)?,
            response_bytes: register(response_bytes)?,
            started_count: register(started)?,
            finished_count: register(finished)?,
            request_count: register(requests)?,
            response_count: register(responses)?,
        })
    }
}

impl Measures {
    pub fn register(registry: &mut MeasureRegistry) -> Result<Self, MeasureError> {
        Ok(Self {
            client: RoleMeasures::register(registry, &CLIENT_MEASURES)?,
            server: RoleMeasures::register(registry, &SERVER_MEASURES)?,
        })
    }
}

static MEASURES: OnceLock<Measures> = OnceLock::new();

/// The process-wide catalog, registered on first use.
///
/// Install the metrics recorder before the first call so the descriptions
/// reach it.
pub fn measures() -> &'static Measures {
    MEASURES.get_or_init(|| {
        let mut registry = MeasureRegistry::new();
        Measures::register(&mut registry)
            .unwrap_or_else(|e| panic!("cannot create HTTP measures: {e}"))
    })
}
