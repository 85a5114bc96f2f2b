//! HTTP stats.
//!
//! # Data Flow
//! ```text
//! process start
//!     → observability::metrics installs the recorder
//!     → measures.rs registers the catalog once (conflict = panic)
//! per request:
//!     → layer.rs StatsService records counts, sizes and latency
//! ```

pub mod layer;
pub mod measures;

pub use layer::{StatsLayer, StatsService};
pub use measures::{
    measures, Measure, MeasureError, MeasureKind, MeasureRegistry, MeasureUnit, Measures,
    RoleMeasures,
};
