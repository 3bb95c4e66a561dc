// src/health/mod.rs
mod checker;
mod elapsed;
mod error;
mod probe;
pub mod probes;
mod report;

pub use checker::{Aggregator, ProbeGroup};
pub use elapsed::format_elapsed;
pub use error::ProbeError;
pub use probe::{build_probe, Probe};
pub use report::{HealthReport, StatusGroup, Vital};
