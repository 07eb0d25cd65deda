//! Seismic Radar Runtime
//!
//! Drives the periodic aggregation cycle and owns the score cache:
//! - Fault-isolated, time-bounded fan-out to every feed
//! - Merge, ETAS, scoring and alert override, in that order
//! - Atomic publish into a single-writer, many-reader cache
//! - Non-overlapping, cancellable scheduling

pub mod cache;
pub mod config;
pub mod orchestrator;
pub mod scheduler;

#[cfg(test)]
pub(crate) mod testing;

pub use cache::*;
pub use config::*;
pub use orchestrator::*;
pub use scheduler::*;
