//! Seismic Radar Core - event model and scoring primitives
//!
//! This crate provides the pure, I/O-free pieces of the pipeline:
//! - Seismic events and their GeoJSON-like wire shape
//! - Deduplicating event merger
//! - ETAS aftershock intensity model with optional calibration
//! - Weighted component scorer and the official-alert override
//! - Time-since-last-major-event recurrence model

pub mod event;
pub mod merge;
pub mod etas;
pub mod scoring;
pub mod recurrence;

pub use event::*;
pub use merge::*;
pub use etas::*;
pub use scoring::*;
pub use recurrence::*;

/// Maximum number of events kept after a merge
pub const MAX_MERGED_EVENTS: usize = 50;

/// Milliseconds in one day
pub const MS_PER_DAY: f64 = 86_400_000.0;

/// Weight ceiling of the seismic component
pub const SEISMIC_CEILING: u8 = 40;

/// Weight ceiling of the ionosphere component
pub const IONOSPHERE_CEILING: u8 = 30;

/// Weight ceiling of the time-since-last component
pub const TIME_CEILING: u8 = 20;

/// Weight ceiling of the crowd component
pub const CROWD_CEILING: u8 = 10;
