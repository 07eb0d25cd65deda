//! Seismic Radar Feeds
//!
//! One adapter per external source, all behind the [`Feed`] trait:
//! - **USGS**: global weekly summary, filtered to the region radius
//! - **GSI**: regional bulletin table
//! - **EMSC**: felt-report estimate from the last 24h of regional events
//! - **NASA CMR**: ionospheric TEC granule availability
//! - **Open-Meteo**: surface pressure
//! - **Home Front Command**: authoritative earthquake alerts
//!
//! Every adapter documents a fallback value used when it cannot deliver.

pub mod client;
pub mod config;
pub mod traits;
pub mod usgs;
pub mod gsi;
pub mod emsc;
pub mod nasa;
pub mod pressure;
pub mod alert;

pub use client::*;
pub use config::*;
pub use traits::*;
pub use usgs::*;
pub use gsi::*;
pub use emsc::*;
pub use nasa::*;
pub use pressure::*;
pub use alert::*;
