//! statwatch - host and process sampling with trend statistics
//!
//! The [`collector`] module turns raw `/proc` counters into instant
//! measurements, [`stats`] reduces a history of measurements into a
//! [`stats::StatDigest`], and [`monitor`] ties both together for a
//! periodic caller.

pub mod collector;
pub mod config;
pub mod error;
pub mod history;
pub mod monitor;
pub mod stats;

pub use collector::{InstantSampler, LinuxSampler, Lookup};
pub use config::Config;
pub use error::{SamplerError, StatsError};
pub use history::History;
pub use monitor::Monitor;
pub use stats::{digest, InstantRate, StatDigest};
