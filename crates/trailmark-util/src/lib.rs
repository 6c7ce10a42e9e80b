//! Shared utilities for trailmark
//!
//! This crate provides:
//! - Session identifiers
//! - Clock helpers (epoch milliseconds, mock time)
//! - Great-circle distance math
//! - Display formatting for distances, durations and times
//! - Default paths for config and data directories

mod format;
mod geo;
mod ids;
mod paths;
mod time;

pub use format::*;
pub use geo::*;
pub use ids::*;
pub use paths::*;
pub use time::*;
