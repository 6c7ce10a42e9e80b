//! Tracking state machine and session history facade for trailmark
//!
//! This crate is the heart of trailmark, containing:
//! - The tracking state machine
//!   (Idle -> PermissionPending -> Idle/PermissionDenied -> Tracking -> Stopped)
//! - Path accumulation and running distance
//! - `Tracker`, which pairs the state machine with the session history and
//!   applies the "only keep sessions with points" policy on stop

mod error;
mod manager;
mod session;
mod tracker;

pub use error::*;
pub use manager::*;
pub use session::*;
pub use tracker::*;
