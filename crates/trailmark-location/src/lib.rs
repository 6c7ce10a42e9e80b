//! Location provider interfaces for trailmark
//!
//! This crate defines the boundary between the tracking core and whatever
//! produces position fixes. It contains no platform code itself, only the
//! trait, the sampling policy, and two in-process providers:
//! - `MockLocationProvider` for tests that push samples by hand
//! - `ReplayProvider` for feeding a recorded track through the core

mod handle;
mod mock;
mod replay;
mod sampling;
mod traits;

pub use handle::*;
pub use mock::*;
pub use replay::*;
pub use sampling::*;
pub use traits::*;
