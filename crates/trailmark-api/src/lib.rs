//! Data model for trailmark
//!
//! This crate defines the types every other crate agrees on:
//! - Location points and tracking sessions (also the persisted shape)
//! - Derived session statistics
//! - Live tracking state published to the presentation layer
//! - Events emitted by the tracking manager

mod events;
mod state;
mod types;

pub use events::*;
pub use state::*;
pub use types::*;
