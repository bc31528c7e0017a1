//! Signal feed types
//!
//! The normalized shape every adapter produces and the merged payload
//! served to clients.

mod types;

pub use types::{Direction, Signal, SignalFeed, SignalKind};
