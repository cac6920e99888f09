//! Switch protocol
//!
//! Moves "active" from one account to another: back up whoever is live,
//! restore the target's secret and identity, and only then commit the
//! registry.

mod protocol;

pub use protocol::{AccountRef, SwitchOutcome, SwitchProtocol};
