//! Lifecycle management for background reload tasks.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGINT / Ctrl+C → wait_for_signal() returns
//!
//! Shutdown (shutdown.rs):
//!     Shutdown::trigger() → every subscribed poll task leaves its loop
//! ```
//!
//! # Design Decisions
//! - One broadcast channel per coordinator; tasks subscribe before they start
//! - Triggering with no subscribers is not an error

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
