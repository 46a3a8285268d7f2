//! Configuration resolution and hot reload.
//!
//! # Data Flow
//! ```text
//! candidate files (+ <name>.<env>.<ext> siblings)
//!     → loader.rs     decode each file, deep merge over the record
//!     → loader.rs     environment layer, argument layer, default layer
//!     → validation.rs required check (all missing fields at once)
//!     → live.rs       Live<T> published through ArcSwap
//!
//! On every poll tick:
//!     watcher.rs stats candidate files
//!     → unchanged: nothing happens
//!     → changed:   copy live record → loader.rs resolves the copy
//!                  → atomic swap of Arc<T> → on_change callback
//!     → failure:   error logged, previous record and stamps kept
//! ```
//!
//! # Design Decisions
//! - The loader never holds global state; options are passed in or discovered explicitly
//! - Reloads resolve into a copy, so readers only ever see complete records
//! - Polling instead of file-system notifications; the tick is cheap when nothing changed

pub mod live;
pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use live::Live;
pub use loader::{load, Loader};
pub use schema::Options;
pub use validation::check_required;
pub use watcher::Supervisor;
