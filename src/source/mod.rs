//! Source adapters: where raw configuration values come from.
//!
//! # Data Flow
//! ```text
//! process environment → env.rs  (EnvTable, %{VAR} expansion on lookup)
//! process arguments   → args.rs (ArgTable, --name=value / --name value / positionals)
//! candidate files     → file.rs (sibling resolution, stamps, decode + deep merge)
//! ```
//!
//! # Design Decisions
//! - Environment and argument tables are snapshots, taken once per loader
//! - Files decode into a JSON tree that is merged over the record, never replacing it wholesale

pub mod args;
pub mod env;
pub mod file;

pub use args::ArgTable;
pub use env::EnvTable;
pub use file::{FileFormat, FileStamps};
