//! Typed configuration binding.
//!
//! A record implements [`Bind`] to describe its fields. A [`Loader`] fills it from
//! configuration files (YAML, TOML, JSON), environment variables and command-line
//! arguments, applies defaults and checks required fields. A [`Supervisor`] keeps a
//! published copy in sync with the files on disk.
//!
//! # Precedence
//!
//! ```text
//! files (in order, env siblings after their base)
//!     < environment variables (%{VAR} expanded)
//!     < command-line arguments
//! defaults fill whatever is still zero; required fields are checked last
//! ```

pub mod bind;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod observability;
pub mod source;
pub mod value;

pub use bind::{Bind, Field, Sequence, Settings, Visitor};
pub use config::{load, Live, Loader, Options, Supervisor};
pub use error::{BindError, BindResult, Layer, ValueError};
pub use lifecycle::Shutdown;
pub use source::{ArgTable, EnvTable, FileStamps};
pub use value::{Array, ArrayBool, ArrayDuration, ArrayInt, Bytes, Duration, Leaf, Settable};
