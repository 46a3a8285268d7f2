//! Structured logging.
//!
//! Binding and reload events go to `tracing`. Embedders that want them through their own
//! logger register a [`LogSink`] on the loader.

use std::fmt;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::BindError;

/// Callback receiving an optional error and a formatted message.
pub type LogSink = Arc<dyn Fn(Option<&BindError>, fmt::Arguments<'_>) + Send + Sync>;

/// A sink that drops every message.
pub fn noop_sink() -> LogSink {
    Arc::new(|_, _| {})
}

/// A sink that forwards messages to `tracing`, as errors when one is attached.
pub fn tracing_sink() -> LogSink {
    Arc::new(|err, message| match err {
        Some(err) => tracing::error!(error = %err, "{}", message),
        None => tracing::info!("{}", message),
    })
}

/// Install the global subscriber on stderr: `RUST_LOG` when set, otherwise `default_directive`.
///
/// Returns `false` if a subscriber was already installed.
pub fn init(default_directive: &str) -> bool {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_directive.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .is_ok()
}
