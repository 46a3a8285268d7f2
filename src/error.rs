//! Error types shared by every layer of the binding pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout the crate.
pub type BindResult<T> = Result<T, BindError>;

/// The layer a value was being applied from when it failed to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    File,
    Env,
    Arg,
    Default,
}

impl std::fmt::Display for Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Layer::File => "file",
            Layer::Env => "environment",
            Layer::Arg => "argument",
            Layer::Default => "default",
        };
        f.write_str(name)
    }
}

/// Failure to parse a single raw string into a leaf value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValueError {
    #[error("duration cannot be empty")]
    EmptyDuration,

    #[error("cannot parse duration {0:?}")]
    InvalidDuration(String),

    #[error("invalid duration suffix in {0:?}")]
    InvalidDurationSuffix(String),

    #[error("duration cannot be negative; got {0:?}")]
    NegativeDuration(String),

    #[error("too big duration {0:?}")]
    DurationOverflow(String),

    #[error("cannot parse byte size {0:?}")]
    InvalidBytes(String),

    #[error("cannot parse boolean {0:?}")]
    InvalidBool(String),

    #[error("cannot parse integer {value:?}: {reason}")]
    InvalidInt { value: String, reason: String },

    #[error("cannot decode {value:?}: {reason}")]
    Decode { value: String, reason: String },
}

/// Error type for binding a record.
#[derive(Debug, Error)]
pub enum BindError {
    /// A configuration file exists but could not be read.
    #[error("failed to read configuration file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A configuration file could not be decoded.
    #[error("failed to decode configuration file {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// The record could not be converted to or from the merge tree.
    #[error("failed to merge decoded files into the record: {0}")]
    Record(#[from] serde_json::Error),

    /// A leaf rejected the value offered by a layer.
    #[error("invalid {layer} value for `{field}`: {source}")]
    Field {
        field: String,
        layer: Layer,
        #[source]
        source: ValueError,
    },

    /// Required leaves still held their zero value after every layer.
    #[error("{} is required, but empty", .fields.join(", "))]
    MissingRequired { fields: Vec<String> },

    /// A field tag string could not be parsed.
    #[error("invalid tag for field `{field}`: {message}")]
    Tag { field: String, message: String },
}

impl BindError {
    pub(crate) fn decode(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Decode {
            path: path.into(),
            message: message.into(),
        }
    }

    pub(crate) fn tag(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Tag {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Names of the missing required fields, when this is a required-field error.
    pub fn missing_fields(&self) -> &[String] {
        match self {
            Self::MissingRequired { fields } => fields,
            _ => &[],
        }
    }
}
