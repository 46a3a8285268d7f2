//! Configuration files: candidate resolution, change stamps and decoding.
//!
//! Every listed file may have an environment sibling: for environment `test`,
//! `config.yml` is followed by `config.test.yml` and `settings` by `settings.test`.
//! Files that do not exist are skipped silently.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde_json::Value;

use crate::error::{BindError, BindResult};

/// Document formats a configuration file can be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Yaml,
    Toml,
    Json,
}

impl FileFormat {
    /// Format implied by the file extension, case-insensitively.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "yaml" | "yml" => Some(Self::Yaml),
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// The sibling of `path` for environment `env`.
pub fn env_sibling(path: &Path, env: &str) -> PathBuf {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => path.with_extension(format!("{env}.{ext}")),
        None => {
            let mut name = path.as_os_str().to_owned();
            name.push(".");
            name.push(env);
            PathBuf::from(name)
        }
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    let meta = fs::metadata(path).ok()?;
    if !meta.is_file() {
        return None;
    }
    meta.modified().ok()
}

/// Existing candidate files in load order, each with its last observed modification time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileStamps {
    entries: Vec<(PathBuf, SystemTime)>,
}

impl FileStamps {
    /// Stat every listed file and, when `env` is non-empty, its environment sibling.
    /// The sibling is probed on its own, so it loads even when the base file is absent.
    pub fn collect<P: AsRef<Path>>(files: &[P], env: &str) -> Self {
        let mut entries = Vec::new();
        for file in files {
            let file = file.as_ref();
            match modified(file) {
                Some(stamp) => entries.push((file.to_path_buf(), stamp)),
                None => tracing::debug!(path = ?file, "Configuration file not found, skipping"),
            }

            if env.is_empty() {
                continue;
            }
            let sibling = env_sibling(file, env);
            if let Some(stamp) = modified(&sibling) {
                entries.push((sibling, stamp));
            }
        }
        Self { entries }
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.entries.iter().map(|(p, _)| p.as_path())
    }

    pub fn get(&self, path: &Path) -> Option<SystemTime> {
        self.entries
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, t)| *t)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether this observation differs from `previous`: a file appeared, vanished or was
    /// modified after its previous stamp.
    pub fn changed_since(&self, previous: &FileStamps) -> bool {
        if self.entries.len() != previous.entries.len() {
            return true;
        }
        self.entries
            .iter()
            .any(|(path, stamp)| previous.get(path).map_or(true, |old| *stamp > old))
    }
}

/// Read and decode one file into a document tree. Empty files yield `None`.
pub fn decode_file(path: &Path) -> BindResult<Option<Value>> {
    let content = fs::read_to_string(path).map_err(|source| BindError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    decode_str(&content, FileFormat::from_path(path), path)
}

/// Decode `content`. Without a known format, a leading `{` means JSON, anything else is
/// tried as YAML and then as TOML.
pub fn decode_str(content: &str, format: Option<FileFormat>, path: &Path) -> BindResult<Option<Value>> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let value = match format {
        Some(format) => parse(content, format).map_err(|e| BindError::decode(path, e))?,
        None if trimmed.starts_with('{') => {
            parse(content, FileFormat::Json).map_err(|e| BindError::decode(path, e))?
        }
        None => match parse(content, FileFormat::Yaml) {
            Ok(value) => value,
            Err(yaml) => parse(content, FileFormat::Toml)
                .map_err(|toml| BindError::decode(path, format!("yaml: {yaml}; toml: {toml}")))?,
        },
    };

    Ok((!value.is_null()).then_some(value))
}

fn parse(content: &str, format: FileFormat) -> Result<Value, String> {
    let value = match format {
        FileFormat::Yaml => serde_yaml::from_str::<Value>(content).map_err(|e| e.to_string())?,
        FileFormat::Json => serde_json::from_str::<Value>(content).map_err(|e| e.to_string())?,
        FileFormat::Toml => {
            let table: toml::Table = toml::from_str(content).map_err(|e| e.to_string())?;
            serde_json::to_value(table).map_err(|e| e.to_string())?
        }
    };
    // Sniffing relies on this: a TOML line like `a = 1` is a valid YAML scalar.
    if !matches!(value, Value::Object(_) | Value::Null) {
        return Err("document is not a mapping".to_string());
    }
    Ok(value)
}

/// Merge `overlay` into `base`. Mappings merge key by key, nulls are ignored and every
/// other value replaces what was there.
pub fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (_, Value::Null) => {}
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(slot) => merge_values(slot, value),
                    None if value.is_null() => {}
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}
