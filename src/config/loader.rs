//! The resolution pipeline: files, environment, arguments, defaults, required check.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::bind::layers::{ArgLayer, DefaultLayer, EnvLayer};
use crate::bind::{Bind, Settings};
use crate::config::schema::Options;
use crate::config::validation::check_required;
use crate::error::{BindError, BindResult};
use crate::observability::{noop_sink, LogSink};
use crate::source::file::{decode_file, merge_values};
use crate::source::{ArgTable, EnvTable, FileStamps};

/// Resolves records from files, environment variables and arguments.
///
/// The environment and the argument list are captured when the loader is built; a loader
/// resolves every record against the same snapshot.
pub struct Loader {
    options: Options,
    env: EnvTable,
    args: ArgTable,
    sink: LogSink,
}

impl Loader {
    /// A loader over the current process environment and arguments.
    pub fn new(options: Options) -> Self {
        Self::with_sources(options, EnvTable::from_process(), ArgTable::from_process())
    }

    pub fn with_sources(options: Options, env: EnvTable, args: ArgTable) -> Self {
        Self {
            options,
            env,
            args,
            sink: noop_sink(),
        }
    }

    /// Route load and reload messages to `sink` as well as to `tracing`.
    pub fn with_log_sink(mut self, sink: LogSink) -> Self {
        self.sink = sink;
        self
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn env(&self) -> &EnvTable {
        &self.env
    }

    pub fn args(&self) -> &ArgTable {
        &self.args
    }

    /// The files `resolve` would read for `files`, in order, with their modification times.
    pub fn candidate_files<P: AsRef<Path>>(&self, files: &[P]) -> FileStamps {
        FileStamps::collect(files, &self.options.env)
    }

    /// Resolve `record` in place and return the stamps of the files that were read.
    ///
    /// On error the record may be partially updated; callers that need the previous value
    /// intact resolve into a copy.
    pub fn resolve<T, P>(&self, record: &mut T, files: &[P]) -> BindResult<FileStamps>
    where
        T: Bind + Serialize + DeserializeOwned,
        P: AsRef<Path>,
    {
        let stamps = self.candidate_files(files);
        self.resolve_with(record, &stamps)?;
        Ok(stamps)
    }

    pub(crate) fn resolve_with<T>(&self, record: &mut T, stamps: &FileStamps) -> BindResult<()>
    where
        T: Bind + Serialize + DeserializeOwned,
    {
        self.apply_files(record, stamps)?;
        record.bind(&mut EnvLayer::new(&self.env, &self.options.env_prefix))?;
        record.bind(&mut ArgLayer::new(&self.args, &self.options.arg_prefix))?;
        record.bind(&mut DefaultLayer::default())?;
        check_required(record)?;

        tracing::debug!(files = stamps.len(), "Configuration resolved");
        self.log(None, format_args!("Configuration resolved from {} file(s)", stamps.len()));
        Ok(())
    }

    fn apply_files<T>(&self, record: &mut T, stamps: &FileStamps) -> BindResult<()>
    where
        T: Serialize + DeserializeOwned,
    {
        if stamps.is_empty() {
            return Ok(());
        }

        let mut tree = serde_json::to_value(&*record)?;
        let mut merged: Option<T> = None;
        for path in stamps.paths() {
            let Some(document) = decode_file(path)? else {
                tracing::debug!(path = ?path, "Configuration file is empty");
                continue;
            };
            merge_values(&mut tree, document);
            // Deserialize after every file so a type mismatch is reported against its file.
            let next = serde_json::from_value(tree.clone())
                .map_err(|e| BindError::decode(path, e.to_string()))?;
            merged = Some(next);
            tracing::info!(path = ?path, "Loaded configuration file");
        }

        if let Some(next) = merged {
            *record = next;
        }
        Ok(())
    }

    pub(crate) fn log(&self, err: Option<&BindError>, message: std::fmt::Arguments<'_>) {
        (self.sink)(err, message);
    }
}

/// Resolve a fresh `T::default()` with a loader over the process environment and arguments.
pub fn load<T, P>(options: Options, files: &[P]) -> BindResult<T>
where
    T: Settings + Default,
    P: AsRef<Path>,
{
    let mut record = T::default();
    Loader::new(options).resolve(&mut record, files)?;
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bind::{Field, Visitor};
    use serde::Deserialize;
    use std::fs;

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    struct Db {
        host: String,
        port: u16,
        password: String,
    }

    impl Bind for Db {
        fn bind(&mut self, v: &mut dyn Visitor) -> BindResult<()> {
            v.leaf(&Field::new("host").default("localhost"), &mut self.host)?;
            v.leaf(&Field::new("port").default("3306"), &mut self.port)?;
            v.leaf(
                &Field::new("password").env("DBPassword").required(),
                &mut self.password,
            )
        }
    }

    #[test]
    fn test_files_then_env_then_args_then_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("db.yml");
        fs::write(&file, "host: db.internal\npassword: confgo\n").unwrap();

        let env = EnvTable::from_pairs([("DBPassword", "mypass"), ("HOST", "env-host")]);
        let args = ArgTable::parse(["--host=arg-host"]);
        let loader = Loader::with_sources(Options::default(), env, args);

        let mut db = Db::default();
        let stamps = loader.resolve(&mut db, &[&file]).unwrap();
        assert_eq!(stamps.len(), 1);
        assert_eq!(db.password, "mypass");
        assert_eq!(db.host, "arg-host");
        assert_eq!(db.port, 3306);
    }

    #[test]
    fn test_type_mismatch_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("db.json");
        fs::write(&file, r#"{"port": "not a number", "password": "x"}"#).unwrap();

        let loader = Loader::with_sources(Options::default(), EnvTable::default(), ArgTable::default());
        let err = loader.resolve(&mut Db::default(), &[&file]).unwrap_err();
        match err {
            BindError::Decode { path, .. } => assert_eq!(path, file),
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_sink_sees_resolution() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let loader = Loader::with_sources(
            Options::default(),
            EnvTable::from_pairs([("DBPassword", "p")]),
            ArgTable::default(),
        )
        .with_log_sink(Arc::new(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        loader.resolve(&mut Db::default(), &[] as &[&str]).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
