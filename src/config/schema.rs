//! The loader's own settings.
//!
//! `Options` is itself a bindable record, so it can be discovered from `STRATA_*`
//! environment variables and `--strata-*` arguments before any application record is loaded.

use serde::{Deserialize, Serialize};

use crate::bind::{Bind, Field, Visitor};
use crate::config::loader::Loader;
use crate::error::BindResult;
use crate::source::{ArgTable, EnvTable};
use crate::value::Duration;

/// Poll period used when `auto_reload_interval` is zero.
pub const DEFAULT_RELOAD_INTERVAL_MSECS: i64 = 3_000;

/// Loader settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Options {
    /// Environment name; selects `<file>.<env>.<ext>` siblings.
    pub env: String,

    /// Prefix for derived environment variable names. `""` or `"-"` disables it.
    pub env_prefix: String,

    /// Prefix for derived argument names. `""` or `"-"` disables it.
    pub arg_prefix: String,

    /// Whether the binary should start a reload supervisor.
    pub auto_reload: bool,

    pub auto_reload_interval: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            env: String::new(),
            env_prefix: String::new(),
            arg_prefix: String::new(),
            auto_reload: false,
            auto_reload_interval: Duration::from_msecs(DEFAULT_RELOAD_INTERVAL_MSECS),
        }
    }
}

impl Options {
    /// Resolve options from `STRATA_*` variables and `--strata-*` arguments.
    pub fn discover(env: &EnvTable, args: &ArgTable) -> BindResult<Self> {
        let loader = Loader::with_sources(Options::default(), env.clone(), args.clone());
        let mut options = Options::default();
        loader.resolve(&mut options, &[] as &[&str])?;
        tracing::debug!(
            env = %options.env,
            env_prefix = %options.env_prefix,
            arg_prefix = %options.arg_prefix,
            auto_reload = options.auto_reload,
            "Loader options discovered"
        );
        Ok(options)
    }

    /// The poll period, falling back to the default when the interval is zero.
    pub fn reload_interval(&self) -> std::time::Duration {
        if self.auto_reload_interval.msecs() > 0 {
            self.auto_reload_interval.as_std()
        } else {
            Duration::from_msecs(DEFAULT_RELOAD_INTERVAL_MSECS).as_std()
        }
    }
}

impl Bind for Options {
    fn bind(&mut self, v: &mut dyn Visitor) -> BindResult<()> {
        v.leaf(
            &Field::new("env").env("STRATA_ENV").arg("strata-env"),
            &mut self.env,
        )?;
        v.leaf(
            &Field::new("env_prefix")
                .env("STRATA_ENV_PREFIX")
                .arg("strata-env-prefix"),
            &mut self.env_prefix,
        )?;
        v.leaf(
            &Field::new("arg_prefix")
                .env("STRATA_ARG_PREFIX")
                .arg("strata-arg-prefix"),
            &mut self.arg_prefix,
        )?;
        v.leaf(
            &Field::new("auto_reload")
                .env("STRATA_AUTO_RELOAD")
                .arg("strata-auto-reload"),
            &mut self.auto_reload,
        )?;
        v.leaf(
            &Field::new("auto_reload_interval")
                .env("STRATA_AUTO_RELOAD_INTERVAL")
                .arg("strata-auto-reload-interval")
                .default("3s"),
            &mut self.auto_reload_interval,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = Options::discover(&EnvTable::default(), &ArgTable::default()).unwrap();
        assert_eq!(options, Options::default());
        assert_eq!(options.reload_interval(), std::time::Duration::from_secs(3));
    }

    #[test]
    fn test_discover_from_env_and_args() {
        let env = EnvTable::from_pairs([
            ("STRATA_ENV", "test"),
            ("STRATA_ENV_PREFIX", "APP"),
            ("STRATA_AUTO_RELOAD", "1"),
            ("STRATA_AUTO_RELOAD_INTERVAL", "500ms"),
        ]);
        let args = ArgTable::parse(["--strata-env=prod", "--strata-arg-prefix", "app"]);
        let options = Options::discover(&env, &args).unwrap();
        assert_eq!(options.env, "prod");
        assert_eq!(options.env_prefix, "APP");
        assert_eq!(options.arg_prefix, "app");
        assert!(options.auto_reload);
        assert_eq!(options.reload_interval(), std::time::Duration::from_millis(500));
    }

    #[test]
    fn test_zero_interval_falls_back() {
        let env = EnvTable::from_pairs([("STRATA_AUTO_RELOAD_INTERVAL", "0")]);
        let options = Options::discover(&env, &ArgTable::default()).unwrap();
        assert_eq!(options.auto_reload_interval.to_string(), "3s");

        let options = Options {
            auto_reload_interval: Duration::from_msecs(0),
            ..Options::default()
        };
        assert_eq!(options.reload_interval(), std::time::Duration::from_secs(3));
    }
}
