//! strata: resolve a service configuration and print it.
//!
//! ```text
//! strata [--env NAME] [--env-prefix P] [--arg-prefix P] [--watch] FILES... [-- OVERRIDES...]
//!
//!     FILES      read in order; config.<env>.yml follows config.yml
//!     OVERRIDES  field arguments such as `-- --db-port 3307 --server-host 0.0.0.0`
//! ```
//!
//! The resolved record is printed as JSON on stdout. With `--watch` the files are polled
//! and the record is printed again after every successful reload, until Ctrl+C.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use serde::{Deserialize, Serialize};

use strata::lifecycle::signals;
use strata::observability::{logging, tracing_sink};
use strata::{
    Array, ArgTable, Bind, BindResult, Bytes, Duration, EnvTable, Field, Loader, Options,
    Shutdown, Supervisor, Visitor,
};

#[derive(Parser, Debug)]
#[command(name = "strata", version, about = "Resolve a service configuration and print it as JSON")]
struct Cli {
    /// Configuration files; later files override earlier ones.
    files: Vec<PathBuf>,

    /// Environment name used to pick `<file>.<env>.<ext>` siblings.
    #[arg(long)]
    env: Option<String>,

    /// Prefix for environment variable names (`-` for none).
    #[arg(long)]
    env_prefix: Option<String>,

    /// Prefix for override argument names (`-` for none).
    #[arg(long)]
    arg_prefix: Option<String>,

    /// Keep polling the files and print the record after every reload.
    #[arg(long)]
    watch: bool,

    /// Log filter used when RUST_LOG is not set.
    #[arg(long, default_value = "strata=info")]
    log: String,

    /// Field overrides, passed after `--`.
    #[arg(last = true)]
    overrides: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ServiceConfig {
    name: String,
    db: Database,
    server: Server,
    contacts: Vec<Contact>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Database {
    name: String,
    user: String,
    password: String,
    port: u16,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Server {
    host: String,
    port: u16,
    read_timeout: Duration,
    max_body: Bytes,
    allowed_origins: Array,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Contact {
    name: String,
    email: String,
}

impl Bind for ServiceConfig {
    fn bind(&mut self, v: &mut dyn Visitor) -> BindResult<()> {
        v.leaf(&Field::new("name").default("strata"), &mut self.name)?;
        v.nested(&Field::new("db"), &mut self.db)?;
        v.nested(&Field::new("server"), &mut self.server)?;
        v.sequence(&Field::new("contacts"), &mut self.contacts)
    }
}

impl Bind for Database {
    fn bind(&mut self, v: &mut dyn Visitor) -> BindResult<()> {
        v.leaf(&Field::new("name"), &mut self.name)?;
        v.leaf(&Field::new("user").default("root"), &mut self.user)?;
        v.leaf(
            &Field::tagged("password", r#"env:"DBPassword,DB_PASSWORD" required:"true""#)?,
            &mut self.password,
        )?;
        v.leaf(&Field::new("port").default("3306"), &mut self.port)
    }
}

impl Bind for Server {
    fn bind(&mut self, v: &mut dyn Visitor) -> BindResult<()> {
        v.leaf(&Field::new("host").default("127.0.0.1"), &mut self.host)?;
        v.leaf(&Field::new("port").arg("port,p").default("8080"), &mut self.port)?;
        v.leaf(&Field::new("read_timeout").default("30s"), &mut self.read_timeout)?;
        v.leaf(&Field::new("max_body").default("1MiB"), &mut self.max_body)?;
        v.leaf(&Field::new("allowed_origins"), &mut self.allowed_origins)
    }
}

impl Bind for Contact {
    fn bind(&mut self, v: &mut dyn Visitor) -> BindResult<()> {
        v.leaf(&Field::new("name"), &mut self.name)?;
        v.leaf(&Field::new("email").required(), &mut self.email)
    }
}

fn print_json(config: &ServiceConfig) {
    match serde_json::to_string_pretty(config) {
        Ok(json) => println!("{json}"),
        Err(e) => tracing::error!(error = %e, "Failed to render configuration"),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init(&cli.log);

    let env = EnvTable::from_process();
    let args = ArgTable::parse(&cli.overrides);
    let mut options = Options::discover(&env, &args)?;
    if let Some(name) = cli.env {
        options.env = name;
    }
    if let Some(prefix) = cli.env_prefix {
        options.env_prefix = prefix;
    }
    if let Some(prefix) = cli.arg_prefix {
        options.arg_prefix = prefix;
    }
    options.auto_reload |= cli.watch;

    tracing::info!(
        files = cli.files.len(),
        env = %options.env,
        auto_reload = options.auto_reload,
        "strata v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    let loader = Arc::new(Loader::with_sources(options, env, args).with_log_sink(tracing_sink()));
    let supervisor = Supervisor::start(loader, ServiceConfig::default(), &cli.files)?
        .on_change(print_json);
    print_json(&supervisor.current());

    let shutdown = Shutdown::new();
    if let Some(task) = Arc::new(supervisor).spawn_if_enabled(&shutdown) {
        signals::trigger_on_signal(&shutdown).await?;
        task.await?;
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
