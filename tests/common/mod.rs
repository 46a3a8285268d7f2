//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};
use strata::{ArgTable, Bind, BindResult, EnvTable, Field, Loader, Options, Visitor};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestConfig {
    pub app_name: String,
    pub hosts: Vec<String>,
    pub db: Db,
    pub contact: Contact,
    pub boolean: bool,
    pub number: i64,
    pub help: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Db {
    pub name: String,
    pub user: String,
    pub password: String,
    pub port: u32,
    pub ssl: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
    pub email: String,
}

impl Bind for TestConfig {
    fn bind(&mut self, v: &mut dyn Visitor) -> BindResult<()> {
        v.leaf(&Field::new("app_name").default("confgo"), &mut self.app_name)?;
        v.leaf(&Field::new("hosts"), &mut self.hosts)?;
        v.nested(&Field::new("db"), &mut self.db)?;
        v.nested(&Field::new("contact").env("-"), &mut self.contact)?;
        v.leaf(&Field::tagged("boolean", r#"arg:"b,bool""#)?, &mut self.boolean)?;
        v.leaf(&Field::tagged("number", r#"arg:"n,num""#)?, &mut self.number)?;
        v.leaf(&Field::tagged("help", r#"arg:"h,help""#)?, &mut self.help)
    }
}

impl Bind for Db {
    fn bind(&mut self, v: &mut dyn Visitor) -> BindResult<()> {
        v.leaf(&Field::new("name"), &mut self.name)?;
        v.leaf(&Field::new("user").default("root"), &mut self.user)?;
        v.leaf(
            &Field::tagged("password", r#"required:"true" env:"DBPassword""#)?,
            &mut self.password,
        )?;
        v.leaf(&Field::new("port").default("3306"), &mut self.port)?;
        v.leaf(&Field::new("ssl").default("true"), &mut self.ssl)
    }
}

impl Bind for Contact {
    fn bind(&mut self, v: &mut dyn Visitor) -> BindResult<()> {
        v.leaf(&Field::new("name"), &mut self.name)?;
        v.leaf(&Field::new("email").required(), &mut self.email)
    }
}

/// A fully populated record; every required field is set.
pub fn default_config() -> TestConfig {
    TestConfig {
        app_name: "confgo".into(),
        hosts: vec!["http://example.org".into(), "http://hello.world".into()],
        db: Db {
            name: "confgo".into(),
            user: "confgo".into(),
            password: "confgo".into(),
            port: 3306,
            ssl: true,
        },
        contact: Contact {
            name: "Cloudfly".into(),
            email: "hello@gmail.com".into(),
        },
        boolean: false,
        number: 100,
        help: String::new(),
    }
}

pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

pub fn write_json<T: Serialize>(dir: &Path, name: &str, value: &T) -> PathBuf {
    write_file(dir, name, &serde_json::to_string(value).unwrap())
}

/// Rewrite `path` and move its modification time `secs` seconds into the future, so the
/// change is visible even on file systems with coarse timestamps.
pub fn rewrite(path: &Path, content: &str, secs: u64) {
    fs::write(path, content).unwrap();
    fs::File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(SystemTime::now() + Duration::from_secs(secs))
        .unwrap();
}

pub fn loader(options: Options, env: &[(&str, &str)], args: &[&str]) -> Loader {
    Loader::with_sources(
        options,
        EnvTable::from_pairs(env.iter().copied()),
        ArgTable::parse(args),
    )
}
