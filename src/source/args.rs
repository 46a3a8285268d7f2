//! Command-line argument table.
//!
//! Accepted shapes are `--name=value`, `--name value`, `-name value` and a bare `--flag`,
//! which reads as `"true"` when no value follows. Tokens that are not names and do not
//! complete an open name are positionals, stored under `$1`, `$2`, ... in order.

use std::collections::HashMap;

/// Parsed command-line arguments, keyed by name without leading dashes.
#[derive(Debug, Clone, Default)]
pub struct ArgTable {
    values: HashMap<String, String>,
    positionals: Vec<String>,
}

impl ArgTable {
    /// Parse the current process arguments, skipping the program name.
    pub fn from_process() -> Self {
        Self::parse(
            std::env::args_os()
                .skip(1)
                .map(|a| a.to_string_lossy().into_owned()),
        )
    }

    /// Parse an argument list. The first element is treated as an argument, not a program name.
    pub fn parse<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut table = Self::default();
        let mut open: Option<String> = None;

        for arg in args {
            let arg = arg.as_ref();
            if arg.starts_with('-') {
                if let Some(name) = open.take() {
                    table.values.insert(name, "true".to_string());
                }
                let body = arg.trim_start_matches('-');
                match body.split_once('=') {
                    Some((name, value)) => {
                        table.values.insert(name.to_string(), value.to_string());
                    }
                    None if body.is_empty() => {}
                    None => open = Some(body.to_string()),
                }
            } else if let Some(name) = open.take() {
                table.values.insert(name, arg.to_string());
            } else {
                table.positionals.push(arg.to_string());
                let key = format!("${}", table.positionals.len());
                table.values.insert(key, arg.to_string());
            }
        }

        if let Some(name) = open {
            table.values.insert(name, "true".to_string());
        }
        table
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// The `n`th positional argument, counting from 1.
    pub fn positional(&self, n: usize) -> Option<&str> {
        n.checked_sub(1)
            .and_then(|i| self.positionals.get(i))
            .map(String::as_str)
    }

    pub fn positionals(&self) -> &[String] {
        &self.positionals
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
