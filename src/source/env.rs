//! Environment variable snapshot with `%{NAME}` placeholder expansion.

use std::collections::HashMap;

/// Expansion stops at this depth; anything still unexpanded is kept verbatim.
const MAX_EXPANSION_DEPTH: usize = 16;

/// An immutable snapshot of environment variables.
///
/// Values are expanded on lookup: every `%{NAME}` is replaced by the (expanded) value of
/// `NAME`. Placeholders naming unknown variables are left untouched.
#[derive(Debug, Clone, Default)]
pub struct EnvTable {
    vars: HashMap<String, String>,
}

impl EnvTable {
    /// Snapshot the current process environment.
    pub fn from_process() -> Self {
        let vars: HashMap<String, String> = std::env::vars_os()
            .map(|(k, v)| {
                (
                    k.to_string_lossy().into_owned(),
                    v.to_string_lossy().into_owned(),
                )
            })
            .collect();
        tracing::debug!(variables = vars.len(), "Environment snapshot taken");
        Self { vars }
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// The unexpanded value of `name`.
    pub fn raw(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// The expanded value of `name`.
    pub fn lookup(&self, name: &str) -> Option<String> {
        self.vars
            .get(name)
            .map(|value| self.expand_at(value, 0))
    }

    /// Expand every `%{NAME}` placeholder in `value`.
    pub fn expand(&self, value: &str) -> String {
        self.expand_at(value, 0)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    fn expand_at(&self, value: &str, depth: usize) -> String {
        if depth >= MAX_EXPANSION_DEPTH || !value.contains("%{") {
            return value.to_string();
        }

        let mut out = String::with_capacity(value.len());
        let mut rest = value;
        while let Some(start) = rest.find("%{") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let Some(end) = after.find('}') else {
                break;
            };
            let name = &after[..end];
            match self.vars.get(name) {
                Some(inner) => out.push_str(&self.expand_at(inner, depth + 1)),
                None => out.push_str(&rest[start..start + end + 3]),
            }
            rest = &after[end + 1..];
        }
        out.push_str(rest);
        out
    }
}
