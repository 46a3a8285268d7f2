//! The environment, argument and default layers, each a [`Visitor`] over a record.

use heck::ToKebabCase;

use crate::bind::{ArgBinding, Bind, EnvBinding, Field, Sequence, Visitor};
use crate::error::{BindError, BindResult, Layer, ValueError};
use crate::source::{ArgTable, EnvTable};
use crate::value::Leaf;

/// `""` and `"-"` both mean no prefix.
pub(crate) fn prefix_segments(prefix: &str) -> Vec<String> {
    match prefix {
        "" | "-" => Vec::new(),
        prefix => vec![prefix.to_string()],
    }
}

/// Dotted field path used in logs and errors: `db.password`, `servers.0.host`.
#[derive(Debug, Default)]
pub(crate) struct FieldPath(Vec<String>);

impl FieldPath {
    pub(crate) fn push(&mut self, segment: impl Into<String>) {
        self.0.push(segment.into());
    }

    pub(crate) fn pop(&mut self) {
        self.0.pop();
    }

    pub(crate) fn join(&self, leaf: &str) -> String {
        let mut parts: Vec<&str> = self.0.iter().map(String::as_str).collect();
        parts.push(leaf);
        parts.join(".")
    }
}

fn field_error(path: &FieldPath, field: &Field, layer: Layer, source: ValueError) -> BindError {
    BindError::Field {
        field: path.join(field.name()),
        layer,
        source,
    }
}

/// Applies environment variables.
pub(crate) struct EnvLayer<'a> {
    env: &'a EnvTable,
    segments: Vec<String>,
    path: FieldPath,
    assigned: usize,
}

impl<'a> EnvLayer<'a> {
    pub(crate) fn new(env: &'a EnvTable, prefix: &str) -> Self {
        Self {
            env,
            segments: prefix_segments(prefix),
            path: FieldPath::default(),
            assigned: 0,
        }
    }

    fn candidates(&self, field: &Field) -> Vec<String> {
        match field.env_binding() {
            EnvBinding::Disabled => Vec::new(),
            EnvBinding::Names(names) => names.clone(),
            EnvBinding::Path => {
                let mut parts = self.segments.clone();
                parts.push(field.name().to_string());
                let name = parts.join("_");
                let upper = name.to_uppercase();
                if upper == name {
                    vec![name]
                } else {
                    vec![name, upper]
                }
            }
        }
    }

    /// Push the name segment a composite contributes. Returns whether one was pushed.
    fn enter(&mut self, field: &Field) -> bool {
        let segment = match field.env_binding() {
            EnvBinding::Disabled => return false,
            EnvBinding::Names(names) => names.first().cloned().unwrap_or_default(),
            EnvBinding::Path => field.name().to_string(),
        };
        self.segments.push(segment);
        true
    }

    fn element(&mut self, index: usize, element: &mut dyn Bind) -> BindResult<()> {
        self.segments.push(index.to_string());
        self.path.push(index.to_string());
        let result = element.bind(self);
        self.path.pop();
        self.segments.pop();
        result
    }

    fn elements(&mut self, seq: &mut dyn Sequence) -> BindResult<()> {
        if !seq.is_empty() {
            for index in 0..seq.len() {
                if let Some(element) = seq.element(index) {
                    self.element(index, element)?;
                }
            }
            return Ok(());
        }

        // Grow by probing: keep an element only if the environment assigned something to it.
        let mut index = 0;
        loop {
            let before = self.assigned;
            let element = seq.push_default();
            self.element(index, element)?;
            if self.assigned == before {
                seq.pop();
                return Ok(());
            }
            index += 1;
        }
    }
}

impl Visitor for EnvLayer<'_> {
    fn leaf(&mut self, field: &Field, value: &mut dyn Leaf) -> BindResult<()> {
        for name in self.candidates(field) {
            let Some(raw) = self.env.lookup(&name) else {
                continue;
            };
            if raw.is_empty() {
                continue;
            }
            value
                .decode_env(&raw)
                .map_err(|e| field_error(&self.path, field, Layer::Env, e))?;
            tracing::debug!(field = %self.path.join(field.name()), variable = %name, "Applied environment value");
            // Only index-bearing names may keep a growing sequence alive.
            if *field.env_binding() == EnvBinding::Path {
                self.assigned += 1;
            }
            break;
        }
        Ok(())
    }

    fn nested(&mut self, field: &Field, value: &mut dyn Bind) -> BindResult<()> {
        let entered = self.enter(field);
        self.path.push(field.name());
        let result = value.bind(self);
        self.path.pop();
        if entered {
            self.segments.pop();
        }
        result
    }

    fn sequence(&mut self, field: &Field, value: &mut dyn Sequence) -> BindResult<()> {
        let entered = self.enter(field);
        self.path.push(field.name());
        let result = self.elements(value);
        self.path.pop();
        if entered {
            self.segments.pop();
        }
        result
    }
}

/// Applies command-line arguments that are present in the table.
pub(crate) struct ArgLayer<'a> {
    args: &'a ArgTable,
    prefix: Vec<String>,
    segments: Vec<String>,
    path: FieldPath,
}

impl<'a> ArgLayer<'a> {
    pub(crate) fn new(args: &'a ArgTable, prefix: &str) -> Self {
        Self {
            args,
            prefix: prefix_segments(prefix),
            segments: Vec::new(),
            path: FieldPath::default(),
        }
    }

    fn candidates(&self, field: &Field) -> Vec<String> {
        match field.arg_binding() {
            ArgBinding::Disabled => Vec::new(),
            ArgBinding::Names(names) => names
                .iter()
                .map(|name| {
                    let mut parts = self.prefix.clone();
                    parts.push(name.clone());
                    parts.join("-")
                })
                .collect(),
            ArgBinding::Path => {
                let mut parts = self.prefix.clone();
                parts.extend(self.segments.iter().cloned());
                parts.push(field.name().to_kebab_case());
                vec![parts.join("-")]
            }
        }
    }

    fn descend(
        &mut self,
        name: &str,
        segment: String,
        walk: impl FnOnce(&mut Self) -> BindResult<()>,
    ) -> BindResult<()> {
        self.path.push(name);
        self.segments.push(segment);
        let result = walk(self);
        self.segments.pop();
        self.path.pop();
        result
    }
}

impl Visitor for ArgLayer<'_> {
    fn leaf(&mut self, field: &Field, value: &mut dyn Leaf) -> BindResult<()> {
        for name in self.candidates(field) {
            let Some(raw) = self.args.get(&name) else {
                continue;
            };
            value
                .decode(raw)
                .map_err(|e| field_error(&self.path, field, Layer::Arg, e))?;
            tracing::debug!(field = %self.path.join(field.name()), argument = %name, "Applied argument value");
        }
        Ok(())
    }

    fn nested(&mut self, field: &Field, value: &mut dyn Bind) -> BindResult<()> {
        if *field.arg_binding() == ArgBinding::Disabled {
            return Ok(());
        }
        self.descend(field.name(), field.name().to_kebab_case(), |this| {
            value.bind(this)
        })
    }

    fn sequence(&mut self, field: &Field, value: &mut dyn Sequence) -> BindResult<()> {
        if *field.arg_binding() == ArgBinding::Disabled {
            return Ok(());
        }
        self.descend(field.name(), field.name().to_kebab_case(), |this| {
            for index in 0..value.len() {
                if let Some(element) = value.element(index) {
                    let index = index.to_string();
                    this.descend(&index, index.clone(), |this| element.bind(this))?;
                }
            }
            Ok(())
        })
    }
}

/// Fills zero leaves from their default literal.
#[derive(Default)]
pub(crate) struct DefaultLayer {
    path: FieldPath,
}

impl Visitor for DefaultLayer {
    fn leaf(&mut self, field: &Field, value: &mut dyn Leaf) -> BindResult<()> {
        let Some(literal) = field.default_literal() else {
            return Ok(());
        };
        if value.is_zero() {
            value
                .decode(literal)
                .map_err(|e| field_error(&self.path, field, Layer::Default, e))?;
        }
        Ok(())
    }

    fn nested(&mut self, field: &Field, value: &mut dyn Bind) -> BindResult<()> {
        self.path.push(field.name());
        let result = value.bind(self);
        self.path.pop();
        result
    }

    fn sequence(&mut self, field: &Field, value: &mut dyn Sequence) -> BindResult<()> {
        self.path.push(field.name());
        let mut result = Ok(());
        for index in 0..value.len() {
            if let Some(element) = value.element(index) {
                self.path.push(index.to_string());
                result = element.bind(self);
                self.path.pop();
            }
            if result.is_err() {
                break;
            }
        }
        self.path.pop();
        result
    }
}
