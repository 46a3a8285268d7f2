//! Field descriptors: the name of a field plus its binding options.
//!
//! Options can be given with builder methods or as a tag string using the
//! vocabulary `env:"A,B"`, `arg:"a,b"`, `default:"literal"` and `required:"true"`.

use crate::error::{BindError, BindResult};
use crate::value::array::unquote;

/// How a field participates in the environment layer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EnvBinding {
    /// Names are derived from the prefix and the field path.
    #[default]
    Path,
    /// Explicit variable names, tried in order.
    Names(Vec<String>),
    /// `env:"-"`: leaves are skipped, composites add no path segment.
    Disabled,
}

/// How a field participates in the argument layer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ArgBinding {
    /// The name is derived from the prefix and the kebab-case field path.
    #[default]
    Path,
    /// Explicit aliases; later ones take precedence.
    Names(Vec<String>),
    /// `arg:"-"`: the field and anything below it ignore arguments.
    Disabled,
}

/// Binding options for one field of a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    name: String,
    env: EnvBinding,
    args: ArgBinding,
    default: Option<String>,
    required: bool,
}

impl Field {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            env: EnvBinding::Path,
            args: ArgBinding::Path,
            default: None,
            required: false,
        }
    }

    /// Parse a tag string such as `env:"DB_PASSWORD" default:"secret" required:"true"`.
    ///
    /// Unknown keys are ignored so tags can be shared with other tooling.
    pub fn tagged(name: impl Into<String>, tags: &str) -> BindResult<Self> {
        let mut field = Self::new(name);
        for (key, value) in parse_tags(tags).map_err(|m| BindError::tag(&field.name, m))? {
            field = match key {
                "env" => field.env(&value),
                "arg" => field.arg(&value),
                "default" => field.default(value),
                "required" => match value.as_str() {
                    "true" => field.required(),
                    "false" | "" => field,
                    other => {
                        return Err(BindError::tag(
                            &field.name,
                            format!("required must be \"true\" or \"false\", got {other:?}"),
                        ))
                    }
                },
                _ => field,
            };
        }
        Ok(field)
    }

    /// Comma separated environment variable names, or `-` to opt out.
    pub fn env(mut self, names: &str) -> Self {
        self.env = match names {
            "" => EnvBinding::Path,
            "-" => EnvBinding::Disabled,
            names => EnvBinding::Names(names.split(',').map(str::to_string).collect()),
        };
        self
    }

    /// Comma separated argument names, or `-` to opt out. Later names take precedence
    /// when several are given.
    pub fn arg(mut self, names: &str) -> Self {
        let names: Vec<String> = names
            .split(',')
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .collect();
        self.args = match names.as_slice() {
            [] => ArgBinding::Path,
            [dash] if dash == "-" => ArgBinding::Disabled,
            _ => ArgBinding::Names(names),
        };
        self
    }

    /// Literal applied when the field is still zero after every other layer.
    pub fn default(mut self, literal: impl Into<String>) -> Self {
        self.default = Some(literal.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn env_binding(&self) -> &EnvBinding {
        &self.env
    }

    pub fn arg_binding(&self) -> &ArgBinding {
        &self.args
    }

    /// Explicit aliases; empty for derived or disabled bindings.
    pub fn arg_names(&self) -> &[String] {
        match &self.args {
            ArgBinding::Names(names) => names,
            ArgBinding::Path | ArgBinding::Disabled => &[],
        }
    }

    pub fn default_literal(&self) -> Option<&str> {
        self.default.as_deref()
    }

    pub fn is_required(&self) -> bool {
        self.required
    }
}

/// Split `key:"value" key:"value"` pairs.
fn parse_tags(tags: &str) -> Result<Vec<(&str, String)>, String> {
    let mut pairs = Vec::new();
    let mut rest = tags.trim_start();
    while !rest.is_empty() {
        let colon = rest
            .find(':')
            .ok_or_else(|| format!("missing ':' after {rest:?}"))?;
        let key = &rest[..colon];
        if key.is_empty() || key.contains(|c: char| c.is_whitespace() || c == '"') {
            return Err(format!("invalid key {key:?}"));
        }

        let quoted = &rest[colon + 1..];
        if !quoted.starts_with('"') {
            return Err(format!("value of {key:?} must be quoted"));
        }
        let end = closing_quote(quoted).ok_or_else(|| format!("unterminated value for {key:?}"))?;
        let value = unquote(&quoted[..=end])
            .ok_or_else(|| format!("invalid escape in value for {key:?}"))?;
        pairs.push((key, value));
        rest = quoted[end + 1..].trim_start();
    }
    Ok(pairs)
}

/// Byte index of the quote closing the string that starts at `s[0]`.
fn closing_quote(s: &str) -> Option<usize> {
    let mut escaped = false;
    for (i, c) in s.char_indices().skip(1) {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '"' => return Some(i),
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_vocabulary() {
        let field = Field::tagged(
            "password",
            r#"env:"DBPassword,DB_PASS" arg:"pass,p" default:"secret" required:"true""#,
        )
        .unwrap();
        assert_eq!(field.name(), "password");
        assert_eq!(
            field.env_binding(),
            &EnvBinding::Names(vec!["DBPassword".into(), "DB_PASS".into()])
        );
        assert_eq!(field.arg_names(), ["pass", "p"]);
        assert_eq!(field.default_literal(), Some("secret"));
        assert!(field.is_required());
    }

    #[test]
    fn test_tags_match_builder() {
        let tagged = Field::tagged("port", r#"json:"port" env:"-" default:"3306""#).unwrap();
        let built = Field::new("port").env("-").default("3306");
        assert_eq!(tagged, built);
    }

    #[test]
    fn test_dash_disables_arguments() {
        let field = Field::tagged("token", r#"arg:"-""#).unwrap();
        assert_eq!(field.arg_binding(), &ArgBinding::Disabled);
        assert!(field.arg_names().is_empty());
        assert_eq!(Field::new("token").arg(""), Field::new("token"));
    }

    #[test]
    fn test_escaped_tag_values() {
        let field = Field::tagged("sep", r#"default:"a\"b\\c""#).unwrap();
        assert_eq!(field.default_literal(), Some(r#"a"b\c"#));
    }

    #[test]
    fn test_malformed_tags() {
        for tags in [r#"env"X""#, r#"env:X"#, r#"env:"X"#, r#"required:"yes""#, r#"env:"\q""#] {
            let err = Field::tagged("f", tags).unwrap_err();
            assert!(matches!(err, BindError::Tag { .. }), "{tags:?} gave {err}");
        }
    }
}
