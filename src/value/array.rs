//! Comma separated arrays with optional double-quoted items.
//!
//! `a,"b, c",d` holds three items; quoted items may contain commas, escaped quotes
//! and the usual backslash escapes (`\n`, `\t`, `\xHH`, ...).

use std::fmt;
use std::ops::Deref;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValueError;
use crate::value::duration::Duration;
use crate::value::{FromItems, ItemsVisitor, Settable};

/// Split `s` into its items. An empty string has no items.
pub fn parse_array_values(s: &str) -> Vec<String> {
    let mut values = Vec::new();
    if s.is_empty() {
        return values;
    }
    let mut rest = s;
    loop {
        let (value, tail) = next_array_value(rest);
        values.push(value);
        if tail.is_empty() {
            return values;
        }
        rest = tail.strip_prefix(',').unwrap_or(tail);
    }
}

/// Join items with commas, quoting the ones that would not survive a re-parse.
pub fn render_array_values<S: AsRef<str>>(items: &[S]) -> String {
    items
        .iter()
        .map(|item| {
            let item = item.as_ref();
            if item.contains(['"', ',', ' ', '\n']) {
                quote(item)
            } else {
                item.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

fn next_array_value(s: &str) -> (String, &str) {
    if !s.starts_with('"') {
        return match s.find(',') {
            Some(n) => (s[..n].to_string(), &s[n..]),
            None => (s.to_string(), ""),
        };
    }

    let bytes = s.as_bytes();
    let mut end = 1;
    loop {
        let Some(n) = s[end..].find('"') else {
            // No closing quote: the rest of the input is one item.
            return (s.to_string(), "");
        };
        let quote_at = end + n;
        let backslashes = bytes[..quote_at]
            .iter()
            .rev()
            .take_while(|&&b| b == b'\\')
            .count();
        end = quote_at + 1;
        if backslashes % 2 == 0 {
            break;
        }
    }

    let quoted = &s[..end];
    let value = unquote(quoted).unwrap_or_else(|| quoted.to_string());
    (value, &s[end..])
}

/// Undo `quote`. Returns `None` for anything that is not a well-formed quoted string.
pub fn unquote(quoted: &str) -> Option<String> {
    let inner = quoted.strip_prefix('"')?.strip_suffix('"')?;
    let mut out: Vec<u8> = Vec::with_capacity(inner.len());
    let mut chars = inner.chars();

    while let Some(c) = chars.next() {
        match c {
            '"' | '\n' => return None,
            '\\' => {
                let escaped = chars.next()?;
                match escaped {
                    'a' => out.push(0x07),
                    'b' => out.push(0x08),
                    'f' => out.push(0x0c),
                    'n' => out.push(b'\n'),
                    'r' => out.push(b'\r'),
                    't' => out.push(b'\t'),
                    'v' => out.push(0x0b),
                    '\\' => out.push(b'\\'),
                    '"' => out.push(b'"'),
                    '\'' => out.push(b'\''),
                    'x' => out.push(take_radix(&mut chars, 2, 16)? as u8),
                    'u' | 'U' => {
                        let width = if escaped == 'u' { 4 } else { 8 };
                        let ch = char::from_u32(take_radix(&mut chars, width, 16)?)?;
                        push_char(&mut out, ch);
                    }
                    '0'..='7' => {
                        let rest = take_radix(&mut chars, 2, 8)?;
                        let value = escaped.to_digit(8)? * 64 + rest;
                        out.push(u8::try_from(value).ok()?);
                    }
                    _ => return None,
                }
            }
            c => push_char(&mut out, c),
        }
    }

    String::from_utf8(out).ok()
}

fn take_radix(chars: &mut std::str::Chars<'_>, width: usize, radix: u32) -> Option<u32> {
    let mut value = 0u32;
    for _ in 0..width {
        value = value * radix + chars.next()?.to_digit(radix)?;
    }
    Some(value)
}

fn push_char(out: &mut Vec<u8>, c: char) {
    let mut buf = [0u8; 4];
    out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
}

/// Quote `s` with backslash escapes so that `unquote` restores it.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{07}' => out.push_str("\\a"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0b}' => out.push_str("\\v"),
            '\u{0c}' => out.push_str("\\f"),
            c if c.is_control() && (c as u32) < 0x80 => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

macro_rules! array_type {
    ($(#[$meta:meta])* $name:ident, $item:ty) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq)]
        pub struct $name(pub Vec<$item>);

        impl $name {
            pub fn into_inner(self) -> Vec<$item> {
                self.0
            }
        }

        impl Deref for $name {
            type Target = [$item];

            fn deref(&self) -> &[$item] {
                &self.0
            }
        }

        impl From<Vec<$item>> for $name {
            fn from(items: Vec<$item>) -> Self {
                Self(items)
            }
        }

        impl Settable for $name {
            fn set(&mut self, raw: &str) -> Result<(), ValueError> {
                self.set_items(parse_array_values(raw))
            }

            fn is_zero(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                self.0.serialize(serializer)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                deserializer.deserialize_any(ItemsVisitor::new())
            }
        }
    };
}

array_type!(
    /// Array of strings.
    Array,
    String
);
array_type!(
    /// Array of booleans, items are `true` or `false` in any letter case.
    ArrayBool,
    bool
);
array_type!(
    /// Array of base-10 signed integers.
    ArrayInt,
    i64
);
array_type!(
    /// Array of durations, each item in the duration grammar.
    ArrayDuration,
    Duration
);

impl FromItems for Array {
    fn set_items(&mut self, items: Vec<String>) -> Result<(), ValueError> {
        self.0 = items;
        Ok(())
    }
}

impl FromItems for ArrayBool {
    fn set_items(&mut self, items: Vec<String>) -> Result<(), ValueError> {
        let parsed = items
            .iter()
            .map(|item| {
                if item.eq_ignore_ascii_case("true") {
                    Ok(true)
                } else if item.eq_ignore_ascii_case("false") {
                    Ok(false)
                } else {
                    Err(ValueError::InvalidBool(item.clone()))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.0 = parsed;
        Ok(())
    }
}

impl FromItems for ArrayInt {
    fn set_items(&mut self, items: Vec<String>) -> Result<(), ValueError> {
        let parsed = items
            .iter()
            .map(|item| {
                item.parse::<i64>().map_err(|e| ValueError::InvalidInt {
                    value: item.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.0 = parsed;
        Ok(())
    }
}

impl FromItems for ArrayDuration {
    fn set_items(&mut self, items: Vec<String>) -> Result<(), ValueError> {
        let parsed = items
            .iter()
            .map(|item| {
                let mut d = Duration::default();
                d.set(item)?;
                Ok(d)
            })
            .collect::<Result<Vec<_>, ValueError>>()?;
        self.0 = parsed;
        Ok(())
    }
}

impl fmt::Display for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render_array_values(&self.0))
    }
}

impl fmt::Display for ArrayBool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let items: Vec<String> = self.0.iter().map(bool::to_string).collect();
        f.write_str(&items.join(","))
    }
}

impl fmt::Display for ArrayInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let items: Vec<String> = self.0.iter().map(i64::to_string).collect();
        f.write_str(&items.join(","))
    }
}

impl fmt::Display for ArrayDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let items: Vec<String> = self.0.iter().map(Duration::to_string).collect();
        f.write_str(&items.join(","))
    }
}
