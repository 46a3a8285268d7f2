//! Leaf values and the scalar grammars the binding engine understands.
//!
//! # Data Flow
//! ```text
//! raw string (file scalar, env var, argument, default literal)
//!     → Leaf::decode / Leaf::decode_env
//!         → Settable::set     (Array*, Duration, Bytes: custom grammars)
//!         → verbatim          (String, PathBuf)
//!         → serde_yaml        (numbers, bool, char, Vec<T>)
//!     → field holds the new value
//! ```
//!
//! # Design Decisions
//! - `Settable` is the extension point: implement it and the type becomes a leaf
//! - Setters parse fully before assigning, a failed set leaves the value untouched
//! - `is_zero` drives both default back-filling and the required check

pub mod array;
pub mod bytes;
pub mod duration;

use std::fmt;
use std::marker::PhantomData;
use std::path::PathBuf;

use serde::de::{self, DeserializeOwned, Deserializer, SeqAccess, Visitor};
use serde::Deserialize;

use crate::error::ValueError;

pub use array::{Array, ArrayBool, ArrayDuration, ArrayInt};
pub use bytes::Bytes;
pub use duration::Duration;

/// A value that parses itself from one string and renders itself back through `Display`.
pub trait Settable: fmt::Display {
    /// Replace the value with the one parsed from `raw`.
    fn set(&mut self, raw: &str) -> Result<(), ValueError>;

    /// Whether the value is still its type's zero value.
    fn is_zero(&self) -> bool;
}

/// A leaf field as seen by the binding engine.
pub trait Leaf {
    /// Decode `raw` through the generic path used by files, arguments and defaults.
    fn decode(&mut self, raw: &str) -> Result<(), ValueError>;

    /// Decode a value read from the environment.
    fn decode_env(&mut self, raw: &str) -> Result<(), ValueError> {
        self.decode(raw)
    }

    fn is_zero(&self) -> bool;
}

impl<T: Settable> Leaf for T {
    fn decode(&mut self, raw: &str) -> Result<(), ValueError> {
        self.set(raw)
    }

    fn is_zero(&self) -> bool {
        Settable::is_zero(self)
    }
}

/// Decode `raw` as a YAML document into `T`.
pub fn decode_yaml<T: DeserializeOwned>(raw: &str) -> Result<T, ValueError> {
    serde_yaml::from_str(raw).map_err(|e| ValueError::Decode {
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

/// Tolerant boolean used for environment values: `""`, `0` and `false` are false.
pub fn parse_env_bool(raw: &str) -> bool {
    !(raw.is_empty() || raw == "0" || raw.eq_ignore_ascii_case("false"))
}

macro_rules! yaml_leaf {
    ($($ty:ty),* $(,)?) => {$(
        impl Leaf for $ty {
            fn decode(&mut self, raw: &str) -> Result<(), ValueError> {
                *self = decode_yaml(raw)?;
                Ok(())
            }

            fn is_zero(&self) -> bool {
                *self == <$ty>::default()
            }
        }
    )*};
}

yaml_leaf!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64, char);

impl Leaf for bool {
    fn decode(&mut self, raw: &str) -> Result<(), ValueError> {
        *self = decode_yaml(raw)?;
        Ok(())
    }

    fn decode_env(&mut self, raw: &str) -> Result<(), ValueError> {
        *self = parse_env_bool(raw);
        Ok(())
    }

    fn is_zero(&self) -> bool {
        !*self
    }
}

impl Leaf for String {
    fn decode(&mut self, raw: &str) -> Result<(), ValueError> {
        raw.clone_into(self);
        Ok(())
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl Leaf for PathBuf {
    fn decode(&mut self, raw: &str) -> Result<(), ValueError> {
        *self = PathBuf::from(raw);
        Ok(())
    }

    fn is_zero(&self) -> bool {
        self.as_os_str().is_empty()
    }
}

impl<T: DeserializeOwned> Leaf for Vec<T> {
    fn decode(&mut self, raw: &str) -> Result<(), ValueError> {
        *self = decode_yaml(raw)?;
        Ok(())
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl<T: Leaf + Default> Leaf for Option<T> {
    fn decode(&mut self, raw: &str) -> Result<(), ValueError> {
        let mut inner = T::default();
        inner.decode(raw)?;
        *self = Some(inner);
        Ok(())
    }

    fn decode_env(&mut self, raw: &str) -> Result<(), ValueError> {
        let mut inner = T::default();
        inner.decode_env(raw)?;
        *self = Some(inner);
        Ok(())
    }

    fn is_zero(&self) -> bool {
        self.is_none()
    }
}

/// Any scalar from a decoded document, captured as its textual form.
pub(crate) struct ScalarText(pub(crate) String);

impl<'de> Deserialize<'de> for ScalarText {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TextVisitor;

        impl Visitor<'_> for TextVisitor {
            type Value = ScalarText;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a string, number or boolean")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<ScalarText, E> {
                Ok(ScalarText(v.to_string()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<ScalarText, E> {
                Ok(ScalarText(v))
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<ScalarText, E> {
                Ok(ScalarText(v.to_string()))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<ScalarText, E> {
                Ok(ScalarText(v.to_string()))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<ScalarText, E> {
                Ok(ScalarText(v.to_string()))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<ScalarText, E> {
                Ok(ScalarText(v.to_string()))
            }
        }

        deserializer.deserialize_any(TextVisitor)
    }
}

/// Settable types that can also be filled from a list of already-split items.
pub(crate) trait FromItems: Settable + Default {
    fn set_items(&mut self, items: Vec<String>) -> Result<(), ValueError>;
}

/// Deserializes a `Settable` from a scalar, or a `FromItems` type from a sequence.
pub(crate) struct SettableVisitor<T>(PhantomData<T>);

impl<T> SettableVisitor<T> {
    pub(crate) fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T: Settable + Default> SettableVisitor<T> {
    fn parse<E: de::Error>(raw: &str) -> Result<T, E> {
        let mut value = T::default();
        value.set(raw).map_err(E::custom)?;
        Ok(value)
    }
}

impl<'de, T: Settable + Default> Visitor<'de> for SettableVisitor<T> {
    type Value = T;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string or number")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<T, E> {
        Self::parse(v)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<T, E> {
        Self::parse(&v.to_string())
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<T, E> {
        Self::parse(&v.to_string())
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<T, E> {
        Self::parse(&v.to_string())
    }
}

/// Sequence-aware visitor for the array types.
pub(crate) struct ItemsVisitor<T>(PhantomData<T>);

impl<T> ItemsVisitor<T> {
    pub(crate) fn new() -> Self {
        Self(PhantomData)
    }
}

impl<'de, T: FromItems> Visitor<'de> for ItemsVisitor<T> {
    type Value = T;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a comma separated string or a sequence")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<T, E> {
        SettableVisitor::<T>::new().visit_str(v)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<T, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(ScalarText(item)) = seq.next_element()? {
            items.push(item);
        }
        let mut value = T::default();
        value.set_items(items).map_err(de::Error::custom)?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_bool_is_tolerant() {
        assert!(!parse_env_bool(""));
        assert!(!parse_env_bool("0"));
        assert!(!parse_env_bool("FALSE"));
        assert!(parse_env_bool("1"));
        assert!(parse_env_bool("yes"));
        assert!(parse_env_bool("true"));
    }

    #[test]
    fn test_generic_leaves_decode_through_yaml() {
        let mut port = 0u16;
        port.decode("3306").unwrap();
        assert_eq!(port, 3306);
        assert!(port.decode("not-a-port").is_err());
        assert_eq!(port, 3306, "failed decode must not touch the value");

        let mut hosts: Vec<String> = Vec::new();
        hosts.decode("- http://example.org\n- http://hello.world").unwrap();
        assert_eq!(hosts, vec!["http://example.org", "http://hello.world"]);
    }

    #[test]
    fn test_string_is_verbatim() {
        let mut name = String::new();
        assert!(Leaf::is_zero(&name));
        name.decode("123").unwrap();
        assert_eq!(name, "123");
    }

    #[test]
    fn test_option_wraps_inner_decode() {
        let mut level: Option<u8> = None;
        assert!(level.is_zero());
        level.decode("3").unwrap();
        assert_eq!(level, Some(3));

        let mut flag: Option<bool> = None;
        flag.decode_env("0").unwrap();
        assert_eq!(flag, Some(false));
    }
}
