//! Human readable byte sizes: `512`, `1KB`, `1.5MiB`, `2gb`.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValueError;
use crate::value::{Settable, SettableVisitor};

const SUFFIXES: [(&str, f64); 6] = [
    ("KiB", 1024.0),
    ("MiB", 1024.0 * 1024.0),
    ("GiB", 1024.0 * 1024.0 * 1024.0),
    ("KB", 1e3),
    ("MB", 1e6),
    ("GB", 1e9),
];

/// 2^64, the first size a `u64` cannot hold.
const U64_BOUND: f64 = 18_446_744_073_709_551_616.0;

/// A size in bytes, settable with an optional decimal (`KB`) or binary (`KiB`) suffix.
#[derive(Debug, Clone, Default)]
pub struct Bytes {
    n: u64,
    text: String,
}

impl Bytes {
    pub fn new(n: u64) -> Self {
        Self {
            n,
            text: String::new(),
        }
    }

    pub fn get(&self) -> u64 {
        self.n
    }
}

impl PartialEq for Bytes {
    fn eq(&self, other: &Self) -> bool {
        self.n == other.n
    }
}

impl Eq for Bytes {}

fn normalize(s: &str) -> String {
    s.to_uppercase().replace('I', "i")
}

impl Settable for Bytes {
    fn set(&mut self, raw: &str) -> Result<(), ValueError> {
        let value = normalize(raw);
        let (number, multiplier) = SUFFIXES
            .iter()
            .find_map(|(suffix, m)| value.strip_suffix(suffix).map(|n| (n, *m)))
            .unwrap_or((value.as_str(), 1.0));

        let invalid = || ValueError::InvalidBytes(raw.to_string());
        let n = match number.parse::<u64>() {
            Ok(whole) => whole
                .checked_mul(multiplier as u64)
                .ok_or_else(invalid)?,
            Err(_) => {
                let f: f64 = number.parse().map_err(|_| invalid())?;
                let n = f * multiplier;
                if !n.is_finite() || n < 0.0 || n >= U64_BOUND {
                    return Err(invalid());
                }
                n as u64
            }
        };

        self.n = n;
        self.text = value;
        Ok(())
    }

    fn is_zero(&self) -> bool {
        self.n == 0
    }
}

impl fmt::Display for Bytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.text.is_empty() {
            write!(f, "{}", self.n)
        } else {
            f.write_str(&self.text)
        }
    }
}

impl Serialize for Bytes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Bytes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(SettableVisitor::new())
    }
}
