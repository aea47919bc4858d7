//! Cache Record Module
//!
//! Defines the serialized form of a single cached value with its creation time
//! and optional TTL.
//!
//! Wire format: `{"createdAt": <ms>, "ttl": <ms> | "", "data": <payload>}`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::Result;

// == Ttl ==
/// Expiry rule carried by a record.
///
/// Records written by other clients may carry loosely typed TTLs. They are read
/// by truthiness first and numeric value second: `""`, `null`, `0` and
/// non-numeric strings never expire, `"0"` expires once any time has passed,
/// and a negative TTL is expired from the start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Ttl {
    /// No expiration
    #[default]
    Never,
    /// Expires once the elapsed time exceeds this many milliseconds
    After(u64),
    /// Expired on first read
    Elapsed,
}

impl Ttl {
    /// Maps a millisecond TTL; a missing or zero TTL never expires.
    pub fn from_ms(ttl_ms: Option<u64>) -> Self {
        match ttl_ms {
            Some(ms) if ms > 0 => Ttl::After(ms),
            _ => Ttl::Never,
        }
    }

    fn from_number(n: f64) -> Self {
        if n.is_nan() || n == 0.0 || n == f64::INFINITY {
            Ttl::Never
        } else if n < 0.0 {
            Ttl::Elapsed
        } else {
            // elapsed is integral, so `elapsed > n` equals `elapsed > floor(n)`
            Ttl::After(n.floor() as u64)
        }
    }
}

// == Cache Record ==
/// A cached payload with expiry metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheRecord<T> {
    /// Creation timestamp (Unix milliseconds)
    #[serde(rename = "createdAt")]
    pub created_at: u64,
    /// Expiry rule
    #[serde(default, with = "ttl_field")]
    pub ttl: Ttl,
    /// The stored payload
    pub data: T,
}

impl<T> CacheRecord<T> {
    // == Constructor ==
    /// Creates a record stamped with `now_ms`. A TTL of zero means no expiration.
    pub fn new(data: T, ttl: Option<u64>, now_ms: u64) -> Self {
        Self {
            created_at: now_ms,
            ttl: Ttl::from_ms(ttl),
            data,
        }
    }

    // == Is Expired ==
    /// Checks if the record has expired at `now_ms`.
    ///
    /// Boundary condition: a record expires only once the elapsed time is
    /// strictly greater than the TTL, so a read at exactly `created_at + ttl`
    /// still hits.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        match self.ttl {
            Ttl::Never => false,
            Ttl::After(ttl) => now_ms.saturating_sub(self.created_at) > ttl,
            Ttl::Elapsed => true,
        }
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, or None if no expiration is set.
    ///
    /// # Returns
    /// - `Some(0)` if the record has expired
    /// - `Some(remaining_ms)` if the record has a TTL and hasn't expired
    /// - `None` if the record never expires
    pub fn ttl_remaining_ms(&self, now_ms: u64) -> Option<u64> {
        match self.ttl {
            Ttl::Never => None,
            Ttl::After(ttl) => {
                let elapsed = now_ms.saturating_sub(self.created_at);
                Some(ttl.saturating_sub(elapsed))
            }
            Ttl::Elapsed => Some(0),
        }
    }
}

impl<T: Serialize> CacheRecord<T> {
    /// Serializes the record into its single-string storage form.
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl<T: DeserializeOwned> CacheRecord<T> {
    /// Parses a stored record. Anything malformed yields None.
    pub fn decode(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }
}

// == TTL Field Codec ==
/// Writes a TTL as a number, `""` when absent; reads numbers, strings, booleans
/// and `null`.
mod ttl_field {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    use super::Ttl;

    pub fn serialize<S: Serializer>(ttl: &Ttl, serializer: S) -> Result<S::Ok, S::Error> {
        match ttl {
            Ttl::Never => serializer.serialize_str(""),
            // A numeric zero would read back as "never"
            Ttl::After(0) => serializer.serialize_str("0"),
            Ttl::After(ms) => serializer.serialize_u64(*ms),
            Ttl::Elapsed => serializer.serialize_i64(-1),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Ttl, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Null | Value::Bool(false) => Ok(Ttl::Never),
            Value::Bool(true) => Ok(Ttl::After(1)),
            Value::Number(n) => match (n.as_u64(), n.as_f64()) {
                (Some(ms), _) => Ok(Ttl::from_ms(Some(ms))),
                (None, Some(f)) => Ok(Ttl::from_number(f)),
                (None, None) => Ok(Ttl::Never),
            },
            Value::String(s) if s.is_empty() => Ok(Ttl::Never),
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Ok(Ttl::After(0));
                }
                Ok(trimmed.parse::<f64>().map_or(Ttl::Never, |n| {
                    if n == 0.0 {
                        Ttl::After(0)
                    } else {
                        Ttl::from_number(n)
                    }
                }))
            }
            other => Err(D::Error::custom(format!("invalid ttl: {}", other))),
        }
    }
}
