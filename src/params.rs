//! Parameter mappings handed to transformations.
//!
//! Parameters arrive as plain strings (query string, config preset, CLI flag;
//! the pipeline does not care which) and are coerced by the transformation
//! that reads them. Every check here runs before any backend call.
//!
//! ## Coercion rules
//!
//! - A key whose value is empty (after trimming) counts as absent.
//! - Integers accept `"42"`, `"-7"` and decimal strings, which truncate
//!   toward zero (`"12.9"` → 12).
//! - Floats accept anything `f64` parses, as long as the result is finite.

use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required parameter: {0}")]
    Missing(String),
    #[error("Invalid value for parameter {name}: {value:?} (expected {expected})")]
    Invalid {
        name: String,
        value: String,
        expected: &'static str,
    },
    #[error("{0}")]
    Conflict(String),
}

/// Named parameters for one transformation invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(BTreeMap<String, String>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, mostly for tests and presets.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Trimmed value for `key`; empty values read as absent.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn require(&self, key: &str) -> Result<&str, ValidationError> {
        self.get(key)
            .ok_or_else(|| ValidationError::Missing(key.to_string()))
    }

    pub fn require_int(&self, key: &str) -> Result<i64, ValidationError> {
        coerce_int(key, self.require(key)?)
    }

    pub fn int(&self, key: &str) -> Result<Option<i64>, ValidationError> {
        self.get(key).map(|v| coerce_int(key, v)).transpose()
    }

    pub fn int_or(&self, key: &str, default: i64) -> Result<i64, ValidationError> {
        Ok(self.int(key)?.unwrap_or(default))
    }

    pub fn require_float(&self, key: &str) -> Result<f64, ValidationError> {
        let raw = self.require(key)?;
        match raw.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(v),
            _ => Err(invalid(key, raw, "a number")),
        }
    }

    pub fn string(&self, key: &str) -> Option<String> {
        self.get(key).map(str::to_string)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl fmt::Display for Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (key, value) in self.iter() {
            if !first {
                f.write_str(",")?;
            }
            write!(f, "{key}={value}")?;
            first = false;
        }
        Ok(())
    }
}

fn invalid(key: &str, value: &str, expected: &'static str) -> ValidationError {
    ValidationError::Invalid {
        name: key.to_string(),
        value: value.to_string(),
        expected,
    }
}

fn coerce_int(key: &str, raw: &str) -> Result<i64, ValidationError> {
    if let Ok(v) = raw.parse::<i64>() {
        return Ok(v);
    }
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() && v.abs() < i64::MAX as f64 => Ok(v.trunc() as i64),
        _ => Err(invalid(key, raw, "an integer")),
    }
}
