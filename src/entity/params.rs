// Opaque parameter blobs for machines and presets
// The core guarantees round-trip fidelity and an encoded size bound only;
// it never interprets individual keys.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::validation::ValidationError;

/// String-keyed scalar parameter map.
///
/// BTreeMap keeps key order stable so the encoded form is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParamMap {
    values: BTreeMap<String, f64>,
}

impl ParamMap {
    /// Maximum encoded size of one blob (1 MB)
    pub const MAX_ENCODED_BYTES: usize = 1024 * 1024;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: f64) {
        self.values.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.values.get(key).copied()
    }

    pub fn remove(&mut self, key: &str) -> Option<f64> {
        self.values.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Encoded size of the blob in bytes (JSON form)
    pub fn encoded_len(&self) -> usize {
        // Serialization of a string->f64 map cannot fail
        serde_json::to_vec(&self.values).map(|v| v.len()).unwrap_or(0)
    }

    /// Check the blob against the size bound
    pub fn check_size(&self, entity: &'static str) -> Result<(), ValidationError> {
        let len = self.encoded_len();
        if len > Self::MAX_ENCODED_BYTES {
            return Err(ValidationError::field(
                entity,
                "parameters",
                format!(
                    "encoded blob is {} bytes, limit is {} bytes",
                    len,
                    Self::MAX_ENCODED_BYTES
                ),
            ));
        }
        Ok(())
    }
}

impl FromIterator<(String, f64)> for ParamMap {
    fn from_iter<T: IntoIterator<Item = (String, f64)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}
