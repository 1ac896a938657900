/*
 *  Copyright 2025-2026 Colliery Software
 *
 *  Licensed under the Apache License, Version 2.0 (the "License");
 *  you may not use this file except in compliance with the License.
 *  You may obtain a copy of the License at
 *
 *      http://www.apache.org/licenses/LICENSE-2.0
 *
 *  Unless required by applicable law or agreed to in writing, software
 *  distributed under the License is distributed on an "AS IS" BASIS,
 *  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *  See the License for the specific language governing permissions and
 *  limitations under the License.
 */

//! Canonical encoding of product metadata.
//!
//! Signatures and digests are computed over the canonical bytes of the
//! metadata, so signer and verifier must produce identical output for equal
//! logical content. The encoding is compact JSON with object keys sorted by
//! code point at every nesting level, UTF-8 output and non-ASCII characters
//! written literally.
//!
//! Key ordering is enforced here rather than relying on `serde_json::Map`,
//! whose iteration order changes if any crate in the build enables the
//! `preserve_order` feature.

use super::signing::SigningError;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;

/// Product metadata attached to a signed record.
///
/// A flat or nested mapping of string keys to JSON values. Only
/// `manufacturer` carries meaning to this crate: it names the author whose
/// registered key must have produced the signature.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductMetadata(BTreeMap<String, Value>);

impl ProductMetadata {
    /// Key naming the author of the record.
    pub const MANUFACTURER: &'static str = "manufacturer";

    pub fn new() -> Self {
        Self::default()
    }

    /// The field set a manufacturer fills in when issuing a product record.
    pub fn template() -> Self {
        [
            ("product_id", "SKU-12345"),
            ("batch", "BATCH-2025-09-30"),
            ("manufacturer", "ACME FOOD JSC"),
            ("origin", "Viet Nam"),
            ("production_date", "2025-09-30"),
            ("expiry_date", "2026-09-30"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), Value::from(v)))
        .collect()
    }

    /// Parse metadata from JSON text. The text must be a JSON object.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Insert a field, returning the previous value if one was present.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Get a field as a string, if present and a JSON string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// The declared author of the record.
    pub fn manufacturer(&self) -> Option<&str> {
        self.get_str(Self::MANUFACTURER)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

impl FromIterator<(String, Value)> for ProductMetadata {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<BTreeMap<String, Value>> for ProductMetadata {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Self(map)
    }
}

/// Serializes a JSON value with object keys in sorted order at every level.
struct Canonical<'a>(&'a Value);

impl Serialize for Canonical<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            Value::Object(map) => {
                let mut entries: Vec<(&String, &Value)> = map.iter().collect();
                entries.sort_by(|a, b| a.0.cmp(b.0));

                let mut state = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    state.serialize_entry(key, &Canonical(value))?;
                }
                state.end()
            }
            Value::Array(items) => {
                let mut state = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    state.serialize_element(&Canonical(item))?;
                }
                state.end()
            }
            scalar => scalar.serialize(serializer),
        }
    }
}

/// Top-level metadata map; `BTreeMap` already iterates in key order.
struct CanonicalMetadata<'a>(&'a ProductMetadata);

impl Serialize for CanonicalMetadata<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in self.0.iter() {
            state.serialize_entry(key, &Canonical(value))?;
        }
        state.end()
    }
}

/// Encodes product metadata into its canonical byte form.
///
/// # Errors
///
/// Returns `SigningError::Canonicalization` if the metadata cannot be
/// serialized.
pub fn canonicalize_metadata(metadata: &ProductMetadata) -> Result<Vec<u8>, SigningError> {
    serde_json::to_vec(&CanonicalMetadata(metadata))
        .map_err(|e| SigningError::Canonicalization(e.to_string()))
}

/// Encodes an arbitrary JSON value into its canonical byte form.
pub fn canonicalize_value(value: &Value) -> Result<Vec<u8>, SigningError> {
    serde_json::to_vec(&Canonical(value)).map_err(|e| SigningError::Canonicalization(e.to_string()))
}
