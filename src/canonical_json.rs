// Copyright groupdag contributors.
//
// This software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, this software is distributed
// under the GPL Licence on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licence for the specific language
// governing permissions and limitations relating to use of this software.

//! Deterministic JSON encoding.
//!
//! Because envelope hashes bind the signer's exact JSON bytes, every
//! implementation must agree on one canonical encoding or peers will derive
//! different hashes for operations they intend to mean the same thing.
//! This module sorts object keys, uses no insignificant whitespace, and is
//! UTF-8 throughout.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Serialises `value` to canonical JSON bytes: sorted object keys, compact
/// separators, UTF-8.
pub fn to_canonical_bytes<T: Serialize>(value: &T) -> serde_json::Result<Vec<u8>> {
    let value = serde_json::to_value(value)?;
    let sorted = sort_keys(value);
    serde_json::to_vec(&sorted)
}

fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<String, Value> =
                map.into_iter().map(|(k, v)| (k, sort_keys(v))).collect();
            let mut out = serde_json::Map::new();
            for (k, v) in sorted {
                out.insert(k, v);
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sorts_object_keys_recursively() {
        let value = json!({"b": 1, "a": {"d": 2, "c": 3}});
        let bytes = to_canonical_bytes(&value).unwrap();
        assert_eq!(bytes, br#"{"a":{"c":3,"d":2},"b":1}"#);
    }

    #[test]
    fn encoding_is_deterministic_across_calls() {
        let value = json!({"z": 1, "m": [3, 2, 1], "a": "hi"});
        let first = to_canonical_bytes(&value).unwrap();
        let second = to_canonical_bytes(&value).unwrap();
        assert_eq!(first, second);
    }
}
