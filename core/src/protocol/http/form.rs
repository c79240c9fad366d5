/*
 * form.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Silq, an HTTP client library.
 *
 * Silq is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Silq is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Silq.  If not, see <http://www.gnu.org/licenses/>.
 */

//! `application/x-www-form-urlencoded` bodies from any serde-serializable map.
//!
//! Scalars are stringified (numbers in JSON notation, booleans as `true`/`false`),
//! nulls are skipped, nested arrays and objects use bracket keys: `tags[0]=a`, `user[name]=b`.

use serde::Serialize;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::uri::encode_component;

pub const CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Flatten a serializable map into ordered key/value string pairs.
pub fn to_pairs<T: Serialize + ?Sized>(form: &T) -> Result<Vec<(String, String)>> {
    let value = serde_json::to_value(form).map_err(|e| Error::Encode(e.to_string()))?;
    let object = match value {
        Value::Object(map) => map,
        other => {
            return Err(Error::Encode(format!(
                "form body must be a map, got {}",
                kind(&other)
            )))
        }
    };
    let mut pairs = Vec::with_capacity(object.len());
    for (key, value) in object {
        flatten(key, value, &mut pairs);
    }
    Ok(pairs)
}

/// Encode pairs as `k=v&k2=v2` with both sides percent-encoded.
pub fn encode_pairs(pairs: &[(String, String)]) -> String {
    let mut out = String::new();
    for (key, value) in pairs {
        if !out.is_empty() {
            out.push('&');
        }
        out.push_str(&encode_component(key));
        out.push('=');
        out.push_str(&encode_component(value));
    }
    out
}

fn flatten(key: String, value: Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Null => {}
        Value::Bool(b) => out.push((key, b.to_string())),
        Value::Number(n) => out.push((key, n.to_string())),
        Value::String(s) => out.push((key, s)),
        Value::Array(items) => {
            for (i, item) in items.into_iter().enumerate() {
                flatten(format!("{}[{}]", key, i), item, out);
            }
        }
        Value::Object(map) => {
            for (k, v) in map {
                flatten(format!("{}[{}]", key, k), v, out);
            }
        }
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    #[test]
    fn numbers_are_stringified() {
        let pairs = to_pairs(&json!({"name": "bob", "age": 42, "ratio": 1.5})).unwrap();
        let map: BTreeMap<_, _> = pairs.into_iter().collect();
        assert_eq!(map["name"], "bob");
        assert_eq!(map["age"], "42");
        assert_eq!(map["ratio"], "1.5");
    }

    #[test]
    fn nested_values_use_bracket_keys() {
        let pairs = to_pairs(&json!({"tags": ["a", "b"], "user": {"id": 7}, "skip": null})).unwrap();
        let map: BTreeMap<_, _> = pairs.into_iter().collect();
        assert_eq!(map["tags[0]"], "a");
        assert_eq!(map["tags[1]"], "b");
        assert_eq!(map["user[id]"], "7");
        assert!(!map.contains_key("skip"));
    }

    #[test]
    fn encoding_escapes_reserved_characters() {
        let pairs = vec![("a b".to_string(), "x&y=z".to_string()), ("c".into(), "d".into())];
        assert_eq!(encode_pairs(&pairs), "a%20b=x%26y%3Dz&c=d");
    }

    #[test]
    fn non_map_is_rejected() {
        let err = to_pairs(&vec![1, 2]).unwrap_err();
        assert!(matches!(err, Error::Encode(_)));
        assert!(err.to_string().contains("an array"));
    }

    #[test]
    fn btree_map_is_accepted() {
        let mut map = BTreeMap::new();
        map.insert("k", "v");
        assert_eq!(to_pairs(&map).unwrap(), vec![("k".to_string(), "v".to_string())]);
    }
}
