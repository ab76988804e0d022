//! Cache keys for WCL queries.

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::Result;

/// A cache key made of a prefix and the hash of a query's variables.
#[derive(Clone, Debug)]
pub struct QueryKey {
  prefix: String,
  hash: String,
}

impl QueryKey {
  /// Build a key from any serializable variable set.
  ///
  /// Two variable sets with the same key/value pairs produce the same key
  /// whatever order their fields were inserted in.
  pub fn new<V: Serialize + ?Sized>(prefix: &str, variables: &V) -> Result<Self> {
    let value = serde_json::to_value(variables)?;

    let mut canonical = String::new();
    write_canonical(&value, &mut canonical);

    // SHA256 hash for stable, fixed-length keys
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());

    Ok(Self {
      prefix: prefix.to_string(),
      hash: hex::encode(hasher.finalize()),
    })
  }

  /// The full storage key, `prefix:hash`.
  pub fn cache_key(&self) -> String {
    format!("{}:{}", self.prefix, self.hash)
  }
}

/// Serialize `value` as JSON with object keys sorted at every level.
fn write_canonical(value: &Value, out: &mut String) {
  match value {
    Value::Object(map) => {
      let mut entries: Vec<(&String, &Value)> = map.iter().collect();
      entries.sort_by(|a, b| a.0.cmp(b.0));

      out.push('{');
      for (i, (key, val)) in entries.into_iter().enumerate() {
        if i > 0 {
          out.push(',');
        }
        out.push_str(&Value::String(key.clone()).to_string());
        out.push(':');
        write_canonical(val, out);
      }
      out.push('}');
    }
    Value::Array(items) => {
      out.push('[');
      for (i, item) in items.iter().enumerate() {
        if i > 0 {
          out.push(',');
        }
        write_canonical(item, out);
      }
      out.push(']');
    }
    scalar => out.push_str(&scalar.to_string()),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::wcl::queries::GuildVariables;
  use serde_json::json;
  use std::collections::HashMap;

  #[test]
  fn test_insertion_order_does_not_matter() {
    let mut a = HashMap::new();
    a.insert("name", json!("Echo"));
    a.insert("server", json!("tarren-mill"));
    a.insert("region", json!("EU"));

    let mut b = HashMap::new();
    b.insert("region", json!("EU"));
    b.insert("name", json!("Echo"));
    b.insert("server", json!("tarren-mill"));

    assert_eq!(
      QueryKey::new("guild", &a).unwrap().cache_key(),
      QueryKey::new("guild", &b).unwrap().cache_key()
    );
  }

  #[test]
  fn test_struct_and_map_hash_alike() {
    let vars = GuildVariables {
      id: Some(7),
      ..Default::default()
    };
    assert_eq!(
      QueryKey::new("guild", &vars).unwrap().cache_key(),
      QueryKey::new("guild", &json!({"id": 7})).unwrap().cache_key()
    );
  }

  #[test]
  fn test_different_values_differ() {
    let one = QueryKey::new("guild", &json!({"id": 1})).unwrap();
    let two = QueryKey::new("guild", &json!({"id": 2})).unwrap();
    assert_ne!(one.cache_key(), two.cache_key());
  }

  #[test]
  fn test_number_and_string_values_differ() {
    let number = QueryKey::new("guild", &json!({"id": 1})).unwrap();
    let string = QueryKey::new("guild", &json!({"id": "1"})).unwrap();
    assert_ne!(number.cache_key(), string.cache_key());
  }

  #[test]
  fn test_key_format() {
    let key = QueryKey::new("guild", &json!({})).unwrap().cache_key();
    let (prefix, hash) = key.split_once(':').unwrap();
    assert_eq!(prefix, "guild");
    assert_eq!(hash.len(), 64);
  }

  #[test]
  fn test_nested_objects_are_canonical() {
    let mut out = String::new();
    write_canonical(&json!({"b": {"y": 1, "x": [2, {"d": 0, "c": 1}]}, "a": null}), &mut out);
    assert_eq!(out, r#"{"a":null,"b":{"x":[2,{"c":1,"d":0}],"y":1}}"#);
  }
}
