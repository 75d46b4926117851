//! Provenance hash chain.
//!
//! Every evidence record carries `(record_hash, previous_hash)`. The hash is a
//! SHA-256 digest over the canonical JSON of the record's core fields, the
//! previous hash and the acting user id. Canonical JSON sorts object keys at
//! every depth so the digest is independent of map insertion order.

use serde_json::Value;
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Serialize a JSON value with object keys sorted recursively.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String((*key).clone()).to_string());
                out.push(':');
                write_canonical(&map[key.as_str()], out);
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

pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Digest linking a record version to its predecessor.
pub fn compute_record_hash(core: &Value, previous_hash: Option<&str>, actor_id: Uuid) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical_json(core).as_bytes());
    hasher.update(b"|");
    hasher.update(previous_hash.unwrap_or("").as_bytes());
    hasher.update(b"|");
    hasher.update(actor_id.to_string().as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_canonical_json_sorts_nested_keys() {
        let a = json!({"b": 1, "a": {"z": true, "y": [ {"d": 1, "c": 2} ]}});
        assert_eq!(
            canonical_json(&a),
            r#"{"a":{"y":[{"c":2,"d":1}],"z":true},"b":1}"#
        );
    }

    #[test]
    fn test_hash_depends_on_previous_and_actor() {
        let core = json!({"gene": "BRCA1", "points": 3});
        let actor = Uuid::new_v4();
        let h1 = compute_record_hash(&core, None, actor);
        let h2 = compute_record_hash(&core, Some(&h1), actor);
        let h3 = compute_record_hash(&core, None, Uuid::new_v4());
        assert_eq!(h1.len(), 64);
        assert_ne!(h1, h2);
        assert_ne!(h1, h3);
        assert_eq!(h1, compute_record_hash(&core, None, actor));
    }

    #[test]
    fn test_sha256_hex_known_value() {
        assert_eq!(
            sha256_hex("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
