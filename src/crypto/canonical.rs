// Canonical encoding - deterministic JSON rendering and SHA-256 digests
//
// Every hash that feeds a signature is computed over this canonical form:
// object keys sorted lexicographically at every level, no whitespace,
// absent optional fields absent (never null).

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CanonicalError {
    #[error("Serialization failed: {0}")]
    Serialize(String),
}

/// Render a JSON value in canonical form
pub fn to_canonical_string(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            out.push('{');
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
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
        other => out.push_str(&other.to_string()),
    }
}

/// SHA-256 over the canonical rendering of a JSON value
pub fn digest_value(value: &Value) -> [u8; 32] {
    let canonical = to_canonical_string(value);
    let hash = Sha256::digest(canonical.as_bytes());
    let mut out = [0u8; 32];
    out.copy_from_slice(&hash);
    out
}

/// SHA-256 over the canonical rendering of any serializable value
pub fn digest<T: Serialize>(value: &T) -> Result<[u8; 32], CanonicalError> {
    let json = serde_json::to_value(value).map_err(|e| CanonicalError::Serialize(e.to_string()))?;
    Ok(digest_value(&json))
}

/// Lowercase hex form of [`digest`] (64 characters)
pub fn digest_hex<T: Serialize>(value: &T) -> Result<String, CanonicalError> {
    Ok(hex::encode(digest(value)?))
}

/// Plain SHA-256 of raw bytes, hex-encoded (used for file contents)
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_keys_sorted_at_every_level() {
        let v = json!({"b": 1, "a": {"z": true, "m": [2, 1]}});
        assert_eq!(
            to_canonical_string(&v),
            r#"{"a":{"m":[2,1],"z":true},"b":1}"#
        );
    }

    #[test]
    fn test_digest_invariant_under_key_order() {
        let a = json!({"amount": 5, "from": "x", "nonce": 1});
        let b = json!({"nonce": 1, "amount": 5, "from": "x"});
        assert_eq!(digest_value(&a), digest_value(&b));
    }

    #[test]
    fn test_integers_stay_integers() {
        let v = json!({"amount": 9007199254740991u64});
        assert_eq!(to_canonical_string(&v), r#"{"amount":9007199254740991}"#);
    }

    #[test]
    fn test_string_escaping() {
        let v = json!({"comment": "a\"b"});
        assert_eq!(to_canonical_string(&v), r#"{"comment":"a\"b"}"#);
    }
}
