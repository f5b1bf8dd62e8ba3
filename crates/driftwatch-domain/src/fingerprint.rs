use serde_json::Value;
use sha2::{Digest, Sha256};

/// Deterministic hash of a serializable value, independent of struct field
/// order or `HashMap` iteration order.
///
/// `serde_json::Value`'s `Object` variant is a `BTreeMap` internally, so
/// re-serializing through `Value` before hashing gives key-sorted, canonical
/// JSON for free — the same trick the store uses for its desired-state hash.
pub fn canonical_hash<T: serde::Serialize>(value: &T) -> String {
    let v = serde_json::to_value(value).expect("value must serialize to JSON");
    let canonical = serde_json::to_vec(&v).expect("canonical value must serialize");
    let digest = Sha256::digest(&canonical);
    encode_hex(&digest)
}

/// Recursively drops object entries whose value is `null`, an empty string,
/// or the number zero, so that `None`, `Some("")`, and `Some(0)` all hash
/// identically — a provider that reports an unset field inconsistently
/// across ticks must not cause a spurious `modified` event.
pub fn normalize_for_fingerprint(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut out = serde_json::Map::new();
            for (key, val) in map {
                let val = normalize_for_fingerprint(val);
                if is_unset(&val) {
                    continue;
                }
                out.insert(key, val);
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(normalize_for_fingerprint).collect()),
        other => other,
    }
}

fn is_unset(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Number(n) => n.as_f64() == Some(0.0),
        _ => false,
    }
}

fn encode_hex(bytes: &[u8]) -> String {
    const CHARS: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push(CHARS[(b >> 4) as usize] as char);
        out.push(CHARS[(b & 0x0f) as usize] as char);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_order_does_not_affect_hash() {
        let a = serde_json::json!({"a": 1, "b": 2});
        let b = serde_json::json!({"b": 2, "a": 1});
        assert_eq!(canonical_hash(&a), canonical_hash(&b));
    }

    #[test]
    fn different_values_hash_differently() {
        let a = serde_json::json!({"a": 1});
        let b = serde_json::json!({"a": 2});
        assert_ne!(canonical_hash(&a), canonical_hash(&b));
    }

    #[test]
    fn normalize_treats_null_empty_string_and_zero_as_equivalent() {
        let null = normalize_for_fingerprint(serde_json::json!({"status": null, "vcpus": null}));
        let empty = normalize_for_fingerprint(serde_json::json!({"status": "", "vcpus": 0}));
        assert_eq!(canonical_hash(&null), canonical_hash(&empty));
    }

    #[test]
    fn normalize_preserves_meaningful_values() {
        let a = normalize_for_fingerprint(serde_json::json!({"status": "running"}));
        let b = normalize_for_fingerprint(serde_json::json!({"status": ""}));
        assert_ne!(canonical_hash(&a), canonical_hash(&b));
    }
}
