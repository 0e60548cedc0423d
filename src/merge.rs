//! Recursive merge of metadata records.
//!
//! [`deep_merge`] lays an overlay record on top of a base record: nested
//! objects combine key by key, everything else (scalars, arrays, `null`)
//! is replaced wholesale by the overlay's value.

use serde_json::Value;

use crate::models::MetadataRecord;

/// Keys never copied from an overlay, at any depth.
pub const BLOCKED_KEYS: [&str; 2] = ["__proto__", "constructor"];

/// Returns `true` if `key` must be dropped during a merge.
pub fn is_blocked_key(key: &str) -> bool {
    BLOCKED_KEYS.contains(&key)
}

/// Merge `overlay` on top of `base`, returning a new record.
///
/// Neither input is modified. Overlay values win on every conflicting
/// key, except that when both sides hold an object the two objects are
/// merged recursively. Blocked keys in the overlay are skipped entirely.
pub fn deep_merge(base: &MetadataRecord, overlay: &MetadataRecord) -> MetadataRecord {
    let mut merged = base.clone();
    merge_into(&mut merged, overlay);
    merged
}

fn merge_into(target: &mut MetadataRecord, overlay: &MetadataRecord) {
    for (key, value) in overlay {
        if is_blocked_key(key) {
            continue;
        }

        match (target.get_mut(key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                merge_into(existing, incoming);
            }
            _ => {
                target.insert(key.clone(), strip_blocked(value));
            }
        }
    }
}

/// Copy a value, dropping blocked keys from any object nested inside it.
fn strip_blocked(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(k, _)| !is_blocked_key(k))
                .map(|(k, v)| (k.clone(), strip_blocked(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}
