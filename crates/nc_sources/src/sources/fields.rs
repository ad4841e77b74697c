//! Tolerant reads over loosely-typed JSON records.
//!
//! Upstream schemas drift: the same field shows up under different names and
//! the record list under different keys. Callers pass names in priority order.

use serde_json::Value;

/// First non-empty string found under `keys`, tried in order. Numbers are
/// accepted and rendered; anything else counts as absent.
pub fn first_str(record: &Value, keys: &[&str]) -> String {
    keys.iter()
        .filter_map(|key| match record.get(key)? {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .find(|s| !s.is_empty())
        .unwrap_or_default()
}

/// Nested string lookup such as `source.name`.
pub fn nested_str(record: &Value, path: &[&str]) -> String {
    path.iter()
        .try_fold(record, |value, key| value.get(key))
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

/// The list of records in a response body: the first non-empty array under
/// `preferred`, else the body itself when it is an array of objects, else any
/// top-level array of objects.
pub fn find_records<'a>(data: &'a Value, preferred: &[&str]) -> Option<&'a [Value]> {
    let looks_like_records = |v: &'a Value| -> Option<&'a [Value]> {
        let items = v.as_array()?;
        items.first()?.is_object().then_some(items.as_slice())
    };

    preferred
        .iter()
        .filter_map(|key| data.get(key))
        .find_map(looks_like_records)
        .or_else(|| looks_like_records(data))
        .or_else(|| data.as_object()?.values().find_map(looks_like_records))
}
