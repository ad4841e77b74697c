//! Pulls a JSON payload out of free-form model output.
//!
//! Fallback chain: strict parse of the whole reply (code fences removed),
//! then a scan for an embedded, bracket-balanced value, then `None` so the
//! caller can substitute its placeholder. The scan is bounded both in how
//! many start positions it tries and in how far it looks ahead from each.

use serde_json::Value;

const MAX_CANDIDATES: usize = 32;
const MAX_LOOKAHEAD_BYTES: usize = 256 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonShape {
    Object,
    Array,
}

impl JsonShape {
    fn open(self) -> char {
        match self {
            JsonShape::Object => '{',
            JsonShape::Array => '[',
        }
    }

    fn matches(self, value: &Value) -> bool {
        match self {
            JsonShape::Object => value.is_object(),
            JsonShape::Array => value.is_array(),
        }
    }
}

pub fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "").replace("```JSON", "").replace("```", "")
}

pub fn extract_json(text: &str, shape: JsonShape) -> Option<Value> {
    extract_json_where(text, shape, |_| true)
}

/// Like [`extract_json`], but only accepts values for which `accept` holds.
pub fn extract_json_where(
    text: &str,
    shape: JsonShape,
    accept: impl Fn(&Value) -> bool,
) -> Option<Value> {
    let cleaned = strip_code_fences(text);
    let trimmed = cleaned.trim();

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        if shape.matches(&value) && accept(&value) {
            return Some(value);
        }
    }

    trimmed
        .match_indices(shape.open())
        .take(MAX_CANDIDATES)
        .find_map(|(start, _)| {
            let candidate = &trimmed[start..];
            let end = balanced_end(candidate)?;
            serde_json::from_str::<Value>(&candidate[..end])
                .ok()
                .filter(|v| shape.matches(v) && accept(v))
        })
}

/// Byte length of the bracket-balanced value at the start of `text`,
/// ignoring brackets inside string literals.
fn balanced_end(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, b) in text.bytes().enumerate().take(MAX_LOOKAHEAD_BYTES) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' | b'[' => depth += 1,
            b'}' | b']' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strict_parse() {
        let value = extract_json(r#"{"summary": "ok"}"#, JsonShape::Object).unwrap();
        assert_eq!(value, json!({"summary": "ok"}));
    }

    #[test]
    fn test_code_fenced_reply() {
        let reply = "```json\n[{\"date\": \"2023-08-23\"}]\n```";
        let value = extract_json(reply, JsonShape::Array).unwrap();
        assert_eq!(value[0]["date"], "2023-08-23");
    }

    #[test]
    fn test_prose_around_payload() {
        let reply = "Sure! Here is the analysis you asked for:\n{\"timeline\": [], \"summary\": \"A [bracketed] note }\"}\nLet me know if you need more.";
        let value = extract_json(reply, JsonShape::Object).unwrap();
        assert_eq!(value["summary"], "A [bracketed] note }");
    }

    #[test]
    fn test_skips_unparsable_candidates() {
        let reply = "Use {placeholders} like this. Result: {\"ok\": true}";
        assert_eq!(extract_json(reply, JsonShape::Object).unwrap(), json!({"ok": true}));
    }

    #[test]
    fn test_predicate_filters_inner_objects() {
        let reply = "[{\"date\": \"x\"}] and then {\"summary\": \"s\"}";
        let value = extract_json_where(reply, JsonShape::Object, |v| v.get("summary").is_some());
        assert_eq!(value.unwrap(), json!({"summary": "s"}));
    }

    #[test]
    fn test_nothing_to_extract() {
        assert!(extract_json("no json here", JsonShape::Object).is_none());
        assert!(extract_json("[unterminated", JsonShape::Array).is_none());
        assert!(extract_json("", JsonShape::Array).is_none());
    }
}
