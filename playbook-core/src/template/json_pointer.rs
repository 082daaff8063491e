use std::fmt;

use serde_json::Value;

/// RFC 6901 JSON pointer, validated on construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonPointer {
    raw: String,
}

impl JsonPointer {
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn parse(fragment: &str) -> Result<Self, JsonPointerError> {
        // "#/a/b" (URI fragment form) is accepted and normalised to "/a/b".
        let fragment = fragment.strip_prefix('#').unwrap_or(fragment);
        if fragment.is_empty() {
            return Ok(Self { raw: String::new() });
        }
        if !fragment.starts_with('/') {
            return Err(JsonPointerError::InvalidPrefix);
        }

        let mut chars = fragment.chars();
        while let Some(ch) = chars.next() {
            if ch == '~' && !matches!(chars.next(), Some('0' | '1')) {
                return Err(JsonPointerError::InvalidEscape);
            }
        }

        Ok(Self {
            raw: fragment.to_string(),
        })
    }

    /// Decoded reference tokens.
    pub fn segments(&self) -> impl Iterator<Item = String> + '_ {
        self.raw
            .split('/')
            .skip(1)
            .map(|s| s.replace("~1", "/").replace("~0", "~"))
    }

    /// Walks `value`, naming the first segment that does not exist.
    pub fn lookup<'v>(&self, value: &'v Value) -> Result<&'v Value, JsonPointerError> {
        let mut cur = value;
        for seg in self.segments() {
            let next = match cur {
                Value::Object(map) => map.get(&seg),
                Value::Array(arr) => seg.parse::<usize>().ok().and_then(|i| arr.get(i)),
                _ => None,
            };
            cur = next.ok_or_else(|| JsonPointerError::NotFound {
                pointer: self.raw.clone(),
                segment: seg.clone(),
            })?;
        }
        Ok(cur)
    }
}

impl fmt::Display for JsonPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JsonPointerError {
    #[error("json pointer must start with '/'")]
    InvalidPrefix,
    #[error("json pointer contains invalid escape (only ~0 and ~1 are allowed)")]
    InvalidEscape,
    #[error("json pointer {pointer} not found (missing segment '{segment}')")]
    NotFound { pointer: String, segment: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lookup_walks_objects_and_arrays() {
        let body = json!({"items": [{"id": 7}], "a/b": {"~x": true}});
        let p = JsonPointer::parse("/items/0/id").unwrap();
        assert_eq!(p.lookup(&body).unwrap(), &json!(7));
        let escaped = JsonPointer::parse("/a~1b/~0x").unwrap();
        assert_eq!(escaped.lookup(&body).unwrap(), &json!(true));
    }

    #[test]
    fn lookup_reports_missing_segment() {
        let p = JsonPointer::parse("#/token").unwrap();
        let err = p.lookup(&json!({"other": 1})).unwrap_err();
        assert_eq!(
            err,
            JsonPointerError::NotFound {
                pointer: "/token".to_string(),
                segment: "token".to_string()
            }
        );
    }

    #[test]
    fn rejects_bad_escape() {
        assert_eq!(
            JsonPointer::parse("/a~2").unwrap_err(),
            JsonPointerError::InvalidEscape
        );
    }
}
