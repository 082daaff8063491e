use std::sync::LazyLock;

use regex::Regex;

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_\$\.\-]+$").expect("valid regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    /// `source` is the token exactly as written, braces and inner spaces included.
    Token { name: String, source: String },
}

/// A string split into literal text and `{{name}}` tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub segments: Vec<Segment>,
}

impl Template {
    /// Names of all tokens in order of appearance (duplicates kept).
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Token { name, .. } => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// The token name when the whole input is exactly one token.
    pub fn single_token(&self) -> Option<&str> {
        match self.segments.as_slice() {
            [Segment::Token { name, .. }] => Some(name),
            _ => None,
        }
    }

    pub fn has_tokens(&self) -> bool {
        self.tokens().next().is_some()
    }
}

pub fn is_valid_name(name: &str) -> bool {
    NAME_RE.is_match(name)
}

/// Splits `input` into literals and tokens.
///
/// Parsing is lenient: an unclosed `{{` or a brace pair whose content is not a valid
/// variable name stays literal text, so malformed input never fails a run. A rejected
/// `{{` only consumes itself; scanning resumes right after it.
pub fn parse_template(input: &str) -> Template {
    let mut segments = Vec::new();
    let mut buf = String::new();
    let mut rest = input;

    while let Some(start) = rest.find("{{") {
        let after_open = &rest[start + 2..];
        let Some(end) = after_open.find("}}") else {
            break;
        };
        let inner = after_open[..end].trim();
        if !is_valid_name(inner) {
            buf.push_str(&rest[..start + 2]);
            rest = after_open;
            continue;
        }
        buf.push_str(&rest[..start]);
        if !buf.is_empty() {
            segments.push(Segment::Literal(std::mem::take(&mut buf)));
        }
        segments.push(Segment::Token {
            name: inner.to_string(),
            source: rest[start..start + 2 + end + 2].to_string(),
        });
        rest = &after_open[end + 2..];
    }
    buf.push_str(rest);

    if !buf.is_empty() {
        segments.push(Segment::Literal(buf));
    }

    Template { segments }
}

/// Collects the token names referenced anywhere inside a JSON value (strings only).
pub fn value_tokens(value: &serde_json::Value, out: &mut Vec<String>) {
    match value {
        serde_json::Value::String(s) => {
            out.extend(parse_template(s).tokens().map(str::to_string));
        }
        serde_json::Value::Array(arr) => {
            for v in arr {
                value_tokens(v, out);
            }
        }
        serde_json::Value::Object(map) => {
            for v in map.values() {
                value_tokens(v, out);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_literals_and_tokens() {
        let t = parse_template("Bearer {{ token }}!");
        assert_eq!(
            t.segments,
            vec![
                Segment::Literal("Bearer ".to_string()),
                Segment::Token {
                    name: "token".to_string(),
                    source: "{{ token }}".to_string(),
                },
                Segment::Literal("!".to_string()),
            ]
        );
        assert_eq!(t.single_token(), None);
    }

    #[test]
    fn whole_field_token_is_detected() {
        assert_eq!(parse_template("{{$randomint}}").single_token(), Some("$randomint"));
    }

    #[test]
    fn malformed_braces_stay_literal() {
        let t = parse_template("{{not a name}} and {{open");
        assert!(!t.has_tokens());
        assert_eq!(
            t.segments,
            vec![Segment::Literal("{{not a name}} and {{open".to_string())]
        );
    }

    #[test]
    fn rejected_open_brace_does_not_swallow_a_later_token() {
        let t = parse_template("{{x y {{name}}");
        assert_eq!(t.tokens().collect::<Vec<_>>(), ["name"]);
        assert_eq!(t.segments[0], Segment::Literal("{{x y ".to_string()));

        let t = parse_template("{{{{a}} {{b c}} {{d}}");
        assert_eq!(t.tokens().collect::<Vec<_>>(), ["a", "d"]);
    }

    #[test]
    fn json_braces_are_not_tokens() {
        let t = parse_template(r#"{"a": {"b": 1}}"#);
        assert!(!t.has_tokens());
    }
}
