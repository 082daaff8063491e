use std::collections::BTreeMap;

use playbook_core::types::{RequestTemplate, ValueMap};
use serde_json::Value as JsonValue;
use url::Url;

use crate::substitute::text_of;
use crate::transport::HttpRequest;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PrepareError {
    #[error("invalid url '{url}': {message}")]
    InvalidUrl { url: String, message: String },
    #[error("unsupported url scheme '{0}' (expected http or https)")]
    UnsupportedScheme(String),
    #[error("failed to serialize request body: {0}")]
    Body(String),
    #[error("credential '{0}' has no parameter name")]
    CredentialName(String),
}

/// A request after substitution with its URL parsed and parameters placed.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRequest {
    pub method: String,
    pub url: Url,
    pub headers: BTreeMap<String, String>,
    pub body: Option<String>,
}

impl PreparedRequest {
    /// Sets a header, replacing any existing one with the same name in any case.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.retain(|k, _| !k.eq_ignore_ascii_case(name));
        self.headers.insert(name.to_string(), value.into());
    }

    pub fn append_query(&mut self, name: &str, value: &str) {
        self.url.query_pairs_mut().append_pair(name, value);
    }

    pub fn append_cookie(&mut self, name: &str, value: &str) {
        let pair = format!("{name}={value}");
        let existing = self
            .headers
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case("cookie"));
        match existing {
            Some((_, c)) => {
                c.push_str("; ");
                c.push_str(&pair);
            }
            None => {
                self.headers.insert("Cookie".to_string(), pair);
            }
        }
    }

    pub fn into_http(self) -> HttpRequest {
        HttpRequest {
            method: self.method,
            url: self.url.to_string(),
            headers: self.headers,
            body: self.body,
        }
    }
}

/// Turns a substituted template into a sendable request: fills `{param}` path
/// placeholders, parses the URL, then appends query, header, cookie and body.
pub fn prepare_request(template: &RequestTemplate) -> Result<PreparedRequest, PrepareError> {
    let raw = fill_path_params(&template.url, &template.parameters.path);
    let mut url = Url::parse(&raw).map_err(|e| PrepareError::InvalidUrl {
        url: raw.clone(),
        message: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(PrepareError::UnsupportedScheme(url.scheme().to_string()));
    }

    if !template.parameters.query.is_empty() {
        let mut qp = url.query_pairs_mut();
        for (k, v) in &template.parameters.query {
            match v {
                JsonValue::Array(items) => {
                    for item in items {
                        qp.append_pair(k, &text_of(item));
                    }
                }
                other => {
                    qp.append_pair(k, &text_of(other));
                }
            }
        }
    }

    let mut prepared = PreparedRequest {
        method: template.method.to_ascii_uppercase(),
        url,
        headers: BTreeMap::new(),
        body: None,
    };

    for (k, v) in &template.parameters.header {
        prepared.set_header(k, text_of(v));
    }
    for (k, v) in &template.parameters.cookie {
        prepared.append_cookie(k, &text_of(v));
    }

    if let Some(body) = &template.body {
        let text = if body.is_json() {
            serde_json::to_string(&body.value).map_err(|e| PrepareError::Body(e.to_string()))?
        } else {
            text_of(&body.value)
        };
        let has_content_type = prepared
            .headers
            .keys()
            .any(|k| k.eq_ignore_ascii_case("content-type"));
        if !has_content_type {
            let media_type = body
                .media_type
                .clone()
                .unwrap_or_else(|| "application/json".to_string());
            prepared.set_header("Content-Type", media_type);
        }
        prepared.body = Some(text);
    }

    Ok(prepared)
}

/// Replaces single-brace `{name}` placeholders with percent-encoded values. Double-brace
/// variable tokens and unknown names are left untouched.
fn fill_path_params(url: &str, params: &ValueMap) -> String {
    let mut out = String::with_capacity(url.len());
    let mut rest = url;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        if tail.starts_with("{{") {
            match tail.find("}}") {
                Some(end) => {
                    out.push_str(&tail[..end + 2]);
                    rest = &tail[end + 2..];
                }
                None => {
                    out.push_str(tail);
                    rest = "";
                }
            }
            continue;
        }
        match tail.find('}') {
            Some(end) => {
                let name = &tail[1..end];
                match params.get(name) {
                    Some(v) => out.push_str(&urlencoding::encode(&text_of(v))),
                    None => out.push_str(&tail[..=end]),
                }
                rest = &tail[end + 1..];
            }
            None => {
                out.push_str(tail);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn template(url: &str) -> RequestTemplate {
        RequestTemplate {
            method: "get".to_string(),
            url: url.to_string(),
            parameters: Default::default(),
            body: None,
        }
    }

    #[test]
    fn fills_path_params_and_keeps_tokens() {
        let mut params = ValueMap::new();
        params.insert("id".to_string(), json!("a b"));
        assert_eq!(
            fill_path_params("http://h/users/{id}/{{missing}}/{other}", &params),
            "http://h/users/a%20b/{{missing}}/{other}"
        );
    }

    #[test]
    fn prepares_query_headers_cookies_and_json_body() {
        let mut t = template("https://api.example.com/items");
        t.method = "post".to_string();
        t.parameters.query.insert("tag".to_string(), json!(["a", "b"]));
        t.parameters.header.insert("X-Trace".to_string(), json!(7));
        t.parameters.cookie.insert("session".to_string(), json!("s1"));
        t.body = Some(playbook_core::types::RequestBody {
            media_type: None,
            value: json!({ "n": 1 }),
        });

        let p = prepare_request(&t).unwrap();
        assert_eq!(p.method, "POST");
        assert_eq!(p.url.as_str(), "https://api.example.com/items?tag=a&tag=b");
        assert_eq!(p.headers["X-Trace"], "7");
        assert_eq!(p.headers["Cookie"], "session=s1");
        assert_eq!(p.headers["Content-Type"], "application/json");
        assert_eq!(p.body.as_deref(), Some(r#"{"n":1}"#));
    }

    #[test]
    fn rejects_unresolved_host_and_bad_scheme() {
        assert!(matches!(
            prepare_request(&template("{{host}}/x")),
            Err(PrepareError::InvalidUrl { .. })
        ));
        assert!(matches!(
            prepare_request(&template("ftp://h/x")),
            Err(PrepareError::UnsupportedScheme(_))
        ));
    }
}
