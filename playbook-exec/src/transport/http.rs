use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::transport::{HttpRequest, HttpResponse, Transport, TransportError};

#[derive(Debug, Clone)]
pub struct ReqwestTransportConfig {
    pub timeout: Duration,
    pub max_response_bytes: usize,
}

impl Default for ReqwestTransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_response_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Direct HTTP transport. Redirects are not followed; every hop is reported as sent.
pub struct ReqwestTransport {
    client: reqwest::Client,
    config: ReqwestTransportConfig,
}

impl ReqwestTransport {
    pub fn new(config: ReqwestTransportConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(concat!("playbook-exec/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError::Other(e.to_string()))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let method = request
            .method
            .parse::<reqwest::Method>()
            .map_err(|e| TransportError::Other(e.to_string()))?;
        let mut rb = self
            .client
            .request(method, &request.url)
            .timeout(self.config.timeout);

        for (k, v) in &request.headers {
            rb = rb.header(k, v);
        }
        if let Some(body) = request.body {
            rb = rb.body(body);
        }

        let resp = rb.send().await.map_err(map_reqwest_error)?;
        let status = resp.status().as_u16();

        let headers = collect_headers(resp.headers());

        let body = resp.bytes().await.map_err(map_reqwest_error)?;
        if body.len() > self.config.max_response_bytes {
            return Err(TransportError::ResponseTooLarge {
                max_bytes: self.config.max_response_bytes,
            });
        }

        Ok(HttpResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&body).into_owned(),
        })
    }
}

/// Flattens a header map. Repeated headers (several `Set-Cookie` lines, for one) are
/// joined with `, ` in arrival order.
fn collect_headers(map: &reqwest::header::HeaderMap) -> BTreeMap<String, String> {
    let mut headers: BTreeMap<String, String> = BTreeMap::new();
    for (k, v) in map.iter() {
        let Ok(s) = v.to_str() else {
            continue;
        };
        headers
            .entry(k.to_string())
            .and_modify(|joined| {
                joined.push_str(", ");
                joined.push_str(s);
            })
            .or_insert_with(|| s.to_string());
    }
    headers
}

fn map_reqwest_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        return TransportError::Timeout;
    }
    if e.is_connect() || e.is_request() {
        return TransportError::Network(e.to_string());
    }
    TransportError::Other(e.to_string())
}

#[cfg(test)]
mod tests {
    use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, SET_COOKIE};

    use super::*;

    #[test]
    fn repeated_headers_are_joined_in_order() {
        let mut map = HeaderMap::new();
        map.append(SET_COOKIE, HeaderValue::from_static("a=1; Path=/"));
        map.append(SET_COOKIE, HeaderValue::from_static("b=2"));
        map.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let headers = collect_headers(&map);
        assert_eq!(headers["set-cookie"], "a=1; Path=/, b=2");
        assert_eq!(headers["content-type"], "application/json");
        assert_eq!(headers.len(), 2);
    }
}
