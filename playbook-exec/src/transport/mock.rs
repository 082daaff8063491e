use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::transport::{HttpRequest, HttpResponse, Transport, TransportError};

/// Answers every request with the same canned response and records what it was sent.
#[derive(Debug, Clone)]
pub struct MockTransport {
    response: HttpResponse,
    sent: Arc<Mutex<Vec<HttpRequest>>>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new(HttpResponse::new(200))
    }
}

impl MockTransport {
    pub fn new(response: HttpResponse) -> Self {
        Self {
            response,
            sent: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub async fn sent(&self) -> Vec<HttpRequest> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.sent.lock().await.push(request);
        Ok(self.response.clone())
    }
}
