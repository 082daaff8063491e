use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot, Mutex};
use uuid::Uuid;

use crate::transport::{HttpRequest, HttpResponse, Transport, TransportError};

pub type Reply = Result<HttpResponse, TransportError>;

/// A request handed to the outside world, tagged so its reply can find the way back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundRequest {
    #[serde(rename = "correlationId")]
    pub correlation_id: String,
    pub request: HttpRequest,
}

/// Fire-and-forget side of a live transport (a UI bridge, a message bus, ...).
#[async_trait]
pub trait OutboundChannel: Send + Sync {
    async fn post(&self, message: OutboundRequest) -> Result<(), TransportError>;
}

/// Correlation table from request id to the task waiting for its reply.
#[derive(Clone, Default)]
pub struct ReplyRouter {
    pending: Arc<Mutex<HashMap<String, oneshot::Sender<Reply>>>>,
}

impl ReplyRouter {
    pub fn new() -> Self {
        Self::default()
    }

    async fn register(&self, id: String) -> oneshot::Receiver<Reply> {
        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id, tx);
        rx
    }

    async fn forget(&self, id: &str) {
        self.pending.lock().await.remove(id);
    }

    /// Routes a reply to its waiting request. Returns `false` for unknown or already
    /// settled ids, including replies that arrive after a timeout.
    pub async fn deliver(&self, correlation_id: &str, reply: Reply) -> bool {
        let Some(tx) = self.pending.lock().await.remove(correlation_id) else {
            tracing::debug!(correlation_id, "dropping reply for unknown request");
            return false;
        };
        tx.send(reply).is_ok()
    }

    pub async fn pending(&self) -> usize {
        self.pending.lock().await.len()
    }
}

/// Sends requests through an [`OutboundChannel`] and awaits replies delivered to the
/// shared [`ReplyRouter`]. Concurrent requests are matched by correlation id, never by
/// arrival order.
pub struct LiveTransport {
    channel: Arc<dyn OutboundChannel>,
    router: ReplyRouter,
    timeout: Option<Duration>,
}

impl LiveTransport {
    pub fn new(channel: Arc<dyn OutboundChannel>, router: ReplyRouter) -> Self {
        Self {
            channel,
            router,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn router(&self) -> &ReplyRouter {
        &self.router
    }
}

#[async_trait]
impl Transport for LiveTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let correlation_id = Uuid::new_v4().to_string();
        let rx = self.router.register(correlation_id.clone()).await;

        if let Err(e) = self
            .channel
            .post(OutboundRequest {
                correlation_id: correlation_id.clone(),
                request,
            })
            .await
        {
            self.router.forget(&correlation_id).await;
            return Err(e);
        }

        let reply = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, rx).await {
                Ok(r) => r,
                Err(_) => {
                    self.router.forget(&correlation_id).await;
                    return Err(TransportError::Timeout);
                }
            },
            None => rx.await,
        };
        reply.unwrap_or(Err(TransportError::ChannelClosed))
    }
}

/// Outbound channel backed by a tokio mpsc queue.
pub struct MpscOutboundChannel {
    tx: mpsc::UnboundedSender<OutboundRequest>,
}

impl MpscOutboundChannel {
    pub fn new(tx: mpsc::UnboundedSender<OutboundRequest>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl OutboundChannel for MpscOutboundChannel {
    async fn post(&self, message: OutboundRequest) -> Result<(), TransportError> {
        self.tx
            .send(message)
            .map_err(|_| TransportError::ChannelClosed)
    }
}
