use std::sync::Arc;
use std::time::Duration;

use playbook_exec::transport::{
    LiveTransport, MockTransport, MpscOutboundChannel, OutboundRequest, ReplyRouter,
};
use playbook_exec::{HttpRequest, HttpResponse, Transport, TransportError};
use tokio::sync::mpsc;

fn get(url: &str) -> HttpRequest {
    HttpRequest {
        method: "GET".to_string(),
        url: url.to_string(),
        headers: Default::default(),
        body: None,
    }
}

fn live() -> (Arc<LiveTransport>, mpsc::UnboundedReceiver<OutboundRequest>, ReplyRouter) {
    let (tx, rx) = mpsc::unbounded_channel();
    let router = ReplyRouter::new();
    let transport = LiveTransport::new(Arc::new(MpscOutboundChannel::new(tx)), router.clone());
    (Arc::new(transport), rx, router)
}

#[tokio::test]
async fn mock_returns_canned_response_and_records_requests() {
    let mock = MockTransport::new(HttpResponse::new(201).with_body("{}"));
    let resp = mock.send(get("http://localhost/a")).await.unwrap();
    assert_eq!(resp.status, 201);
    assert_eq!(resp.body, "{}");
    assert_eq!(mock.sent().await[0].url, "http://localhost/a");
}

#[tokio::test]
async fn live_replies_are_matched_by_correlation_id() {
    let (transport, mut outbound, router) = live();

    let t1 = transport.clone();
    let first = tokio::spawn(async move { t1.send(get("http://localhost/one")).await });
    let t2 = transport.clone();
    let second = tokio::spawn(async move { t2.send(get("http://localhost/two")).await });

    let a = outbound.recv().await.unwrap();
    let b = outbound.recv().await.unwrap();
    assert_ne!(a.correlation_id, b.correlation_id);

    // Answer in reverse order; each reply carries the path it was for.
    for msg in [&b, &a] {
        let path = msg.request.url.rsplit('/').next().unwrap().to_string();
        assert!(router.deliver(&msg.correlation_id, Ok(HttpResponse::new(200).with_body(path))).await);
    }

    assert_eq!(first.await.unwrap().unwrap().body, "one");
    assert_eq!(second.await.unwrap().unwrap().body, "two");
    assert_eq!(router.pending().await, 0);
}

#[tokio::test]
async fn live_transport_errors_are_passed_through() {
    let (transport, mut outbound, router) = live();
    let task = tokio::spawn(async move { transport.send(get("http://localhost/x")).await });

    let msg = outbound.recv().await.unwrap();
    router
        .deliver(&msg.correlation_id, Err(TransportError::Network("refused".to_string())))
        .await;

    assert_eq!(
        task.await.unwrap(),
        Err(TransportError::Network("refused".to_string()))
    );
}

#[tokio::test(start_paused = true)]
async fn live_timeout_forgets_the_request() {
    let (tx, mut outbound) = mpsc::unbounded_channel();
    let router = ReplyRouter::new();
    let transport = LiveTransport::new(Arc::new(MpscOutboundChannel::new(tx)), router.clone())
        .with_timeout(Duration::from_secs(5));

    let result = transport.send(get("http://localhost/slow")).await;
    assert_eq!(result, Err(TransportError::Timeout));

    let msg = outbound.recv().await.unwrap();
    assert_eq!(router.pending().await, 0);
    assert!(!router.deliver(&msg.correlation_id, Ok(HttpResponse::new(200))).await);
}

#[tokio::test]
async fn closed_outbound_channel_fails_fast() {
    let (tx, rx) = mpsc::unbounded_channel();
    drop(rx);
    let router = ReplyRouter::new();
    let transport = LiveTransport::new(Arc::new(MpscOutboundChannel::new(tx)), router.clone());

    assert_eq!(
        transport.send(get("http://localhost/x")).await,
        Err(TransportError::ChannelClosed)
    );
    assert_eq!(router.pending().await, 0);
}

#[test]
fn transport_error_serializes_with_kind() {
    let v = serde_json::to_value(TransportError::Network("refused".to_string())).unwrap();
    assert_eq!(v, serde_json::json!({ "kind": "network", "message": "refused" }));
    let v = serde_json::to_value(TransportError::Timeout).unwrap();
    assert_eq!(v, serde_json::json!({ "kind": "timeout" }));
}
