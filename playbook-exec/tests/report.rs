use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use playbook_core::types::{Bundle, RequestRef, Stage};
use playbook_core::{parse_bundle_str, BundleFormat};
use playbook_exec::executor::{
    fold, request_playbooks, CollectingEventSink, ExecutorConfig, Playbook, StepEvent,
};
use playbook_exec::executor::report::ReportStatus;
use playbook_exec::transport::{LiveTransport, MockTransport, MpscOutboundChannel, ReplyRouter};
use playbook_exec::{EnvStack, Executor, HttpRequest, HttpResponse, RunReport, Transport, TransportError};
use tokio::sync::mpsc;

const BUNDLE: &str = r#"
before:
  - request: { method: get, url: "http://localhost/health" }
requests:
  login:
    request: { method: post, url: "http://localhost/login" }
    responses:
      "200":
        variableAssignments:
          - { name: token, from: response, in: body, path: /token }
  me:
    request: { method: get, url: "http://localhost/me" }
    auth: [session]
authenticationDetails:
  - session:
      type: bearer
      default: m
      methods:
        m:
          credential: "{{token}}"
          requests:
            - ref: { type: request, id: login }
"#;

fn executor() -> Executor {
    let bundle: Bundle = parse_bundle_str(BUNDLE, BundleFormat::Yaml).unwrap().bundle;
    let transport = MockTransport::new(HttpResponse::new(200).with_body(r#"{"token":"abc"}"#));
    Executor::new(Arc::new(bundle), Arc::new(transport), ExecutorConfig::default())
}

fn playbooks(exec: &Executor) -> Vec<Playbook> {
    request_playbooks(exec.bundle(), RequestRef::request("me")).unwrap()
}

#[tokio::test]
async fn nested_auth_run_lands_in_its_request_slot() {
    let exec = executor();
    let sink = CollectingEventSink::new();
    exec.execute(&playbooks(&exec), EnvStack::new(), &sink).await;
    let events = sink.into_events();

    let report = events.iter().fold(RunReport::new(), fold);

    let names: Vec<&str> = report.playbooks.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["Global Before", "Request"]);
    assert!(report.succeeded());

    let request = &report.playbooks[1].requests[0];
    assert_eq!(request.reference, Some(RequestRef::request("me")));
    assert_eq!(
        request.request.as_ref().unwrap().headers["Authorization"],
        "Bearer abc"
    );

    assert_eq!(request.auth.len(), 1);
    let auth = &request.auth[0];
    assert_eq!(auth.name, "session");
    assert!(auth.finished);
    assert_eq!(auth.run.playbooks[0].name, "session");
    assert_eq!(auth.run.playbooks[0].status, ReportStatus::Finished);
    let login = &auth.run.playbooks[0].requests[0];
    assert_eq!(login.reference, Some(RequestRef::request("login")));
    assert_eq!(login.assigned[0].env["token"], "abc");
    assert!(!login.failed());

    assert_eq!(RunReport::from_events(&events), report);
}

#[tokio::test]
async fn stream_yields_the_same_events_as_a_sink() {
    let exec = executor();
    let sink = CollectingEventSink::new();
    exec.execute(&playbooks(&exec), EnvStack::new(), &sink).await;
    let expected = sink.into_events();

    let streamed: Vec<StepEvent> = exec.stream(playbooks(&exec), EnvStack::new()).collect().await;
    assert_eq!(streamed, expected);
    assert!(matches!(
        streamed.last(),
        Some(StepEvent::PlaybookFinished { name }) if name == "Request"
    ));
}

#[test]
fn partial_stream_shows_running_playbook() {
    let events = [
        StepEvent::PlaybookStarted {
            name: "Scenario".to_string(),
        },
        StepEvent::RequestStarted { reference: None },
        StepEvent::HttpRequestPrepareError {
            error: "invalid url".to_string(),
        },
    ];
    let report = RunReport::from_events(&events);
    assert_eq!(report.playbooks[0].status, ReportStatus::Running);
    assert!(report.playbooks[0].requests[0].failed());
    assert!(!report.succeeded());
}

#[tokio::test]
async fn nested_auth_events_stream_while_login_is_in_flight() {
    let bundle: Bundle = parse_bundle_str(BUNDLE, BundleFormat::Yaml).unwrap().bundle;
    let (tx, mut outbound) = mpsc::unbounded_channel();
    let router = ReplyRouter::new();
    let transport = LiveTransport::new(Arc::new(MpscOutboundChannel::new(tx)), router.clone());
    let exec = Executor::new(Arc::new(bundle), Arc::new(transport), ExecutorConfig::default());
    let playbook = Playbook::new("Request", vec![Stage::reference(RequestRef::request("me"))]);
    let mut events = Box::pin(exec.stream(vec![playbook], EnvStack::new()));

    // The login request is waiting for its reply; everything before it must be visible.
    let login = outbound.recv().await.unwrap();
    assert!(login.request.url.ends_with("/login"));
    let mut seen = Vec::new();
    for _ in 0..6 {
        seen.push(events.next().await.unwrap().kind());
    }
    assert_eq!(
        seen,
        [
            "playbook-started",
            "auth-started",
            "playbook-started",
            "request-started",
            "payload-variables-substituted",
            "http-request-prepared",
        ]
    );

    assert!(
        router
            .deliver(
                &login.correlation_id,
                Ok(HttpResponse::new(200).with_body(r#"{"token":"abc"}"#)),
            )
            .await
    );
    let me = outbound.recv().await.unwrap();
    assert_eq!(me.request.headers["Authorization"], "Bearer abc");
    assert!(router.deliver(&me.correlation_id, Ok(HttpResponse::new(200))).await);

    let rest: Vec<StepEvent> = events.collect().await;
    assert!(matches!(
        rest.last(),
        Some(StepEvent::PlaybookFinished { name }) if name == "Request"
    ));
}

#[derive(Default)]
struct SlowCountingTransport {
    sent: AtomicUsize,
}

#[async_trait]
impl Transport for SlowCountingTransport {
    async fn send(&self, _request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.sent.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(100)).await;
        Ok(HttpResponse::new(200))
    }
}

#[tokio::test(start_paused = true)]
async fn dropping_the_stream_abandons_the_run() {
    let bundle: Bundle = parse_bundle_str(BUNDLE, BundleFormat::Yaml).unwrap().bundle;
    let transport = Arc::new(SlowCountingTransport::default());
    let exec = Executor::new(Arc::new(bundle), transport.clone(), ExecutorConfig::default());
    let stages = (0..5)
        .map(|_| Stage::reference(RequestRef::request("login")))
        .collect();

    let mut events = Box::pin(exec.stream(vec![Playbook::new("Scenario", stages)], EnvStack::new()));
    assert!(matches!(
        events.next().await,
        Some(StepEvent::PlaybookStarted { .. })
    ));
    drop(events);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(transport.sent.load(Ordering::SeqCst), 1);
}
