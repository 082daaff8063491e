use std::sync::Arc;

use async_trait::async_trait;
use playbook_core::types::{Bundle, RequestRef, Stage};
use playbook_core::{parse_bundle_str, BundleFormat};
use playbook_exec::env::EnvStackEntry;
use playbook_exec::executor::{
    scenario_playbooks, CollectingEventSink, ExecutorConfig, FailurePolicy, Interpreter, Playbook,
    PlaybookStatus, StepEvent,
};
use playbook_exec::transport::MockTransport;
use playbook_exec::{EnvStack, HttpRequest, HttpResponse, Transport, TransportError};
use serde_json::json;

fn bundle(yaml: &str) -> Bundle {
    parse_bundle_str(yaml, BundleFormat::Yaml).unwrap().bundle
}

fn kinds(events: &[StepEvent]) -> Vec<&'static str> {
    events.iter().map(StepEvent::kind).collect()
}

fn seed() -> EnvStack {
    EnvStack::from(vec![EnvStackEntry::new(
        "functions",
        [("$random".to_string(), json!("1"))].into(),
    )])
}

async fn run(
    bundle: &Bundle,
    transport: &dyn Transport,
    config: ExecutorConfig,
    playbooks: &[Playbook],
    seed: EnvStack,
) -> (playbook_exec::RunOutcome, Vec<StepEvent>) {
    let sink = CollectingEventSink::new();
    let outcome = Interpreter::new(bundle, transport, &config)
        .execute(playbooks, seed, &sink)
        .await;
    (outcome, sink.into_events())
}

/// Answers by URL path suffix; anything unmatched gets a 404.
struct RoutingTransport {
    routes: Vec<(&'static str, Result<HttpResponse, TransportError>)>,
}

#[async_trait]
impl Transport for RoutingTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let path = url::Url::parse(&request.url).unwrap().path().to_string();
        self.routes
            .iter()
            .find(|(suffix, _)| path.ends_with(suffix))
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(|| Ok(HttpResponse::new(404)))
    }
}

const GET_USER: &str = r#"
operations:
  getUser:
    operationId: getUser
    request:
      request:
        method: get
        url: "http://localhost:8080/users/{id}"
        parameters:
          path: { id: "7" }
    scenarios:
      - key: happy.path
        requests:
          - ref: { type: operation, id: getUser }
"#;

#[tokio::test]
async fn single_operation_scenario_emits_expected_sequence() {
    let b = bundle(GET_USER);
    let playbooks = scenario_playbooks(&b, "getUser", None).unwrap();
    let transport = MockTransport::new(HttpResponse::new(200).with_body("{}"));

    let (outcome, events) = run(&b, &transport, ExecutorConfig::default(), &playbooks, seed()).await;

    assert_eq!(
        kinds(&events),
        [
            "playbook-started",
            "request-started",
            "payload-variables-substituted",
            "http-request-prepared",
            "http-response-received",
            "playbook-finished",
        ]
    );
    assert_eq!(
        events[0],
        StepEvent::PlaybookStarted {
            name: "Scenario".to_string()
        }
    );
    assert_eq!(
        events[1],
        StepEvent::RequestStarted {
            reference: Some(RequestRef::operation("getUser"))
        }
    );
    match &events[3] {
        StepEvent::HttpRequestPrepared {
            request,
            operation_id,
        } => {
            assert_eq!(request.method, "GET");
            assert_eq!(request.url, "http://localhost:8080/users/7");
            assert_eq!(operation_id.as_deref(), Some("getUser"));
        }
        other => panic!("unexpected event {other:?}"),
    }
    assert!(outcome.succeeded());
}

#[tokio::test]
async fn missing_variable_is_reported_and_left_in_body() {
    let b = bundle(
        r#"
requests:
  create:
    request:
      method: post
      url: "http://localhost/items"
      body:
        value: { name: "{{undeclaredVar}}", seed: "{{$random}}" }
"#,
    );
    let playbooks = [Playbook::new("Scenario", vec![Stage::reference(RequestRef::request("create"))])];
    let (_, events) = run(&b, &MockTransport::default(), ExecutorConfig::default(), &playbooks, seed()).await;

    let (found, missing) = events
        .iter()
        .find_map(|e| match e {
            StepEvent::PayloadVariablesSubstituted { found, missing, .. } => Some((found, missing)),
            _ => None,
        })
        .unwrap();
    assert_eq!(found, &["$random"]);
    assert_eq!(missing, &["undeclaredVar"]);

    let body = events
        .iter()
        .find_map(|e| match e {
            StepEvent::HttpRequestPrepared { request, .. } => request.body.clone(),
            _ => None,
        })
        .unwrap();
    assert!(body.contains("{{undeclaredVar}}"));
    assert!(body.contains(r#""seed":"1""#));
}

const TWO_REQUESTS: &str = r#"
requests:
  login:
    request:
      method: post
      url: "http://localhost/login"
    responses:
      "200":
        variableAssignments:
          - { name: token, from: response, in: body, path: /token }
          - { name: nope, from: response, in: body, path: /does/not/exist }
  me:
    request:
      method: get
      url: "http://localhost/me"
      parameters:
        header: { X-Token: "{{token}}" }
"#;

#[tokio::test]
async fn events_of_earlier_playbooks_precede_later_stages() {
    let b = bundle(TWO_REQUESTS);
    let login = Stage::reference(RequestRef::request("login"));
    let me = Stage::reference(RequestRef::request("me"));
    let playbooks = [
        Playbook::new("Before", vec![login]),
        Playbook::new("Scenario", vec![me.clone(), me]),
    ];
    let (_, events) = run(&b, &MockTransport::default(), ExecutorConfig::default(), &playbooks, seed()).await;

    let starts: Vec<usize> = events
        .iter()
        .enumerate()
        .filter(|(_, e)| matches!(e, StepEvent::RequestStarted { .. }))
        .map(|(i, _)| i)
        .collect();
    assert_eq!(starts.len(), 3);
    let before_finished = events
        .iter()
        .position(|e| matches!(e, StepEvent::PlaybookFinished { name } if name == "Before"))
        .unwrap();
    assert!(before_finished < starts[1]);
}

#[tokio::test]
async fn failed_assignment_does_not_stop_the_playbook() {
    let b = bundle(TWO_REQUESTS);
    let transport = RoutingTransport {
        routes: vec![("/login", Ok(HttpResponse::new(200).with_body(r#"{"token":"t-1"}"#)))],
    };
    let playbooks = [Playbook::new(
        "Scenario",
        vec![
            Stage::reference(RequestRef::request("login")),
            Stage::reference(RequestRef::request("me")),
        ],
    )];
    let (outcome, events) = run(&b, &transport, ExecutorConfig::default(), &playbooks, seed()).await;

    assert_eq!(
        &kinds(&events)[..8],
        [
            "playbook-started",
            "request-started",
            "payload-variables-substituted",
            "http-request-prepared",
            "http-response-received",
            "variables-assigned",
            "variables-assignment-error",
            "request-started",
        ]
    );
    match &events[6] {
        StepEvent::VariablesAssignmentError { name, error } => {
            assert_eq!(name, "nope");
            assert!(error.contains("/does/not/exist"));
        }
        other => panic!("unexpected event {other:?}"),
    }

    let me = events
        .iter()
        .rev()
        .find_map(|e| match e {
            StepEvent::HttpRequestPrepared { request, .. } => Some(request),
            _ => None,
        })
        .unwrap();
    assert_eq!(me.headers["X-Token"], "t-1");
    assert_eq!(outcome.stack.lookup("token"), Some(&json!("t-1")));
    assert!(outcome.succeeded());
}

#[tokio::test]
async fn http_error_status_is_a_response_not_a_failure() {
    let b = bundle(GET_USER);
    let playbooks = scenario_playbooks(&b, "getUser", Some("happy.path")).unwrap();
    let transport = MockTransport::new(HttpResponse::new(503));
    let (outcome, events) = run(&b, &transport, ExecutorConfig::default(), &playbooks, seed()).await;

    assert!(events
        .iter()
        .any(|e| matches!(e, StepEvent::HttpResponseReceived { response } if response.status == 503)));
    assert!(outcome.succeeded());
}

#[tokio::test]
async fn transport_error_aborts_the_playbook() {
    let b = bundle(GET_USER);
    let playbooks = scenario_playbooks(&b, "getUser", None).unwrap();
    let transport = RoutingTransport {
        routes: vec![("/users/7", Err(TransportError::Timeout))],
    };
    let (outcome, events) = run(&b, &transport, ExecutorConfig::default(), &playbooks, seed()).await;

    assert_eq!(
        kinds(&events)[4..],
        ["http-error-received", "playbook-aborted"]
    );
    assert_eq!(outcome.playbooks[0].status, PlaybookStatus::Aborted);
}

#[tokio::test]
async fn stage_environment_applies_to_one_stage_only() {
    let b = bundle(
        r#"
before:
  - request: { method: get, url: "http://localhost/{{segment}}" }
    environment: { segment: "scoped" }
  - request: { method: get, url: "http://localhost/{{segment}}" }
"#,
    );
    let playbooks = [Playbook::new("Global Before", b.before.clone())];
    let (outcome, events) = run(&b, &MockTransport::default(), ExecutorConfig::default(), &playbooks, seed()).await;

    let substituted: Vec<(Vec<String>, Vec<String>)> = events
        .iter()
        .filter_map(|e| match e {
            StepEvent::PayloadVariablesSubstituted { found, missing, .. } => {
                Some((found.clone(), missing.clone()))
            }
            _ => None,
        })
        .collect();
    assert_eq!(substituted[0], (vec!["segment".to_string()], vec![]));
    assert_eq!(substituted[1], (vec![], vec!["segment".to_string()]));
    let first_url = events
        .iter()
        .find_map(|e| match e {
            StepEvent::HttpRequestPrepared { request, .. } => Some(request.url.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(first_url, "http://localhost/scoped");
    assert!(outcome.stack.lookup("segment").is_none());
}

fn failing_then_ok() -> (Bundle, Vec<Playbook>) {
    let b = bundle(
        r#"
requests:
  broken:
    request: { method: get, url: "{{host}}/x" }
  ok:
    request: { method: get, url: "http://localhost/ok" }
"#,
    );
    let broken = Stage::reference(RequestRef::request("broken"));
    let ok = Stage::reference(RequestRef::request("ok"));
    let playbooks = vec![
        Playbook::new("Before", vec![broken, ok.clone()]),
        Playbook::new("Scenario", vec![ok]),
    ];
    (b, playbooks)
}

fn config(policy: FailurePolicy) -> ExecutorConfig {
    ExecutorConfig {
        failure_policy: policy,
    }
}

fn request_count(events: &[StepEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, StepEvent::RequestStarted { .. }))
        .count()
}

#[tokio::test]
async fn abort_playbook_policy_runs_later_playbooks() {
    let (b, playbooks) = failing_then_ok();
    let (outcome, events) = run(&b, &MockTransport::default(), config(FailurePolicy::AbortPlaybook), &playbooks, seed()).await;

    assert_eq!(request_count(&events), 2);
    assert_eq!(outcome.playbooks[0].status, PlaybookStatus::Aborted);
    assert_eq!(outcome.playbooks[1].status, PlaybookStatus::Finished);
    assert!(!outcome.succeeded());
}

#[tokio::test]
async fn continue_stages_policy_runs_remaining_stages() {
    let (b, playbooks) = failing_then_ok();
    let (outcome, events) = run(&b, &MockTransport::default(), config(FailurePolicy::ContinueStages), &playbooks, seed()).await;

    assert_eq!(request_count(&events), 3);
    assert_eq!(outcome.playbooks[0].status, PlaybookStatus::Aborted);
    assert_eq!(outcome.playbooks[1].status, PlaybookStatus::Finished);
}

#[tokio::test]
async fn abort_run_policy_skips_later_playbooks() {
    let (b, playbooks) = failing_then_ok();
    let (outcome, events) = run(&b, &MockTransport::default(), config(FailurePolicy::AbortRun), &playbooks, seed()).await;

    assert_eq!(request_count(&events), 1);
    assert_eq!(outcome.playbooks[1].status, PlaybookStatus::Skipped);
    assert!(!events
        .iter()
        .any(|e| matches!(e, StepEvent::PlaybookStarted { name } if name == "Scenario")));
}

#[tokio::test]
async fn unresolvable_reference_fails_the_stage() {
    let b = bundle("requests: {}");
    let playbooks = [Playbook::new("Scenario", vec![Stage::reference(RequestRef::request("gone"))])];
    let (_, events) = run(&b, &MockTransport::default(), ExecutorConfig::default(), &playbooks, seed()).await;

    assert_eq!(
        kinds(&events),
        [
            "playbook-started",
            "request-started",
            "http-request-prepare-error",
            "playbook-aborted",
        ]
    );
}

#[tokio::test]
async fn mock_runs_are_deterministic() {
    let b = Arc::new(bundle(TWO_REQUESTS));
    let playbooks = [Playbook::new(
        "Scenario",
        vec![
            Stage::reference(RequestRef::request("login")),
            Stage::reference(RequestRef::request("me")),
        ],
    )];
    let transport = MockTransport::new(HttpResponse::new(200).with_body(r#"{"token":"x"}"#));

    let (_, first) = run(&b, &transport, ExecutorConfig::default(), &playbooks, seed()).await;
    let (_, second) = run(&b, &transport, ExecutorConfig::default(), &playbooks, seed()).await;

    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}
