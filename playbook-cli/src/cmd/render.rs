use std::fmt::Write as _;

use playbook_exec::executor::report::{PlaybookReport, ReportStatus, RequestReport};
use playbook_exec::RunReport;

/// Renders a run summary for the terminal. Credential runs are nested under the request
/// that needed them.
pub fn render_report(report: &RunReport) -> String {
    let mut out = String::new();
    render_run(&mut out, report, 0);
    out
}

fn render_run(out: &mut String, report: &RunReport, depth: usize) {
    for playbook in &report.playbooks {
        render_playbook(out, playbook, depth);
    }
}

fn render_playbook(out: &mut String, playbook: &PlaybookReport, depth: usize) {
    let status = match playbook.status {
        ReportStatus::Running => "running",
        ReportStatus::Finished => "finished",
        ReportStatus::Aborted => "aborted",
    };
    let _ = writeln!(out, "{}{}: {status}", indent(depth), playbook.name);
    for request in &playbook.requests {
        render_request(out, request, depth + 1);
    }
}

fn render_request(out: &mut String, request: &RequestReport, depth: usize) {
    let pad = indent(depth);
    let label = request
        .reference
        .as_ref()
        .map(ToString::to_string)
        .or_else(|| request.operation_id.as_ref().map(|id| format!("external:{id}")))
        .unwrap_or_else(|| "external".to_string());

    let outcome = match (&request.response, &request.error, &request.prepare_error) {
        (Some(resp), _, _) => resp.status.to_string(),
        (_, Some(err), _) => format!("error: {err}"),
        (_, _, Some(err)) => format!("not sent: {err}"),
        _ => "not sent".to_string(),
    };
    match &request.request {
        Some(req) => {
            let _ = writeln!(out, "{pad}{label} {} {} -> {outcome}", req.method, req.url);
        }
        None => {
            let _ = writeln!(out, "{pad}{label} -> {outcome}");
        }
    }

    let detail = indent(depth + 1);
    for auth in &request.auth {
        let state = if auth.finished { "" } else { " (incomplete)" };
        let _ = writeln!(out, "{detail}auth {}{state}", auth.name);
        render_run(out, &auth.run, depth + 2);
    }
    if !request.missing.is_empty() {
        let _ = writeln!(out, "{detail}missing: {}", request.missing.join(", "));
    }
    let assigned: Vec<&str> = request
        .assigned
        .iter()
        .flat_map(|entry| entry.env.keys().map(String::as_str))
        .collect();
    if !assigned.is_empty() {
        let _ = writeln!(out, "{detail}assigned: {}", assigned.join(", "));
    }
    for err in &request.assignment_errors {
        let _ = writeln!(out, "{detail}assignment {} failed: {}", err.name, err.error);
    }
}

fn indent(depth: usize) -> String {
    "  ".repeat(depth)
}
