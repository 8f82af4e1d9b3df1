use httpmock::prelude::*;
use serde_json::{json, Value};
use std::{cell::RefCell, collections::VecDeque, time::Duration};

use midi_gen_client::{wait_for_completion, JobClient, MidiGenError, Result, StatusSource, WaitOptions};

/// Replays canned status reports; the last one repeats forever.
struct Scripted {
    reports: RefCell<VecDeque<Value>>,
    polls: RefCell<Vec<String>>,
}

impl Scripted {
    fn new(statuses: &[&str]) -> Self {
        Self {
            reports: RefCell::new(
                statuses
                    .iter()
                    .map(|s| json!({"status": s, "error": "render node crashed"}))
                    .collect(),
            ),
            polls: RefCell::new(Vec::new()),
        }
    }

    fn poll_count(&self) -> usize {
        self.polls.borrow().len()
    }
}

impl StatusSource for Scripted {
    fn fetch_status(&self, job_id: &str) -> Result<Value> {
        self.polls.borrow_mut().push(job_id.to_string());
        let mut reports = self.reports.borrow_mut();
        let report = if reports.len() > 1 {
            reports.pop_front().unwrap()
        } else {
            reports.front().cloned().unwrap()
        };
        Ok(report)
    }
}

fn no_delay() -> WaitOptions {
    WaitOptions {
        timeout: Duration::from_secs(5),
        poll_interval: Duration::ZERO,
    }
}

#[test]
fn returns_completed_payload_after_three_polls() {
    let source = Scripted::new(&["running", "running", "completed"]);

    let report = wait_for_completion(&source, "j-1", &no_delay()).expect("wait failed");

    assert_eq!(source.poll_count(), 3);
    assert_eq!(report["status"], "completed");
    assert!(source.polls.borrow().iter().all(|id| id == "j-1"));
}

#[test]
fn failed_status_stops_after_two_polls() {
    let source = Scripted::new(&["running", "failed", "completed"]);

    let err = wait_for_completion(&source, "j-2", &no_delay()).unwrap_err();

    assert_eq!(source.poll_count(), 2);
    match err {
        MidiGenError::JobFailed { job_id, detail } => {
            assert_eq!(job_id, "j-2");
            assert_eq!(detail, "render node crashed");
        }
        other => panic!("expected job failure, got: {other}"),
    }
}

#[test]
fn unknown_statuses_keep_polling() {
    let source = Scripted::new(&["queued", "", "COMPLETED", "pending", "completed"]);

    wait_for_completion(&source, "j-3", &no_delay()).expect("wait failed");

    assert_eq!(source.poll_count(), 5);
}

#[test]
fn times_out_within_the_poll_bound() {
    let source = Scripted::new(&["running"]);
    let unit = Duration::from_millis(40);
    let opts = WaitOptions {
        timeout: unit,
        poll_interval: unit,
    };

    let err = wait_for_completion(&source, "j-4", &opts).unwrap_err();

    assert!(matches!(err, MidiGenError::Timeout { ref job_id, .. } if job_id == "j-4"));
    // ceil(timeout / interval) + 1
    assert!(source.poll_count() >= 1);
    assert!(source.poll_count() <= 2, "polled {} times", source.poll_count());
}

#[test]
fn zero_timeout_never_polls() {
    let source = Scripted::new(&["completed"]);
    let opts = WaitOptions {
        timeout: Duration::ZERO,
        poll_interval: Duration::ZERO,
    };

    let err = wait_for_completion(&source, "j-5", &opts).unwrap_err();

    assert!(matches!(err, MidiGenError::Timeout { .. }));
    assert_eq!(source.poll_count(), 0);
}

#[test]
fn client_status_returns_report_verbatim() {
    let server = MockServer::start();
    let status = server.mock(|when, then| {
        when.method(GET)
            .path("/generations/j-9")
            .header("authorization", "Bearer sk-poll")
            .header("content-type", "application/json");
        then.status(200)
            .json_body(json!({"status": "running", "progress": 0.4, "eta": null}));
    });

    let client = JobClient::with_base_url("sk-poll", &server.base_url()).unwrap();
    let report = client.get_generation_status("j-9").expect("status failed");

    status.assert_hits(1);
    assert_eq!(report, json!({"status": "running", "progress": 0.4, "eta": null}));
}

#[test]
fn client_wait_reports_server_failure() {
    let server = MockServer::start();
    let status = server.mock(|when, then| {
        when.method(GET).path("/generations/j-10");
        then.status(200)
            .json_body(json!({"status": "failed", "error": "unsupported tempo map"}));
    });

    let client = JobClient::with_base_url("sk-poll", &server.base_url()).unwrap();
    let err = client
        .wait_for_completion("j-10", &WaitOptions::default())
        .unwrap_err();

    status.assert_hits(1);
    assert_eq!(err.to_string(), "Generation j-10 failed: unsupported tempo map");
}

#[test]
fn poll_error_ends_the_wait() {
    let server = MockServer::start();
    let status = server.mock(|when, then| {
        when.method(GET).path("/generations/j-11");
        then.status(503).body("maintenance");
    });

    let client = JobClient::with_base_url("sk-poll", &server.base_url()).unwrap();
    let err = client.wait_for_completion("j-11", &no_delay()).unwrap_err();

    status.assert_hits(1);
    match err {
        MidiGenError::Remote {
            operation,
            status,
            body,
        } => {
            assert_eq!(operation, "status");
            assert_eq!(status, 503);
            assert_eq!(body, "maintenance");
        }
        other => panic!("expected remote error, got: {other}"),
    }
}
