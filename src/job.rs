//! Generation job status and the polling loop that waits for a terminal one.

use crate::{
    error::{MidiGenError, Result},
    types::WaitOptions,
};
use serde_json::Value;
use std::{thread, time::Instant};
use tracing::{debug, info, warn};

/// Status of a remote generation job as seen in one status report.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Running,
    Completed,
    Failed,
    /// Any other status value, including a missing or non-string one.
    /// Treated as still in progress.
    Unrecognized(Option<String>),
}

impl JobState {
    pub fn from_report(report: &Value) -> Self {
        match report.get("status").and_then(Value::as_str) {
            Some("completed") => JobState::Completed,
            Some("failed") => JobState::Failed,
            Some("pending") => JobState::Pending,
            Some("running") => JobState::Running,
            Some(other) => JobState::Unrecognized(Some(other.to_string())),
            None => JobState::Unrecognized(None),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }
}

/// Something that can fetch the current status report of a job.
pub trait StatusSource {
    fn fetch_status(&self, job_id: &str) -> Result<Value>;
}

/// Poll `source` until the job completes, fails, or `opts.timeout` elapses.
///
/// Returns the full status payload of the completed job. Poll errors end the
/// wait immediately.
pub fn wait_for_completion<S>(source: &S, job_id: &str, opts: &WaitOptions) -> Result<Value>
where
    S: StatusSource + ?Sized,
{
    let start = Instant::now();
    let mut polls = 0u32;

    while start.elapsed() < opts.timeout {
        let report = source.fetch_status(job_id)?;
        polls += 1;

        match JobState::from_report(&report) {
            JobState::Completed => {
                info!(job_id, polls, "generation completed");
                return Ok(report);
            }
            JobState::Failed => {
                let detail = error_detail(&report);
                warn!(job_id, %detail, "generation failed");
                return Err(MidiGenError::JobFailed {
                    job_id: job_id.to_string(),
                    detail,
                });
            }
            state => {
                debug!(job_id, polls, ?state, "generation still in progress");
                thread::sleep(opts.poll_interval);
            }
        }
    }

    Err(MidiGenError::Timeout {
        job_id: job_id.to_string(),
        timeout: opts.timeout,
    })
}

fn error_detail(report: &Value) -> String {
    match report.get("error") {
        Some(Value::String(s)) => s.clone(),
        None | Some(Value::Null) => "no error detail reported".to_string(),
        Some(other) => other.to_string(),
    }
}

/// URL of the rendered audio in a completed status payload.
pub fn audio_url(report: &Value) -> Option<&str> {
    report.get("audio_url").and_then(Value::as_str)
}
