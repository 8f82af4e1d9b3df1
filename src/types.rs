use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_STYLE: &str = "pop";
pub const DEFAULT_DURATION_SECS: u32 = 180;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(300);

/// Optional form fields sent alongside an uploaded MIDI file.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct UploadOptions {
    pub title: Option<String>,
    pub style: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl UploadOptions {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }
}

/// Server response to an upload, kept exactly as parsed.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UploadResult(pub Value);

impl UploadResult {
    /// The stored MIDI's identifier, in whatever JSON form the server used.
    pub fn midi_id(&self) -> Option<&Value> {
        self.0.get("midi_id").filter(|v| !v.is_null())
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

/// Parameters passed once when a generation is triggered.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerationParams {
    pub style: String,
    pub prompt: Option<String>,
    pub duration_secs: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            style: DEFAULT_STYLE.into(),
            prompt: None,
            duration_secs: DEFAULT_DURATION_SECS,
        }
    }
}

impl GenerationParams {
    pub fn style(mut self, style: impl Into<String>) -> Self {
        self.style = style.into();
        self
    }

    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    pub fn duration_secs(mut self, secs: u32) -> Self {
        self.duration_secs = secs;
        self
    }
}

/// Server response to a generate call, kept exactly as parsed.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GenerationJob(pub Value);

impl GenerationJob {
    pub fn job_id(&self) -> Option<&Value> {
        self.0.get("job_id").filter(|v| !v.is_null())
    }

    /// The job id as it appears in a status URL. Numbers are rendered in
    /// decimal; other non-string ids have no path form.
    pub fn job_id_path(&self) -> Option<String> {
        match self.job_id()? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

/// Bounds for [`crate::wait_for_completion`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WaitOptions {
    /// Wall-clock budget measured from the first poll.
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_WAIT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}
