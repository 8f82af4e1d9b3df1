use crate::{
    error::{MidiGenError, Result},
    io::net::DEFAULT_REQUEST_TIMEOUT,
    types::WaitOptions,
};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.suno.ai/v1";

/// Client settings, usually loaded from the environment.
///
/// | Env Var                          | Default                   |
/// |----------------------------------|---------------------------|
/// | `MIDI_GEN_API_KEY`               | (required)                |
/// | `MIDI_GEN_BASE_URL`              | `https://api.suno.ai/v1`  |
/// | `MIDI_GEN_REQUEST_TIMEOUT_SECS`  | `3600`                    |
/// | `MIDI_GEN_POLL_INTERVAL_SECS`    | `5`                       |
/// | `MIDI_GEN_TIMEOUT_SECS`          | `300`                     |
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_key: String,
    pub base_url: String,
    pub request_timeout: Duration,
    pub wait: WaitOptions,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            wait: WaitOptions::default(),
        }
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key/value source. A missing API key is left
    /// empty so callers can supply it some other way before building a client.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut cfg = Self::new(lookup("MIDI_GEN_API_KEY").unwrap_or_default());

        if let Some(url) = lookup("MIDI_GEN_BASE_URL").filter(|s| !s.trim().is_empty()) {
            cfg.base_url = url.trim().to_string();
        }
        if let Some(secs) = parse_secs(&lookup, "MIDI_GEN_REQUEST_TIMEOUT_SECS")? {
            cfg.request_timeout = secs;
        }
        if let Some(secs) = parse_secs(&lookup, "MIDI_GEN_POLL_INTERVAL_SECS")? {
            cfg.wait.poll_interval = secs;
        }
        if let Some(secs) = parse_secs(&lookup, "MIDI_GEN_TIMEOUT_SECS")? {
            cfg.wait.timeout = secs;
        }
        Ok(cfg)
    }
}

fn parse_secs(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<Duration>> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(|s| Some(Duration::from_secs(s)))
            .map_err(|_| MidiGenError::Config(format!("{key} must be a whole number of seconds, got `{raw}`"))),
    }
}
