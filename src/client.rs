use crate::{
    config::{ClientConfig, DEFAULT_BASE_URL},
    error::{MidiGenError, Result},
    io::{
        form::encode_tags,
        midi::MidiAsset,
        net::{download_to_file, ensure_ok, http_client, DEFAULT_REQUEST_TIMEOUT},
    },
    job::{self, audio_url, StatusSource},
    types::{GenerationJob, GenerationParams, UploadOptions, UploadResult, WaitOptions},
};
use reqwest::{
    blocking::{
        multipart::{Form, Part},
        Client,
    },
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
};
use serde::Serialize;
use serde_json::Value;
use std::{path::Path, time::Duration};
use tracing::{debug, info, warn};

const MIDI_MIME: &str = "audio/midi";

/// Drives one generation job against the remote service: upload, generate,
/// poll, download. Holds the credentials for its whole lifetime.
#[derive(Debug, Clone)]
pub struct JobClient {
    http: Client,
    base_url: String,
    /// Token plus JSON content type, for generate and status calls.
    json_headers: HeaderMap,
    /// Token only. Multipart uploads must let the transport set the
    /// content type with its boundary.
    auth_headers: HeaderMap,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    midi_id: Option<&'a Value>,
    style: &'a str,
    duration: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    prompt: Option<&'a str>,
}

impl JobClient {
    pub fn new(token: &str) -> Result<Self> {
        Self::with_base_url(token, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(token: &str, base_url: &str) -> Result<Self> {
        Self::build(token, base_url, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn from_config(cfg: &ClientConfig) -> Result<Self> {
        Self::build(&cfg.api_key, &cfg.base_url, cfg.request_timeout)
    }

    fn build(token: &str, base_url: &str, request_timeout: Duration) -> Result<Self> {
        let auth_headers = bearer_headers(token)?;
        let mut json_headers = auth_headers.clone();
        json_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Ok(Self {
            http: http_client(request_timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            json_headers,
            auth_headers,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Upload a `.mid`/`.midi` file. The file is validated and read before
    /// any request is made.
    pub fn upload_midi(&self, path: impl AsRef<Path>, opts: &UploadOptions) -> Result<UploadResult> {
        let asset = MidiAsset::open(path.as_ref())?;
        let file_name = asset.file_name();
        let size = asset.bytes().len();

        debug!(path = %asset.path().display(), size, "uploading MIDI");
        let part = Part::bytes(asset.into_bytes())
            .file_name(file_name.clone())
            .mime_str(MIDI_MIME)?;
        let mut form = Form::new().part("midi_file", part);

        if let Some(title) = non_empty(&opts.title) {
            form = form.text("title", title.to_string());
        }
        if let Some(style) = non_empty(&opts.style) {
            form = form.text("style", style.to_string());
        }
        if let Some(tags) = opts.tags.as_ref().filter(|t| !t.is_empty()) {
            // one field holding a JSON array, not a repeated field
            form = form.text("tags", encode_tags(tags)?);
        }

        let resp = self
            .http
            .post(self.url("uploads/midi"))
            .headers(self.auth_headers.clone())
            .multipart(form)
            .send()?;

        let result: UploadResult = ensure_ok("upload", resp)?.json()?;
        info!(file = %file_name, midi_id = ?result.midi_id(), "MIDI uploaded");
        Ok(result)
    }

    /// Trigger generation for an already uploaded MIDI. The id is sent in
    /// the JSON form the upload returned it; `None` is sent as `null`.
    pub fn generate(&self, midi_id: Option<&Value>, params: &GenerationParams) -> Result<GenerationJob> {
        let body = GenerateRequest {
            midi_id,
            style: &params.style,
            duration: params.duration_secs,
            prompt: params.prompt.as_deref().filter(|p| !p.is_empty()),
        };

        debug!(?midi_id, style = %params.style, duration = params.duration_secs, "requesting generation");
        let resp = self
            .http
            .post(self.url("generate"))
            .headers(self.json_headers.clone())
            .json(&body)
            .send()?;

        let job: GenerationJob = ensure_ok("generate", resp)?.json()?;
        info!(job_id = ?job.job_id(), "generation started");
        Ok(job)
    }

    /// Upload `path` then trigger generation from the returned `midi_id`.
    pub fn generate_from_midi(
        &self,
        path: impl AsRef<Path>,
        params: &GenerationParams,
    ) -> Result<GenerationJob> {
        let upload = self.upload_midi(path, &UploadOptions::default())?;
        if upload.midi_id().is_none() {
            warn!("upload response has no midi_id, generating with a null id");
        }
        self.generate(upload.midi_id(), params)
    }

    /// Current status report of a job, returned verbatim.
    pub fn get_generation_status(&self, job_id: &str) -> Result<Value> {
        debug!(job_id, "checking generation status");
        let resp = self
            .http
            .get(self.url(&format!("generations/{job_id}")))
            .headers(self.json_headers.clone())
            .send()?;

        Ok(ensure_ok("status", resp)?.json()?)
    }

    pub fn wait_for_completion(&self, job_id: &str, opts: &WaitOptions) -> Result<Value> {
        job::wait_for_completion(self, job_id, opts)
    }

    /// Fetch the rendered audio to `output`, overwriting any existing file.
    /// No credentials are sent with this request. Returns the bytes written.
    pub fn download_result(&self, result_url: &str, output: impl AsRef<Path>) -> Result<u64> {
        download_to_file(&self.http, result_url, output.as_ref())
    }

    /// Generate from `path`, wait for the job, and download its audio to
    /// `output`. Returns the completed status payload.
    pub fn render(
        &self,
        path: impl AsRef<Path>,
        params: &GenerationParams,
        wait: &WaitOptions,
        output: impl AsRef<Path>,
    ) -> Result<Value> {
        let job = self.generate_from_midi(path, params)?;
        let job_id = job.job_id_path().ok_or(MidiGenError::MissingField("job_id"))?;

        let report = self.wait_for_completion(&job_id, wait)?;
        let url = audio_url(&report).ok_or(MidiGenError::MissingField("audio_url"))?;

        self.download_result(url, output)?;
        Ok(report)
    }
}

impl StatusSource for JobClient {
    fn fetch_status(&self, job_id: &str) -> Result<Value> {
        self.get_generation_status(job_id)
    }
}

fn bearer_headers(token: &str) -> Result<HeaderMap> {
    if token.trim().is_empty() {
        return Err(MidiGenError::MissingToken);
    }
    let mut value =
        HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| MidiGenError::MissingToken)?;
    value.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, value);
    Ok(headers)
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}
