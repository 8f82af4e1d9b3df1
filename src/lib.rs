//! # midi-gen-client
//!
//! Blocking client for a remote music-generation service: upload a MIDI
//! file, trigger generation, poll the job until it finishes, and download
//! the rendered audio.

pub mod client;
pub mod config;
pub mod error;
pub mod io;
pub mod job;
pub mod types;

pub use crate::{
    client::JobClient,
    config::{ClientConfig, DEFAULT_BASE_URL},
    error::{MidiGenError, Result},
    io::{
        midi::MidiAsset,
        net::DOWNLOAD_CHUNK_SIZE,
        progress::{clear_download_progress_callback, set_download_progress_callback},
    },
    job::{audio_url, wait_for_completion, JobState, StatusSource},
    types::{GenerationJob, GenerationParams, UploadOptions, UploadResult, WaitOptions},
};
