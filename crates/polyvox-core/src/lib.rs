//! Polyvox core: multilingual text-to-speech on top of a pretrained model.
//!
//! The crate validates requests, chunks long documents, drives the model
//! through the [`SpeechModel`] boundary and post-processes the returned audio.

pub mod audio;
pub mod config;
pub mod error;
pub mod languages;
pub mod model;
pub mod params;
pub mod synthesis;
pub mod text;

pub use audio::Waveform;
pub use config::EngineConfig;
pub use error::{Error, Result};
pub use languages::{supported_languages, Language, DEFAULT_LANGUAGE};
pub use model::{RemoteSpeechModel, SpeechModel, SpeechRequest};
pub use params::{ChunkSize, GenerationParams};
pub use synthesis::{
    error_status, read_text_file, NarrationJob, OutputTarget, SpeechJob, SpeechKind,
    SpeechOutput, SpeechService, StatusReport,
};
pub use text::{chunk_text, split_sentences};
