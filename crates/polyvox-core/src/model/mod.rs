//! The speech model boundary.
//!
//! Acoustic modeling and vocoding happen outside this crate. A backend only
//! has to turn one [`SpeechRequest`] into a [`Waveform`].

mod remote;

pub use remote::RemoteSpeechModel;

use async_trait::async_trait;
use std::path::PathBuf;

use crate::audio::Waveform;
use crate::error::Result;
use crate::languages::Language;
use crate::params::GenerationParams;

/// One model invocation.
#[derive(Debug, Clone)]
pub struct SpeechRequest {
    pub text: String,
    pub language: Language,
    pub exaggeration: f32,
    pub cfg_weight: f32,
    pub temperature: f32,
    /// Reference recording for voice cloning.
    pub reference_audio: Option<PathBuf>,
}

impl SpeechRequest {
    pub fn new(text: impl Into<String>, language: Language, params: &GenerationParams) -> Self {
        Self {
            text: text.into(),
            language,
            exaggeration: params.exaggeration,
            cfg_weight: params.cfg_weight,
            temperature: params.temperature,
            reference_audio: None,
        }
    }

    pub fn with_reference_audio(mut self, path: Option<PathBuf>) -> Self {
        self.reference_audio = path;
        self
    }
}

#[async_trait]
pub trait SpeechModel: Send + Sync {
    /// Output sample rate of every waveform this model returns.
    fn sample_rate(&self) -> u32;

    async fn generate(&self, request: &SpeechRequest) -> Result<Waveform>;
}
