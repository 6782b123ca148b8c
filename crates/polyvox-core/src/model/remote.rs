//! HTTP model worker backend.
//!
//! The worker hosts the pretrained multilingual model and exposes two routes:
//! `GET /info` describing the loaded model and `POST /generate` returning a
//! WAV body for one request.

use std::time::Instant;

use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{SpeechModel, SpeechRequest};
use crate::audio::{decode_wav, Waveform};
use crate::config::EngineConfig;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct ModelInfo {
    pub sample_rate: u32,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub languages: Vec<String>,
}

#[derive(Debug, Serialize)]
struct GenerateBody<'a> {
    text: &'a str,
    language_id: &'a str,
    exaggeration: f32,
    cfg_weight: f32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    audio_prompt_base64: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    audio_prompt_filename: Option<String>,
}

pub struct RemoteSpeechModel {
    client: reqwest::Client,
    endpoint: String,
    info: ModelInfo,
}

impl RemoteSpeechModel {
    /// Connect to the worker and read the loaded model's metadata.
    pub async fn connect(config: &EngineConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .no_proxy()
            .timeout(config.request_timeout)
            .user_agent(format!("polyvox/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Connection(format!("Failed to initialize HTTP client: {e}")))?;
        let endpoint = config.endpoint.trim_end_matches('/').to_string();

        let response = client.get(format!("{endpoint}/info")).send().await?;
        let response = check_status(response).await?;
        let info: ModelInfo = response.json().await?;
        if info.sample_rate == 0 {
            return Err(Error::InferenceError(
                "Model worker reported sample rate 0".to_string(),
            ));
        }

        info!(
            "Connected to model worker at {} ({} Hz, {} languages)",
            endpoint,
            info.sample_rate,
            info.languages.len()
        );

        Ok(Self {
            client,
            endpoint,
            info,
        })
    }

    pub fn info(&self) -> &ModelInfo {
        &self.info
    }

    async fn reference_payload(
        request: &SpeechRequest,
    ) -> Result<(Option<String>, Option<String>)> {
        let Some(path) = request.reference_audio.as_ref() else {
            return Ok((None, None));
        };

        let bytes = tokio::fs::read(path).await.map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                Error::InvalidInput(format!("Reference audio not found: {}", path.display()))
            } else {
                Error::Io(err)
            }
        })?;
        if bytes.is_empty() {
            return Err(Error::InvalidInput(format!(
                "Reference audio is empty: {}",
                path.display()
            )));
        }

        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());
        Ok((
            Some(base64::engine::general_purpose::STANDARD.encode(bytes)),
            filename,
        ))
    }
}

#[async_trait]
impl SpeechModel for RemoteSpeechModel {
    fn sample_rate(&self) -> u32 {
        self.info.sample_rate
    }

    async fn generate(&self, request: &SpeechRequest) -> Result<Waveform> {
        let (audio_prompt_base64, audio_prompt_filename) =
            Self::reference_payload(request).await?;
        let body = GenerateBody {
            text: &request.text,
            language_id: request.language.code,
            exaggeration: request.exaggeration,
            cfg_weight: request.cfg_weight,
            temperature: request.temperature,
            audio_prompt_base64,
            audio_prompt_filename,
        };

        let started = Instant::now();
        let response = self
            .client
            .post(format!("{}/generate", self.endpoint))
            .json(&body)
            .send()
            .await?;
        let response = check_status(response).await?;
        let bytes = response.bytes().await?;
        let waveform = decode_wav(&bytes)?;

        if waveform.sample_rate != self.info.sample_rate {
            warn!(
                "Model worker returned {} Hz audio, expected {} Hz",
                waveform.sample_rate, self.info.sample_rate
            );
        }
        debug!(
            "Generated {:.2}s of {} audio in {:.1}ms",
            waveform.duration_secs(),
            request.language.code,
            started.elapsed().as_secs_f32() * 1000.0
        );

        Ok(waveform)
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let message = response.text().await.unwrap_or_default();
    Err(Error::Backend {
        status,
        message: message.trim().to_string(),
    })
}
