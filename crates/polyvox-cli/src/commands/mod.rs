pub mod config;
pub mod languages;
pub mod narrate;
pub mod smoke;
pub mod speak;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use indicatif::ProgressBar;
use tracing::debug;
use polyvox_core::params::{CFG_WEIGHT, EXAGGERATION, SPEED, TEMPERATURE};
use polyvox_core::{
    EngineConfig, GenerationParams, RemoteSpeechModel, SpeechModel, DEFAULT_LANGUAGE,
};

use crate::config::Config;
use crate::error::Result;
use crate::style::{self, Theme};

/// Voice and sampling options shared by the synthesis commands.
#[derive(Debug, Clone, Args)]
pub struct VoiceArgs {
    /// Language code (e.g. en, fr, hi, zh)
    #[arg(short, long)]
    pub language: Option<String>,

    /// Emotion intensity, 0.0 (neutral) to 1.0 (very expressive)
    #[arg(long, default_value_t = EXAGGERATION.default)]
    pub exaggeration: f32,

    /// Guidance weight, 0.0 to 1.0; lower gives more natural pacing
    #[arg(long, default_value_t = CFG_WEIGHT.default)]
    pub cfg_weight: f32,

    /// Sampling temperature, 0.1 to 1.0
    #[arg(long, default_value_t = TEMPERATURE.default)]
    pub temperature: f32,

    /// Playback speed, 0.5 to 2.0
    #[arg(long, default_value_t = SPEED.default)]
    pub speed: f32,

    /// Reference recording to clone the voice from
    #[arg(long)]
    pub reference: Option<PathBuf>,
}

impl VoiceArgs {
    pub fn params(&self) -> GenerationParams {
        GenerationParams {
            exaggeration: self.exaggeration,
            cfg_weight: self.cfg_weight,
            temperature: self.temperature,
            speed: self.speed,
        }
    }
}

/// Resolved settings for commands that talk to the model.
pub struct Session {
    pub engine: EngineConfig,
    pub config: Config,
}

impl Session {
    pub fn new(endpoint: Option<String>, config: Config) -> Self {
        let mut engine = EngineConfig::from_env();
        if let Some(endpoint) = endpoint.or_else(|| config.endpoint.clone()) {
            engine.endpoint = endpoint.trim().trim_end_matches('/').to_string();
        }
        debug!(
            "Model endpoint {} (timeout {}s)",
            engine.endpoint,
            engine.request_timeout.as_secs()
        );
        Self { engine, config }
    }

    pub fn language(&self, flag: Option<&str>) -> String {
        flag.map(str::to_string)
            .or_else(|| self.config.language.clone())
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string())
    }

    pub fn output_dir(&self) -> PathBuf {
        self.config
            .output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Connect to the model worker, showing a spinner meanwhile.
    pub async fn connect(&self, theme: &Theme) -> Result<Arc<dyn SpeechModel>> {
        let pb = ProgressBar::new_spinner();
        pb.set_style(style::spinner_style());
        pb.set_message(format!("Loading model from {}...", self.engine.endpoint));
        pb.enable_steady_tick(std::time::Duration::from_millis(100));

        let result = RemoteSpeechModel::connect(&self.engine).await;
        pb.finish_and_clear();

        let model = result?;
        if let Some(name) = model.info().model.as_deref() {
            theme.muted(&format!("Model: {} ({} Hz)", name, model.sample_rate()));
        }
        Ok(Arc::new(model))
    }
}
