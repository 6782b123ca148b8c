//! Shared application state

use polyvox_core::SpeechService;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Which HTML page `GET /` serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum UiVariant {
    /// Text box and language dropdown only
    Simple,
    /// Text and file tabs, voice cloning, sliders and presets
    Advanced,
}

#[derive(Clone)]
pub struct AppState {
    pub speech: Arc<SpeechService>,
    /// Bounds how many requests may queue for the model
    pub request_semaphore: Arc<Semaphore>,
    pub ui: UiVariant,
}

impl AppState {
    pub fn new(speech: SpeechService, ui: UiVariant) -> Self {
        let max_concurrent = std::env::var("MAX_CONCURRENT_REQUESTS")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|n: &usize| *n > 0)
            .unwrap_or(16);

        let timeout = std::env::var("REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|n: &u64| *n > 0)
            .unwrap_or(300);

        Self::with_limits(speech, ui, max_concurrent, Duration::from_secs(timeout))
    }

    /// `call_timeout` applies to each model call once it holds the model.
    pub fn with_limits(
        speech: SpeechService,
        ui: UiVariant,
        max_concurrent: usize,
        call_timeout: Duration,
    ) -> Self {
        Self {
            speech: Arc::new(speech.with_call_timeout(call_timeout)),
            request_semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
            ui,
        }
    }

    pub async fn acquire_permit(&self) -> tokio::sync::SemaphorePermit<'_> {
        self.request_semaphore
            .acquire()
            .await
            .expect("Semaphore should never be closed")
    }
}
