//! Speech generation service: validation, model calls, post-processing and
//! output files.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

use crate::audio::{concat, write_wav, Waveform};
use crate::error::{Error, Result};
use crate::languages::{self, Language};
use crate::model::{SpeechModel, SpeechRequest};
use crate::params::{ChunkSize, GenerationParams};
use crate::text::chunk_text;

pub const MIN_NARRATION_CHARS: usize = 100;

/// Where generated audio is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// A fresh `speech-<uuid>.wav` per request.
    Temporary { dir: PathBuf },
    /// The same file, overwritten by every request.
    Fixed { path: PathBuf },
}

impl OutputTarget {
    pub fn next_path(&self) -> PathBuf {
        match self {
            Self::Temporary { dir } => {
                dir.join(format!("speech-{}.wav", uuid::Uuid::new_v4().simple()))
            }
            Self::Fixed { path } => path.clone(),
        }
    }

    /// Directory holding every file this target produces.
    pub fn dir(&self) -> &Path {
        match self {
            Self::Temporary { dir } => dir,
            Self::Fixed { path } => path.parent().unwrap_or_else(|| Path::new(".")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SpeechJob {
    pub text: String,
    pub language: String,
    pub reference_audio: Option<PathBuf>,
    pub params: GenerationParams,
}

#[derive(Debug, Clone)]
pub struct NarrationJob {
    pub text: String,
    pub language: String,
    pub reference_audio: Option<PathBuf>,
    pub params: GenerationParams,
    pub chunk_size: ChunkSize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechKind {
    Single,
    Narration,
}

#[derive(Debug, Clone)]
pub struct SpeechOutput {
    pub kind: SpeechKind,
    pub path: PathBuf,
    pub duration_secs: f32,
    pub chunks: usize,
    pub sample_rate: u32,
    pub language: Language,
    pub voice_cloned: bool,
}

impl SpeechOutput {
    pub fn status_message(&self) -> String {
        let mut status = match self.kind {
            SpeechKind::Single => format!(
                "✅ Generated {:.1}s of {} speech",
                self.duration_secs, self.language.name
            ),
            SpeechKind::Narration => format!(
                "✅ Processed {} chunks, {:.1}s of {} speech",
                self.chunks, self.duration_secs, self.language.name
            ),
        };
        if self.voice_cloned {
            status.push_str(" (with voice cloning)");
        }
        status
    }
}

/// What a front-end shows after a request: an audio file and a status line.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusReport {
    pub audio_path: Option<PathBuf>,
    pub status: String,
}

impl StatusReport {
    pub fn from_result(result: &Result<SpeechOutput>) -> Self {
        match result {
            Ok(output) => Self {
                audio_path: Some(output.path.clone()),
                status: output.status_message(),
            },
            Err(err) => Self {
                audio_path: None,
                status: error_status(err),
            },
        }
    }
}

/// Status line for a failed request.
pub fn error_status(err: &Error) -> String {
    if err.is_user_input() {
        err.to_string()
    } else {
        format!("❌ Error: {err}")
    }
}

/// Owns the single model instance; model calls never overlap.
pub struct SpeechService {
    model: Arc<dyn SpeechModel>,
    output: OutputTarget,
    model_lock: Mutex<()>,
    call_timeout: Option<Duration>,
}

impl SpeechService {
    pub fn new(model: Arc<dyn SpeechModel>, output: OutputTarget) -> Self {
        Self {
            model,
            output,
            model_lock: Mutex::new(()),
            call_timeout: None,
        }
    }

    /// Limit each model call to `timeout`. Time spent queued for the model
    /// does not count.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }

    pub fn sample_rate(&self) -> u32 {
        self.model.sample_rate()
    }

    pub fn output_target(&self) -> &OutputTarget {
        &self.output
    }

    pub async fn generate_speech(&self, job: SpeechJob) -> Result<SpeechOutput> {
        if job.text.trim().is_empty() {
            return Err(Error::InvalidInput("Please enter some text".to_string()));
        }
        let language = languages::resolve(&job.language)?;
        job.params.validate()?;

        let voice_cloned = job.reference_audio.is_some();
        let request = SpeechRequest::new(job.text.trim(), language, &job.params)
            .with_reference_audio(job.reference_audio);

        let started = Instant::now();
        let guard = self.model_lock.lock().await;
        let waveform = self.call_model(&request).await?;
        let _guard = self.release_unless_fixed(guard);

        let waveform = apply_speed(waveform, &job.params).await?;
        let path = self.write_output(waveform.clone()).await?;

        info!(
            "Generated {:.2}s of {} speech in {:.1}ms",
            waveform.duration_secs(),
            language.code,
            started.elapsed().as_secs_f32() * 1000.0
        );

        Ok(SpeechOutput {
            kind: SpeechKind::Single,
            path,
            duration_secs: waveform.duration_secs(),
            chunks: 1,
            sample_rate: waveform.sample_rate,
            language,
            voice_cloned,
        })
    }

    pub async fn narrate_text(&self, job: NarrationJob) -> Result<SpeechOutput> {
        self.narrate_text_with_progress(job, |_, _| {}).await
    }

    /// Narrate a long text chunk by chunk. `on_chunk(done, total)` runs after
    /// each chunk is synthesized. A failing chunk aborts the whole narration.
    pub async fn narrate_text_with_progress<F>(
        &self,
        job: NarrationJob,
        mut on_chunk: F,
    ) -> Result<SpeechOutput>
    where
        F: FnMut(usize, usize) + Send,
    {
        if job.text.chars().count() < MIN_NARRATION_CHARS {
            return Err(Error::InvalidInput(format!(
                "Text file too short (minimum {MIN_NARRATION_CHARS} characters)"
            )));
        }
        let language = languages::resolve(&job.language)?;
        job.params.validate()?;

        let chunks = chunk_text(&job.text, job.chunk_size.get());
        if chunks.is_empty() {
            return Err(Error::InvalidInput("No valid text chunks found".to_string()));
        }

        let voice_cloned = job.reference_audio.is_some();
        let total = chunks.len();
        let started = Instant::now();
        info!(
            "Narrating {} chars of {} text in {} chunks",
            job.text.chars().count(),
            language.code,
            total
        );

        let mut segments = Vec::with_capacity(total);
        let guard = self.model_lock.lock().await;
        for (idx, chunk) in chunks.into_iter().enumerate() {
            debug!("Chunk {}/{} ({} chars)", idx + 1, total, chunk.chars().count());
            let request = SpeechRequest::new(chunk, language, &job.params)
                .with_reference_audio(job.reference_audio.clone());
            let waveform = self.call_model(&request).await?;
            segments.push(apply_speed(waveform, &job.params).await?);
            on_chunk(idx + 1, total);
        }
        let _guard = self.release_unless_fixed(guard);

        let merged = concat(segments)?;
        let duration_secs = merged.duration_secs();
        let sample_rate = merged.sample_rate;
        let path = self.write_output(merged).await?;

        info!(
            "Narrated {:.2}s of {} speech in {:.1}s",
            duration_secs,
            language.code,
            started.elapsed().as_secs_f32()
        );

        Ok(SpeechOutput {
            kind: SpeechKind::Narration,
            path,
            duration_secs,
            chunks: total,
            sample_rate,
            language,
            voice_cloned,
        })
    }

    /// Narrate a UTF-8 text file; `job.text` is replaced by the file contents.
    pub async fn narrate_file(&self, path: &Path, mut job: NarrationJob) -> Result<SpeechOutput> {
        job.text = read_text_file(path).await?;
        self.narrate_text(job).await
    }

    /// One model call; the caller holds the model lock.
    async fn call_model(&self, request: &SpeechRequest) -> Result<Waveform> {
        let Some(limit) = self.call_timeout else {
            return self.model.generate(request).await;
        };
        tokio::time::timeout(limit, self.model.generate(request))
            .await
            .map_err(|_| Error::Timeout(limit.as_secs()))?
    }

    /// A fixed output file is shared by every request, so its writer keeps
    /// the model lock until the file is on disk.
    fn release_unless_fixed<'a>(
        &self,
        guard: MutexGuard<'a, ()>,
    ) -> Option<MutexGuard<'a, ()>> {
        match self.output {
            OutputTarget::Fixed { .. } => Some(guard),
            OutputTarget::Temporary { .. } => None,
        }
    }

    async fn write_output(&self, waveform: Waveform) -> Result<PathBuf> {
        if waveform.is_empty() {
            return Err(Error::InferenceError("Model returned no audio".to_string()));
        }
        let path = self.output.next_path();
        let target = path.clone();
        tokio::task::spawn_blocking(move || write_wav(&target, &waveform))
            .await
            .map_err(|err| Error::InferenceError(format!("Audio encoding failed: {err}")))??;
        Ok(path)
    }
}

async fn apply_speed(waveform: Waveform, params: &GenerationParams) -> Result<Waveform> {
    if !params.changes_speed() {
        return Ok(waveform);
    }
    let speed = params.speed;
    tokio::task::spawn_blocking(move || waveform.stretched(speed))
        .await
        .map_err(|err| Error::InferenceError(format!("Speed adjustment failed: {err}")))
}

/// Read an uploaded narration source.
pub async fn read_text_file(path: &Path) -> Result<String> {
    let bytes = tokio::fs::read(path).await.map_err(|err| {
        if err.kind() == std::io::ErrorKind::NotFound {
            Error::InvalidInput("Please upload a text file".to_string())
        } else {
            Error::Io(err)
        }
    })?;
    String::from_utf8(bytes)
        .map_err(|_| Error::InvalidInput("Text file must be UTF-8 encoded".to_string()))
}
