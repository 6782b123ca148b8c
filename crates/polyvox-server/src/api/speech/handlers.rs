use std::io::Write;
use std::path::PathBuf;

use axum::{
    body::Body,
    extract::{Extension, Multipart, Path, Request, State},
    http::{header, HeaderValue, StatusCode},
    response::Response,
    Json, RequestExt,
};
use base64::Engine;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::info;

use crate::api::request_context::RequestContext;
use crate::error::ApiError;
use crate::state::AppState;
use polyvox_core::params::CHUNK_SIZE_DEFAULT;
use polyvox_core::{
    supported_languages, ChunkSize, GenerationParams, NarrationJob, OutputTarget, SpeechJob,
    SpeechOutput, StatusReport, DEFAULT_LANGUAGE,
};

#[derive(Debug, Serialize)]
pub struct LanguageEntry {
    pub code: &'static str,
    pub name: &'static str,
    pub label: String,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ExamplePreset {
    pub text: &'static str,
    pub language: &'static str,
    pub exaggeration: f32,
    pub cfg_weight: f32,
    pub speed: f32,
    pub temperature: f32,
}

pub static EXAMPLE_PRESETS: [ExamplePreset; 4] = [
    ExamplePreset {
        text: "Hello, this is a test of English speech.",
        language: "en",
        exaggeration: 0.5,
        cfg_weight: 0.5,
        speed: 1.0,
        temperature: 0.7,
    },
    ExamplePreset {
        text: "Hola, esto es una prueba de voz en español.",
        language: "es",
        exaggeration: 0.7,
        cfg_weight: 0.3,
        speed: 1.0,
        temperature: 0.7,
    },
    ExamplePreset {
        text: "Bonjour, ceci est un test de synthèse vocale française.",
        language: "fr",
        exaggeration: 0.5,
        cfg_weight: 0.5,
        speed: 0.9,
        temperature: 0.7,
    },
    ExamplePreset {
        text: "नमस्ते, यह हिंदी में बोलने का परीक्षण है।",
        language: "hi",
        exaggeration: 0.6,
        cfg_weight: 0.4,
        speed: 1.0,
        temperature: 0.7,
    },
];

#[derive(Debug, Serialize)]
pub struct SpeechResponse {
    pub status: String,
    pub audio_url: String,
    pub duration_secs: f32,
    pub chunks: usize,
    pub sample_rate: u32,
    pub language: &'static str,
}

impl SpeechResponse {
    fn new(output: &SpeechOutput, report: StatusReport) -> Self {
        let file_name = report
            .audio_path
            .as_deref()
            .and_then(|path| path.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            status: report.status,
            audio_url: format!("/v1/audio/{file_name}"),
            duration_secs: output.duration_secs,
            chunks: output.chunks,
            sample_rate: output.sample_rate,
            language: output.language.code,
        }
    }
}

#[derive(Debug)]
struct Upload {
    bytes: Vec<u8>,
    filename: Option<String>,
}

#[derive(Debug, Default)]
struct ParsedSpeechRequest {
    text: Option<String>,
    language: Option<String>,
    exaggeration: Option<f32>,
    cfg_weight: Option<f32>,
    temperature: Option<f32>,
    speed: Option<f32>,
    chunk_size: Option<usize>,
    reference_audio: Option<Upload>,
    text_file: Option<Upload>,
}

impl ParsedSpeechRequest {
    fn params(&self) -> GenerationParams {
        let defaults = GenerationParams::default();
        GenerationParams {
            exaggeration: self.exaggeration.unwrap_or(defaults.exaggeration),
            cfg_weight: self.cfg_weight.unwrap_or(defaults.cfg_weight),
            temperature: self.temperature.unwrap_or(defaults.temperature),
            speed: self.speed.unwrap_or(defaults.speed),
        }
    }

    fn language(&self) -> String {
        self.language
            .clone()
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct JsonSpeechRequest {
    #[serde(default, alias = "input")]
    text: Option<String>,
    #[serde(default, alias = "language_id")]
    language: Option<String>,
    #[serde(default)]
    exaggeration: Option<f32>,
    #[serde(default)]
    cfg_weight: Option<f32>,
    #[serde(default)]
    temperature: Option<f32>,
    #[serde(default)]
    speed: Option<f32>,
    #[serde(default)]
    chunk_size: Option<usize>,
    #[serde(default)]
    reference_audio_base64: Option<String>,
    #[serde(default)]
    reference_audio_filename: Option<String>,
}

pub async fn list_languages() -> Json<Vec<LanguageEntry>> {
    Json(
        supported_languages()
            .iter()
            .map(|lang| LanguageEntry {
                code: lang.code,
                name: lang.name,
                label: lang.choice_label(),
            })
            .collect(),
    )
}

pub async fn list_examples() -> Json<&'static [ExamplePreset]> {
    Json(&EXAMPLE_PRESETS)
}

pub async fn create_speech(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    req: Request,
) -> Result<Json<SpeechResponse>, ApiError> {
    let parsed = parse_speech_request(req).await?;
    let reference = parsed
        .reference_audio
        .as_ref()
        .map(stage_reference_audio)
        .transpose()?;

    let job = SpeechJob {
        text: parsed.text.clone().unwrap_or_default(),
        language: parsed.language(),
        reference_audio: reference.as_ref().map(|file| file.path().to_path_buf()),
        params: parsed.params(),
    };

    let _permit = state.acquire_permit().await;
    let result = state.speech.generate_speech(job).await;
    speech_response(result, &ctx)
}

pub async fn create_narration(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    req: Request,
) -> Result<Json<SpeechResponse>, ApiError> {
    let parsed = parse_speech_request(req).await?;

    let text = match (&parsed.text_file, &parsed.text) {
        (Some(upload), _) => String::from_utf8(upload.bytes.clone())
            .map_err(|_| ApiError::bad_request("Text file must be UTF-8 encoded"))?,
        (None, Some(text)) => text.clone(),
        (None, None) => return Err(ApiError::bad_request("Please upload a text file")),
    };
    let chunk_size = ChunkSize::new(parsed.chunk_size.unwrap_or(CHUNK_SIZE_DEFAULT))?;

    let reference = parsed
        .reference_audio
        .as_ref()
        .map(stage_reference_audio)
        .transpose()?;

    let job = NarrationJob {
        text,
        language: parsed.language(),
        reference_audio: reference.as_ref().map(|file| file.path().to_path_buf()),
        params: parsed.params(),
        chunk_size,
    };

    let _permit = state.acquire_permit().await;
    let result = state.speech.narrate_text(job).await;
    speech_response(result, &ctx)
}

fn speech_response(
    result: polyvox_core::Result<SpeechOutput>,
    ctx: &RequestContext,
) -> Result<Json<SpeechResponse>, ApiError> {
    let report = StatusReport::from_result(&result);
    match result {
        Ok(output) => {
            info!(request_id = %ctx.correlation_id, "{}", report.status);
            Ok(Json(SpeechResponse::new(&output, report)))
        }
        Err(err) => Err(ApiError::from_report(&err, report)),
    }
}

pub async fn get_audio(
    State(state): State<AppState>,
    Path(file_name): Path<String>,
) -> Result<Response, ApiError> {
    let target = state.speech.output_target();
    if !is_generated_name(target, &file_name) {
        return Err(ApiError::not_found("Audio not found"));
    }

    let path: PathBuf = target.dir().join(&file_name);
    let bytes = tokio::fs::read(&path).await.map_err(|err| {
        if err.kind() == std::io::ErrorKind::NotFound {
            ApiError::not_found("Audio not found")
        } else {
            ApiError::internal(format!("Failed reading audio: {err}"))
        }
    })?;

    Ok(audio_response(bytes, &file_name))
}

async fn parse_speech_request(req: Request) -> Result<ParsedSpeechRequest, ApiError> {
    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();

    if content_type.starts_with("application/json") {
        let Json(payload) = req
            .extract::<Json<JsonSpeechRequest>, _>()
            .await
            .map_err(|err| ApiError::bad_request(format!("Invalid JSON payload: {err}")))?;

        let reference_audio = match payload.reference_audio_base64.as_deref() {
            Some(raw) if !raw.trim().is_empty() => Some(Upload {
                bytes: decode_audio_base64(raw)?,
                filename: sanitize_optional(payload.reference_audio_filename),
            }),
            _ => None,
        };

        return Ok(ParsedSpeechRequest {
            text: payload.text,
            language: sanitize_optional(payload.language),
            exaggeration: payload.exaggeration,
            cfg_weight: payload.cfg_weight,
            temperature: payload.temperature,
            speed: payload.speed,
            chunk_size: payload.chunk_size,
            reference_audio,
            text_file: None,
        });
    }

    if content_type.starts_with("multipart/form-data") {
        let multipart = req
            .extract::<Multipart, _>()
            .await
            .map_err(|err| ApiError::bad_request(format!("Invalid multipart payload: {err}")))?;
        return parse_multipart(multipart).await;
    }

    Err(ApiError {
        status: StatusCode::UNSUPPORTED_MEDIA_TYPE,
        message: "Expected `Content-Type: application/json` or `multipart/form-data`".to_string(),
    })
}

async fn parse_multipart(mut multipart: Multipart) -> Result<ParsedSpeechRequest, ApiError> {
    let mut out = ParsedSpeechRequest::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::bad_request(format!("Failed reading multipart field: {err}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "reference_audio" | "file" => {
                let file_name = field.file_name().map(ToString::to_string);
                let bytes = field.bytes().await.map_err(|err| {
                    ApiError::bad_request(format!("Failed reading multipart '{name}' field: {err}"))
                })?;
                if bytes.is_empty() {
                    continue;
                }
                let upload = Upload {
                    bytes: bytes.to_vec(),
                    filename: sanitize_optional(file_name),
                };
                if name == "file" {
                    out.text_file = Some(upload);
                } else {
                    out.reference_audio = Some(upload);
                }
            }
            "text" => out.text = Some(field_text(field, &name).await?),
            "language" => out.language = sanitize_optional(Some(field_text(field, &name).await?)),
            "exaggeration" => out.exaggeration = parse_number(&name, field_text(field, &name).await?)?,
            "cfg_weight" => out.cfg_weight = parse_number(&name, field_text(field, &name).await?)?,
            "temperature" => out.temperature = parse_number(&name, field_text(field, &name).await?)?,
            "speed" => out.speed = parse_number(&name, field_text(field, &name).await?)?,
            "chunk_size" => out.chunk_size = parse_number(&name, field_text(field, &name).await?)?,
            _ => {}
        }
    }

    Ok(out)
}

async fn field_text(field: axum::extract::multipart::Field<'_>, name: &str) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|err| ApiError::bad_request(format!("Failed reading multipart '{name}' field: {err}")))
}

fn parse_number<T: std::str::FromStr>(name: &str, raw: String) -> Result<Option<T>, ApiError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<T>()
        .map(Some)
        .map_err(|_| ApiError::bad_request(format!("Invalid number for `{name}`: {trimmed}")))
}

fn decode_audio_base64(raw: &str) -> Result<Vec<u8>, ApiError> {
    base64::engine::general_purpose::STANDARD
        .decode(raw.trim())
        .map_err(|_| ApiError::bad_request("Invalid base64 audio payload."))
}

fn sanitize_optional<T>(raw: Option<T>) -> Option<String>
where
    T: Into<String>,
{
    let value: String = raw?.into();
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Write an uploaded reference voice to a temp file that lives as long as the
/// returned handle.
fn stage_reference_audio(upload: &Upload) -> Result<NamedTempFile, ApiError> {
    let extension = upload
        .filename
        .as_deref()
        .and_then(|name| std::path::Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or("wav");
    let suffix = format!(".{extension}");

    let mut file = tempfile::Builder::new()
        .prefix("polyvox-reference-")
        .suffix(&suffix)
        .tempfile()
        .map_err(|err| ApiError::internal(format!("Failed staging reference audio: {err}")))?;
    file.write_all(&upload.bytes)
        .map_err(|err| ApiError::internal(format!("Failed staging reference audio: {err}")))?;
    Ok(file)
}

fn is_generated_name(target: &OutputTarget, name: &str) -> bool {
    match target {
        OutputTarget::Temporary { .. } => name
            .strip_prefix("speech-")
            .and_then(|rest| rest.strip_suffix(".wav"))
            .is_some_and(|id| id.len() == 32 && id.chars().all(|c| c.is_ascii_hexdigit())),
        OutputTarget::Fixed { path } => path.file_name().is_some_and(|file| file == name),
    }
}

fn audio_response(bytes: Vec<u8>, file_name: &str) -> Response {
    let mut response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, HeaderValue::from_static("audio/wav"));

    let disposition = format!("inline; filename=\"{}\"", file_name.replace('"', ""));
    if let Ok(value) = HeaderValue::from_str(disposition.as_str()) {
        response = response.header(header::CONTENT_DISPOSITION, value);
    }

    response
        .body(Body::from(bytes))
        .unwrap_or_else(|_| Response::new(Body::empty()))
}
