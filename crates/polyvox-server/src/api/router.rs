use axum::{extract::Request, middleware, routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info_span;

use crate::api::request_context::{attach_request_context, RequestContext, REQUEST_ID_HEADER};
use crate::state::AppState;

/// Create the main API router.
pub fn create_router(state: AppState) -> Router {
    let trace_layer = TraceLayer::new_for_http().make_span_with(|request: &Request| {
        let request_id = request
            .extensions()
            .get::<RequestContext>()
            .map(|ctx| ctx.correlation_id.as_str())
            .or_else(|| {
                request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|v| v.to_str().ok())
            })
            .unwrap_or("-");
        info_span!(
            "http_request",
            method = %request.method(),
            uri = %request.uri(),
            correlation_id = %request_id
        )
    });

    let v1_routes = Router::new()
        .merge(crate::api::internal::router())
        .merge(crate::api::speech::router());

    Router::new()
        .route("/", get(crate::api::ui::index))
        .nest("/v1", v1_routes)
        .layer(trace_layer)
        .layer(middleware::from_fn(attach_request_context))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::UiVariant;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request as HttpRequest, StatusCode};
    use http_body_util::BodyExt;
    use polyvox_core::{
        Error, OutputTarget, SpeechModel, SpeechRequest, SpeechService, Waveform,
    };
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex as StdMutex};
    use std::time::Duration;
    use tower::ServiceExt;

    #[derive(Default)]
    struct ToneModel {
        fail: bool,
        delay: Duration,
        /// Reference voice bytes read while each call was running
        references: StdMutex<Vec<(PathBuf, Vec<u8>)>>,
    }

    #[async_trait]
    impl SpeechModel for ToneModel {
        fn sample_rate(&self) -> u32 {
            16_000
        }

        async fn generate(&self, request: &SpeechRequest) -> polyvox_core::Result<Waveform> {
            if self.fail {
                return Err(Error::Connection("worker offline".to_string()));
            }
            if let Some(path) = &request.reference_audio {
                let bytes = std::fs::read(path)?;
                self.references.lock().unwrap().push((path.clone(), bytes));
            }
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let samples = request.text.chars().count() * 160;
            Ok(Waveform::new(vec![0.2; samples], 16_000))
        }
    }

    fn app_with_model(
        model: Arc<ToneModel>,
        ui: UiVariant,
        call_timeout: Duration,
    ) -> (Router, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let service = SpeechService::new(
            model,
            OutputTarget::Temporary {
                dir: dir.path().to_path_buf(),
            },
        );
        let state = AppState::with_limits(service, ui, 16, call_timeout);
        (create_router(state), dir)
    }

    fn app_with(fail: bool, ui: UiVariant) -> (Router, tempfile::TempDir) {
        let model = Arc::new(ToneModel {
            fail,
            ..ToneModel::default()
        });
        app_with_model(model, ui, Duration::from_secs(300))
    }

    fn app() -> (Router, tempfile::TempDir) {
        app_with(false, UiVariant::Advanced)
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn json_request(uri: &str, body: serde_json::Value) -> Request {
        HttpRequest::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn multipart_request(uri: &str, fields: &[(&str, Option<&str>, &str)]) -> Request {
        const BOUNDARY: &str = "polyvox-test-boundary";
        let mut body = String::new();
        for (name, file_name, value) in fields {
            body.push_str(&format!("--{BOUNDARY}\r\n"));
            match file_name {
                Some(file_name) => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
                     Content-Type: text/plain\r\n\r\n"
                )),
                None => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{name}\"\r\n\r\n"
                )),
            }
            body.push_str(value);
            body.push_str("\r\n");
        }
        body.push_str(&format!("--{BOUNDARY}--\r\n"));

        HttpRequest::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn get(uri: &str) -> Request {
        HttpRequest::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn health_reports_model_sample_rate() {
        let (app, _dir) = app();
        let response = app.oneshot(get("/v1/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["sample_rate"], 16_000);
    }

    #[tokio::test]
    async fn lists_languages_and_examples() {
        let (app, _dir) = app();
        let languages = body_json(app.clone().oneshot(get("/v1/languages")).await.unwrap()).await;
        let languages = languages.as_array().unwrap();
        assert_eq!(languages.len(), 23);
        assert!(languages
            .iter()
            .any(|l| l["code"] == "hi" && l["label"] == "Hindi (hi)"));

        let examples = body_json(app.oneshot(get("/v1/examples")).await.unwrap()).await;
        let codes: Vec<_> = examples
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["language"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(codes, vec!["en", "es", "fr", "hi"]);
    }

    #[tokio::test]
    async fn json_speech_generates_servable_audio() {
        let (app, _dir) = app();
        let response = app
            .clone()
            .oneshot(json_request(
                "/v1/speech",
                serde_json::json!({"text": "Hola mundo.", "language": "es"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "✅ Generated 0.1s of Spanish speech");
        assert_eq!(body["chunks"], 1);

        let audio_url = body["audio_url"].as_str().unwrap().to_string();
        let audio = app.oneshot(get(&audio_url)).await.unwrap();
        assert_eq!(audio.status(), StatusCode::OK);
        assert_eq!(audio.headers()[header::CONTENT_TYPE], "audio/wav");
        let bytes = audio.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..4], b"RIFF");
    }

    #[tokio::test]
    async fn multipart_speech_accepts_form_fields() {
        let (app, _dir) = app();
        let response = app
            .oneshot(multipart_request(
                "/v1/speech",
                &[
                    ("text", None, "Bonjour."),
                    ("language", None, "fr"),
                    ("speed", None, "2.0"),
                ],
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["language"], "fr");
        assert!((body["duration_secs"].as_f64().unwrap() - 0.04).abs() < 0.005);
    }

    #[tokio::test]
    async fn blank_text_is_a_bad_request() {
        let (app, _dir) = app();
        let response = app
            .oneshot(json_request("/v1/speech", serde_json::json!({"text": "  "})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["status"], "Please enter some text");
    }

    #[tokio::test]
    async fn out_of_range_parameter_is_a_bad_request() {
        let (app, _dir) = app();
        let response = app
            .oneshot(json_request(
                "/v1/speech",
                serde_json::json!({"text": "Hi.", "temperature": 5.0}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn model_failure_is_bad_gateway_with_error_status() {
        let (app, _dir) = app_with(true, UiVariant::Advanced);
        let response = app
            .oneshot(json_request("/v1/speech", serde_json::json!({"text": "Hello."})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let status = body_json(response).await["status"].as_str().unwrap().to_string();
        assert!(status.starts_with("❌ Error:"), "{status}");
    }

    #[tokio::test]
    async fn unsupported_content_type_is_rejected() {
        let (app, _dir) = app();
        let request = HttpRequest::builder()
            .method("POST")
            .uri("/v1/speech")
            .header(header::CONTENT_TYPE, "text/plain")
            .body(Body::from("hello"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[tokio::test]
    async fn file_narration_reports_chunks() {
        let (app, _dir) = app();
        let text = (1..=10)
            .map(|i| format!("Sentence {i} is part of a longer document for narration."))
            .collect::<Vec<_>>()
            .join(" ");
        let response = app
            .oneshot(multipart_request(
                "/v1/speech/file",
                &[
                    ("file", Some("chapter.txt"), text.as_str()),
                    ("language", None, "en"),
                    ("chunk_size", None, "200"),
                ],
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let chunks = body["chunks"].as_u64().unwrap();
        assert!(chunks > 1);
        assert!(body["status"]
            .as_str()
            .unwrap()
            .starts_with(&format!("✅ Processed {chunks} chunks")));
    }

    #[tokio::test]
    async fn file_narration_validates_input() {
        let (app, _dir) = app();
        let missing = app
            .clone()
            .oneshot(multipart_request("/v1/speech/file", &[("language", None, "en")]))
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(missing).await["status"], "Please upload a text file");

        let short = app
            .clone()
            .oneshot(multipart_request(
                "/v1/speech/file",
                &[("file", Some("short.txt"), "Too short.")],
            ))
            .await
            .unwrap();
        assert_eq!(
            body_json(short).await["status"],
            "Text file too short (minimum 100 characters)"
        );

        let bad_chunk = app
            .oneshot(multipart_request(
                "/v1/speech/file",
                &[("file", Some("a.txt"), "x"), ("chunk_size", None, "50")],
            ))
            .await
            .unwrap();
        assert_eq!(bad_chunk.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_audio_is_not_found() {
        let (app, _dir) = app();
        for uri in [
            "/v1/audio/secret.txt",
            "/v1/audio/speech-0123456789abcdef0123456789abcdef.wav",
        ] {
            let response = app.clone().oneshot(get(uri)).await.unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
        }
    }

    #[tokio::test]
    async fn request_id_is_echoed() {
        let (app, _dir) = app();
        let request = HttpRequest::builder()
            .uri("/v1/health")
            .header("x-request-id", "req-42")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.headers()["x-request-id"], "req-42");
    }

    #[tokio::test]
    async fn index_serves_selected_ui() {
        for (ui, marker) in [
            (UiVariant::Advanced, "File Processing"),
            (UiVariant::Simple, "Generate Speech"),
        ] {
            let (app, _dir) = app_with(false, ui);
            let response = app.oneshot(get("/")).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            let bytes = response.into_body().collect().await.unwrap().to_bytes();
            let html = String::from_utf8(bytes.to_vec()).unwrap();
            assert!(html.contains(marker), "{ui:?}");
        }
    }

    #[tokio::test]
    async fn multipart_reference_voice_is_staged_for_the_model() {
        let model = Arc::new(ToneModel::default());
        let (app, _dir) =
            app_with_model(model.clone(), UiVariant::Advanced, Duration::from_secs(300));

        let response = app
            .oneshot(multipart_request(
                "/v1/speech",
                &[
                    ("text", None, "Hola mundo."),
                    ("language", None, "es"),
                    ("reference_audio", Some("voice.flac"), "RIFF-fake-voice"),
                ],
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert!(body["status"]
            .as_str()
            .unwrap()
            .ends_with(" (with voice cloning)"));

        let references = model.references.lock().unwrap();
        assert_eq!(references.len(), 1);
        let (path, bytes) = &references[0];
        assert_eq!(bytes.as_slice(), b"RIFF-fake-voice");
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("flac"));
        assert!(!path.exists(), "staged reference should be removed after the request");
    }

    #[tokio::test]
    async fn json_base64_reference_voice_is_staged_for_the_model() {
        use base64::Engine;

        let model = Arc::new(ToneModel::default());
        let (app, _dir) =
            app_with_model(model.clone(), UiVariant::Advanced, Duration::from_secs(300));
        let encoded = base64::engine::general_purpose::STANDARD.encode(b"fake voice bytes");

        let response = app
            .oneshot(json_request(
                "/v1/speech",
                serde_json::json!({
                    "text": "Bonjour.",
                    "language": "fr",
                    "reference_audio_base64": encoded,
                    "reference_audio_filename": "sample.mp3",
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(
            body["status"],
            "✅ Generated 0.1s of French speech (with voice cloning)"
        );

        let references = model.references.lock().unwrap();
        assert_eq!(references[0].1.as_slice(), b"fake voice bytes");
        assert_eq!(
            references[0].0.extension().and_then(|e| e.to_str()),
            Some("mp3")
        );
    }

    #[tokio::test]
    async fn slow_model_call_is_gateway_timeout() {
        let model = Arc::new(ToneModel {
            delay: Duration::from_millis(300),
            ..ToneModel::default()
        });
        let (app, _dir) = app_with_model(model, UiVariant::Advanced, Duration::from_millis(100));

        let response = app
            .oneshot(json_request("/v1/speech", serde_json::json!({ "text": "Hi." })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
        let body = body_json(response).await;
        assert!(body["status"]
            .as_str()
            .unwrap()
            .starts_with("❌ Error: Speech generation timed out"));
    }

    #[tokio::test]
    async fn request_queued_behind_narration_does_not_time_out() {
        let model = Arc::new(ToneModel {
            delay: Duration::from_millis(300),
            ..ToneModel::default()
        });
        let (app, _dir) = app_with_model(model, UiVariant::Advanced, Duration::from_millis(500));
        let narration_text = (1..=9)
            .map(|i| format!("Sentence number {i} is here to make the narration long enough."))
            .collect::<Vec<_>>()
            .join(" ");

        let narration = app.clone().oneshot(json_request(
            "/v1/speech/file",
            serde_json::json!({ "text": narration_text, "chunk_size": 200 }),
        ));
        let single = async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            app.clone()
                .oneshot(json_request("/v1/speech", serde_json::json!({ "text": "Hi." })))
                .await
        };
        let (narration, single) = tokio::join!(narration, single);

        let narration = narration.unwrap();
        assert_eq!(narration.status(), StatusCode::OK);
        assert_eq!(body_json(narration).await["chunks"], 3);
        assert_eq!(single.unwrap().status(), StatusCode::OK);
    }
}
