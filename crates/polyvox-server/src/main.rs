//! Polyvox server - web UI and HTTP API for multilingual speech generation

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod error;
mod state;

use polyvox_core::{EngineConfig, OutputTarget, RemoteSpeechModel, SpeechModel, SpeechService};
use state::{AppState, UiVariant};

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 7860;

#[derive(Debug, Parser)]
#[command(
    name = "polyvox-server",
    about = "Web UI and HTTP API for multilingual text-to-speech",
    version = env!("CARGO_PKG_VERSION")
)]
struct ServerArgs {
    /// Host to bind to
    #[arg(short = 'H', long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Web UI to serve at `/`
    #[arg(long, value_enum, default_value_t = UiVariant::Advanced)]
    ui: UiVariant,

    /// Base URL of the model worker
    #[arg(long)]
    model_endpoint: Option<String>,

    /// Directory for generated audio (one file per request)
    #[arg(long, conflicts_with = "output_file")]
    output_dir: Option<PathBuf>,

    /// Overwrite this single file on every request instead
    #[arg(long)]
    output_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct BindConfig {
    host: String,
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = ServerArgs::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "polyvox_server=info,polyvox_core=info,tower_http=warn".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Polyvox server");

    let config = resolve_engine_config(&args);
    let output = resolve_output_target(&args, &config);
    tokio::fs::create_dir_all(output.dir()).await?;
    info!("Writing generated audio to {:?}", output.dir());

    // Load the model once; every request shares it.
    let model = RemoteSpeechModel::connect(&config).await?;
    info!("Model ready ({} Hz)", model.sample_rate());

    let speech = SpeechService::new(Arc::new(model), output);
    let state = AppState::new(speech, args.ui);
    let app = api::create_router(state);

    let bind = resolve_bind_config(&args);
    let addr = format!("{}:{}", bind.host, bind.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);

    let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());

    info!("Server ready. Press Ctrl+C to stop.");
    server.await?;

    Ok(())
}

fn resolve_engine_config(args: &ServerArgs) -> EngineConfig {
    let mut config = EngineConfig::from_env();
    if let Some(endpoint) = args.model_endpoint.as_deref() {
        config.endpoint = endpoint.trim().trim_end_matches('/').to_string();
    }
    if let Some(dir) = args.output_dir.clone() {
        config.output_dir = dir;
    }
    config
}

fn resolve_output_target(args: &ServerArgs, config: &EngineConfig) -> OutputTarget {
    match args.output_file.clone() {
        Some(path) => OutputTarget::Fixed { path },
        None => OutputTarget::Temporary {
            dir: config.output_dir.clone(),
        },
    }
}

fn resolve_bind_config(args: &ServerArgs) -> BindConfig {
    BindConfig {
        host: args.host.clone().unwrap_or_else(host_from_env_or_default),
        port: args.port.unwrap_or_else(port_from_env_or_default),
    }
}

fn host_from_env_or_default() -> String {
    match std::env::var("POLYVOX_HOST") {
        Ok(raw) => {
            let host = raw.trim();
            if host.is_empty() {
                warn!("Empty POLYVOX_HOST, falling back to {}", DEFAULT_HOST);
                DEFAULT_HOST.to_string()
            } else {
                host.to_string()
            }
        }
        Err(_) => DEFAULT_HOST.to_string(),
    }
}

fn port_from_env_or_default() -> u16 {
    match std::env::var("POLYVOX_PORT") {
        Ok(raw) => match raw.trim().parse::<u16>() {
            Ok(parsed) => parsed,
            Err(_) => {
                warn!("Invalid POLYVOX_PORT='{}', falling back to {}", raw, DEFAULT_PORT);
                DEFAULT_PORT
            }
        },
        Err(_) => DEFAULT_PORT,
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down...");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down...");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, OnceLock};

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        ENV_LOCK
            .get_or_init(|| Mutex::new(()))
            .lock()
            .expect("environment lock poisoned")
    }

    fn clear_bind_env() {
        std::env::remove_var("POLYVOX_HOST");
        std::env::remove_var("POLYVOX_PORT");
    }

    fn parse(args: &[&str]) -> ServerArgs {
        ServerArgs::try_parse_from(args).expect("arguments should parse")
    }

    #[test]
    fn cli_values_override_environment() {
        let _guard = env_lock();
        clear_bind_env();
        std::env::set_var("POLYVOX_HOST", "0.0.0.0");
        std::env::set_var("POLYVOX_PORT", "8080");

        let bind = resolve_bind_config(&parse(&[
            "polyvox-server",
            "--host",
            "10.0.0.5",
            "--port",
            "9000",
        ]));

        assert_eq!(bind.host, "10.0.0.5");
        assert_eq!(bind.port, 9000);
        clear_bind_env();
    }

    #[test]
    fn uses_environment_when_cli_values_missing() {
        let _guard = env_lock();
        clear_bind_env();
        std::env::set_var("POLYVOX_HOST", "0.0.0.0");
        std::env::set_var("POLYVOX_PORT", "8088");

        let bind = resolve_bind_config(&parse(&["polyvox-server"]));

        assert_eq!(bind.host, "0.0.0.0");
        assert_eq!(bind.port, 8088);
        clear_bind_env();
    }

    #[test]
    fn falls_back_to_local_defaults() {
        let _guard = env_lock();
        clear_bind_env();

        let bind = resolve_bind_config(&parse(&["polyvox-server"]));

        assert_eq!(
            bind,
            BindConfig {
                host: "127.0.0.1".to_string(),
                port: 7860,
            }
        );
    }

    #[test]
    fn falls_back_to_default_when_env_port_is_invalid() {
        let _guard = env_lock();
        clear_bind_env();
        std::env::set_var("POLYVOX_PORT", "not-a-port");

        let bind = resolve_bind_config(&parse(&["polyvox-server"]));

        assert_eq!(bind.port, 7860);
        clear_bind_env();
    }

    #[test]
    fn ui_defaults_to_advanced() {
        assert_eq!(parse(&["polyvox-server"]).ui, UiVariant::Advanced);
        assert_eq!(
            parse(&["polyvox-server", "--ui", "simple"]).ui,
            UiVariant::Simple
        );
    }

    #[test]
    fn output_file_selects_fixed_target() {
        let args = parse(&["polyvox-server", "--output-file", "out/output.wav"]);
        let target = resolve_output_target(&args, &EngineConfig::default());
        assert_eq!(
            target,
            OutputTarget::Fixed {
                path: PathBuf::from("out/output.wav")
            }
        );

        let args = parse(&["polyvox-server", "--output-dir", "/srv/audio"]);
        let config = resolve_engine_config(&args);
        assert_eq!(
            resolve_output_target(&args, &config),
            OutputTarget::Temporary {
                dir: PathBuf::from("/srv/audio")
            }
        );
    }

    #[test]
    fn output_dir_and_file_conflict() {
        assert!(ServerArgs::try_parse_from([
            "polyvox-server",
            "--output-dir",
            "a",
            "--output-file",
            "b.wav"
        ])
        .is_err());
    }
}
