//! polyvox - multilingual text-to-speech from the command line

mod commands;
mod config;
mod error;
mod style;
mod utils;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::commands::Session;
use crate::config::Config;
use crate::error::Result;
use crate::style::{Theme, HELP_TEMPLATE};

#[derive(Debug, Parser)]
#[command(
    name = "polyvox",
    about = "Multilingual text-to-speech with voice cloning",
    version = env!("CARGO_PKG_VERSION"),
    help_template = HELP_TEMPLATE
)]
struct Cli {
    /// Model worker URL
    #[arg(long, global = true, env = "POLYVOX_MODEL_ENDPOINT")]
    endpoint: Option<String>,

    /// Config file [default: <config dir>/polyvox/config.toml]
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Show debug logs
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Synthesize a piece of text
    Speak(commands::speak::SpeakArgs),

    /// Narrate a long text file chunk by chunk
    Narrate(commands::narrate::NarrateArgs),

    /// Generate a short phrase in several languages
    Smoke(commands::smoke::SmokeArgs),

    /// List supported languages
    Languages {
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Show or change saved defaults
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print the current configuration
    Show,
    /// Print one value
    Get { key: String },
    /// Set a value (keys: endpoint, language, output_dir)
    Set { key: String, value: String },
    /// Print the config file location
    Path,
    /// Delete the config file
    Reset {
        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Plain,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let theme = if cli.no_color || std::env::var_os("NO_COLOR").is_some() {
        console::set_colors_enabled(false);
        Theme::no_color()
    } else {
        Theme::default()
    };

    let default_filter = if cli.verbose {
        "polyvox_cli=debug,polyvox_core=debug"
    } else {
        "polyvox_cli=warn,polyvox_core=warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(err) = run(cli, &theme).await {
        theme.error(&err.to_string());
        std::process::exit(1);
    }
}

async fn run(cli: Cli, theme: &Theme) -> Result<()> {
    let config_path = config::resolve_config_path(cli.config.as_deref())?;

    match cli.command {
        Commands::Config { command } => {
            commands::config::execute(command, &config_path, theme).await
        }
        Commands::Languages { format } => commands::languages::execute(format),
        Commands::Speak(args) => {
            let session = Session::new(cli.endpoint, Config::load(&config_path)?);
            commands::speak::execute(args, &session, theme).await
        }
        Commands::Narrate(args) => {
            let session = Session::new(cli.endpoint, Config::load(&config_path)?);
            commands::narrate::execute(args, &session, theme).await
        }
        Commands::Smoke(args) => {
            theme.print_banner();
            let session = Session::new(cli.endpoint, Config::load(&config_path)?);
            commands::smoke::execute(args, &session, theme).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).expect("arguments should parse")
    }

    #[test]
    fn speak_accepts_voice_options() {
        let cli = parse(&[
            "polyvox",
            "speak",
            "Hola",
            "-l",
            "es",
            "--exaggeration",
            "0.7",
            "--cfg-weight",
            "0.3",
            "--reference",
            "voice.wav",
            "-o",
            "hola.wav",
        ]);
        let Commands::Speak(args) = cli.command else {
            panic!("expected speak");
        };
        assert_eq!(args.voice.language.as_deref(), Some("es"));
        assert_eq!(args.voice.exaggeration, 0.7);
        assert_eq!(args.voice.cfg_weight, 0.3);
        assert_eq!(args.voice.temperature, 0.7);
        assert_eq!(args.voice.speed, 1.0);
        assert_eq!(args.voice.reference, Some(PathBuf::from("voice.wav")));
        assert_eq!(args.output, Some(PathBuf::from("hola.wav")));
    }

    #[test]
    fn narrate_defaults_chunk_size() {
        let cli = parse(&["polyvox", "narrate", "book.txt"]);
        let Commands::Narrate(args) = cli.command else {
            panic!("expected narrate");
        };
        assert_eq!(args.chunk_size, 500);
    }

    #[test]
    fn global_flags_work_after_subcommand() {
        let cli = parse(&[
            "polyvox",
            "languages",
            "--format",
            "json",
            "--endpoint",
            "http://gpu:8000",
            "--no-color",
        ]);
        assert_eq!(cli.endpoint.as_deref(), Some("http://gpu:8000"));
        assert!(cli.no_color);
        assert!(matches!(
            cli.command,
            Commands::Languages {
                format: OutputFormat::Json
            }
        ));
    }

    #[test]
    fn config_set_takes_key_and_value() {
        let cli = parse(&["polyvox", "config", "set", "language", "fr"]);
        assert!(matches!(
            cli.command,
            Commands::Config {
                command: ConfigCommands::Set { .. }
            }
        ));
    }
}
