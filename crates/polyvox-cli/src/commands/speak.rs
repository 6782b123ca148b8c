use std::path::PathBuf;

use clap::Args;
use indicatif::ProgressBar;
use polyvox_core::{languages, OutputTarget, SpeechJob, SpeechService};

use super::{Session, VoiceArgs};
use crate::error::Result;
use crate::style::{self, Theme};
use crate::utils;

#[derive(Debug, Args)]
pub struct SpeakArgs {
    /// Text to speak, or `-` to read from stdin
    pub text: String,

    /// Output WAV file [default: <output_dir>/output.wav]
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub voice: VoiceArgs,
}

pub async fn execute(args: SpeakArgs, session: &Session, theme: &Theme) -> Result<()> {
    let text = utils::text_or_stdin(args.text)?;
    let language = languages::resolve(&session.language(args.voice.language.as_deref()))?;
    let params = args.voice.params();
    params.validate()?;

    let output = args
        .output
        .unwrap_or_else(|| session.output_dir().join("output.wav"));

    theme.step(1, 2, "Loading model...");
    let model = session.connect(theme).await?;
    let service = SpeechService::new(model, OutputTarget::Fixed { path: output });

    theme.step(
        2,
        2,
        &format!(
            "Generating {} speech: \"{}\"",
            language.name,
            utils::truncate_chars(text.trim(), 60)
        ),
    );
    let pb = ProgressBar::new_spinner();
    pb.set_style(style::spinner_style());
    pb.set_message("Synthesizing...");
    pb.enable_steady_tick(std::time::Duration::from_millis(100));

    let started = std::time::Instant::now();
    let result = service
        .generate_speech(SpeechJob {
            text,
            language: language.code.to_string(),
            reference_audio: args.voice.reference,
            params,
        })
        .await;
    pb.finish_and_clear();
    let output = result?;

    theme.success(&output.status_message());
    theme.info(&format!(
        "Saved to {} ({}, took {})",
        output.path.display(),
        utils::file_size(&output.path)
            .map(utils::format_bytes)
            .unwrap_or_else(|| "-".to_string()),
        utils::format_duration(started.elapsed())
    ));
    Ok(())
}
