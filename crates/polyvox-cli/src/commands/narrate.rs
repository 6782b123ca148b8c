use std::path::PathBuf;

use clap::Args;
use indicatif::ProgressBar;
use polyvox_core::params::CHUNK_SIZE_DEFAULT;
use polyvox_core::{
    chunk_text, languages, read_text_file, ChunkSize, NarrationJob, OutputTarget, SpeechService,
};

use super::{Session, VoiceArgs};
use crate::error::Result;
use crate::style::{self, Theme};
use crate::utils;

#[derive(Debug, Args)]
pub struct NarrateArgs {
    /// UTF-8 text file to narrate
    pub file: PathBuf,

    /// Maximum characters per chunk (200 to 1000)
    #[arg(long, default_value_t = CHUNK_SIZE_DEFAULT)]
    pub chunk_size: usize,

    /// Output WAV file [default: <output_dir>/<file stem>.wav]
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub voice: VoiceArgs,
}

pub async fn execute(args: NarrateArgs, session: &Session, theme: &Theme) -> Result<()> {
    let chunk_size = ChunkSize::new(args.chunk_size)?;
    let language = languages::resolve(&session.language(args.voice.language.as_deref()))?;
    let params = args.voice.params();
    params.validate()?;

    let text = read_text_file(&args.file).await?;
    let planned = chunk_text(&text, chunk_size.get()).len();
    theme.info(&format!(
        "{}: {} characters, {} chunks of up to {} characters",
        args.file.display(),
        text.chars().count(),
        planned,
        chunk_size.get()
    ));

    let output = args
        .output
        .unwrap_or_else(|| utils::wav_path_for(&args.file, &session.output_dir()));

    let model = session.connect(theme).await?;
    let service = SpeechService::new(model, OutputTarget::Fixed { path: output });

    let pb = ProgressBar::new(planned as u64);
    pb.set_style(style::chunk_progress_style());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));

    let started = std::time::Instant::now();
    let result = service
        .narrate_text_with_progress(
            NarrationJob {
                text,
                language: language.code.to_string(),
                reference_audio: args.voice.reference,
                params,
                chunk_size,
            },
            |done, total| {
                pb.set_length(total as u64);
                pb.set_position(done as u64);
            },
        )
        .await;
    pb.finish_and_clear();
    let output = result?;

    theme.success(&output.status_message());
    theme.info(&format!(
        "Saved to {} (took {})",
        output.path.display(),
        utils::format_duration(started.elapsed())
    ));
    Ok(())
}
