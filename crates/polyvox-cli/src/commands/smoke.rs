use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Args;
use comfy_table::{Cell, CellAlignment, Color, Table};
use polyvox_core::{
    languages, GenerationParams, OutputTarget, SpeechJob, SpeechModel, SpeechService,
};

use super::Session;
use crate::error::{CliError, Result};
use crate::style::Theme;

/// One short phrase per script family.
pub const SMOKE_CASES: [(&str, &str); 4] = [
    ("en", "Hello, this is English."),
    ("es", "Hola, esto es español."),
    ("hi", "नमस्ते, यह हिंदी है।"),
    ("zh", "你好，这是中文。"),
];

#[derive(Debug, Args)]
pub struct SmokeArgs {
    /// Directory for the multilingual_<code>.wav files [default: <output_dir>]
    #[arg(long)]
    pub out_dir: Option<PathBuf>,
}

#[derive(Debug)]
pub struct SmokeResult {
    pub code: &'static str,
    pub outcome: std::result::Result<(PathBuf, f32), String>,
}

pub async fn execute(args: SmokeArgs, session: &Session, theme: &Theme) -> Result<()> {
    let out_dir = args.out_dir.unwrap_or_else(|| session.output_dir());
    if !out_dir.exists() {
        theme.warning(&format!("{} does not exist, creating it", out_dir.display()));
    }
    let model = session.connect(theme).await?;

    theme.info(&format!(
        "Testing {} languages, writing to {}",
        SMOKE_CASES.len(),
        out_dir.display()
    ));
    let results = run_cases(model, &out_dir, theme).await;
    print_summary(&results);

    let failed = results.iter().filter(|r| r.outcome.is_err()).count();
    if failed > 0 {
        return Err(CliError::SmokeFailed {
            failed,
            total: results.len(),
        });
    }
    theme.success("All languages generated successfully");
    Ok(())
}

/// Run every case in order; a failing language does not stop the rest.
pub async fn run_cases(
    model: Arc<dyn SpeechModel>,
    out_dir: &Path,
    theme: &Theme,
) -> Vec<SmokeResult> {
    let mut results = Vec::with_capacity(SMOKE_CASES.len());

    for (idx, &(code, text)) in SMOKE_CASES.iter().enumerate() {
        let name = languages::lookup(code)
            .map(|lang| lang.name)
            .unwrap_or(code);
        theme.step(idx + 1, SMOKE_CASES.len(), &format!("{name}: {text}"));

        let service = SpeechService::new(
            model.clone(),
            OutputTarget::Fixed {
                path: out_dir.join(format!("multilingual_{code}.wav")),
            },
        );
        let outcome = service
            .generate_speech(SpeechJob {
                text: text.to_string(),
                language: code.to_string(),
                reference_audio: None,
                params: GenerationParams::default(),
            })
            .await
            .map(|output| (output.path, output.duration_secs))
            .map_err(|err| err.to_string());

        match &outcome {
            Ok((path, _)) => theme.success(&format!("Saved {}", path.display())),
            Err(err) => theme.error(&format!("{name} failed: {err}")),
        }
        results.push(SmokeResult { code, outcome });
    }

    results
}

fn print_summary(results: &[SmokeResult]) {
    let mut table = Table::new();
    table.set_header(vec!["Language", "Result", "Duration", "File"]);

    for result in results {
        let name = languages::lookup(result.code)
            .map(|lang| lang.choice_label())
            .unwrap_or_else(|| result.code.to_string());
        match &result.outcome {
            Ok((path, duration)) => table.add_row(vec![
                Cell::new(name).fg(Color::Cyan),
                Cell::new("✓").fg(Color::Green),
                Cell::new(format!("{duration:.1}s")).set_alignment(CellAlignment::Right),
                Cell::new(path.display().to_string()),
            ]),
            Err(err) => table.add_row(vec![
                Cell::new(name).fg(Color::Cyan),
                Cell::new("✗").fg(Color::Red),
                Cell::new("-").set_alignment(CellAlignment::Right),
                Cell::new(err),
            ]),
        };
    }

    println!();
    println!("{table}");
}
