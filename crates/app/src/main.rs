use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use cpscan_ocr::{OcrBackend, ProgressFn, ScanConfig, ScanPipeline};

mod report;

#[derive(Parser)]
#[command(name = "cpscan", about = "Extract creature stats from game screenshots via OCR")]
struct Cli {
    /// TOML scan configuration; tuned defaults are used when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan a single screenshot and print the recovered fields.
    Scan {
        image: PathBuf,
        /// Emit the full scan result as JSON instead of the text report.
        #[arg(long)]
        json: bool,
    },
    /// Watch a folder and scan every screenshot dropped into it.
    Watch {
        /// Folder to watch; defaults to `<data-dir>/intake`.
        dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ScanConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ScanConfig::default(),
    };

    let project_dirs = directories::ProjectDirs::from("dev", "cpscan", "cpscan")
        .context("failed to resolve app directory")?;
    let data_dir = project_dirs.data_dir().to_path_buf();
    let screenshots_dir = data_dir.join("screenshots");
    std::fs::create_dir_all(&screenshots_dir)
        .with_context(|| format!("failed to create {}", screenshots_dir.display()))?;

    let pipeline = ScanPipeline::new(build_recognizer(), screenshots_dir, config);

    match cli.command {
        Command::Scan { image, json } => scan_once(&pipeline, &image, json).await,
        Command::Watch { dir } => {
            watch_folder(pipeline, dir.unwrap_or_else(|| data_dir.join("intake"))).await
        }
    }
}

#[cfg(feature = "tesseract")]
fn build_recognizer() -> Box<dyn OcrBackend> {
    use cpscan_ocr::recognizer::tesseract_backend::TesseractRecognizer;
    Box::new(TesseractRecognizer::new(None))
}

#[cfg(not(feature = "tesseract"))]
fn build_recognizer() -> Box<dyn OcrBackend> {
    tracing::warn!("built without the `tesseract` feature; OCR returns an empty transcript");
    Box::new(cpscan_ocr::MockRecognizer::new(""))
}

async fn scan_once(
    pipeline: &ScanPipeline<Box<dyn OcrBackend>>,
    image: &Path,
    json: bool,
) -> Result<()> {
    let progress: ProgressFn =
        Arc::new(|f: f32| tracing::info!("scanning… {:.0}%", f * 100.0));

    match pipeline.process_file(image, Some(progress), None).await {
        Ok(result) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print!("{}", report::render(&result));
            }
        }
        Err(e) => {
            // A failed scan is a status message plus not-found fields,
            // never a crash; the next invocation starts clean.
            eprintln!("scan failed: {e}");
            print!("{}", report::render_failure());
        }
    }
    Ok(())
}

async fn watch_folder(pipeline: ScanPipeline<Box<dyn OcrBackend>>, dir: PathBuf) -> Result<()> {
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;

    // The channel bridges the notify watcher thread and the async processor.
    let (tx, mut rx) = mpsc::channel::<PathBuf>(64);
    let _watcher = cpscan_ocr::spawn_intake_watcher(&dir, tx)
        .context("failed to start intake folder watcher")?;
    tracing::info!("watching intake folder: {}", dir.display());

    let cancel = CancellationToken::new();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                cancel.cancel();
                tracing::info!("shutting down");
                break;
            }
            maybe = rx.recv() => {
                let Some(path) = maybe else { break };
                tracing::info!("processing screenshot: {}", path.display());
                match pipeline.process_file(&path, None, Some(cancel.child_token())).await {
                    Ok(result) => print!("{}", report::render(&result)),
                    Err(e) => {
                        tracing::warn!("scan pipeline error: {e}");
                        print!("{}", report::render_failure());
                    }
                }
            }
        }
    }
    Ok(())
}
