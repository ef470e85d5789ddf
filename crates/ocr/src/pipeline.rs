use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::ScanConfig;
use crate::extract::Extractor;
use crate::hash;
use crate::preprocess;
use crate::recognizer::{OcrBackend, OcrError, ProgressFn};
use crate::types::{ExtractedCreature, Transcript};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image preprocessing failed: {0}")]
    Preprocess(#[from] preprocess::PreprocessError),
    #[error("OCR recognition failed: {0}")]
    Ocr(#[from] OcrError),
}

/// The result of one screenshot scan.
#[derive(Debug, Clone, Serialize)]
pub struct ScanResult {
    /// SHA-256 hex digest of the original file — the content-addressed key.
    pub hash_hex: String,
    /// Where the original screenshot was stored.
    pub screenshot_path: PathBuf,
    /// Raw recognizer output.
    pub transcript: Transcript,
    /// Structured fields recovered from the transcript.
    pub extracted: ExtractedCreature,
    /// Reference-table cross-check, when both name and CP were recovered.
    pub verdict: Option<cpscan_core::Verdict>,
    pub scanned_at: DateTime<Utc>,
}

/// Orchestrates one scan: hash → content-store → normalize → OCR → extract.
/// Each invocation owns its buffers; concurrent scans of independent images
/// share nothing mutable.
pub struct ScanPipeline<R: OcrBackend> {
    recognizer: R,
    screenshots_dir: PathBuf,
    config: ScanConfig,
    lang: String,
}

impl<R: OcrBackend> ScanPipeline<R> {
    pub fn new(recognizer: R, screenshots_dir: PathBuf, config: ScanConfig) -> Self {
        Self { recognizer, screenshots_dir, config, lang: "eng".to_string() }
    }

    pub fn with_lang(mut self, lang: &str) -> Self {
        self.lang = lang.to_string();
        self
    }

    /// Scan a screenshot on disk.
    pub async fn process_file(
        &self,
        path: &Path,
        progress: Option<ProgressFn>,
        cancel: Option<CancellationToken>,
    ) -> Result<ScanResult, PipelineError> {
        let bytes = tokio::fs::read(path).await?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("bin")
            .to_lowercase();
        self.process_bytes(&bytes, &ext, progress, cancel).await
    }

    /// Scan raw screenshot bytes.
    pub async fn process_bytes(
        &self,
        data: &[u8],
        ext: &str,
        progress: Option<ProgressFn>,
        cancel: Option<CancellationToken>,
    ) -> Result<ScanResult, PipelineError> {
        let hash_hex = hash::to_hex(&hash::sha256_bytes(data));
        let dest = hash::screenshot_path(&self.screenshots_dir, &hash_hex, ext);
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&dest, data).await?;

        let image_bytes = preprocess::prepare_for_ocr_from_bytes(data, &self.config.normalize)?;

        // The one suspension point of a scan. Cancellation surfaces as an
        // OCR failure: no retry, fields stay not-found, next scan unaffected.
        let transcript = match cancel {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => return Err(OcrError::Cancelled.into()),
                r = self.recognizer.recognize(&image_bytes, &self.lang, progress) => r?,
            },
            None => {
                self.recognizer
                    .recognize(&image_bytes, &self.lang, progress)
                    .await?
            }
        };

        let extracted = Extractor::extract(&transcript, &self.config.extract);
        let verdict = match (&extracted.name, &extracted.cp) {
            (Some(name), Some(cp)) => Some(cpscan_core::verify(&name.value, cp.value)),
            _ => None,
        };
        tracing::debug!(
            hash = %hash_hex,
            cp = ?extracted.cp.as_ref().map(|f| f.value),
            name = ?extracted.name.as_ref().map(|f| f.value.as_str()),
            "scan complete"
        );

        Ok(ScanResult {
            hash_hex,
            screenshot_path: dest,
            transcript,
            extracted,
            verdict,
            scanned_at: Utc::now(),
        })
    }
}

// ── Watch-folder integration ──────────────────────────────────────────────────

/// Spawn a notify watcher on `watch_dir` that sends newly created screenshot
/// paths to `tx`. Returns the watcher — it must be kept alive for watching
/// to continue.
pub fn spawn_intake_watcher(
    watch_dir: &Path,
    tx: mpsc::Sender<PathBuf>,
) -> notify::Result<impl notify::Watcher> {
    use notify::{EventKind, RecursiveMode, Watcher};

    let mut watcher = notify::recommended_watcher(move |event: notify::Result<notify::Event>| {
        if let Ok(ev) = event {
            if matches!(ev.kind, EventKind::Create(_)) {
                for path in ev.paths {
                    let _ = tx.try_send(path);
                }
            }
        }
    })?;

    watcher.watch(watch_dir, RecursiveMode::NonRecursive)?;
    Ok(watcher)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognizer::MockRecognizer;
    use cpscan_core::Verdict;
    use image::{DynamicImage, GrayImage, ImageBuffer, Luma};
    use std::io::Cursor;

    fn tiny_png() -> Vec<u8> {
        let img: GrayImage = ImageBuffer::from_fn(4, 4, |_, _| Luma([200u8]));
        let mut buf = Vec::new();
        DynamicImage::ImageLuma8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    fn pipeline(text: &str, dir: &Path) -> ScanPipeline<MockRecognizer> {
        ScanPipeline::new(
            MockRecognizer::new(text),
            dir.to_path_buf(),
            ScanConfig::default(),
        )
    }

    #[tokio::test]
    async fn process_bytes_produces_scan_result() {
        let dir = tempfile::tempdir().unwrap();
        let p = pipeline("11:42\nCP2207\nGarchomp\nHP 187/187", dir.path());

        let result = p.process_bytes(&tiny_png(), "png", None, None).await.unwrap();

        assert_eq!(result.hash_hex.len(), 64);
        assert!(result.screenshot_path.exists());
        assert_eq!(result.extracted.cp.as_ref().unwrap().value, 2207);
        assert_eq!(result.extracted.name.as_ref().unwrap().value, "Garchomp");
        assert_eq!(result.verdict, Some(Verdict::Plausible));
    }

    #[tokio::test]
    async fn implausible_cp_is_flagged_by_the_cross_check() {
        let dir = tempfile::tempdir().unwrap();
        let p = pipeline("CP3000\nGible\nHP 55/55", dir.path());

        let result = p.process_bytes(&tiny_png(), "png", None, None).await.unwrap();

        assert_eq!(result.extracted.cp.as_ref().unwrap().value, 3000);
        assert_eq!(result.verdict, Some(Verdict::ImplausibleCp { max_cp: 1300 }));
    }

    #[tokio::test]
    async fn dedup_path_is_stable() {
        let dir = tempfile::tempdir().unwrap();
        let p = pipeline("irrelevant", dir.path());
        let data = tiny_png();

        let r1 = p.process_bytes(&data, "png", None, None).await.unwrap();
        let r2 = p.process_bytes(&data, "png", None, None).await.unwrap();

        assert_eq!(r1.hash_hex, r2.hash_hex);
        assert_eq!(r1.screenshot_path, r2.screenshot_path);
    }

    #[tokio::test]
    async fn empty_transcript_yields_not_found_fields_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let p = pipeline("", dir.path());

        let result = p.process_bytes(&tiny_png(), "png", None, None).await.unwrap();

        assert!(result.extracted.is_empty());
        assert_eq!(result.verdict, None);
    }

    #[tokio::test]
    async fn cancellation_surfaces_as_ocr_failure() {
        let dir = tempfile::tempdir().unwrap();
        let p = pipeline("CP2207", dir.path());
        let token = CancellationToken::new();
        token.cancel();

        let err = p
            .process_bytes(&tiny_png(), "png", None, Some(token))
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Ocr(OcrError::Cancelled)));
    }
}
