use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::types::Transcript;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Image decode error: {0}")]
    ImageDecode(String),
    #[error("OCR engine error: {0}")]
    Engine(String),
    #[error("OCR cancelled")]
    Cancelled,
    #[error("Tesseract not available — build with `tesseract` feature")]
    NotAvailable,
}

/// Observational progress hook: invoked with a monotonically non-decreasing
/// completion fraction in [0, 1]. Must not influence recognition output.
pub type ProgressFn = Arc<dyn Fn(f32) + Send + Sync>;

/// Abstraction over an OCR backend. Implementations accept PNG/JPEG bytes
/// plus a language hint and return the line-segmented transcript.
/// Recognition is the single long-running step of a scan, so the call is
/// async; everything around it is ordinary CPU work.
#[async_trait]
pub trait OcrBackend: Send + Sync {
    async fn recognize(
        &self,
        image_bytes: &[u8],
        lang: &str,
        progress: Option<ProgressFn>,
    ) -> Result<Transcript, OcrError>;
}

#[async_trait]
impl<T: OcrBackend + ?Sized> OcrBackend for Box<T> {
    async fn recognize(
        &self,
        image_bytes: &[u8],
        lang: &str,
        progress: Option<ProgressFn>,
    ) -> Result<Transcript, OcrError> {
        (**self).recognize(image_bytes, lang, progress).await
    }
}

// ── Mock backend (always available, used for tests) ───────────────────────────

/// Returns a pre-set transcript — lets the extraction pipeline be exercised
/// without Tesseract installed.
pub struct MockRecognizer {
    transcript: Transcript,
}

impl MockRecognizer {
    pub fn new(text: impl Into<String>) -> Self {
        Self { transcript: Transcript::from_text(&text.into()) }
    }

    pub fn from_transcript(transcript: Transcript) -> Self {
        Self { transcript }
    }
}

#[async_trait]
impl OcrBackend for MockRecognizer {
    async fn recognize(
        &self,
        _image_bytes: &[u8],
        _lang: &str,
        progress: Option<ProgressFn>,
    ) -> Result<Transcript, OcrError> {
        if let Some(report) = &progress {
            report(0.0);
            report(0.5);
            report(1.0);
        }
        Ok(self.transcript.clone())
    }
}

// ── Tesseract backend (optional, gated behind `tesseract` feature) ─────────────

#[cfg(feature = "tesseract")]
pub mod tesseract_backend {
    use super::{async_trait, OcrBackend, OcrError, ProgressFn};
    use crate::types::Transcript;
    use leptess::LepTess;

    pub struct TesseractRecognizer {
        data_path: Option<String>,
    }

    impl TesseractRecognizer {
        pub fn new(data_path: Option<String>) -> Self {
            Self { data_path }
        }
    }

    #[async_trait]
    impl OcrBackend for TesseractRecognizer {
        async fn recognize(
            &self,
            image_bytes: &[u8],
            lang: &str,
            progress: Option<ProgressFn>,
        ) -> Result<Transcript, OcrError> {
            if let Some(report) = &progress {
                report(0.0);
            }
            let data_path = self.data_path.clone();
            let lang = lang.to_string();
            let bytes = image_bytes.to_vec();
            // leptess is synchronous; keep it off the async executor.
            let text = tokio::task::spawn_blocking(move || {
                let mut lt = LepTess::new(data_path.as_deref(), &lang)
                    .map_err(|e| OcrError::Engine(e.to_string()))?;
                lt.set_image_from_mem(&bytes)
                    .map_err(|e| OcrError::ImageDecode(e.to_string()))?;
                lt.get_utf8_text().map_err(|e| OcrError::Engine(e.to_string()))
            })
            .await
            .map_err(|e| OcrError::Engine(e.to_string()))??;
            if let Some(report) = &progress {
                report(1.0);
            }
            Ok(Transcript::from_text(&text))
        }
    }
}
