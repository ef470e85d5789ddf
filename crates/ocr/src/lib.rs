pub mod config;
pub mod confusion;
pub mod extract;
pub mod hash;
pub mod pipeline;
pub mod preprocess;
pub mod recognizer;
pub mod types;

pub use config::{ColorStrategy, ConfigError, ExtractConfig, NormalizeConfig, ScanConfig};
pub use confusion::clean_digits;
pub use extract::Extractor;
pub use pipeline::{spawn_intake_watcher, PipelineError, ScanPipeline, ScanResult};
pub use preprocess::{prepare_for_ocr, prepare_for_ocr_from_bytes, PreprocessError};
pub use recognizer::{MockRecognizer, OcrBackend, OcrError, ProgressFn};
pub use types::{ExtractedCreature, ExtractedField, HpReading, Line, Transcript};
