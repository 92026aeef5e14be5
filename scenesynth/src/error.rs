//! Error types shared across the synthesis pipeline.
//!
//! Responsibilities:
//! - Separate the classifier-boundary failure modes (transient vs malformed)
//!   from pipeline-level failures so retry wrappers can dispatch on them.
//! - Keep artifact and validation failures distinct: a missing upstream file
//!   is fatal for the problem instance, a failed structural check is only
//!   fatal once the regeneration budget is spent.

use thiserror::Error;

/// Failure modes of a single classifier/generator call.
///
/// Transient failures are retried by the call wrapper; malformed responses
/// are returned to the caller unchanged.
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("Transient provider failure: {0}")]
    Transient(String),
    #[error("Malformed provider response: {0}")]
    Malformed(String),
}

impl ClassifierError {
    pub fn is_transient(&self) -> bool {
        matches!(self, ClassifierError::Transient(_))
    }
}

/// Error type for the synthesis pipeline.
#[derive(Debug, Error)]
pub enum SynthError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serde(String),
    #[error("Image error: {0}")]
    Image(String),
    #[error("Classifier error: {0}")]
    Classifier(ClassifierError),
    #[error("Missing upstream artifact: {0}")]
    MissingArtifact(String),
    #[error("Structural validation failed: {0}")]
    Validation(String),
    #[error("Synthesis gave up after {attempts} attempts, last failure: {check}")]
    SynthesisExhausted { attempts: u32, check: String },
    #[error("Invalid input: {0}")]
    Invalid(String),
}

impl From<std::io::Error> for SynthError {
    fn from(e: std::io::Error) -> Self {
        SynthError::Io(e.to_string())
    }
}
impl From<serde_json::Error> for SynthError {
    fn from(e: serde_json::Error) -> Self {
        SynthError::Serde(e.to_string())
    }
}
impl From<image::ImageError> for SynthError {
    fn from(e: image::ImageError) -> Self {
        SynthError::Image(e.to_string())
    }
}
impl From<ClassifierError> for SynthError {
    fn from(e: ClassifierError) -> Self {
        SynthError::Classifier(e)
    }
}
