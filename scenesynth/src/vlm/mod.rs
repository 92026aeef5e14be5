//! Vision-language provider abstraction.
//!
//! This module provides the abstraction layer for the model boundary,
//! allowing the pipeline to work against any OpenAI-compatible vision
//! endpoint while tests run against a deterministic stub.

pub mod openai;
pub mod prompts;
pub mod retry;
pub mod stub;

pub use openai::*;
pub use retry::*;
pub use stub::*;

use crate::error::ClassifierError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Per-problem context handed to every classifier call.
#[derive(Debug, Clone, Default)]
pub struct ProblemContext {
    /// Natural-language description of the scenario.
    pub description: String,
    /// Allowed background type labels.
    pub background_types: Vec<String>,
    /// Object names the classifier may report for foreground content.
    pub object_vocabulary: Vec<String>,
    /// Predicates section of the domain, guiding fact fragments.
    pub predicates: String,
}

/// Foreground classification of one cell sample.
///
/// `fact_fragment` may carry `$i`/`$j` markers that assembly substitutes
/// with the cell's 1-based row and column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForegroundReading {
    #[serde(rename = "object_name")]
    pub object_names: Vec<String>,
    #[serde(rename = "object_pddl_str")]
    pub fact_fragment: String,
}

impl ForegroundReading {
    pub fn empty() -> Self {
        ForegroundReading {
            object_names: Vec::new(),
            fact_fragment: String::new(),
        }
    }
}

/// Abstract interface for vision-language providers.
///
/// Implementations signal retryable conditions with
/// `ClassifierError::Transient`; everything else is `Malformed` and is not
/// retried.
#[async_trait]
pub trait VlmProvider: Send + Sync {
    /// Background type of one cell sample.
    async fn classify_background(
        &self,
        jpeg: &[u8],
        ctx: &ProblemContext,
    ) -> Result<String, ClassifierError>;

    /// Foreground objects in one cell sample plus their fact fragment.
    async fn classify_foreground(
        &self,
        jpeg: &[u8],
        ctx: &ProblemContext,
    ) -> Result<ForegroundReading, ClassifierError>;

    /// Generate free text from a prompt.
    async fn generate_text(&self, prompt: &str) -> Result<String, ClassifierError>;

    /// Generate a JSON payload from a prompt. Returns the raw reply; callers
    /// extract and parse.
    async fn generate_json(&self, prompt: &str) -> Result<String, ClassifierError>;
}
