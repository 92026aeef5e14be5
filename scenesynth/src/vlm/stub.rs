//! Deterministic provider for tests and offline runs.

use crate::error::ClassifierError;
use crate::vlm::{ForegroundReading, ProblemContext, VlmProvider};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};

/// Deterministic stand-in for a real endpoint.
///
/// Classification calls are dispatched on the mean intensity of the decoded
/// sample (the registered entry nearest to the observed mean wins, which
/// absorbs JPEG round-trip noise). Generation calls are dispatched on prompt
/// markers. Call counters expose how often the boundary was crossed.
#[derive(Default)]
pub struct StubVlmProvider {
    backgrounds: Vec<(u8, String)>,
    foregrounds: Vec<(u8, ForegroundReading)>,
    replies: Vec<(String, String)>,
    background_calls: AtomicU64,
    foreground_calls: AtomicU64,
}

impl StubVlmProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Background label returned for samples whose mean intensity is nearest
    /// to `intensity`.
    pub fn with_background(mut self, intensity: u8, label: &str) -> Self {
        self.backgrounds.push((intensity, label.to_string()));
        self
    }

    /// Foreground reading returned for samples whose mean intensity is
    /// nearest to `intensity`.
    pub fn with_foreground(mut self, intensity: u8, reading: ForegroundReading) -> Self {
        self.foregrounds.push((intensity, reading));
        self
    }

    /// Reply returned by `generate_text`/`generate_json` for prompts
    /// containing `marker`. First registered match wins.
    pub fn with_reply(mut self, marker: &str, reply: &str) -> Self {
        self.replies.push((marker.to_string(), reply.to_string()));
        self
    }

    pub fn background_calls(&self) -> u64 {
        self.background_calls.load(Ordering::Relaxed)
    }

    pub fn foreground_calls(&self) -> u64 {
        self.foreground_calls.load(Ordering::Relaxed)
    }

    fn mean_intensity(jpeg: &[u8]) -> Result<u8, ClassifierError> {
        let img = image::load_from_memory(jpeg)
            .map_err(|e| ClassifierError::Malformed(format!("Stub could not decode sample: {}", e)))?
            .to_rgb8();
        let mut sum: u64 = 0;
        for px in img.pixels() {
            sum += px.0[0] as u64 + px.0[1] as u64 + px.0[2] as u64;
        }
        let count = (img.width() as u64) * (img.height() as u64) * 3;
        Ok((sum / count.max(1)) as u8)
    }

    fn nearest<T>(entries: &[(u8, T)], value: u8) -> Option<&T> {
        entries
            .iter()
            .min_by_key(|(v, _)| (*v as i32 - value as i32).abs())
            .map(|(_, t)| t)
    }

    fn reply_for(&self, prompt: &str) -> Result<String, ClassifierError> {
        self.replies
            .iter()
            .find(|(marker, _)| prompt.contains(marker))
            .map(|(_, reply)| reply.clone())
            .ok_or_else(|| {
                ClassifierError::Malformed("No stub reply registered for prompt".to_string())
            })
    }
}

#[async_trait]
impl VlmProvider for StubVlmProvider {
    async fn classify_background(
        &self,
        jpeg: &[u8],
        _ctx: &ProblemContext,
    ) -> Result<String, ClassifierError> {
        self.background_calls.fetch_add(1, Ordering::Relaxed);
        let value = Self::mean_intensity(jpeg)?;
        Self::nearest(&self.backgrounds, value)
            .cloned()
            .ok_or_else(|| {
                ClassifierError::Malformed(format!(
                    "No stub background registered (intensity {})",
                    value
                ))
            })
    }

    async fn classify_foreground(
        &self,
        jpeg: &[u8],
        _ctx: &ProblemContext,
    ) -> Result<ForegroundReading, ClassifierError> {
        self.foreground_calls.fetch_add(1, Ordering::Relaxed);
        let value = Self::mean_intensity(jpeg)?;
        Self::nearest(&self.foregrounds, value)
            .cloned()
            .ok_or_else(|| {
                ClassifierError::Malformed(format!(
                    "No stub foreground registered (intensity {})",
                    value
                ))
            })
    }

    async fn generate_text(&self, prompt: &str) -> Result<String, ClassifierError> {
        self.reply_for(prompt)
    }

    async fn generate_json(&self, prompt: &str) -> Result<String, ClassifierError> {
        self.reply_for(prompt)
    }
}
