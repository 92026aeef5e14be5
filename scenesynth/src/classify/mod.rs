//! One-call-per-signature classification phase.
//!
//! Responsibilities:
//! - Freeze the set of distinct signatures before any provider call.
//! - Classify each signature exactly once, from its first occurrence.
//! - Skip the foreground call for uniform cells.
//! - Expose the frozen map for fact assembly and persistence.

pub mod records;

pub use records::{ClassificationMap, ClassificationRecord};

use crate::error::SynthError;
use crate::segment::{OccurrenceIndex, SegmentedFrame, Signature};
use crate::vlm::{call_with_retry, ForegroundReading, ProblemContext, RetryPolicy, VlmProvider};
use futures::future::join_all;
use indexmap::IndexMap;
use tracing::{debug, info};

/// Classifies every distinct signature in the stimulus.
///
/// The signature set is frozen before the first call is dispatched, so
/// every occurrence in every frame resolves through the returned map.
/// Calls for different signatures run concurrently; retrying a transient
/// failure stalls only its own signature.
pub async fn classify_signatures(
    provider: &dyn VlmProvider,
    frames: &[SegmentedFrame],
    index: &OccurrenceIndex,
    context: &ProblemContext,
    policy: &RetryPolicy,
) -> Result<ClassificationMap, SynthError> {
    let total = index.total_occurrences();
    let distinct = index.distinct_count();
    info!(
        "Classifying {} distinct signatures covering {} cell instances",
        distinct, total
    );
    if total > distinct {
        info!(
            "Classifier calls saved by signature deduplication: {}",
            total - distinct
        );
    }

    let signatures: Vec<Signature> = index.signatures().collect();
    let calls = signatures
        .iter()
        .map(|signature| classify_one(provider, frames, index, context, policy, *signature));
    let results = join_all(calls).await;

    let mut map = IndexMap::new();
    for (signature, result) in signatures.into_iter().zip(results) {
        map.insert(signature, result?);
    }
    Ok(ClassificationMap::new(map))
}

async fn classify_one(
    provider: &dyn VlmProvider,
    frames: &[SegmentedFrame],
    index: &OccurrenceIndex,
    context: &ProblemContext,
    policy: &RetryPolicy,
    signature: Signature,
) -> Result<ClassificationRecord, SynthError> {
    let occurrence = index.representative(signature).ok_or_else(|| {
        SynthError::Invalid(format!("signature {} has no recorded occurrence", signature))
    })?;
    let cell = frames[occurrence.frame].cell(occurrence.row, occurrence.col);

    let cell_type = call_with_retry(policy, "cell classification", || {
        provider.classify_background(&cell.jpeg, context)
    })
    .await?;

    let reading = if cell.is_uniform() {
        debug!(
            "Signature {} is uniform (variability {}), skipping object classification",
            signature, cell.variability
        );
        ForegroundReading::empty()
    } else {
        call_with_retry(policy, "object classification", || {
            provider.classify_foreground(&cell.jpeg, context)
        })
        .await?
    };

    debug!("Signature {} classified as '{}'", signature, cell_type);
    Ok(ClassificationRecord {
        cell_type,
        object_names: reading.object_names,
        fact_fragment: reading.fact_fragment,
    })
}
