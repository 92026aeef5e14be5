//! Domain and configuration synthesis.
//!
//! Responsibilities:
//! - Generate objects.json, domain.pddl and config.json for one problem.
//! - Regenerate the whole set when the structural cross-checks reject it,
//!   up to a bounded number of attempts with a fixed delay between them.
//!
//! Generation-internal rejections (wrong reply shape, action mismatch)
//! regenerate inside their own step and do not charge an attempt; only a
//! failed cross-check or a rejected configuration shape does.

pub mod domain;
pub mod objects;
pub mod scenario;
pub mod validate;

pub use domain::{synthesize_domain, ActionMatching};
pub use objects::synthesize_objects;
pub use scenario::synthesize_scenario;
pub use validate::check_problem_setup;

use crate::error::SynthError;
use crate::store::ProblemStore;
use crate::vlm::{RetryPolicy, VlmProvider};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

/// Attempt budget and matching mode for one synthesis run.
#[derive(Debug, Clone)]
pub struct SynthesisSettings {
    pub max_attempts: u32,
    /// Pause between a rejected attempt and the next one.
    pub attempt_delay: Duration,
    pub matching: ActionMatching,
}

impl Default for SynthesisSettings {
    fn default() -> Self {
        SynthesisSettings {
            max_attempts: 7,
            attempt_delay: Duration::from_secs(5),
            matching: ActionMatching::default(),
        }
    }
}

/// Generates and persists the three synthesis artifacts, retrying rejected
/// attempts until one validates or the budget runs out.
///
/// Artifacts are persisted as each step finishes, so a rejected attempt
/// still leaves its files behind for inspection.
pub async fn synthesize_problem_setup(
    provider: &dyn VlmProvider,
    store: &ProblemStore,
    settings: &SynthesisSettings,
    policy: &RetryPolicy,
) -> Result<(), SynthError> {
    let description = store.description()?;
    let mut last_failure = String::new();

    for attempt in 1..=settings.max_attempts {
        if attempt > 1 {
            sleep(settings.attempt_delay).await;
        }
        info!(
            "Synthesis attempt {}/{} for {}/{}",
            attempt,
            settings.max_attempts,
            store.domain(),
            store.problem()
        );

        let mut categories = synthesize_objects(provider, &description, policy).await?;
        store.save_categories(&categories)?;

        let domain = synthesize_domain(
            provider,
            &description,
            &mut categories,
            settings.matching,
            policy,
        )
        .await?;
        store.save_domain(&domain)?;
        // Generic names may have been pruned against the domain.
        store.save_categories(&categories)?;

        let scenario =
            match synthesize_scenario(provider, &description, &domain, &categories, policy).await {
                Ok(scenario) => scenario,
                Err(SynthError::Validation(report)) => {
                    warn!("Synthesis attempt {} rejected: {}", attempt, report);
                    last_failure = report;
                    continue;
                }
                Err(e) => return Err(e),
            };
        store.save_scenario(&scenario)?;

        match check_problem_setup(&domain, &scenario, &categories) {
            Ok(()) => {
                info!("Synthesis validated on attempt {}", attempt);
                return Ok(());
            }
            Err(report) => {
                warn!("Synthesis attempt {} rejected: {}", attempt, report);
                last_failure = report;
            }
        }
    }

    Err(SynthError::SynthesisExhausted {
        attempts: settings.max_attempts,
        check: last_failure,
    })
}
