//! Scenario configuration generation.

use crate::catalog::ObjectCategories;
use crate::error::{ClassifierError, SynthError};
use crate::pddl;
use crate::store::ScenarioConfig;
use crate::vlm::{call_with_retry, RetryPolicy, VlmProvider};
use serde_json::Value;
use tracing::info;

const CONFIG_PROMPT: &str = "You are configuring a grid-based scenario. \
Only return a json file with the keys \"grid_size\" (the [rows, columns] of the \
stimulus grid), \"observability\" (\"full\" or \"partial\"), \"belief_config\" \
(an object with the keys \"belief_object\" and \"belief_container\", required \
when observability is \"partial\") and \"goals\" and nothing else.\n";

/// Generates the scenario configuration.
///
/// A reply that is not JSON aborts the run. A JSON reply that does not fit
/// the configuration shape fails with a validation error, which charges the
/// enclosing synthesis attempt.
pub async fn synthesize_scenario(
    provider: &dyn VlmProvider,
    description: &str,
    domain: &str,
    categories: &ObjectCategories,
    policy: &RetryPolicy,
) -> Result<ScenarioConfig, SynthError> {
    let objects_json = serde_json::to_string(categories)?;
    let prompt = format!(
        "{}\nTask description:{}\nPDDL domain file:{}\nObjects:{}",
        CONFIG_PROMPT, description, domain, objects_json
    );
    let reply = call_with_retry(policy, "scenario configuration", || {
        provider.generate_json(&prompt)
    })
    .await?;

    let value: Value = serde_json::from_str(pddl::extract_json(&reply)).map_err(|e| {
        ClassifierError::Malformed(format!("scenario configuration reply is not JSON: {}", e))
    })?;
    let scenario: ScenarioConfig = serde_json::from_value(value).map_err(|e| {
        SynthError::Validation(format!("scenario configuration has the wrong shape: {}", e))
    })?;
    info!(
        "Scenario: {}x{} grid, {:?} observability",
        scenario.grid_size.0, scenario.grid_size.1, scenario.observability
    );
    Ok(scenario)
}
