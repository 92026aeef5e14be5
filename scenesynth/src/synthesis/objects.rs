//! Object vocabulary generation.

use crate::catalog::ObjectCategories;
use crate::error::{ClassifierError, SynthError};
use crate::pddl;
use crate::vlm::{call_with_retry, RetryPolicy, VlmProvider};
use serde_json::Value;
use tracing::{info, warn};

const OBJECTS_PROMPT: &str = "You are given the description of a grid-based scenario. \
Extract its object vocabulary. \
Only return a json file with the keys \"unique_objects\" (objects that occur exactly once), \
\"generic_objects\" (objects that may occur any number of times), \
\"background_cells\" (background cell types of the grid) and \
\"agent\" (the controllable entities, two at most) and nothing else.\n";

/// Generates the object vocabulary, regenerating until it passes the
/// structural checks in `ObjectCategories::validate`.
///
/// A reply that is not JSON at all aborts the run; a JSON reply with the
/// wrong shape or failing validation is regenerated.
pub async fn synthesize_objects(
    provider: &dyn VlmProvider,
    description: &str,
    policy: &RetryPolicy,
) -> Result<ObjectCategories, SynthError> {
    let prompt = format!("{}Description:{}", OBJECTS_PROMPT, description);
    loop {
        let reply = call_with_retry(policy, "object vocabulary generation", || {
            provider.generate_json(&prompt)
        })
        .await?;

        let value: Value = serde_json::from_str(pddl::extract_json(&reply)).map_err(|e| {
            ClassifierError::Malformed(format!("object vocabulary reply is not JSON: {}", e))
        })?;
        let categories: ObjectCategories = match serde_json::from_value(value) {
            Ok(categories) => categories,
            Err(e) => {
                warn!(
                    "Object vocabulary reply has the wrong shape ({}), regenerating",
                    e
                );
                continue;
            }
        };

        match categories.validate() {
            Ok(()) => {
                info!(
                    "Object vocabulary: {} unique, {} generic, {} background types, {} agents",
                    categories.unique_objects.len(),
                    categories.generic_objects.len(),
                    categories.background_cells.len(),
                    categories.agent.len()
                );
                return Ok(categories);
            }
            Err(errors) => {
                warn!(
                    "Object vocabulary rejected ({}), regenerating",
                    errors.join("; ")
                );
            }
        }
    }
}
