//! Structural validation of a synthesis attempt.

use crate::catalog::ObjectCategories;
use crate::pddl;
use crate::store::{Observability, ScenarioConfig};

/// Cross-checks the three synthesis artifacts against each other. Returns
/// the first failed check, named for the retry report.
pub fn check_problem_setup(
    domain: &str,
    scenario: &ScenarioConfig,
    categories: &ObjectCategories,
) -> Result<(), String> {
    if let Some(belief) = &scenario.belief_config {
        for (key, value) in belief {
            if value.len() < 2 {
                return Err(format!(
                    "belief_config value '{}' for '{}' is too short",
                    value, key
                ));
            }
        }
    }

    if !domain.contains("agent") {
        return Err("domain never mentions 'agent'".to_string());
    }

    for cell_type in &categories.background_cells {
        if !domain.contains(cell_type.as_str()) {
            return Err(format!(
                "background type '{}' does not appear in the domain",
                cell_type
            ));
        }
    }

    if scenario.observability == Observability::Partial {
        let belief = scenario
            .belief_config
            .as_ref()
            .ok_or_else(|| "partial observability without belief_config".to_string())?;
        let object = belief
            .get("belief_object")
            .ok_or_else(|| "belief_config is missing 'belief_object'".to_string())?;
        let container = belief
            .get("belief_container")
            .ok_or_else(|| "belief_config is missing 'belief_container'".to_string())?;

        let types_section = pddl::extract_block(domain, "(:types").unwrap_or_default();
        if !types_section.contains(object.as_str()) {
            return Err(format!(
                "belief_object '{}' does not appear in the (:types section",
                object
            ));
        }
        if !types_section.contains(container.as_str()) {
            return Err(format!(
                "belief_container '{}' does not appear in the (:types section",
                container
            ));
        }
        if !categories.generic_objects.contains(container) {
            return Err(format!(
                "belief_container '{}' is not a generic object",
                container
            ));
        }
    }

    Ok(())
}
