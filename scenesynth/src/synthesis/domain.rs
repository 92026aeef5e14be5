//! Domain file generation.
//!
//! Responsibilities:
//! - Ask for the expected action inventory before generating the domain.
//! - Generate the domain, repair the blank-cell alias, and regenerate when
//!   the declared actions differ from the expected inventory.
//! - Prune generic base names that collide with a unique object name.

use crate::catalog::ObjectCategories;
use crate::error::{ClassifierError, SynthError};
use crate::pddl;
use crate::vlm::{call_with_retry, RetryPolicy, VlmProvider};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

const ACTIONS_PROMPT: &str = "Please count the number of actions that can be performed \
by the agent, based on the text below. Only return a json file in the format of \
{\"action_name\": [action1, action2,...], \"action_count\": N} and nothing else\n\n";

const DOMAIN_PROMPT: &str = "You are given the description of a grid-based scenario. \
Generate a PDDL domain file for it. Model every background cell type as a bit-matrix \
function initialised with new-bit-matrix and written with set-index, declare the \
gridheight and gridwidth functions, and give every object xloc and yloc coordinate \
functions where -1 means off the grid. Declare one (:action ...) block per action \
the description names, and no others.\n";

/// How a declared action is matched against the expected inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionMatching {
    /// A declared action counts as expected when an expected name occurs
    /// inside it ("move-up" covers "move").
    Substring,
    /// Declared and expected names must match exactly.
    Exact,
}

impl Default for ActionMatching {
    fn default() -> Self {
        ActionMatching::Substring
    }
}

#[derive(Debug, Deserialize)]
struct ActionPlan {
    #[serde(rename = "action_name")]
    names: Vec<String>,
    #[serde(rename = "action_count")]
    count: usize,
}

/// Generates the domain file, regenerating until its `(:action ...)` blocks
/// match the expected inventory. On success the colliding generic names are
/// pruned from `categories`.
pub async fn synthesize_domain(
    provider: &dyn VlmProvider,
    description: &str,
    categories: &mut ObjectCategories,
    matching: ActionMatching,
    policy: &RetryPolicy,
) -> Result<String, SynthError> {
    let objects_json = serde_json::to_string(categories)?;

    loop {
        let actions_prompt = format!(
            "{}{}\n\nobjects = {}",
            ACTIONS_PROMPT, description, objects_json
        );
        let reply = call_with_retry(policy, "action inventory", || {
            provider.generate_text(&actions_prompt)
        })
        .await?;
        let value: Value = serde_json::from_str(pddl::extract_json(&reply)).map_err(|e| {
            ClassifierError::Malformed(format!("action inventory reply is not JSON: {}", e))
        })?;
        let plan: ActionPlan = match serde_json::from_value(value) {
            Ok(plan) => plan,
            Err(e) => {
                warn!(
                    "Action inventory reply has the wrong shape ({}), regenerating",
                    e
                );
                continue;
            }
        };
        info!(
            "Expecting {} actions: {:?}",
            plan.count, plan.names
        );

        let domain_prompt = format!(
            "{}\n\nobjects = {}\n\nPlease generate a PDDL domain file based on the text \
above. Only return the PDDL domain file and nothing else.\n{}",
            DOMAIN_PROMPT, objects_json, description
        );
        let raw = call_with_retry(policy, "domain generation", || {
            provider.generate_text(&domain_prompt)
        })
        .await?;
        let domain = repair_background_aliases(
            clean_generated_pddl(&raw),
            &categories.background_cells,
        );

        let declared = pddl::action_names(&domain);
        if let Some(mismatch) = action_mismatch(&declared, &plan.names, matching) {
            warn!("{}, regenerating domain", mismatch);
            continue;
        }
        info!("Domain declares {} actions: {:?}", declared.len(), declared);

        prune_colliding_generics(categories);
        return Ok(domain);
    }
}

fn clean_generated_pddl(raw: &str) -> String {
    raw.replace("```pddl", "")
        .replace("```", "")
        .trim_matches(|c: char| c == '`' || c.is_whitespace())
        .to_string()
}

/// The model flips between the two spellings of the blank cell type; rewrite
/// whichever one the vocabulary does not use.
fn repair_background_aliases(domain: String, background: &[String]) -> String {
    let mut domain = domain;
    if background.iter().any(|b| b == "whitespace") {
        domain = domain.replace("whitesquare", "whitespace");
    }
    if background.iter().any(|b| b == "whitesquare") {
        domain = domain.replace("whitespace", "whitesquare");
    }
    domain
}

/// Returns a description of the first way `declared` differs from
/// `expected`, or None when they line up.
fn action_mismatch(
    declared: &[String],
    expected: &[String],
    matching: ActionMatching,
) -> Option<String> {
    let recognized = |action: &str| match matching {
        ActionMatching::Substring => expected.iter().any(|e| action.contains(e.as_str())),
        ActionMatching::Exact => expected.iter().any(|e| e == action),
    };
    let covered = |name: &str| match matching {
        ActionMatching::Substring => declared.iter().any(|a| a.contains(name)),
        ActionMatching::Exact => declared.iter().any(|a| a == name),
    };

    let extra: Vec<&str> = declared
        .iter()
        .map(String::as_str)
        .filter(|a| !recognized(a))
        .collect();
    if !extra.is_empty() {
        return Some(format!("Domain declares unexpected actions {:?}", extra));
    }
    let missing: Vec<&str> = expected
        .iter()
        .map(String::as_str)
        .filter(|e| !covered(e))
        .collect();
    if !missing.is_empty() {
        return Some(format!("Domain is missing expected actions {:?}", missing));
    }
    None
}

/// Drops generic base names that share a common substring longer than three
/// characters with a unique object name; such a base would be rewritten
/// inside the unique name during identity substitution.
fn prune_colliding_generics(categories: &mut ObjectCategories) {
    let uniques = categories.unique_objects.clone();
    categories.generic_objects.retain(|generic| {
        match uniques
            .iter()
            .find(|unique| longest_common_substring(generic, unique) > 3)
        {
            Some(unique) => {
                warn!(
                    "Dropping generic '{}', name too close to unique '{}'",
                    generic, unique
                );
                false
            }
            None => true,
        }
    });
}

fn longest_common_substring(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut best = 0;
    let mut prev = vec![0usize; b.len() + 1];
    for i in 1..=a.len() {
        let mut cur = vec![0usize; b.len() + 1];
        for j in 1..=b.len() {
            if a[i - 1] == b[j - 1] {
                cur[j] = prev[j - 1] + 1;
                best = best.max(cur[j]);
            }
        }
        prev = cur;
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vlm::StubVlmProvider;

    fn categories() -> ObjectCategories {
        ObjectCategories {
            unique_objects: vec!["goal".to_string()],
            generic_objects: vec!["box".to_string()],
            background_cells: vec!["whitespace".to_string()],
            agent: vec!["robot".to_string()],
            obj_str: None,
        }
    }

    #[test]
    fn test_longest_common_substring() {
        assert_eq!(longest_common_substring("box", "boxer"), 3);
        assert_eq!(longest_common_substring("bluedoor", "reddoor"), 4);
        assert_eq!(longest_common_substring("abc", "xyz"), 0);
        assert_eq!(longest_common_substring("", "anything"), 0);
    }

    #[test]
    fn test_prune_colliding_generics() {
        let mut categories = ObjectCategories {
            unique_objects: vec!["bluedoor".to_string()],
            generic_objects: vec!["reddoor".to_string(), "box".to_string()],
            background_cells: vec![],
            agent: vec![],
            obj_str: None,
        };
        // "reddoor" shares "door" (4 chars) with "bluedoor" and is dropped.
        prune_colliding_generics(&mut categories);
        assert_eq!(categories.generic_objects, vec!["box"]);
    }

    #[test]
    fn test_action_mismatch_substring() {
        let declared = vec!["move-up".to_string(), "move-down".to_string()];
        let expected = vec!["move".to_string()];
        assert!(action_mismatch(&declared, &expected, ActionMatching::Substring).is_none());

        let extra = vec!["move-up".to_string(), "teleport".to_string()];
        let report = action_mismatch(&extra, &expected, ActionMatching::Substring).unwrap();
        assert!(report.contains("teleport"));

        let missing = vec!["move-up".to_string()];
        let expected = vec!["move".to_string(), "push".to_string()];
        let report = action_mismatch(&missing, &expected, ActionMatching::Substring).unwrap();
        assert!(report.contains("push"));
    }

    #[test]
    fn test_action_mismatch_exact() {
        let declared = vec!["move-up".to_string()];
        let expected = vec!["move".to_string()];
        assert!(action_mismatch(&declared, &expected, ActionMatching::Exact).is_some());
        let expected = vec!["move-up".to_string()];
        assert!(action_mismatch(&declared, &expected, ActionMatching::Exact).is_none());
    }

    #[test]
    fn test_repair_background_aliases() {
        let fixed = repair_background_aliases(
            "(:types whitesquare)".to_string(),
            &["whitespace".to_string()],
        );
        assert_eq!(fixed, "(:types whitespace)");

        let fixed = repair_background_aliases(
            "(:types whitespace)".to_string(),
            &["whitesquare".to_string()],
        );
        assert_eq!(fixed, "(:types whitesquare)");
    }

    #[test]
    fn test_clean_generated_pddl() {
        let raw = "```pddl\n(define (domain d))\n```";
        assert_eq!(clean_generated_pddl(raw), "(define (domain d))");
    }

    #[tokio::test]
    async fn test_synthesize_domain_accepts_matching_actions() {
        let provider = StubVlmProvider::new()
            .with_reply(
                "count the number of actions",
                r#"{"action_name": ["move", "push"], "action_count": 2}"#,
            )
            .with_reply(
                "Generate a PDDL domain file",
                "```pddl\n(define (domain grid)\n(:action move-up :effect ())\n(:action push :effect ()))\n```",
            );
        let mut categories = categories();
        let domain = synthesize_domain(
            &provider,
            "The robot can move and push boxes.",
            &mut categories,
            ActionMatching::Substring,
            &RetryPolicy::default(),
        )
        .await
        .unwrap();
        assert!(domain.starts_with("(define (domain grid)"));
        assert!(!domain.contains("```"));
    }
}
