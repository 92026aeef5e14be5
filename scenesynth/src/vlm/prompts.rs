//! Prompt assembly for the two classification calls.
//!
//! Both prompts end by naming the exact json shape the caller parses, and
//! both append the per-problem context (scenario description plus the
//! relevant vocabulary) after the base instructions.

use crate::vlm::ProblemContext;

pub(crate) fn cell_prompt(ctx: &ProblemContext) -> String {
    let mut prompt = String::from(
        "You are shown a single cell cropped from a grid-based scene. \
         Classify the background terrain of this cell. \
         Only return a json file in the format of {\"cell_type\": \"<type>\"} and nothing else.\n",
    );
    prompt.push_str(&format!("Description of the domain: {}\n", ctx.description));
    prompt.push_str(&format!(
        "List of cell types in the domain: {:?}\n",
        ctx.background_types
    ));
    prompt.push_str("Please classify the cell in the image and return a json file.\n");
    prompt
}

pub(crate) fn object_prompt(ctx: &ProblemContext) -> String {
    let mut prompt = String::from(
        "You are shown a single cell cropped from a grid-based scene. \
         Identify the objects placed on the background of this cell and express them as PDDL init facts. \
         Write $i for the cell's row and $j for its column, both 1-based. \
         Only return a json file in the format of {\"object_name\": [\"<name>\", ...], \"object_pddl_str\": \"<facts>\"} and nothing else.\n",
    );
    prompt.push_str(&format!("Description of the domain: {}\n", ctx.description));
    prompt.push_str(&format!(
        "List of objects in the domain: {:?}. Please only use object names in this list\n",
        ctx.object_vocabulary
    ));
    prompt.push_str(&format!(
        "List of attributes in the domain: {}\n",
        ctx.predicates
    ));
    prompt.push_str("Please parse the object in the image and return a json file.\n");
    prompt
}
