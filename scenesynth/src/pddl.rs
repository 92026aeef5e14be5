//! Small text utilities over PDDL-shaped s-expressions and model output.
//!
//! Responsibilities:
//! - Extract balanced s-expression blocks (`(:types ...)`, `(:predicates ...)`)
//!   from generated domain text without a full parser.
//! - Scan declared action names.
//! - Strip markdown fences / surrounding prose from JSON model replies.

use regex::Regex;

/// Extracts the first balanced s-expression starting at `keyword`.
///
/// `keyword` should include the opening paren, e.g. `"(:types"`. Returns
/// `None` when the keyword is absent or the parens never close.
pub fn extract_block(text: &str, keyword: &str) -> Option<String> {
    let start = text.find(keyword)?;
    let mut depth = 0usize;
    for (idx, ch) in text[start..].char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                if depth == 0 {
                    return None;
                }
                depth -= 1;
                if depth == 0 {
                    let end = start + idx + 1;
                    return Some(text[start..end].to_string());
                }
            }
            _ => {}
        }
    }
    None
}

/// Names of every `(:action <name>` declaration in the domain text, in order.
pub fn action_names(domain: &str) -> Vec<String> {
    let re = Regex::new(r"\(:action\s+([^\s\)]+)").unwrap();
    re.captures_iter(domain)
        .map(|c| c[1].to_string())
        .collect()
}

/// Extracts the JSON payload from a model reply.
///
/// Handles ```json fenced blocks and replies with surrounding prose by
/// scanning for the first balanced object or array. Falls back to the
/// trimmed input so the caller's parse error carries the real content.
pub fn extract_json(response: &str) -> &str {
    let trimmed = response.trim();

    // Handle ```json ... ``` or ``` ... ```
    if trimmed.starts_with("```") {
        let start = trimmed.find('\n').map(|i| i + 1).unwrap_or(0);
        let end = trimmed.rfind("```").unwrap_or(trimmed.len());
        if start < end {
            return trimmed[start..end].trim();
        }
    }

    let obj_start = trimmed.find('{');
    let arr_start = trimmed.find('[');
    let (start, open_char, close_char) = match (obj_start, arr_start) {
        (Some(o), Some(a)) => {
            if o < a {
                (o, '{', '}')
            } else {
                (a, '[', ']')
            }
        }
        (Some(o), None) => (o, '{', '}'),
        (None, Some(a)) => (a, '[', ']'),
        (None, None) => return trimmed,
    };

    let mut depth = 0;
    for (i, c) in trimmed[start..].char_indices() {
        if c == open_char {
            depth += 1;
        } else if c == close_char {
            depth -= 1;
            if depth == 0 {
                return &trimmed[start..=start + i];
            }
        }
    }

    trimmed
}
