//! Object category configuration and membership lookup.
//!
//! Responsibilities:
//! - Model the per-problem object vocabulary (objects.json).
//! - Validate the generation contract for that vocabulary.
//! - Resolve name -> kind through a lookup table built once, instead of
//!   repeated containment scans during assembly.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Kinds an object name can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    /// Exactly one instance; bare name, never suffixed.
    Unique,
    /// Zero or more interchangeable instances; suffixed with a per-frame
    /// 1-based index.
    Generic,
    /// Controllable entity; never suffixed, never defaulted off-grid.
    Agent,
}

/// Per-problem object vocabulary, produced by objects synthesis and consumed
/// by classification and assembly.
///
/// `obj_str` is filled in once frame 0 has been assembled and holds the
/// shared object-declaration block that later frames reuse verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectCategories {
    pub unique_objects: Vec<String>,
    pub generic_objects: Vec<String>,
    pub background_cells: Vec<String>,
    pub agent: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obj_str: Option<String>,
}

impl ObjectCategories {
    /// Structural checks on a freshly generated vocabulary. Returns every
    /// failed check so the regeneration log names them all.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.unique_objects.is_empty() {
            errors.push("unique_objects is empty".to_string());
        }
        if self.agent.len() > 2 {
            errors.push(format!(
                "at most two agents are supported, got {}",
                self.agent.len()
            ));
        }
        for agent in &self.agent {
            if self.unique_objects.contains(agent) || self.generic_objects.contains(agent) {
                errors.push(format!("agent '{}' is also listed as an object", agent));
            }
        }
        // A generic base occurring inside a unique name would collide once
        // the base gets an index suffix.
        for generic in &self.generic_objects {
            for unique in &self.unique_objects {
                if unique.contains(generic.as_str()) {
                    errors.push(format!(
                        "generic '{}' occurs inside unique '{}'",
                        generic, unique
                    ));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Every name the classifier may legitimately report.
    pub fn object_vocabulary(&self) -> Vec<String> {
        let mut names = Vec::new();
        names.extend(self.unique_objects.iter().cloned());
        names.extend(self.generic_objects.iter().cloned());
        names.extend(self.agent.iter().cloned());
        names
    }

    /// Builds the name -> kind table. Unique shadows generic on (invalid)
    /// duplicate entries.
    pub fn lookup(&self) -> CategoryLookup {
        let mut map = HashMap::new();
        for name in &self.generic_objects {
            map.insert(name.clone(), ObjectKind::Generic);
        }
        for name in &self.unique_objects {
            map.insert(name.clone(), ObjectKind::Unique);
        }
        for name in &self.agent {
            map.insert(name.clone(), ObjectKind::Agent);
        }
        CategoryLookup { map }
    }
}

/// Name -> kind, built once per problem instance.
#[derive(Debug, Default)]
pub struct CategoryLookup {
    map: HashMap<String, ObjectKind>,
}

impl CategoryLookup {
    pub fn kind_of(&self, name: &str) -> Option<ObjectKind> {
        self.map.get(name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ObjectCategories {
        ObjectCategories {
            unique_objects: vec!["key".to_string()],
            generic_objects: vec!["box".to_string()],
            background_cells: vec!["grass".to_string(), "water".to_string()],
            agent: vec!["robot".to_string()],
            obj_str: None,
        }
    }

    #[test]
    fn test_valid_vocabulary() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn test_missing_unique_rejected() {
        let mut categories = sample();
        categories.unique_objects.clear();
        let errors = categories.validate().unwrap_err();
        assert!(errors.iter().any(|e| e.contains("unique_objects")));
    }

    #[test]
    fn test_agent_overlap_rejected() {
        let mut categories = sample();
        categories.generic_objects.push("robot".to_string());
        let errors = categories.validate().unwrap_err();
        assert!(errors.iter().any(|e| e.contains("robot")));
    }

    #[test]
    fn test_generic_inside_unique_rejected() {
        let mut categories = sample();
        // "box" occurs inside "boxkey", so "box1" would collide with it.
        categories.unique_objects.push("boxkey".to_string());
        let errors = categories.validate().unwrap_err();
        assert!(errors.iter().any(|e| e.contains("boxkey")));
    }

    #[test]
    fn test_lookup_kinds() {
        let lookup = sample().lookup();
        assert_eq!(lookup.kind_of("key"), Some(ObjectKind::Unique));
        assert_eq!(lookup.kind_of("box"), Some(ObjectKind::Generic));
        assert_eq!(lookup.kind_of("robot"), Some(ObjectKind::Agent));
        assert_eq!(lookup.kind_of("ghost"), None);
    }

    #[test]
    fn test_obj_str_survives_roundtrip() {
        let mut categories = sample();
        categories.obj_str = Some("(:objects\nbox1 - box\n)".to_string());
        let json = serde_json::to_string(&categories).unwrap();
        let back: ObjectCategories = serde_json::from_str(&json).unwrap();
        assert_eq!(back, categories);
    }
}
