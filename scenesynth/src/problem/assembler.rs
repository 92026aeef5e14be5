//! Per-frame problem file assembly.
//!
//! Responsibilities:
//! - Emit one PDDL problem file per stimulus frame.
//! - Assign generic identities per frame and substitute them into fact
//!   fragments.
//! - Default undetected unique objects off-grid.
//! - Build the shared object declaration block on frame 0 and persist it
//!   before any later frame is assembled.

use crate::catalog::{CategoryLookup, ObjectCategories, ObjectKind};
use crate::classify::ClassificationMap;
use crate::error::SynthError;
use crate::problem::background::background_facts;
use crate::problem::identity::{substitute_name, substitute_position, GenericCounter};
use crate::segment::SegmentedFrame;
use crate::store::ProblemStore;
use indexmap::IndexMap;
use itertools::Itertools;
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, info, warn};

/// Assembles and writes every frame file of one problem instance.
pub struct ProblemAssembler<'a> {
    store: &'a ProblemStore,
    classes: &'a ClassificationMap,
    categories: ObjectCategories,
    lookup: CategoryLookup,
}

impl<'a> ProblemAssembler<'a> {
    pub fn new(
        store: &'a ProblemStore,
        classes: &'a ClassificationMap,
        categories: ObjectCategories,
    ) -> Self {
        let lookup = categories.lookup();
        ProblemAssembler {
            store,
            classes,
            categories,
            lookup,
        }
    }

    pub fn run(&mut self, frames: &[SegmentedFrame]) -> Result<(), SynthError> {
        for frame in frames {
            let text = self.assemble_frame(frame)?;
            self.store.save_frame(frame.index, &text)?;
            debug!(
                "Wrote {} for {}/{}",
                self.store.frame_path(frame.index).display(),
                self.store.domain(),
                self.store.problem()
            );
        }
        info!(
            "Assembled {} frame files for {}/{}",
            frames.len(),
            self.store.domain(),
            self.store.problem()
        );
        Ok(())
    }

    fn assemble_frame(&mut self, frame: &SegmentedFrame) -> Result<String, SynthError> {
        let background = background_facts(frame, self.classes)?;
        let (dynamic, generics) = self.dynamic_facts(frame)?;
        let declaration = self.declaration_block(frame.index, &generics)?;

        let mut text = format!(
            "(define (problem {})\n (:domain {})\n",
            self.store.problem(),
            self.store.domain()
        );
        if !declaration.is_empty() {
            text.push_str(&declaration);
            text.push('\n');
        }
        text.push_str("(:init \n");
        text.push_str(&background.join("\n"));
        text.push('\n');
        if !dynamic.is_empty() {
            text.push_str(&dynamic.join("\n"));
            text.push('\n');
        }
        text.push_str(")\n(:goal (true)) \n)");
        Ok(text)
    }

    /// Object facts for one frame plus the indexed generic names it used.
    fn dynamic_facts(
        &self,
        frame: &SegmentedFrame,
    ) -> Result<(Vec<String>, Vec<String>), SynthError> {
        let mut facts = Vec::new();
        let mut generics = Vec::new();
        let mut counter = GenericCounter::new();
        let mut detected_uniques: HashSet<&str> = HashSet::new();

        // Two agents alternate turns, even frames first agent.
        if self.categories.agent.len() == 2 {
            facts.push(format!("(= (agentcode {}) 0)", self.categories.agent[0]));
            facts.push(format!("(= (agentcode {}) 1)", self.categories.agent[1]));
            facts.push(format!("(= (turn) {})", frame.index % 2));
        }

        for (row, col, cell) in frame.iter() {
            if cell.is_uniform() {
                continue;
            }
            let record = self.classes.get(cell.signature).ok_or_else(|| {
                SynthError::Invalid(format!(
                    "signature {} at frame {} cell ({},{}) was never classified",
                    cell.signature,
                    frame.index,
                    row + 1,
                    col + 1
                ))
            })?;

            let mut fragment = substitute_position(&record.fact_fragment, row, col);
            for name in &record.object_names {
                match self.lookup.kind_of(name) {
                    Some(ObjectKind::Unique) => {
                        detected_uniques.insert(name.as_str());
                    }
                    Some(ObjectKind::Generic) => {
                        let indexed = format!("{}{}", name, counter.next_index(name));
                        fragment = substitute_name(&fragment, name, &indexed);
                        generics.push(indexed);
                    }
                    Some(ObjectKind::Agent) => {}
                    None => {
                        warn!(
                            "Classifier reported unknown object '{}' at frame {} cell ({},{}), ignoring",
                            name,
                            frame.index,
                            row + 1,
                            col + 1
                        );
                    }
                }
            }
            if !fragment.trim().is_empty() {
                facts.push(fragment);
            }
        }

        for unique in &self.categories.unique_objects {
            if !detected_uniques.contains(unique.as_str()) {
                facts.push(format!("(= (xloc {}) -1)", unique));
                facts.push(format!("(= (yloc {}) -1)", unique));
            }
        }

        Ok((facts, generics))
    }

    /// Frame 0 derives the declaration block from its own generics and
    /// persists it; later frames reuse the stored text verbatim.
    fn declaration_block(
        &mut self,
        frame_index: usize,
        generics: &[String],
    ) -> Result<String, SynthError> {
        if frame_index == 0 {
            let block = declaration_block_text(generics);
            self.categories.obj_str = Some(block.clone());
            self.store.save_categories(&self.categories)?;
            return Ok(block);
        }
        self.categories.obj_str.clone().ok_or_else(|| {
            SynthError::MissingArtifact(
                "object declaration block missing, frame 0 was never assembled".to_string(),
            )
        })
    }
}

/// `(:objects ...)` block listing indexed generic names grouped under their
/// base kind, first-detection kind order, names sorted. Empty when the
/// frame detected nothing generic.
pub fn declaration_block_text(generics: &[String]) -> String {
    if generics.is_empty() {
        return String::new();
    }
    let mut by_kind: IndexMap<String, BTreeSet<String>> = IndexMap::new();
    for name in generics {
        let base = name.trim_end_matches(|c: char| c.is_ascii_digit()).to_string();
        by_kind.entry(base).or_default().insert(name.clone());
    }

    let mut block = String::from("(:objects\n");
    for (kind, names) in &by_kind {
        block.push_str(&format!("{} - {}\n", names.iter().join(" "), kind));
    }
    block.push_str(")\n");
    block
}
