//! Problem file generation from a classified stimulus.
//!
//! Responsibilities:
//! - Drive segmentation, classification and assembly for one problem
//!   whose domain artifacts (objects.json, domain.pddl, config.json)
//!   already exist.
//! - Emit background facts, object facts and the shared declaration block
//!   per frame.

pub mod assembler;
pub mod background;
pub mod identity;

pub use assembler::{declaration_block_text, ProblemAssembler};
pub use background::{background_facts, BitMatrix};
pub use identity::{substitute_name, substitute_position, GenericCounter};

use crate::classify::classify_signatures;
use crate::error::SynthError;
use crate::pddl;
use crate::segment::{load_stimulus, GridSpec, OccurrenceIndex};
use crate::store::ProblemStore;
use crate::vlm::{ProblemContext, RetryPolicy, VlmProvider};
use tracing::info;

/// Generates one PDDL problem file per stimulus frame.
///
/// Expects the synthesis artifacts to be present in the store; a missing
/// one aborts the run.
pub async fn generate_problem_files(
    provider: &dyn VlmProvider,
    store: &ProblemStore,
    policy: &RetryPolicy,
) -> Result<(), SynthError> {
    let scenario = store.load_scenario()?;
    let categories = store.load_categories()?;
    let domain = store.load_domain()?;

    let (rows, cols) = scenario.grid_size;
    let grid = GridSpec::new(rows, cols)?;
    let frames = load_stimulus(&store.gif_path(), grid)?;
    info!(
        "Loaded {} frames from {} ({}x{} grid)",
        frames.len(),
        store.gif_path().display(),
        rows,
        cols
    );

    let index = OccurrenceIndex::build(&frames);
    let context = ProblemContext {
        description: store.description()?,
        background_types: categories.background_cells.clone(),
        object_vocabulary: categories.object_vocabulary(),
        predicates: pddl::extract_block(&domain, "(:predicates").unwrap_or_default(),
    };

    let classes = classify_signatures(provider, &frames, &index, &context, policy).await?;
    store.save_signature_classes(&classes)?;

    let mut assembler = ProblemAssembler::new(store, &classes, categories);
    assembler.run(&frames)
}
