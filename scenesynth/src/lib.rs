// Scenesynth Library
// Turns grid-stimulus GIF recordings into PDDL planning problems

pub mod catalog;
pub mod classify;
pub mod config;
pub mod error;
pub mod pddl;
pub mod problem;
pub mod segment;
pub mod store;
pub mod synthesis;
pub mod vlm;
