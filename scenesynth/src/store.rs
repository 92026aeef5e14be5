//! Per-problem artifact store.
//!
//! One problem instance owns two directories:
//!
//! stimuli: `<stimuli-root>/<domain>/<problem>/` holding `<problem>.gif`
//! and `<problem>.txt` (the scenario description).
//!
//! output: `<output-root>/<domain>/<problem>/` holding `objects.json`,
//! `domain.pddl`, `config.json`, `signature_classes.json` and one
//! `frame_<n>.pddl` per stimulus frame.

use crate::catalog::ObjectCategories;
use crate::classify::ClassificationMap;
use crate::error::SynthError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// How much of the grid the planning agent is assumed to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Observability {
    Full,
    Partial,
}

/// Scenario configuration generated by synthesis (config.json).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// Rows and columns of the stimulus grid.
    pub grid_size: (usize, usize),
    pub observability: Observability,
    /// Required under partial observability; names the belief object and
    /// its container type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub belief_config: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goals: Option<Value>,
    /// Fields the generator added beyond the contract; kept verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Paths and persistence for one problem instance.
#[derive(Debug, Clone)]
pub struct ProblemStore {
    stimuli_root: PathBuf,
    output_root: PathBuf,
    domain: String,
    problem: String,
}

impl ProblemStore {
    pub fn new(
        stimuli_root: impl Into<PathBuf>,
        output_root: impl Into<PathBuf>,
        domain: impl Into<String>,
        problem: impl Into<String>,
    ) -> Self {
        Self {
            stimuli_root: stimuli_root.into(),
            output_root: output_root.into(),
            domain: domain.into(),
            problem: problem.into(),
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn problem(&self) -> &str {
        &self.problem
    }

    pub fn stimulus_dir(&self) -> PathBuf {
        self.stimuli_root.join(&self.domain).join(&self.problem)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.output_root.join(&self.domain).join(&self.problem)
    }

    pub fn gif_path(&self) -> PathBuf {
        self.stimulus_dir().join(format!("{}.gif", self.problem))
    }

    /// Scenario description text shipped next to the stimulus.
    pub fn description(&self) -> Result<String, SynthError> {
        let path = self.stimulus_dir().join(format!("{}.txt", self.problem));
        read_required(&path)
    }

    pub fn load_categories(&self) -> Result<ObjectCategories, SynthError> {
        let text = read_required(&self.output_dir().join("objects.json"))?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn save_categories(&self, categories: &ObjectCategories) -> Result<(), SynthError> {
        self.write_json("objects.json", categories)
    }

    pub fn load_domain(&self) -> Result<String, SynthError> {
        read_required(&self.output_dir().join("domain.pddl"))
    }

    pub fn save_domain(&self, domain: &str) -> Result<(), SynthError> {
        self.write_text("domain.pddl", domain)
    }

    pub fn load_scenario(&self) -> Result<ScenarioConfig, SynthError> {
        let text = read_required(&self.output_dir().join("config.json"))?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn save_scenario(&self, scenario: &ScenarioConfig) -> Result<(), SynthError> {
        self.write_json("config.json", scenario)
    }

    pub fn frame_path(&self, index: usize) -> PathBuf {
        self.output_dir().join(format!("frame_{}.pddl", index))
    }

    pub fn save_frame(&self, index: usize, text: &str) -> Result<(), SynthError> {
        let path = self.frame_path(index);
        self.ensure_output_dir()?;
        fs::write(path, text)?;
        Ok(())
    }

    /// Inspection artifact: what each signature was classified as.
    pub fn save_signature_classes(&self, classes: &ClassificationMap) -> Result<(), SynthError> {
        self.write_json("signature_classes.json", &classes.to_json())
    }

    fn ensure_output_dir(&self) -> Result<(), SynthError> {
        fs::create_dir_all(self.output_dir())?;
        Ok(())
    }

    fn write_text(&self, name: &str, text: &str) -> Result<(), SynthError> {
        self.ensure_output_dir()?;
        fs::write(self.output_dir().join(name), text)?;
        Ok(())
    }

    fn write_json<T: Serialize>(&self, name: &str, value: &T) -> Result<(), SynthError> {
        let json = serde_json::to_string_pretty(value)?;
        self.write_text(name, &json)
    }
}

/// Reads a file that an earlier stage (or the dataset) must have produced.
fn read_required(path: &Path) -> Result<String, SynthError> {
    fs::read_to_string(path).map_err(|e| {
        SynthError::MissingArtifact(format!("{}: {}", path.display(), e))
    })
}
