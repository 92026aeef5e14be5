//! Scenesynth command line.
//!
//! Turns GIF grid stimuli into PDDL problem setups. Stimuli live under
//! `<stimuli-root>/<domain>/<problem>/` with a `<problem>.gif` animation
//! and a `<problem>.txt` description; generated artifacts land under the
//! mirrored layout below the destination root.

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{error, info};

use scenesynth::config::SynthConfig;
use scenesynth::problem::generate_problem_files;
use scenesynth::store::ProblemStore;
use scenesynth::synthesis::synthesize_problem_setup;
use scenesynth::vlm::OpenAIVlmProvider;

#[derive(Parser, Debug)]
#[command(name = "scenesynth")]
#[command(about = "Synthesize PDDL planning problems from GIF grid stimuli")]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// File holding the provider API key on a single line
    #[arg(long, global = true, env = "SCENESYNTH_API_KEY_FILE")]
    api_key_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Process a single problem directory
    Run {
        /// Problem directory, `<stimuli-root>/<domain>/<problem>`
        #[arg(long)]
        problem_path: PathBuf,

        /// Root directory for generated artifacts
        #[arg(long)]
        destination: PathBuf,
    },

    /// Process every problem directory under a domain
    Batch {
        /// Domain directory, `<stimuli-root>/<domain>`
        #[arg(long)]
        domain_path: PathBuf,

        /// Root directory for generated artifacts
        #[arg(long)]
        destination: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("scenesynth=info".parse().unwrap()),
        )
        .with_ansi(false)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => SynthConfig::from_file(path)?,
        None => SynthConfig::default(),
    };
    if let Some(key) = resolve_api_key(cli.api_key_file.as_deref())? {
        config.provider.api_key = Some(key);
    }
    if let Err(errors) = config.validate() {
        bail!("Invalid configuration: {}", errors.join("; "));
    }

    let provider = OpenAIVlmProvider::new(config.provider.clone())?;

    match cli.command {
        Command::Run {
            problem_path,
            destination,
        } => {
            let store = store_for_problem(&problem_path, &destination)?;
            process_problem(&provider, &store, &config).await?;
        }
        Command::Batch {
            domain_path,
            destination,
        } => {
            let domain = dir_name(&domain_path)?;
            let stimuli_root = domain_path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default();
            let problems = list_problems(&domain_path)?;
            if problems.is_empty() {
                bail!("No problem directories under {}", domain_path.display());
            }
            info!("Batch over domain {}: {} problems", domain, problems.len());

            let mut failures = 0usize;
            for problem in &problems {
                let store = ProblemStore::new(&stimuli_root, &destination, &domain, problem);
                if let Err(e) = process_problem(&provider, &store, &config).await {
                    error!("Problem {}/{} failed: {}", domain, problem, e);
                    failures += 1;
                }
            }
            info!(
                "Batch finished: {}/{} problems succeeded",
                problems.len() - failures,
                problems.len()
            );
            if failures > 0 {
                bail!("{} of {} problems failed", failures, problems.len());
            }
        }
    }

    Ok(())
}

async fn process_problem(
    provider: &OpenAIVlmProvider,
    store: &ProblemStore,
    config: &SynthConfig,
) -> Result<()> {
    info!(
        "Processing problem {}/{} from {}",
        store.domain(),
        store.problem(),
        store.stimulus_dir().display()
    );
    let policy = config.retry.policy();
    let settings = config.synthesis.settings();
    synthesize_problem_setup(provider, store, &settings, &policy).await?;
    generate_problem_files(provider, store, &policy).await?;
    info!(
        "Finished problem {}/{}, artifacts in {}",
        store.domain(),
        store.problem(),
        store.output_dir().display()
    );
    Ok(())
}

/// Derives `<stimuli-root>`, `<domain>` and `<problem>` from the problem
/// directory path.
fn store_for_problem(problem_path: &Path, destination: &Path) -> Result<ProblemStore> {
    let problem = dir_name(problem_path)?;
    let domain_dir = problem_path.parent().ok_or_else(|| {
        anyhow!(
            "Problem path {} has no parent domain directory",
            problem_path.display()
        )
    })?;
    let domain = dir_name(domain_dir)?;
    let stimuli_root = domain_dir.parent().map(Path::to_path_buf).unwrap_or_default();
    Ok(ProblemStore::new(stimuli_root, destination, domain, problem))
}

fn dir_name(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| anyhow!("Cannot derive a directory name from {}", path.display()))
}

fn list_problems(domain_path: &Path) -> Result<Vec<String>> {
    let mut problems = Vec::new();
    let entries = std::fs::read_dir(domain_path)
        .with_context(|| format!("Reading domain directory {}", domain_path.display()))?;
    for entry in entries {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            if let Some(name) = entry.file_name().to_str() {
                problems.push(name.to_string());
            }
        }
    }
    problems.sort();
    Ok(problems)
}

fn resolve_api_key(api_key_file: Option<&Path>) -> Result<Option<String>> {
    if let Some(path) = api_key_file {
        let key = std::fs::read_to_string(path)
            .with_context(|| format!("Reading API key file {}", path.display()))?;
        return Ok(Some(key.trim().to_string()));
    }
    for var in ["GEMINI_API_KEY", "OPENAI_API_KEY"] {
        if let Ok(key) = std::env::var(var) {
            if !key.is_empty() {
                return Ok(Some(key));
            }
        }
    }
    Ok(None)
}
