pub mod arena;
pub mod bot;
pub mod dex;
pub mod error;
pub mod model;
pub mod modifiers;
pub mod registry;
pub mod report;
pub mod roster;
pub mod rules;
pub mod session;
pub mod status;
pub mod types;

use crate::arena::{run_arena, ArenaOptions, ArenaSummary};
use crate::dex::{Dex, JsonDex, StaticDex};
pub use crate::error::{BattleError, ProtocolError, Result, ValidationError};
pub use crate::registry::{RegistryConfig, SessionId, SessionRegistry};
pub use crate::rules::Rules;
pub use crate::session::{Action, BattleSession, MoveRequest, Phase};
use anyhow::Context;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct CliOptions {
    pub matches: usize,
    pub seed: u64,
    pub dex_path: Option<PathBuf>,
    pub rules_path: Option<PathBuf>,
    pub output_path: Option<PathBuf>,
    pub verbose: bool,
}

pub fn load_dex(path: Option<&Path>) -> anyhow::Result<Arc<dyn Dex>> {
    match path {
        Some(path) => Ok(Arc::new(JsonDex::from_path(path)?)),
        None => Ok(Arc::new(StaticDex)),
    }
}

pub fn load_rules(path: Option<&Path>) -> anyhow::Result<Rules> {
    let rules = match path {
        Some(path) => Rules::load(path)?,
        None => Rules::default(),
    };
    rules.validate()?;
    Ok(rules)
}

fn write_summary(summary: &ArenaSummary, path: &Path) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(summary).context("Failed to serialize arena summary")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write summary to {}", path.display()))?;
    Ok(())
}

pub fn run(opts: CliOptions) -> anyhow::Result<()> {
    if opts.matches == 0 {
        anyhow::bail!("--matches must be > 0");
    }
    let dex = load_dex(opts.dex_path.as_deref())?;
    if dex.species_names().is_empty() {
        anyhow::bail!("Dex has no creatures to build teams from");
    }
    let rules = load_rules(opts.rules_path.as_deref())?;
    let options = ArenaOptions {
        matches: opts.matches,
        seed: opts.seed,
        rules,
        keep_log: opts.verbose,
        ..ArenaOptions::default()
    };
    let summary = run_arena(dex, &options)?;

    for line in &summary.log {
        println!("{line}");
    }
    println!(
        "{} matches: side A {} / side B {} / draws {} (avg {:.1} turns, longest {})",
        summary.matches,
        summary.side_a_wins,
        summary.side_b_wins,
        summary.draws,
        summary.average_turns,
        summary.longest_match
    );
    if let Some(path) = &opts.output_path {
        write_summary(&summary, path)?;
        println!("Wrote summary to {}", path.display());
    }
    Ok(())
}
