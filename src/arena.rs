use crate::bot::{legal_action, legal_replacement, BotController, Controller};
use crate::dex::Dex;
use crate::registry::{RegistryConfig, SessionId, SessionRegistry};
use crate::report::Dispatch;
use crate::roster::Side;
use crate::rules::Rules;
use crate::session::{MoveRequest, Phase};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Clone, Debug)]
pub struct ArenaOptions {
    pub matches: usize,
    pub seed: u64,
    pub max_turns: u32,
    pub rules: Rules,
    pub keep_log: bool,
}

impl Default for ArenaOptions {
    fn default() -> Self {
        Self {
            matches: 100,
            seed: 0,
            max_turns: 300,
            rules: Rules::default(),
            keep_log: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MatchRecord {
    pub index: usize,
    pub winner: Option<Side>,
    pub turns: u32,
    pub stalled: bool,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct ArenaSummary {
    pub matches: usize,
    pub side_a_wins: usize,
    pub side_b_wins: usize,
    pub draws: usize,
    pub stalled: usize,
    pub average_turns: f64,
    pub longest_match: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub log: Vec<String>,
}

impl ArenaSummary {
    fn from_records(records: &[MatchRecord], log: Vec<String>) -> Self {
        let mut summary = ArenaSummary {
            matches: records.len(),
            log,
            ..ArenaSummary::default()
        };
        let mut total_turns = 0u64;
        for record in records {
            match record.winner {
                Some(Side::A) => summary.side_a_wins += 1,
                Some(Side::B) => summary.side_b_wins += 1,
                None => summary.draws += 1,
            }
            if record.stalled {
                summary.stalled += 1;
            }
            total_turns += u64::from(record.turns);
            summary.longest_match = summary.longest_match.max(record.turns);
        }
        if !records.is_empty() {
            summary.average_turns = total_turns as f64 / records.len() as f64;
        }
        summary
    }
}

fn match_seed(seed: u64, index: usize) -> u64 {
    seed ^ (index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// Plays `options.matches` bot-vs-bot sessions in parallel through one shared
/// registry. Results depend only on the seed, not on thread scheduling.
pub fn run_arena(dex: Arc<dyn Dex>, options: &ArenaOptions) -> anyhow::Result<ArenaSummary> {
    if options.matches == 0 {
        anyhow::bail!("--matches must be > 0");
    }
    let config = RegistryConfig {
        rules: options.rules,
        ..RegistryConfig::default()
    };
    let registry = SessionRegistry::new(dex.clone(), config);
    let results: Vec<(MatchRecord, Vec<String>)> = (0..options.matches)
        .into_par_iter()
        .map(|index| play_match(&registry, dex.as_ref(), index, options))
        .collect::<anyhow::Result<_>>()?;

    let mut log = Vec::new();
    let mut records = Vec::with_capacity(results.len());
    for (record, lines) in results {
        if record.index == 0 {
            log = lines;
        }
        records.push(record);
    }
    let summary = ArenaSummary::from_records(&records, log);
    info!(
        matches = summary.matches,
        a = summary.side_a_wins,
        b = summary.side_b_wins,
        draws = summary.draws,
        "arena finished"
    );
    Ok(summary)
}

struct Contender {
    token: String,
    controller: BotController,
}

fn play_match(
    registry: &SessionRegistry,
    dex: &dyn Dex,
    index: usize,
    options: &ArenaOptions,
) -> anyhow::Result<(MatchRecord, Vec<String>)> {
    let mut rng = SmallRng::seed_from_u64(match_seed(options.seed, index));
    let id = registry.create_session_with_seed(false, rng.gen());
    let mut contenders = [
        Contender {
            token: format!("arena-{index}-a"),
            controller: BotController::with_seed(rng.gen()),
        },
        Contender {
            token: format!("arena-{index}-b"),
            controller: BotController::with_seed(rng.gen()),
        },
    ];
    for (slot, contender) in contenders.iter_mut().enumerate() {
        let selection = contender.controller.build_random_roster(dex);
        let name = format!("Bot {}", if slot == 0 { 'A' } else { 'B' });
        registry.attach_combatant(id, &contender.token, &name, &selection)?;
    }

    let keep_log = options.keep_log && index == 0;
    let mut log = Vec::new();
    let mut stalled = false;
    loop {
        let (phase, turn) = registry.inspect(id, |session| (session.phase(), session.turn()))?;
        if phase == Phase::Terminal {
            break;
        }
        if turn >= options.max_turns {
            debug!(index, turn, "turn cap reached");
            stalled = true;
            break;
        }
        let progressed = match phase {
            Phase::InProgress => play_turn(registry, id, &mut contenders, &mut log)?,
            Phase::AwaitingReplacement => send_replacements(registry, id, &mut contenders, &mut log)?,
            Phase::AwaitingSecondCombatant | Phase::Terminal => false,
        };
        if !progressed {
            stalled = true;
            break;
        }
    }

    let (turns, winner) = registry.inspect(id, |session| (session.turn(), session.winner()))?;
    registry.delete(id);
    if !keep_log {
        log.clear();
    }
    Ok((
        MatchRecord {
            index,
            winner,
            turns,
            stalled,
        },
        log,
    ))
}

fn collect_lines(log: &mut Vec<String>, token: &str, dispatches: &[Dispatch]) {
    if let Some(dispatch) = dispatches.iter().find(|dispatch| dispatch.token == token) {
        log.extend(dispatch.report.lines.iter().cloned());
    }
}

fn play_turn(
    registry: &SessionRegistry,
    id: SessionId,
    contenders: &mut [Contender; 2],
    log: &mut Vec<String>,
) -> anyhow::Result<bool> {
    let observer = contenders[0].token.clone();
    for (side, contender) in Side::BOTH.into_iter().zip(contenders.iter_mut()) {
        let controller: &mut dyn Controller = &mut contender.controller;
        let action = registry.inspect(id, |session| {
            session
                .combatant(side)
                .and_then(|combatant| legal_action(controller, combatant))
        })?;
        let Some(action) = action else {
            return Ok(false);
        };
        let dispatches = registry.submit_move(id, &contender.token, &MoveRequest::from(action))?;
        collect_lines(log, &observer, &dispatches);
    }
    Ok(true)
}

fn send_replacements(
    registry: &SessionRegistry,
    id: SessionId,
    contenders: &mut [Contender; 2],
    log: &mut Vec<String>,
) -> anyhow::Result<bool> {
    let observer = contenders[0].token.clone();
    for (side, contender) in Side::BOTH.into_iter().zip(contenders.iter_mut()) {
        let token = contender.token.as_str();
        let controller: &mut dyn Controller = &mut contender.controller;
        let choice = registry.inspect(id, |session| {
            if !session.needs_replacement(token) {
                return Ok(None);
            }
            match session.combatant(side) {
                Some(combatant) => legal_replacement(controller, combatant).map(Some).ok_or(()),
                None => Err(()),
            }
        })?;
        match choice {
            Ok(Some(index)) => {
                let dispatches = registry.submit_replacement(id, token, index)?;
                collect_lines(log, &observer, &dispatches);
            }
            Ok(None) => {}
            Err(()) => return Ok(false),
        }
    }
    Ok(true)
}
