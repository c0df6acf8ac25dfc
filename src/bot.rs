use crate::dex::Dex;
use crate::model::{CreatureData, TeamEntry, TeamSelection};
use crate::roster::{Combatant, MAX_MOVES, MAX_ROSTER};
use crate::session::Action;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use tracing::warn;

const MIN_RANDOM_ROSTER: usize = 4;

pub trait TeamGenerator: Send + Sync {
    fn generate(&self, rng: &mut SmallRng) -> TeamSelection;
}

pub struct RandomTeamGenerator {
    dex: Arc<dyn Dex>,
}

impl RandomTeamGenerator {
    pub fn new(dex: Arc<dyn Dex>) -> Self {
        Self { dex }
    }
}

impl TeamGenerator for RandomTeamGenerator {
    fn generate(&self, rng: &mut SmallRng) -> TeamSelection {
        build_random_roster(self.dex.as_ref(), rng)
    }
}

fn known_moves(dex: &dyn Dex, data: &CreatureData) -> Vec<String> {
    let mut pool: Vec<String> = data
        .learnset
        .iter()
        .filter(|name| dex.move_data(name).is_some())
        .cloned()
        .collect();
    pool.sort();
    pool.dedup();
    pool
}

pub fn build_random_roster(dex: &dyn Dex, rng: &mut impl Rng) -> TeamSelection {
    let candidates: Vec<(CreatureData, Vec<String>)> = dex
        .species_names()
        .iter()
        .filter_map(|name| dex.creature(name))
        .filter(|data| data.stats.hp > 0 && (1..=2).contains(&data.types.len()))
        .map(|data| {
            let pool = known_moves(dex, &data);
            (data, pool)
        })
        .filter(|(_, pool)| !pool.is_empty())
        .collect();
    if candidates.is_empty() {
        return Vec::new();
    }
    let size = rng.gen_range(MIN_RANDOM_ROSTER..=MAX_ROSTER);
    let mut selection = Vec::with_capacity(size);
    for _ in 0..size {
        let Some((data, pool)) = candidates.choose(rng) else {
            break;
        };
        selection.push(TeamEntry {
            creature: data.name.clone(),
            moves: pool.choose_multiple(rng, MAX_MOVES).cloned().collect(),
        });
    }
    selection
}

pub trait Controller: Send {
    fn choose_action(&mut self, combatant: &Combatant) -> Action;
    fn choose_replacement(&mut self, combatant: &Combatant) -> usize;
}

pub struct BotController {
    rng: SmallRng,
    switch_cursor: usize,
}

impl BotController {
    pub fn new() -> Self {
        Self::with_rng(SmallRng::from_entropy())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(SmallRng::seed_from_u64(seed))
    }

    fn with_rng(rng: SmallRng) -> Self {
        Self {
            rng,
            switch_cursor: 0,
        }
    }

    pub fn build_random_roster(&mut self, dex: &dyn Dex) -> TeamSelection {
        build_random_roster(dex, &mut self.rng)
    }

    pub fn choose_attack(&mut self, combatant: &Combatant) -> usize {
        let known = combatant.active().moves.len().max(1);
        self.rng.gen_range(0..known)
    }

    /// Advances an internal cursor and returns it. It neither wraps nor skips
    /// fainted slots, so callers must be ready for an unusable index.
    pub fn choose_switch(&mut self) -> usize {
        self.switch_cursor += 1;
        self.switch_cursor
    }
}

impl Default for BotController {
    fn default() -> Self {
        Self::new()
    }
}

impl Controller for BotController {
    fn choose_action(&mut self, combatant: &Combatant) -> Action {
        Action::Attack(self.choose_attack(combatant))
    }

    fn choose_replacement(&mut self, _combatant: &Combatant) -> usize {
        self.choose_switch()
    }
}

fn is_legal(combatant: &Combatant, action: Action) -> bool {
    match action {
        Action::Attack(index) => combatant
            .active()
            .moves
            .get(index)
            .is_some_and(|slot| slot.is_usable()),
        Action::Switch(index) => combatant.check_switch_target(index).is_ok(),
    }
}

/// First move with PP left, else a switch to the first healthy bench slot.
pub fn fallback_action(combatant: &Combatant) -> Option<Action> {
    combatant
        .active()
        .moves
        .iter()
        .position(|slot| slot.is_usable())
        .map(Action::Attack)
        .or_else(|| combatant.first_healthy_bench().map(Action::Switch))
}

pub fn legal_action(controller: &mut dyn Controller, combatant: &Combatant) -> Option<Action> {
    let proposed = controller.choose_action(combatant);
    if is_legal(combatant, proposed) {
        return Some(proposed);
    }
    let fallback = fallback_action(combatant);
    warn!(player = %combatant.name, ?proposed, ?fallback, "bot action rejected; falling back");
    fallback
}

pub fn legal_replacement(controller: &mut dyn Controller, combatant: &Combatant) -> Option<usize> {
    let proposed = controller.choose_replacement(combatant);
    if combatant.check_switch_target(proposed).is_ok() {
        return Some(proposed);
    }
    let fallback = combatant.first_healthy_bench();
    warn!(player = %combatant.name, proposed, ?fallback, "bot replacement rejected; falling back");
    fallback
}
