use crate::model::{EffectTarget, MoveData, StatusCondition};
use crate::roster::{Creature, Onset, Side};
use crate::rules::{roll, Rules};
use rand::Rng;
use tracing::debug;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EndOfTurnKind {
    Poison,
    Burn,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PendingEffect {
    pub side: Side,
    pub roster_index: usize,
    pub kind: EndOfTurnKind,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StatusCheck {
    pub messages: Vec<String>,
    pub can_move: bool,
    pub end_of_turn: Option<EndOfTurnKind>,
}

impl StatusCheck {
    fn proceed() -> Self {
        Self {
            messages: Vec::new(),
            can_move: true,
            end_of_turn: None,
        }
    }
}

fn take_onset(creature: &mut Creature) -> bool {
    match creature.status.as_mut() {
        Some(affliction) if affliction.onset == (Onset::Active { emitted: false }) => {
            affliction.onset = Onset::Active { emitted: true };
            true
        }
        _ => false,
    }
}

fn bump_turns(creature: &mut Creature) -> u8 {
    match creature.status.as_mut() {
        Some(affliction) => {
            affliction.turns = affliction.turns.saturating_add(1);
            affliction.turns
        }
        None => 0,
    }
}

pub fn check_status(creature: &mut Creature, rules: &Rules, rng: &mut impl Rng) -> StatusCheck {
    let Some(condition) = creature.condition() else {
        return StatusCheck::proceed();
    };
    let name = creature.name.clone();
    let mut check = StatusCheck::proceed();
    match condition {
        StatusCondition::Poison => {
            let lost = creature.take_damage(creature.fraction_of_max(rules.poison_divisor));
            check.messages.push(format!("{name} is hurt by poison!"));
            check.can_move = !creature.is_fainted();
            check.end_of_turn = Some(EndOfTurnKind::Poison);
            debug!(creature = %name, lost, "poison pre-move damage");
        }
        StatusCondition::Sleep => {
            let turns = bump_turns(creature);
            check.can_move = false;
            if turns >= rules.sleep_max_turns || roll(rng, rules.sleep_wake_chance) {
                creature.clear_status();
                check.messages.push(format!("{name} woke up!"));
                debug!(creature = %name, turns, "woke up");
            } else {
                check.messages.push(format!("{name} is fast asleep."));
            }
        }
        StatusCondition::Burn => {
            if take_onset(creature) {
                check.messages.push(format!("{name} is burned!"));
            }
            check.end_of_turn = Some(EndOfTurnKind::Burn);
        }
        StatusCondition::Freeze => {
            if roll(rng, rules.thaw_chance) {
                creature.clear_status();
                check.messages.push(format!("{name} thawed out!"));
                debug!(creature = %name, "thawed");
            } else {
                check.messages.push(format!("{name} is frozen solid!"));
                check.can_move = false;
            }
        }
        StatusCondition::Confuse => {
            let turns = bump_turns(creature);
            if turns > rules.confusion_max_turns {
                creature.clear_status();
                check.messages.push(format!("{name} snapped out of its confusion!"));
                debug!(creature = %name, turns, "confusion ended");
            } else if roll(rng, rules.confusion_self_hit_chance) {
                creature.take_damage(creature.fraction_of_max(rules.confusion_divisor));
                check.messages.push(format!(
                    "{name} is confused! It hurt itself in its confusion!"
                ));
                check.can_move = false;
            } else {
                check.messages.push(format!("{name} is confused!"));
            }
        }
        StatusCondition::Paralyze => {
            if take_onset(creature) {
                check
                    .messages
                    .push(format!("{name} is paralyzed! It may be unable to move!"));
            }
            if roll(rng, rules.full_paralysis_chance) {
                check.messages.push(format!("{name} is fully paralyzed!"));
                check.can_move = false;
            }
        }
    }
    check
}

pub fn apply_end_of_turn(creature: &mut Creature, kind: EndOfTurnKind, rules: &Rules) -> Option<String> {
    if creature.is_fainted() {
        return None;
    }
    let (divisor, line) = match kind {
        EndOfTurnKind::Poison => (rules.poison_divisor, format!("{} is hurt by poison!", creature.name)),
        EndOfTurnKind::Burn => (rules.burn_divisor, format!("{} is hurt by its burn!", creature.name)),
    };
    creature.take_damage(creature.fraction_of_max(divisor));
    Some(line)
}

fn inflicted_line(name: &str, condition: StatusCondition) -> Option<String> {
    match condition {
        StatusCondition::Poison => Some(format!("{name} was poisoned!")),
        StatusCondition::Sleep => Some(format!("{name} fell asleep!")),
        StatusCondition::Freeze => Some(format!("{name} was frozen solid!")),
        StatusCondition::Confuse => Some(format!("{name} became confused!")),
        // announced by the onset line at the next status check
        StatusCondition::Burn | StatusCondition::Paralyze => None,
    }
}

/// Rolls `mv`'s secondary effect and, on success, overwrites the chosen
/// side's status. An existing status does not protect against the overwrite.
pub fn try_inflict_effect(
    user: &mut Creature,
    target: &mut Creature,
    mv: &MoveData,
    rng: &mut impl Rng,
) -> Option<String> {
    let effect = mv.effect?;
    if effect.chance == 0 {
        return None;
    }
    let roll: u8 = rng.gen_range(0..100);
    if roll >= effect.chance {
        return None;
    }
    let chosen = match effect.target {
        EffectTarget::User => user,
        EffectTarget::Opponent => target,
    };
    if chosen.is_fainted() {
        return None;
    }
    debug!(
        creature = %chosen.name,
        previous = ?chosen.condition(),
        next = %effect.status,
        "status inflicted"
    );
    chosen.set_status(effect.status);
    inflicted_line(&chosen.name, effect.status)
}
