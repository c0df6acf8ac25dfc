use crate::model::{MoveCategory, MoveData};
use crate::roster::{Combatant, Creature, Side};
use crate::rules::{roll, Rules};
use crate::types::type_effectiveness as chart_effectiveness;
use rand::Rng;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DamageOutcome {
    pub damage: u32,
    pub messages: Vec<String>,
}

pub fn faster_side(a: &Combatant, b: &Combatant, rng: &mut impl Rng) -> Side {
    let spe_a = a.active().stats.spe;
    let spe_b = b.active().stats.spe;
    if spe_a != spe_b {
        return if spe_a > spe_b { Side::A } else { Side::B };
    }
    if roll(rng, 0.5) {
        Side::A
    } else {
        Side::B
    }
}

pub fn is_defeated(combatant: &Combatant) -> bool {
    combatant.active().current_hp == 0
}

pub fn type_effectiveness(mv: &MoveData, defender: &Creature) -> (f64, Option<String>) {
    let factor = chart_effectiveness(mv.move_type, &defender.types);
    let message = if factor == 0.0 {
        Some(format!("It doesn't affect {}...", defender.name))
    } else if factor < 1.0 {
        Some("It's not very effective...".to_string())
    } else if factor > 1.0 {
        Some("It's super effective!".to_string())
    } else {
        None
    };
    (factor, message)
}

pub fn stab_modifier(attacker: &Creature, mv: &MoveData, rules: &Rules) -> f64 {
    if attacker.has_type(mv.move_type) {
        rules.stab_multiplier
    } else {
        1.0
    }
}

pub fn critical_modifier(rng: &mut impl Rng, rules: &Rules) -> (f64, Option<String>) {
    if roll(rng, rules.crit_chance) {
        (rules.crit_multiplier, Some("A critical hit!".to_string()))
    } else {
        (1.0, None)
    }
}

pub fn random_spread(rng: &mut impl Rng, rules: &Rules) -> f64 {
    let percent = rng.gen_range(rules.spread_min..=rules.spread_max.max(rules.spread_min));
    f64::from(percent) / 100.0
}

pub fn round_half_up(value: f64) -> u32 {
    if value <= 0.0 {
        return 0;
    }
    (value + 0.5).floor() as u32
}

fn attack_and_defense(attacker: &Creature, mv: &MoveData, defender: &Creature) -> (u32, u32) {
    match mv.category {
        MoveCategory::Special => (attacker.stats.spa, defender.stats.spd),
        MoveCategory::Physical | MoveCategory::Status => (attacker.stats.atk, defender.stats.def),
    }
}

/// Full damage roll for one attack.
///
/// `base = atk * power / (def * 50) + 2`, scaled by crit, type, STAB and a
/// random spread, plus a flat bonus of `flat_bonus * spread`. Rounding happens
/// once at the end. Zero-power moves and type immunities deal nothing.
pub fn damage(
    attacker: &Creature,
    mv: &MoveData,
    defender: &Creature,
    rules: &Rules,
    rng: &mut impl Rng,
) -> DamageOutcome {
    if mv.power == 0 {
        return DamageOutcome::default();
    }
    let (effectiveness, effectiveness_msg) = type_effectiveness(mv, defender);
    if effectiveness == 0.0 {
        return DamageOutcome {
            damage: 0,
            messages: effectiveness_msg.into_iter().collect(),
        };
    }
    let (attack, defense) = attack_and_defense(attacker, mv, defender);
    let base = (f64::from(attack) * f64::from(mv.power)) / (f64::from(defense.max(1)) * 50.0) + 2.0;

    let (critical, crit_msg) = critical_modifier(rng, rules);
    let stab = stab_modifier(attacker, mv, rules);
    let spread = random_spread(rng, rules);
    let multiplier = critical * effectiveness * stab * spread;
    let flat_bonus = rules.flat_bonus * spread;

    let messages = crit_msg.into_iter().chain(effectiveness_msg).collect();
    DamageOutcome {
        damage: round_half_up(base * multiplier + flat_bonus),
        messages,
    }
}
