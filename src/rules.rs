use anyhow::Context;
use rand::Rng;
use serde::Deserialize;
use std::path::Path;

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct Rules {
    pub crit_chance: f64,
    pub crit_multiplier: f64,
    pub stab_multiplier: f64,
    pub spread_min: u32,
    pub spread_max: u32,
    pub flat_bonus: f64,
    pub sleep_wake_chance: f64,
    pub sleep_max_turns: u8,
    pub thaw_chance: f64,
    pub full_paralysis_chance: f64,
    pub confusion_self_hit_chance: f64,
    pub confusion_max_turns: u8,
    pub poison_divisor: u32,
    pub burn_divisor: u32,
    pub confusion_divisor: u32,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            crit_chance: 1.0 / 24.0,
            crit_multiplier: 1.5,
            stab_multiplier: 1.5,
            spread_min: 85,
            spread_max: 100,
            flat_bonus: 20.0,
            sleep_wake_chance: 1.0 / 3.0,
            sleep_max_turns: 3,
            thaw_chance: 0.2,
            full_paralysis_chance: 0.25,
            confusion_self_hit_chance: 1.0 / 3.0,
            confusion_max_turns: 4,
            poison_divisor: 8,
            burn_divisor: 16,
            confusion_divisor: 8,
        }
    }
}

impl Rules {
    pub fn deterministic_damage() -> Self {
        Self {
            crit_chance: 0.0,
            spread_min: 100,
            spread_max: 100,
            ..Self::default()
        }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read rules file at {}", path.display()))?;
        let rules: Rules = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse JSON from {}", path.display()))?;
        rules.validate()?;
        Ok(rules)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let chances = [
            ("crit_chance", self.crit_chance),
            ("sleep_wake_chance", self.sleep_wake_chance),
            ("thaw_chance", self.thaw_chance),
            ("full_paralysis_chance", self.full_paralysis_chance),
            ("confusion_self_hit_chance", self.confusion_self_hit_chance),
        ];
        for (name, value) in chances {
            if !(0.0..=1.0).contains(&value) {
                anyhow::bail!("{name} must be within 0.0..=1.0, got {value}");
            }
        }
        if self.spread_min > self.spread_max {
            anyhow::bail!(
                "spread_min ({}) must not exceed spread_max ({})",
                self.spread_min,
                self.spread_max
            );
        }
        if self.poison_divisor == 0 || self.burn_divisor == 0 || self.confusion_divisor == 0 {
            anyhow::bail!("status damage divisors must be > 0");
        }
        Ok(())
    }
}

/// Bernoulli draw for a configured chance. Values at or above 1.0 always hit;
/// zero, negative and NaN never do.
pub fn roll(rng: &mut impl Rng, chance: f64) -> bool {
    if chance >= 1.0 {
        return true;
    }
    if chance.is_nan() || chance <= 0.0 {
        return false;
    }
    rng.gen_bool(chance)
}
