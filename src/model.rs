use crate::types::ElementType;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveCategory {
    Physical,
    Special,
    Status,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusCondition {
    Poison,
    Sleep,
    Burn,
    Freeze,
    Confuse,
    Paralyze,
}

impl fmt::Display for StatusCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StatusCondition::Poison => "poison",
            StatusCondition::Sleep => "sleep",
            StatusCondition::Burn => "burn",
            StatusCondition::Freeze => "freeze",
            StatusCondition::Confuse => "confuse",
            StatusCondition::Paralyze => "paralyze",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectTarget {
    User,
    #[serde(alias = "target")]
    Opponent,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectData {
    pub status: StatusCondition,
    #[serde(default)]
    pub chance: u8,
    pub target: EffectTarget,
}

fn default_accuracy() -> u8 {
    100
}

fn default_pp() -> u8 {
    10
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveData {
    pub name: String,
    #[serde(rename = "type")]
    pub move_type: ElementType,
    pub category: MoveCategory,
    #[serde(default)]
    pub power: u32,
    #[serde(default = "default_accuracy")]
    pub accuracy: u8,
    #[serde(default = "default_pp")]
    pub pp: u8,
    #[serde(default)]
    pub effect: Option<EffectData>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseStats {
    pub hp: u32,
    pub atk: u32,
    pub def: u32,
    pub spa: u32,
    pub spd: u32,
    pub spe: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sprites {
    #[serde(default)]
    pub front: String,
    #[serde(default)]
    pub back: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatureData {
    pub name: String,
    pub types: Vec<ElementType>,
    pub stats: BaseStats,
    #[serde(default)]
    pub sprites: Sprites,
    #[serde(default)]
    pub learnset: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamEntry {
    pub creature: String,
    pub moves: Vec<String>,
}

impl TeamEntry {
    pub fn new(creature: impl Into<String>, moves: &[&str]) -> Self {
        Self {
            creature: creature.into(),
            moves: moves.iter().map(|m| m.to_string()).collect(),
        }
    }
}

pub type TeamSelection = Vec<TeamEntry>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_defaults_fill_missing_fields() {
        let raw = r#"{ "name": "Growl", "type": "normal", "category": "status" }"#;
        let parsed: MoveData = serde_json::from_str(raw).expect("valid move json");
        assert_eq!(parsed.power, 0);
        assert_eq!(parsed.accuracy, 100);
        assert_eq!(parsed.pp, 10);
        assert!(parsed.effect.is_none());
    }

    #[test]
    fn effect_target_accepts_target_alias() {
        let raw = r#"{ "status": "burn", "chance": 100, "target": "target" }"#;
        let parsed: EffectData = serde_json::from_str(raw).expect("valid effect json");
        assert_eq!(parsed.target, EffectTarget::Opponent);
        assert_eq!(parsed.status, StatusCondition::Burn);
    }
}
