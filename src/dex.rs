use crate::model::{
    BaseStats, CreatureData, EffectData, EffectTarget, MoveCategory, MoveData, Sprites,
    StatusCondition,
};
use crate::types::ElementType;
use anyhow::Context;
use phf::phf_map;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

pub trait Dex: Send + Sync {
    fn creature(&self, name: &str) -> Option<CreatureData>;
    fn move_data(&self, name: &str) -> Option<MoveData>;
    fn species_names(&self) -> Vec<String>;
}

pub fn normalize_id(name: &str) -> String {
    name.to_ascii_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

struct SpeciesEntry {
    name: &'static str,
    types: &'static [ElementType],
    stats: BaseStats,
    learnset: &'static [&'static str],
}

struct MoveEntry {
    name: &'static str,
    move_type: ElementType,
    category: MoveCategory,
    power: u32,
    accuracy: u8,
    pp: u8,
    effect: Option<EffectData>,
}

const fn stats(hp: u32, atk: u32, def: u32, spa: u32, spd: u32, spe: u32) -> BaseStats {
    BaseStats {
        hp,
        atk,
        def,
        spa,
        spd,
        spe,
    }
}

const fn on_target(status: StatusCondition, chance: u8) -> Option<EffectData> {
    Some(EffectData {
        status,
        chance,
        target: EffectTarget::Opponent,
    })
}

const fn on_user(status: StatusCondition, chance: u8) -> Option<EffectData> {
    Some(EffectData {
        status,
        chance,
        target: EffectTarget::User,
    })
}

use ElementType as T;
use MoveCategory::{Physical, Special, Status};
use StatusCondition as S;

static SPECIES: phf::Map<&'static str, SpeciesEntry> = phf_map! {
    "charizard" => SpeciesEntry {
        name: "Charizard",
        types: &[T::Fire, T::Flying],
        stats: stats(153, 104, 98, 129, 105, 120),
        learnset: &["flamethrower", "fireblast", "wingattack", "dragonclaw", "earthquake", "willowisp", "flareblitz"],
    },
    "blastoise" => SpeciesEntry {
        name: "Blastoise",
        types: &[T::Water],
        stats: stats(154, 103, 120, 105, 125, 98),
        learnset: &["surf", "hydropump", "icebeam", "bite", "earthquake", "tackle"],
    },
    "venusaur" => SpeciesEntry {
        name: "Venusaur",
        types: &[T::Grass, T::Poison],
        stats: stats(155, 102, 103, 120, 120, 100),
        learnset: &["razorleaf", "sleeppowder", "sludgebomb", "toxic", "earthquake", "tackle"],
    },
    "pikachu" => SpeciesEntry {
        name: "Pikachu",
        types: &[T::Electric],
        stats: stats(110, 75, 60, 70, 70, 110),
        learnset: &["thunderbolt", "thunderwave", "thunder", "tackle", "bodyslam"],
    },
    "gengar" => SpeciesEntry {
        name: "Gengar",
        types: &[T::Ghost, T::Poison],
        stats: stats(135, 85, 80, 150, 95, 130),
        learnset: &["shadowball", "sludgebomb", "hypnosis", "confuseray", "thunderbolt", "psychic"],
    },
    "snorlax" => SpeciesEntry {
        name: "Snorlax",
        types: &[T::Normal],
        stats: stats(235, 130, 85, 85, 130, 50),
        learnset: &["bodyslam", "hyperbeam", "rest", "earthquake", "crunch"],
    },
    "dragonite" => SpeciesEntry {
        name: "Dragonite",
        types: &[T::Dragon, T::Flying],
        stats: stats(166, 154, 115, 120, 120, 100),
        learnset: &["dragonclaw", "outrage", "wingattack", "thunderwave", "earthquake", "hyperbeam"],
    },
    "alakazam" => SpeciesEntry {
        name: "Alakazam",
        types: &[T::Psychic],
        stats: stats(130, 70, 65, 155, 115, 140),
        learnset: &["psychic", "psybeam", "shadowball", "thunderwave", "hypnosis"],
    },
    "machamp" => SpeciesEntry {
        name: "Machamp",
        types: &[T::Fighting],
        stats: stats(165, 150, 100, 85, 105, 75),
        learnset: &["crosschop", "dynamicpunch", "rockslide", "earthquake", "bodyslam"],
    },
    "lapras" => SpeciesEntry {
        name: "Lapras",
        types: &[T::Water, T::Ice],
        stats: stats(190, 105, 100, 105, 115, 80),
        learnset: &["surf", "icebeam", "blizzard", "bodyslam", "confuseray", "thunderbolt"],
    },
    "golem" => SpeciesEntry {
        name: "Golem",
        types: &[T::Rock, T::Ground],
        stats: stats(155, 140, 150, 75, 85, 65),
        learnset: &["rockslide", "earthquake", "tackle", "bodyslam"],
    },
    "gyarados" => SpeciesEntry {
        name: "Gyarados",
        types: &[T::Water, T::Flying],
        stats: stats(170, 145, 99, 80, 120, 101),
        learnset: &["hydropump", "bite", "crunch", "outrage", "thunderwave", "icebeam"],
    },
    "clefable" => SpeciesEntry {
        name: "Clefable",
        types: &[T::Fairy],
        stats: stats(170, 90, 93, 115, 110, 80),
        learnset: &["moonblast", "thunderwave", "flamethrower", "icebeam", "bodyslam"],
    },
    "scizor" => SpeciesEntry {
        name: "Scizor",
        types: &[T::Bug, T::Steel],
        stats: stats(145, 150, 120, 75, 100, 85),
        learnset: &["ironhead", "xscissor", "wingattack", "bite"],
    },
};

static MOVES: phf::Map<&'static str, MoveEntry> = phf_map! {
    "tackle" => MoveEntry { name: "Tackle", move_type: T::Normal, category: Physical, power: 40, accuracy: 100, pp: 35, effect: None },
    "bodyslam" => MoveEntry { name: "Body Slam", move_type: T::Normal, category: Physical, power: 85, accuracy: 100, pp: 15, effect: on_target(S::Paralyze, 30) },
    "hyperbeam" => MoveEntry { name: "Hyper Beam", move_type: T::Normal, category: Special, power: 150, accuracy: 90, pp: 5, effect: None },
    "rest" => MoveEntry { name: "Rest", move_type: T::Psychic, category: Status, power: 0, accuracy: 100, pp: 5, effect: on_user(S::Sleep, 100) },
    "flamethrower" => MoveEntry { name: "Flamethrower", move_type: T::Fire, category: Special, power: 90, accuracy: 100, pp: 15, effect: on_target(S::Burn, 10) },
    "fireblast" => MoveEntry { name: "Fire Blast", move_type: T::Fire, category: Special, power: 110, accuracy: 85, pp: 5, effect: on_target(S::Burn, 10) },
    "flareblitz" => MoveEntry { name: "Flare Blitz", move_type: T::Fire, category: Physical, power: 120, accuracy: 100, pp: 15, effect: on_target(S::Burn, 10) },
    "willowisp" => MoveEntry { name: "Will-O-Wisp", move_type: T::Fire, category: Status, power: 0, accuracy: 85, pp: 15, effect: on_target(S::Burn, 100) },
    "surf" => MoveEntry { name: "Surf", move_type: T::Water, category: Special, power: 90, accuracy: 100, pp: 15, effect: None },
    "hydropump" => MoveEntry { name: "Hydro Pump", move_type: T::Water, category: Special, power: 110, accuracy: 80, pp: 5, effect: None },
    "icebeam" => MoveEntry { name: "Ice Beam", move_type: T::Ice, category: Special, power: 90, accuracy: 100, pp: 10, effect: on_target(S::Freeze, 10) },
    "blizzard" => MoveEntry { name: "Blizzard", move_type: T::Ice, category: Special, power: 110, accuracy: 70, pp: 5, effect: on_target(S::Freeze, 10) },
    "thunderbolt" => MoveEntry { name: "Thunderbolt", move_type: T::Electric, category: Special, power: 90, accuracy: 100, pp: 15, effect: on_target(S::Paralyze, 10) },
    "thunder" => MoveEntry { name: "Thunder", move_type: T::Electric, category: Special, power: 110, accuracy: 70, pp: 10, effect: on_target(S::Paralyze, 30) },
    "thunderwave" => MoveEntry { name: "Thunder Wave", move_type: T::Electric, category: Status, power: 0, accuracy: 90, pp: 20, effect: on_target(S::Paralyze, 100) },
    "razorleaf" => MoveEntry { name: "Razor Leaf", move_type: T::Grass, category: Physical, power: 55, accuracy: 95, pp: 25, effect: None },
    "sleeppowder" => MoveEntry { name: "Sleep Powder", move_type: T::Grass, category: Status, power: 0, accuracy: 75, pp: 15, effect: on_target(S::Sleep, 100) },
    "sludgebomb" => MoveEntry { name: "Sludge Bomb", move_type: T::Poison, category: Special, power: 90, accuracy: 100, pp: 10, effect: on_target(S::Poison, 30) },
    "toxic" => MoveEntry { name: "Toxic", move_type: T::Poison, category: Status, power: 0, accuracy: 90, pp: 10, effect: on_target(S::Poison, 100) },
    "shadowball" => MoveEntry { name: "Shadow Ball", move_type: T::Ghost, category: Special, power: 80, accuracy: 100, pp: 15, effect: None },
    "confuseray" => MoveEntry { name: "Confuse Ray", move_type: T::Ghost, category: Status, power: 0, accuracy: 100, pp: 10, effect: on_target(S::Confuse, 100) },
    "hypnosis" => MoveEntry { name: "Hypnosis", move_type: T::Psychic, category: Status, power: 0, accuracy: 60, pp: 20, effect: on_target(S::Sleep, 100) },
    "psychic" => MoveEntry { name: "Psychic", move_type: T::Psychic, category: Special, power: 90, accuracy: 100, pp: 10, effect: None },
    "psybeam" => MoveEntry { name: "Psybeam", move_type: T::Psychic, category: Special, power: 65, accuracy: 100, pp: 20, effect: on_target(S::Confuse, 10) },
    "earthquake" => MoveEntry { name: "Earthquake", move_type: T::Ground, category: Physical, power: 100, accuracy: 100, pp: 10, effect: None },
    "rockslide" => MoveEntry { name: "Rock Slide", move_type: T::Rock, category: Physical, power: 75, accuracy: 90, pp: 10, effect: None },
    "crosschop" => MoveEntry { name: "Cross Chop", move_type: T::Fighting, category: Physical, power: 100, accuracy: 80, pp: 5, effect: None },
    "dynamicpunch" => MoveEntry { name: "Dynamic Punch", move_type: T::Fighting, category: Physical, power: 100, accuracy: 50, pp: 5, effect: on_target(S::Confuse, 100) },
    "dragonclaw" => MoveEntry { name: "Dragon Claw", move_type: T::Dragon, category: Physical, power: 80, accuracy: 100, pp: 15, effect: None },
    "outrage" => MoveEntry { name: "Outrage", move_type: T::Dragon, category: Physical, power: 120, accuracy: 100, pp: 10, effect: on_user(S::Confuse, 100) },
    "wingattack" => MoveEntry { name: "Wing Attack", move_type: T::Flying, category: Physical, power: 60, accuracy: 100, pp: 35, effect: None },
    "bite" => MoveEntry { name: "Bite", move_type: T::Dark, category: Physical, power: 60, accuracy: 100, pp: 25, effect: None },
    "crunch" => MoveEntry { name: "Crunch", move_type: T::Dark, category: Physical, power: 80, accuracy: 100, pp: 15, effect: None },
    "ironhead" => MoveEntry { name: "Iron Head", move_type: T::Steel, category: Physical, power: 80, accuracy: 100, pp: 15, effect: None },
    "xscissor" => MoveEntry { name: "X-Scissor", move_type: T::Bug, category: Physical, power: 80, accuracy: 100, pp: 15, effect: None },
    "moonblast" => MoveEntry { name: "Moonblast", move_type: T::Fairy, category: Special, power: 95, accuracy: 100, pp: 15, effect: None },
};

#[derive(Debug, Clone, Copy, Default)]
pub struct StaticDex;

impl Dex for StaticDex {
    fn creature(&self, name: &str) -> Option<CreatureData> {
        let id = normalize_id(name);
        SPECIES.get(id.as_str()).map(|entry| CreatureData {
            name: entry.name.to_string(),
            types: entry.types.to_vec(),
            stats: entry.stats,
            sprites: Sprites {
                front: format!("sprites/front/{id}.png"),
                back: format!("sprites/back/{id}.png"),
            },
            learnset: entry.learnset.iter().map(|m| m.to_string()).collect(),
        })
    }

    fn move_data(&self, name: &str) -> Option<MoveData> {
        MOVES.get(normalize_id(name).as_str()).map(|entry| MoveData {
            name: entry.name.to_string(),
            move_type: entry.move_type,
            category: entry.category,
            power: entry.power,
            accuracy: entry.accuracy,
            pp: entry.pp,
            effect: entry.effect,
        })
    }

    fn species_names(&self) -> Vec<String> {
        // phf iteration order is fixed at compile time; sort so callers see a readable order.
        let mut names: Vec<String> = SPECIES.values().map(|e| e.name.to_string()).collect();
        names.sort();
        names
    }
}

#[derive(Debug, Deserialize)]
struct DexFile {
    #[serde(default)]
    creatures: Vec<CreatureData>,
    #[serde(default)]
    moves: Vec<MoveData>,
}

/// Reference data loaded from a JSON document `{ "creatures": [...], "moves": [...] }`.
#[derive(Debug, Clone, Default)]
pub struct JsonDex {
    creatures: HashMap<String, CreatureData>,
    moves: HashMap<String, MoveData>,
    order: Vec<String>,
}

impl JsonDex {
    pub fn from_entries(creatures: Vec<CreatureData>, moves: Vec<MoveData>) -> Self {
        let mut dex = JsonDex::default();
        for creature in creatures {
            let id = normalize_id(&creature.name);
            if !dex.creatures.contains_key(&id) {
                dex.order.push(creature.name.clone());
            }
            dex.creatures.insert(id, creature);
        }
        for mv in moves {
            dex.moves.insert(normalize_id(&mv.name), mv);
        }
        dex
    }

    pub fn from_json_str(raw: &str) -> anyhow::Result<Self> {
        let parsed: DexFile = serde_json::from_str(raw).context("Failed to parse dex JSON")?;
        Ok(Self::from_entries(parsed.creatures, parsed.moves))
    }

    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read dex file at {}", path.display()))?;
        Self::from_json_str(&raw).with_context(|| format!("Invalid dex file {}", path.display()))
    }
}

impl Dex for JsonDex {
    fn creature(&self, name: &str) -> Option<CreatureData> {
        self.creatures.get(&normalize_id(name)).cloned()
    }

    fn move_data(&self, name: &str) -> Option<MoveData> {
        self.moves.get(&normalize_id(name)).cloned()
    }

    fn species_names(&self) -> Vec<String> {
        self.order.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_dex_lookup_ignores_case_and_spacing() {
        let dex = StaticDex;
        let slam = dex.move_data("Body Slam").expect("body slam exists");
        assert_eq!(slam.power, 85);
        assert_eq!(slam.effect.map(|e| e.status), Some(StatusCondition::Paralyze));
        let zard = dex.creature("CHARIZARD").expect("charizard exists");
        assert_eq!(zard.types, vec![ElementType::Fire, ElementType::Flying]);
        assert_eq!(zard.sprites.front, "sprites/front/charizard.png");
    }

    #[test]
    fn static_learnsets_only_reference_known_moves() {
        let dex = StaticDex;
        for name in dex.species_names() {
            let creature = dex.creature(&name).expect("listed species resolves");
            for mv in &creature.learnset {
                assert!(dex.move_data(mv).is_some(), "{} lists unknown move {}", name, mv);
            }
        }
    }

    #[test]
    fn json_dex_parses_documents() {
        let raw = r#"{
            "creatures": [{
                "name": "Testmon",
                "types": ["water"],
                "stats": { "hp": 100, "atk": 50, "def": 50, "spa": 50, "spd": 50, "spe": 50 },
                "learnset": ["Splash Hit"]
            }],
            "moves": [{ "name": "Splash Hit", "type": "water", "category": "physical", "power": 40 }]
        }"#;
        let dex = JsonDex::from_json_str(raw).expect("valid dex");
        assert_eq!(dex.species_names(), vec!["Testmon".to_string()]);
        assert_eq!(dex.move_data("splashhit").map(|m| m.power), Some(40));
        assert!(dex.creature("missingno").is_none());
    }

    #[test]
    fn json_dex_reports_bad_input() {
        assert!(JsonDex::from_json_str("{ not json").is_err());
    }
}
