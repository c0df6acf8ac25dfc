use crate::roster::{Combatant, Side};
use crate::types::ElementType;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MoveOption {
    pub index: usize,
    pub name: String,
    #[serde(rename = "type")]
    pub move_type: ElementType,
    pub current_pp: u8,
    pub max_pp: u8,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SwitchOption {
    pub index: usize,
    pub name: String,
    pub current_hp: u32,
    pub max_hp: u32,
    pub active: bool,
    pub fainted: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Options {
    pub moves: Vec<MoveOption>,
    pub roster: Vec<SwitchOption>,
}

impl Options {
    pub fn for_combatant(combatant: &Combatant) -> Self {
        let moves = combatant
            .active()
            .moves
            .iter()
            .enumerate()
            .map(|(index, slot)| MoveOption {
                index,
                name: slot.name().to_string(),
                move_type: slot.data.move_type,
                current_pp: slot.current_pp,
                max_pp: slot.max_pp(),
            })
            .collect();
        let roster = combatant
            .roster
            .iter()
            .enumerate()
            .map(|(index, creature)| SwitchOption {
                index,
                name: creature.name.clone(),
                current_hp: creature.current_hp,
                max_hp: creature.max_hp(),
                active: index == combatant.active_index(),
                fainted: creature.is_fainted(),
            })
            .collect();
        Self { moves, roster }
    }

    pub fn switchable(&self) -> impl Iterator<Item = &SwitchOption> {
        self.roster.iter().filter(|slot| !slot.active && !slot.fainted)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Outcome {
    /// `None` when both sides ran out in the same turn.
    pub winner_side: Option<Side>,
    pub winner: Option<String>,
    pub sprites: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TurnReport {
    pub turn: u32,
    pub lines: Vec<String>,
    pub options: Options,
    pub awaiting_replacement: bool,
    pub outcome: Option<Outcome>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Dispatch {
    pub token: String,
    pub report: TurnReport,
}
