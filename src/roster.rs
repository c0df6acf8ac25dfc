use crate::dex::Dex;
use crate::error::ValidationError;
use crate::model::{BaseStats, CreatureData, MoveData, Sprites, StatusCondition, TeamSelection};
use crate::types::ElementType;
use serde::Serialize;

pub const MAX_MOVES: usize = 4;
pub const MAX_ROSTER: usize = 6;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize)]
pub enum Side {
    A,
    B,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::A, Side::B];

    pub fn opponent(self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Side::A => 0,
            Side::B => 1,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MoveSlot {
    pub data: MoveData,
    pub current_pp: u8,
}

impl MoveSlot {
    pub fn new(data: MoveData) -> Self {
        let current_pp = data.pp;
        Self { data, current_pp }
    }

    pub fn name(&self) -> &str {
        &self.data.name
    }

    pub fn max_pp(&self) -> u8 {
        self.data.pp
    }

    pub fn is_usable(&self) -> bool {
        self.current_pp > 0
    }

    pub fn consume_pp(&mut self) {
        self.current_pp = self.current_pp.saturating_sub(1);
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum Onset {
    Inactive,
    Active { emitted: bool },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Affliction {
    pub condition: StatusCondition,
    pub turns: u8,
    pub onset: Onset,
}

impl Affliction {
    pub fn new(condition: StatusCondition) -> Self {
        let onset = match condition {
            StatusCondition::Burn | StatusCondition::Paralyze => Onset::Active { emitted: false },
            _ => Onset::Inactive,
        };
        Self {
            condition,
            turns: 0,
            onset,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Creature {
    pub name: String,
    pub types: Vec<ElementType>,
    pub stats: BaseStats,
    pub current_hp: u32,
    pub moves: Vec<MoveSlot>,
    pub sprites: Sprites,
    pub status: Option<Affliction>,
}

impl Creature {
    pub fn new(data: &CreatureData, moves: Vec<MoveData>) -> Result<Self, ValidationError> {
        if moves.is_empty() || moves.len() > MAX_MOVES {
            return Err(ValidationError::InvalidMoveCount {
                creature: data.name.clone(),
                count: moves.len(),
            });
        }
        if data.types.is_empty() || data.types.len() > 2 {
            return Err(ValidationError::InvalidTypeCount {
                creature: data.name.clone(),
                count: data.types.len(),
            });
        }
        if data.stats.hp == 0 {
            return Err(ValidationError::ZeroHp {
                creature: data.name.clone(),
            });
        }
        Ok(Self {
            name: data.name.clone(),
            types: data.types.clone(),
            stats: data.stats,
            current_hp: data.stats.hp,
            moves: moves.into_iter().map(MoveSlot::new).collect(),
            sprites: data.sprites.clone(),
            status: None,
        })
    }

    pub fn max_hp(&self) -> u32 {
        self.stats.hp
    }

    pub fn is_fainted(&self) -> bool {
        self.current_hp == 0
    }

    pub fn take_damage(&mut self, damage: u32) -> u32 {
        let dealt = damage.min(self.current_hp);
        self.current_hp -= dealt;
        dealt
    }

    pub fn fraction_of_max(&self, divisor: u32) -> u32 {
        (self.max_hp() / divisor.max(1)).max(1)
    }

    pub fn condition(&self) -> Option<StatusCondition> {
        self.status.map(|s| s.condition)
    }

    pub fn set_status(&mut self, condition: StatusCondition) {
        self.status = Some(Affliction::new(condition));
    }

    pub fn clear_status(&mut self) {
        self.status = None;
    }

    pub fn has_type(&self, element: ElementType) -> bool {
        self.types.contains(&element)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Combatant {
    pub name: String,
    pub roster: Vec<Creature>,
    active: usize,
    remaining: usize,
    fainted: Vec<usize>,
}

impl Combatant {
    pub fn new(name: impl Into<String>, roster: Vec<Creature>) -> Result<Self, ValidationError> {
        if roster.is_empty() || roster.len() > MAX_ROSTER {
            return Err(ValidationError::InvalidTeamSize(roster.len()));
        }
        let remaining = roster.len();
        Ok(Self {
            name: name.into(),
            roster,
            active: 0,
            remaining,
            fainted: Vec::new(),
        })
    }

    pub fn from_selection(
        name: impl Into<String>,
        selection: &TeamSelection,
        dex: &dyn Dex,
    ) -> Result<Self, ValidationError> {
        if selection.is_empty() || selection.len() > MAX_ROSTER {
            return Err(ValidationError::InvalidTeamSize(selection.len()));
        }
        let mut roster = Vec::with_capacity(selection.len());
        for entry in selection {
            let data = dex
                .creature(&entry.creature)
                .ok_or_else(|| ValidationError::UnknownCreature(entry.creature.clone()))?;
            let moves = entry
                .moves
                .iter()
                .map(|name| {
                    dex.move_data(name)
                        .ok_or_else(|| ValidationError::UnknownMove(name.clone()))
                })
                .collect::<Result<Vec<_>, _>>()?;
            roster.push(Creature::new(&data, moves)?);
        }
        Self::new(name, roster)
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active(&self) -> &Creature {
        &self.roster[self.active]
    }

    pub fn active_mut(&mut self) -> &mut Creature {
        &mut self.roster[self.active]
    }

    pub fn remaining(&self) -> usize {
        self.remaining
    }

    pub fn fainted_indices(&self) -> &[usize] {
        &self.fainted
    }

    pub fn check_switch_target(&self, index: usize) -> Result<(), ValidationError> {
        let target = self
            .roster
            .get(index)
            .ok_or(ValidationError::IndexOutOfBounds {
                index,
                len: self.roster.len(),
            })?;
        if index == self.active {
            return Err(ValidationError::SameCreatureSwitch {
                creature: target.name.clone(),
            });
        }
        if target.is_fainted() {
            return Err(ValidationError::FaintedTarget {
                creature: target.name.clone(),
            });
        }
        Ok(())
    }

    pub(crate) fn switch_to(&mut self, index: usize) {
        self.active = index;
    }

    /// Records the active creature as fainted once. Returns false if it was
    /// already counted or nothing remains to count.
    pub(crate) fn record_faint(&mut self) -> bool {
        if self.remaining == 0 || self.fainted.contains(&self.active) {
            return false;
        }
        self.fainted.push(self.active);
        self.remaining -= 1;
        true
    }

    pub fn first_healthy_bench(&self) -> Option<usize> {
        self.roster
            .iter()
            .enumerate()
            .find(|(idx, c)| *idx != self.active && !c.is_fainted())
            .map(|(idx, _)| idx)
    }
}
