use crate::registry::SessionId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, BattleError>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{creature} is already in battle")]
    SameCreatureSwitch { creature: String },

    #[error("{move_name} has no PP left")]
    NoPpLeft { move_name: String },

    #[error("unknown action {0:?} (expected \"attack\" or \"switch\")")]
    InvalidAction(String),

    #[error("index {index} is out of bounds for {len} entries")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("{creature} has fainted and cannot battle")]
    FaintedTarget { creature: String },

    #[error("unknown creature {0:?}")]
    UnknownCreature(String),

    #[error("unknown move {0:?}")]
    UnknownMove(String),

    #[error("a team holds 1 to 6 creatures, got {0}")]
    InvalidTeamSize(usize),

    #[error("{creature} must know 1 to 4 moves, got {count}")]
    InvalidMoveCount { creature: String, count: usize },

    #[error("{creature} must have 1 or 2 types, got {count}")]
    InvalidTypeCount { creature: String, count: usize },

    #[error("{creature} has no HP")]
    ZeroHp { creature: String },
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("token {0:?} is not attached to this session")]
    NotAttached(String),

    #[error("session already has two combatants")]
    ThirdCombatant,

    #[error("session is waiting for a second combatant")]
    NotStarted,

    #[error("turn cannot resolve with {0} pending moves")]
    NotReady(usize),

    #[error("moves are not accepted while a replacement is pending")]
    AwaitingReplacement,

    #[error("no replacement is pending for token {0:?}")]
    NoReplacementPending(String),

    #[error("token {0:?} is already bound to another session")]
    TokenInUse(String),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BattleError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("the battle is over; no further changes are accepted")]
    Terminal,

    #[error("session {0} not found")]
    SessionNotFound(SessionId),

    #[error("session {0} already has two human players")]
    SessionFull(SessionId),
}

impl BattleError {
    pub fn is_recoverable(&self) -> bool {
        matches!(self, BattleError::Validation(_))
    }
}
