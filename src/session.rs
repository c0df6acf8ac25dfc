use crate::error::{BattleError, ProtocolError, Result, ValidationError};
use crate::modifiers::{self, faster_side, is_defeated};
use crate::registry::SessionId;
use crate::report::{Dispatch, Options, Outcome, TurnReport};
use crate::roster::{Combatant, Side};
use crate::rules::Rules;
use crate::status::{apply_end_of_turn, check_status, try_inflict_effect, PendingEffect};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, debug_span, info, warn};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum Phase {
    AwaitingSecondCombatant,
    InProgress,
    AwaitingReplacement,
    Terminal,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Action {
    Attack(usize),
    Switch(usize),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRequest {
    pub action: String,
    pub index: usize,
}

impl MoveRequest {
    pub fn attack(index: usize) -> Self {
        Self {
            action: "attack".to_string(),
            index,
        }
    }

    pub fn switch(index: usize) -> Self {
        Self {
            action: "switch".to_string(),
            index,
        }
    }

    pub fn parse(&self) -> std::result::Result<Action, ValidationError> {
        match self.action.trim().to_ascii_lowercase().as_str() {
            "attack" => Ok(Action::Attack(self.index)),
            "switch" => Ok(Action::Switch(self.index)),
            _ => Err(ValidationError::InvalidAction(self.action.clone())),
        }
    }
}

impl From<Action> for MoveRequest {
    fn from(action: Action) -> Self {
        match action {
            Action::Attack(index) => MoveRequest::attack(index),
            Action::Switch(index) => MoveRequest::switch(index),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum Ending {
    Winner(Side),
    Draw,
}

#[derive(Clone, Debug)]
struct Seat {
    token: String,
    combatant: Combatant,
    pending: Option<Action>,
    needs_replacement: bool,
    replacement: Option<usize>,
}

pub struct BattleSession {
    id: SessionId,
    seats: [Option<Seat>; 2],
    phase: Phase,
    ending: Option<Ending>,
    turn: u32,
    messages: Vec<String>,
    effects: Vec<PendingEffect>,
    rules: Rules,
    rng: SmallRng,
}

impl BattleSession {
    pub fn new(id: SessionId, rules: Rules) -> Self {
        Self::with_rng(id, rules, SmallRng::from_entropy())
    }

    pub fn with_seed(id: SessionId, rules: Rules, seed: u64) -> Self {
        Self::with_rng(id, rules, SmallRng::seed_from_u64(seed))
    }

    fn with_rng(id: SessionId, rules: Rules, rng: SmallRng) -> Self {
        Self {
            id,
            seats: [None, None],
            phase: Phase::AwaitingSecondCombatant,
            ending: None,
            turn: 0,
            messages: Vec::new(),
            effects: Vec::new(),
            rules,
            rng,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    pub fn is_terminal(&self) -> bool {
        self.phase == Phase::Terminal
    }

    pub fn ending(&self) -> Option<Ending> {
        self.ending
    }

    pub fn winner(&self) -> Option<Side> {
        match self.ending {
            Some(Ending::Winner(side)) => Some(side),
            _ => None,
        }
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn side_of(&self, token: &str) -> Option<Side> {
        Side::BOTH.into_iter().find(|side| {
            self.seats[side.index()]
                .as_ref()
                .is_some_and(|seat| seat.token == token)
        })
    }

    pub fn token(&self, side: Side) -> Option<&str> {
        self.seat(side).map(|seat| seat.token.as_str())
    }

    pub fn combatant(&self, side: Side) -> Option<&Combatant> {
        self.seat(side).map(|seat| &seat.combatant)
    }

    pub fn needs_replacement(&self, token: &str) -> bool {
        self.side_of(token)
            .and_then(|side| self.seat(side))
            .is_some_and(|seat| seat.needs_replacement)
    }

    pub fn has_pending(&self, token: &str) -> bool {
        self.side_of(token)
            .and_then(|side| self.seat(side))
            .is_some_and(|seat| seat.pending.is_some())
    }

    pub fn pending_count(&self) -> usize {
        self.seats
            .iter()
            .flatten()
            .filter(|seat| seat.pending.is_some())
            .count()
    }

    pub fn ready_to_resolve(&self) -> bool {
        self.phase == Phase::InProgress && self.pending_count() == 2
    }

    fn seat(&self, side: Side) -> Option<&Seat> {
        self.seats[side.index()].as_ref()
    }

    fn seat_mut(&mut self, side: Side) -> Option<&mut Seat> {
        self.seats[side.index()].as_mut()
    }

    fn protocol(&self, err: ProtocolError) -> BattleError {
        warn!(session = %self.id, error = %err, "protocol violation");
        err.into()
    }

    fn ensure_live(&self) -> Result<()> {
        if self.is_terminal() {
            return Err(BattleError::Terminal);
        }
        Ok(())
    }

    fn attached_side(&self, token: &str) -> Result<Side> {
        self.side_of(token)
            .ok_or_else(|| self.protocol(ProtocolError::NotAttached(token.to_string())))
    }

    pub fn attach(&mut self, token: &str, combatant: Combatant) -> Result<Side> {
        self.ensure_live()?;
        if let Some(side) = self.side_of(token) {
            debug!(session = %self.id, token, "token already attached; ignoring");
            return Ok(side);
        }
        let Some(slot) = self.seats.iter().position(Option::is_none) else {
            return Err(self.protocol(ProtocolError::ThirdCombatant));
        };
        let side = if slot == 0 { Side::A } else { Side::B };
        info!(session = %self.id, ?side, player = %combatant.name, "combatant attached");
        self.seats[slot] = Some(Seat {
            token: token.to_string(),
            combatant,
            pending: None,
            needs_replacement: false,
            replacement: None,
        });
        if self.seats.iter().all(Option::is_some) {
            self.phase = Phase::InProgress;
            info!(session = %self.id, "battle started");
        }
        Ok(side)
    }

    pub fn validate_move(&self, token: &str, action: Action) -> Result<()> {
        let side = self.attached_side(token)?;
        let Some(seat) = self.seat(side) else {
            return Err(self.protocol(ProtocolError::NotAttached(token.to_string())));
        };
        match action {
            Action::Attack(index) => {
                let creature = seat.combatant.active();
                let slot = creature
                    .moves
                    .get(index)
                    .ok_or(ValidationError::IndexOutOfBounds {
                        index,
                        len: creature.moves.len(),
                    })?;
                if !slot.is_usable() {
                    return Err(ValidationError::NoPpLeft {
                        move_name: slot.name().to_string(),
                    }
                    .into());
                }
            }
            Action::Switch(index) => seat.combatant.check_switch_target(index)?,
        }
        Ok(())
    }

    pub fn submit_move(&mut self, token: &str, action: Action) -> Result<()> {
        self.ensure_live()?;
        let side = self.attached_side(token)?;
        match self.phase {
            Phase::AwaitingSecondCombatant => return Err(self.protocol(ProtocolError::NotStarted)),
            Phase::AwaitingReplacement => {
                return Err(self.protocol(ProtocolError::AwaitingReplacement))
            }
            Phase::InProgress | Phase::Terminal => {}
        }
        self.validate_move(token, action)?;
        let id = self.id;
        if let Some(seat) = self.seat_mut(side) {
            debug!(session = %id, ?side, ?action, replaced = seat.pending.is_some(), "move submitted");
            seat.pending = Some(action);
        }
        Ok(())
    }

    fn take_pending(&mut self, side: Side) -> Option<Action> {
        self.seat_mut(side).and_then(|seat| seat.pending.take())
    }

    pub fn resolve_turn(&mut self) -> Result<Vec<Dispatch>> {
        self.ensure_live()?;
        if !self.ready_to_resolve() {
            return Err(self.protocol(ProtocolError::NotReady(self.pending_count())));
        }
        let action_a = self.take_pending(Side::A);
        let action_b = self.take_pending(Side::B);
        let (Some(action_a), Some(action_b)) = (action_a, action_b) else {
            return Err(self.protocol(ProtocolError::NotReady(0)));
        };

        self.turn += 1;
        let span = debug_span!("turn", session = %self.id, turn = self.turn);
        let _guard = span.enter();
        self.messages.clear();
        self.effects.clear();

        match (action_a, action_b) {
            (Action::Switch(a), Action::Switch(b)) => {
                self.apply_switch(Side::A, a);
                self.apply_switch(Side::B, b);
            }
            (Action::Switch(a), Action::Attack(b)) => {
                self.apply_switch(Side::A, a);
                self.perform_attack(Side::B, b);
            }
            (Action::Attack(a), Action::Switch(b)) => {
                self.apply_switch(Side::B, b);
                self.perform_attack(Side::A, a);
            }
            (Action::Attack(a), Action::Attack(b)) => {
                let first = match &self.seats {
                    [Some(seat_a), Some(seat_b)] => {
                        faster_side(&seat_a.combatant, &seat_b.combatant, &mut self.rng)
                    }
                    _ => Side::A,
                };
                let (first_move, second_move) = match first {
                    Side::A => (a, b),
                    Side::B => (b, a),
                };
                self.perform_attack(first, first_move);
                let second = first.opponent();
                if self
                    .combatant(second)
                    .is_some_and(|combatant| !is_defeated(combatant))
                {
                    self.perform_attack(second, second_move);
                } else {
                    debug!(?second, "second attack skipped; attacker already down");
                }
            }
        }

        self.run_end_of_turn();
        self.settle_faints();
        debug!(lines = self.messages.len(), phase = ?self.phase, "turn resolved");
        Ok(self.reports())
    }

    fn apply_switch(&mut self, side: Side, index: usize) {
        let Some(seat) = self.seats[side.index()].as_mut() else {
            return;
        };
        seat.combatant.switch_to(index);
        let line = format!(
            "{} switched to {}!",
            seat.combatant.name,
            seat.combatant.active().name
        );
        self.messages.push(line);
    }

    fn perform_attack(&mut self, side: Side, move_index: usize) {
        let [Some(seat_a), Some(seat_b)] = &mut self.seats else {
            return;
        };
        let (me, foe) = match side {
            Side::A => (seat_a, seat_b),
            Side::B => (seat_b, seat_a),
        };
        let attacker = &mut me.combatant;
        let defender = &mut foe.combatant;
        if defender.active().is_fainted() {
            return;
        }
        let rules = &self.rules;
        let rng = &mut self.rng;

        let roster_index = attacker.active_index();
        let check = check_status(attacker.active_mut(), rules, rng);
        self.messages.extend(check.messages);
        if let Some(kind) = check.end_of_turn {
            self.effects.push(PendingEffect {
                side,
                roster_index,
                kind,
            });
        }
        if !check.can_move {
            if attacker.active().is_fainted() {
                debug!(creature = %attacker.active().name, "fainted while unable to move");
            }
            return;
        }

        let Some(mv) = attacker
            .active()
            .moves
            .get(move_index)
            .map(|slot| slot.data.clone())
        else {
            return;
        };
        self.messages
            .push(format!("{} used {}!", attacker.active().name, mv.name));
        let outcome = modifiers::damage(attacker.active(), &mv, defender.active(), rules, rng);
        attacker.active_mut().moves[move_index].consume_pp();

        let target = defender.active_mut();
        target.take_damage(outcome.damage);
        if mv.power > 0 {
            self.messages.push(format!(
                "{} has {}/{} HP left.",
                target.name,
                target.current_hp,
                target.max_hp()
            ));
        }
        self.messages.extend(outcome.messages);

        if let Some(line) = try_inflict_effect(attacker.active_mut(), defender.active_mut(), &mv, rng) {
            self.messages.push(line);
        }
        if defender.active().is_fainted() {
            debug!(creature = %defender.active().name, "knocked out");
        }
    }

    fn run_end_of_turn(&mut self) {
        let effects = std::mem::take(&mut self.effects);
        for effect in effects {
            let Some(seat) = self.seats[effect.side.index()].as_mut() else {
                continue;
            };
            let Some(creature) = seat.combatant.roster.get_mut(effect.roster_index) else {
                continue;
            };
            if let Some(line) = apply_end_of_turn(creature, effect.kind, &self.rules) {
                self.messages.push(line);
            }
        }
    }

    fn settle_faints(&mut self) {
        let mut exhausted = Vec::new();
        let mut replacing = false;
        for side in Side::BOTH {
            let Some(seat) = self.seats[side.index()].as_mut() else {
                continue;
            };
            if !is_defeated(&seat.combatant) || !seat.combatant.record_faint() {
                continue;
            }
            self.messages
                .push(format!("{} fainted!", seat.combatant.active().name));
            if seat.combatant.remaining() == 0 {
                exhausted.push(side);
            } else {
                seat.needs_replacement = true;
                seat.replacement = None;
                replacing = true;
            }
        }
        match exhausted.as_slice() {
            [] if replacing => self.phase = Phase::AwaitingReplacement,
            [] => {}
            [loser] => self.finish(Ending::Winner(loser.opponent())),
            _ => self.finish(Ending::Draw),
        }
    }

    fn finish(&mut self, ending: Ending) {
        self.phase = Phase::Terminal;
        self.ending = Some(ending);
        for seat in self.seats.iter_mut().flatten() {
            seat.needs_replacement = false;
            seat.pending = None;
        }
        if let Some(outcome) = self.outcome() {
            if let Some(winner) = &outcome.winner {
                self.messages.push(format!("{winner} wins the battle!"));
            } else {
                self.messages.push("The battle ended in a draw!".to_string());
            }
        }
        info!(session = %self.id, ?ending, turn = self.turn, "battle finished");
    }

    /// Brings in a replacement for `token`'s fainted active creature. When both
    /// sides lost a creature in the same turn, nothing is applied until both have chosen.
    pub fn resolve_replacement(&mut self, token: &str, index: usize) -> Result<Vec<Dispatch>> {
        self.ensure_live()?;
        let side = self.attached_side(token)?;
        let waiting = self.phase == Phase::AwaitingReplacement
            && self.seat(side).is_some_and(|seat| seat.needs_replacement);
        if !waiting {
            return Err(self.protocol(ProtocolError::NoReplacementPending(token.to_string())));
        }
        if let Some(seat) = self.seat(side) {
            seat.combatant.check_switch_target(index)?;
        }
        if let Some(seat) = self.seat_mut(side) {
            seat.replacement = Some(index);
        }
        let outstanding = self
            .seats
            .iter()
            .flatten()
            .any(|seat| seat.needs_replacement && seat.replacement.is_none());
        if outstanding {
            debug!(session = %self.id, ?side, "replacement buffered; waiting on opponent");
            return Ok(Vec::new());
        }

        self.messages.clear();
        for seat in self.seats.iter_mut().flatten() {
            if !seat.needs_replacement {
                continue;
            }
            if let Some(next) = seat.replacement.take() {
                seat.combatant.switch_to(next);
                seat.needs_replacement = false;
                self.messages.push(format!(
                    "{} sent out {}!",
                    seat.combatant.name,
                    seat.combatant.active().name
                ));
            }
        }
        self.phase = Phase::InProgress;
        Ok(self.reports())
    }

    pub fn outcome(&self) -> Option<Outcome> {
        match self.ending? {
            Ending::Draw => Some(Outcome {
                winner_side: None,
                winner: None,
                sprites: Vec::new(),
            }),
            Ending::Winner(side) => {
                let combatant = self.combatant(side)?;
                Some(Outcome {
                    winner_side: Some(side),
                    winner: Some(combatant.name.clone()),
                    sprites: combatant
                        .roster
                        .iter()
                        .map(|creature| creature.sprites.front.clone())
                        .collect(),
                })
            }
        }
    }

    fn report_for(&self, seat: &Seat, outcome: &Option<Outcome>) -> TurnReport {
        TurnReport {
            turn: self.turn,
            lines: self.messages.clone(),
            options: Options::for_combatant(&seat.combatant),
            awaiting_replacement: seat.needs_replacement,
            outcome: outcome.clone(),
        }
    }

    fn reports(&self) -> Vec<Dispatch> {
        let outcome = self.outcome();
        self.seats
            .iter()
            .flatten()
            .map(|seat| Dispatch {
                token: seat.token.clone(),
                report: self.report_for(seat, &outcome),
            })
            .collect()
    }

    pub fn snapshot(&self, token: &str) -> Result<TurnReport> {
        let side = self.attached_side(token)?;
        let outcome = self.outcome();
        self.seat(side)
            .map(|seat| self.report_for(seat, &outcome))
            .ok_or_else(|| self.protocol(ProtocolError::NotAttached(token.to_string())))
    }
}
