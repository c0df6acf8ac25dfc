use crate::bot::{legal_action, legal_replacement, BotController, Controller, RandomTeamGenerator, TeamGenerator};
use crate::dex::Dex;
use crate::error::{BattleError, ProtocolError, Result};
use crate::model::TeamSelection;
use crate::report::{Dispatch, TurnReport};
use crate::roster::{Combatant, Side};
use crate::rules::Rules;
use crate::session::{BattleSession, MoveRequest, Phase};
use parking_lot::{Mutex, RwLock};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

const SEATS: usize = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug)]
pub struct RegistryConfig {
    pub rules: Rules,
    pub bot_name: String,
    pub seed: Option<u64>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            rules: Rules::default(),
            bot_name: "Rival".to_string(),
            seed: None,
        }
    }
}

struct BotSeat {
    token: String,
    controller: Box<dyn Controller>,
    rng: SmallRng,
    attached: bool,
}

struct Room {
    session: BattleSession,
    bot: Option<BotSeat>,
    occupancy: usize,
}

impl Room {
    fn bot_token(&self) -> Option<&str> {
        self.bot.as_ref().map(|bot| bot.token.as_str())
    }

    fn bot_side(&self) -> Option<Side> {
        self.bot_token().and_then(|token| self.session.side_of(token))
    }

    fn submit_bot_move(&mut self) -> Result<()> {
        let Some(side) = self.bot_side() else {
            return Ok(());
        };
        let Some(bot) = self.bot.as_mut() else {
            return Ok(());
        };
        if self.session.has_pending(&bot.token) {
            return Ok(());
        }
        let Some(combatant) = self.session.combatant(side) else {
            return Ok(());
        };
        match legal_action(bot.controller.as_mut(), combatant) {
            Some(action) => self.session.submit_move(&bot.token, action),
            None => {
                warn!(session = %self.session.id(), "bot has no legal action; turn cannot proceed");
                Ok(())
            }
        }
    }

    fn replace_bot_if_needed(&mut self) -> Result<Vec<Dispatch>> {
        let Some(side) = self.bot_side() else {
            return Ok(Vec::new());
        };
        let Some(bot) = self.bot.as_mut() else {
            return Ok(Vec::new());
        };
        if self.session.phase() != Phase::AwaitingReplacement
            || !self.session.needs_replacement(&bot.token)
        {
            return Ok(Vec::new());
        }
        let Some(combatant) = self.session.combatant(side) else {
            return Ok(Vec::new());
        };
        match legal_replacement(bot.controller.as_mut(), combatant) {
            Some(index) => self.session.resolve_replacement(&bot.token, index),
            None => Ok(Vec::new()),
        }
    }

    fn without_bot(&self, mut dispatches: Vec<Dispatch>) -> Vec<Dispatch> {
        if let Some(token) = self.bot_token() {
            dispatches.retain(|dispatch| dispatch.token != token);
        }
        dispatches
    }
}

fn session_seed(base: u64, id: SessionId) -> u64 {
    base ^ id.0.wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

pub struct SessionRegistry {
    dex: Arc<dyn Dex>,
    generator: Arc<dyn TeamGenerator>,
    config: RegistryConfig,
    next_id: AtomicU64,
    rooms: RwLock<HashMap<SessionId, Arc<Mutex<Room>>>>,
    tokens: RwLock<HashMap<String, SessionId>>,
}

impl SessionRegistry {
    pub fn new(dex: Arc<dyn Dex>, config: RegistryConfig) -> Self {
        let generator = Arc::new(RandomTeamGenerator::new(dex.clone()));
        Self::with_generator(dex, generator, config)
    }

    pub fn with_generator(
        dex: Arc<dyn Dex>,
        generator: Arc<dyn TeamGenerator>,
        config: RegistryConfig,
    ) -> Self {
        Self {
            dex,
            generator,
            config,
            next_id: AtomicU64::new(1),
            rooms: RwLock::new(HashMap::new()),
            tokens: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn session_count(&self) -> usize {
        self.rooms.read().len()
    }

    pub fn create_session(&self, single_player: bool) -> SessionId {
        self.create(single_player, None)
    }

    pub fn create_session_with_seed(&self, single_player: bool, seed: u64) -> SessionId {
        self.create(single_player, Some(seed))
    }

    fn create(&self, single_player: bool, explicit_seed: Option<u64>) -> SessionId {
        let id = SessionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let seed = explicit_seed.or_else(|| self.config.seed.map(|base| session_seed(base, id)));
        let (session, bot) = match seed {
            Some(seed) => {
                let mut seeder = SmallRng::seed_from_u64(seed);
                let session = BattleSession::with_seed(id, self.config.rules, seeder.gen());
                let bot = single_player.then(|| BotSeat {
                    token: format!("bot-{id}"),
                    controller: Box::new(BotController::with_seed(seeder.gen())),
                    rng: SmallRng::seed_from_u64(seeder.gen()),
                    attached: false,
                });
                (session, bot)
            }
            None => {
                let session = BattleSession::new(id, self.config.rules);
                let bot = single_player.then(|| BotSeat {
                    token: format!("bot-{id}"),
                    controller: Box::new(BotController::new()),
                    rng: SmallRng::from_entropy(),
                    attached: false,
                });
                (session, bot)
            }
        };
        let room = Room {
            session,
            bot,
            occupancy: 0,
        };
        self.rooms.write().insert(id, Arc::new(Mutex::new(room)));
        info!(session = %id, single_player, "session created");
        id
    }

    fn room(&self, id: SessionId) -> Result<Arc<Mutex<Room>>> {
        self.rooms
            .read()
            .get(&id)
            .cloned()
            .ok_or(BattleError::SessionNotFound(id))
    }

    pub fn session_of(&self, token: &str) -> Option<SessionId> {
        self.tokens.read().get(token).copied()
    }

    pub fn is_full(&self, id: SessionId) -> Result<bool> {
        Ok(self.room(id)?.lock().occupancy >= SEATS)
    }

    /// Reserves a seat for `token`. Joining twice is a no-op; the first human
    /// in a single-player room also seats the bot.
    pub fn join(&self, id: SessionId, token: &str) -> Result<()> {
        let handle = self.room(id)?;
        let mut room = handle.lock();
        self.join_locked(id, &mut room, token)
    }

    fn join_locked(&self, id: SessionId, room: &mut Room, token: &str) -> Result<()> {
        if room.session.is_terminal() {
            return Err(BattleError::Terminal);
        }
        let mut tokens = self.tokens.write();
        match tokens.get(token) {
            Some(existing) if *existing == id => return Ok(()),
            Some(existing) => {
                warn!(session = %id, token, other = %existing, "token already joined another session");
                return Err(ProtocolError::TokenInUse(token.to_string()).into());
            }
            None => {}
        }
        if room.occupancy >= SEATS {
            return Err(BattleError::SessionFull(id));
        }
        tokens.insert(token.to_string(), id);
        room.occupancy += 1;
        if let Some(bot) = room.bot.as_ref() {
            if room.occupancy < SEATS {
                tokens.insert(bot.token.clone(), id);
                room.occupancy += 1;
            }
        }
        debug!(session = %id, token, occupancy = room.occupancy, "joined");
        Ok(())
    }

    pub fn attach_combatant(
        &self,
        id: SessionId,
        token: &str,
        name: &str,
        selection: &TeamSelection,
    ) -> Result<Side> {
        let handle = self.room(id)?;
        let mut room = handle.lock();
        self.join_locked(id, &mut room, token)?;
        let combatant = Combatant::from_selection(name, selection, self.dex.as_ref())?;
        let side = room.session.attach(token, combatant)?;
        self.attach_bot(&mut room)?;
        Ok(side)
    }

    fn attach_bot(&self, room: &mut Room) -> Result<()> {
        let Some(bot) = room.bot.as_mut() else {
            return Ok(());
        };
        if bot.attached {
            return Ok(());
        }
        let selection = self.generator.generate(&mut bot.rng);
        let combatant =
            Combatant::from_selection(self.config.bot_name.as_str(), &selection, self.dex.as_ref())?;
        room.session.attach(&bot.token, combatant)?;
        bot.attached = true;
        info!(session = %room.session.id(), creatures = selection.len(), "bot seated");
        Ok(())
    }

    pub fn submit_move(&self, id: SessionId, token: &str, request: &MoveRequest) -> Result<Vec<Dispatch>> {
        let action = request.parse()?;
        let handle = self.room(id)?;
        let mut room = handle.lock();
        if room.bot_token() == Some(token) {
            warn!(session = %id, token, "move submitted with the bot's token");
            return Err(ProtocolError::NotAttached(token.to_string()).into());
        }
        room.session.submit_move(token, action)?;
        room.submit_bot_move()?;
        if !room.session.ready_to_resolve() {
            return Ok(Vec::new());
        }
        let mut dispatches = room.session.resolve_turn()?;
        dispatches.extend(room.replace_bot_if_needed()?);
        Ok(room.without_bot(dispatches))
    }

    pub fn submit_replacement(&self, id: SessionId, token: &str, index: usize) -> Result<Vec<Dispatch>> {
        let handle = self.room(id)?;
        let mut room = handle.lock();
        if room.bot_token() == Some(token) {
            warn!(session = %id, token, "replacement submitted with the bot's token");
            return Err(ProtocolError::NotAttached(token.to_string()).into());
        }
        let dispatches = room.session.resolve_replacement(token, index)?;
        Ok(room.without_bot(dispatches))
    }

    pub fn snapshot(&self, id: SessionId, token: &str) -> Result<TurnReport> {
        let handle = self.room(id)?;
        let room = handle.lock();
        room.session.snapshot(token)
    }

    pub fn inspect<R>(&self, id: SessionId, f: impl FnOnce(&BattleSession) -> R) -> Result<R> {
        let handle = self.room(id)?;
        let room = handle.lock();
        Ok(f(&room.session))
    }

    pub fn delete(&self, id: SessionId) -> bool {
        let removed = self.rooms.write().remove(&id).is_some();
        if removed {
            self.tokens.write().retain(|_, session| *session != id);
            info!(session = %id, "session deleted");
        }
        removed
    }

    pub fn prune_terminal(&self) -> usize {
        let finished: Vec<SessionId> = {
            let rooms = self.rooms.read();
            rooms
                .iter()
                .filter(|(_, room)| room.lock().session.is_terminal())
                .map(|(id, _)| *id)
                .collect()
        };
        finished.iter().filter(|id| self.delete(**id)).count()
    }
}
