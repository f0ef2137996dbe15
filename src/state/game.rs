use std::time::SystemTime;

use rand::rngs::StdRng;
use uuid::Uuid;

use crate::state::{
    handler::PhaseHandler, preset::LevelPreset, quests::Quests, roles::RoleCatalog,
    roster::Roster, state_machine::GameStateMachine,
};

/// Final outcome of a match, from the good side's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    /// The match is still being played.
    Unfinished,
    /// Good won.
    Won,
    /// Evil won.
    Lost,
}

/// Identity, timestamps and outcome of a match.
#[derive(Debug, Clone)]
pub struct GameMeta {
    /// Match identifier.
    pub id: Uuid,
    /// When the match was created.
    pub created_at: SystemTime,
    /// When roles were dealt.
    pub started_at: Option<SystemTime>,
    /// When the outcome was settled.
    pub finished_at: Option<SystemTime>,
    /// Outcome so far.
    pub status: GameStatus,
    /// Preset in use, `None` until the match starts.
    pub level_preset: Option<LevelPreset>,
    creator_id: Option<String>,
}

impl GameMeta {
    /// Metadata of a freshly created match.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: SystemTime::now(),
            started_at: None,
            finished_at: None,
            status: GameStatus::Unfinished,
            level_preset: None,
            creator_id: None,
        }
    }

    /// Player who created the match.
    pub fn creator_id(&self) -> Option<&str> {
        self.creator_id.as_deref()
    }

    /// Record the creator; only the first call has an effect.
    pub fn set_creator(&mut self, id: &str) {
        if self.creator_id.is_none() {
            self.creator_id = Some(id.to_string());
        }
    }

    /// Mark the match as started with `preset`.
    pub fn start(&mut self, preset: LevelPreset) {
        self.started_at = Some(SystemTime::now());
        self.level_preset = Some(preset);
    }

    /// Record the final outcome.
    pub fn finish(&mut self, status: GameStatus) {
        self.finished_at = Some(SystemTime::now());
        self.status = status;
    }
}

impl Default for GameMeta {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything one match owns; mutated only through the active phase handler.
pub struct GameSession {
    /// Identity, timestamps and outcome.
    pub meta: GameMeta,
    /// Seated players.
    pub roster: Roster,
    /// The five quests.
    pub quests: Quests,
    /// Phase state machine.
    pub machine: GameStateMachine,
    /// Operation set currently accepted.
    pub handler: PhaseHandler,
    /// Role definitions used for dealing and visibility.
    pub catalog: RoleCatalog,
    /// Randomness for role dealing and the first leader.
    pub rng: StdRng,
}

impl GameSession {
    /// Build a session in the preparation phase.
    pub fn new(machine: GameStateMachine, catalog: RoleCatalog, rng: StdRng) -> Self {
        Self {
            meta: GameMeta::new(),
            roster: Roster::new(),
            quests: Quests::default(),
            machine,
            handler: PhaseHandler::Preparation,
            catalog,
            rng,
        }
    }
}
