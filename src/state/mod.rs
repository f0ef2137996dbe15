pub mod assigner;
pub mod events;
pub mod game;
pub mod handler;
pub mod preset;
pub mod quest;
pub mod quests;
pub mod roles;
pub mod roster;
pub mod scheduler;
pub mod state_machine;
pub mod transitions;

use std::{sync::Arc, time::Duration};

use rand::{SeedableRng, rngs::StdRng};
use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;

use crate::{
    config::{GameConfig, PhaseWaits},
    error::GameError,
    state::{
        events::EventHub, game::GameSession, roles::RoleCatalog, scheduler::Scheduler,
        state_machine::GamePhase,
    },
};

pub use self::state_machine::{AbortError, ApplyError, Plan, PlanError, PlanId, Snapshot};
use self::state_machine::GameStateMachine;

/// Handle shared between the facade and delayed effects.
pub type SharedState = Arc<GameState>;

/// Number of state-change events a lagging subscriber may fall behind.
const EVENT_CAPACITY: usize = 64;

/// Everything one match needs at runtime: its session, notification hub and scheduler.
pub struct GameState {
    session: Mutex<GameSession>,
    events: EventHub,
    scheduler: Scheduler,
    waits: PhaseWaits,
}

impl GameState {
    /// Construct a new [`GameState`] wrapped in an [`Arc`] so delayed effects can hold on to it.
    pub fn new(config: &GameConfig, catalog: RoleCatalog) -> Result<SharedState, GameError> {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let machine =
            GameStateMachine::new().map_err(|err| GameError::InvalidState(err.to_string()))?;
        let session = GameSession::new(machine, catalog, rng);
        debug!(
            game_id = %session.meta.id,
            seeded = config.rng_seed.is_some(),
            "game state created"
        );

        Ok(Arc::new(Self {
            session: Mutex::new(session),
            events: EventHub::new(EVENT_CAPACITY),
            scheduler: Scheduler,
            waits: config.waits,
        }))
    }

    /// Exclusive access to the match session.
    pub async fn session(&self) -> MutexGuard<'_, GameSession> {
        self.session.lock().await
    }

    /// Notification hub of this match.
    pub fn events(&self) -> &EventHub {
        &self.events
    }

    /// Scheduler running delayed phase effects.
    pub fn scheduler(&self) -> Scheduler {
        self.scheduler
    }

    /// Wait inserted before the effect of a transition leaving `phase`.
    pub fn wait_after(&self, phase: GamePhase) -> Duration {
        self.waits.after(phase)
    }
}
