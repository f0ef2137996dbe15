//! Public entry point of a single match.

use tokio::sync::broadcast;
use tokio_stream::Stream;
use uuid::Uuid;

use crate::{
    config::GameConfig,
    dto::{events::StateChangedEvent, game::GameView},
    error::GameError,
    services::game_service,
    state::{
        GameState, SharedState, Snapshot,
        events::ListenerId,
        roles::{RoleCatalog, RoleId},
        scheduler::PendingTransition,
        state_machine::GamePhase,
    },
};

/// One match of the game.
///
/// Operations that may end a phase return a [`PendingTransition`]; it is
/// already complete unless the configuration asks for a wait after that phase.
/// Cloning is cheap and yields another handle to the same match.
#[derive(Clone)]
pub struct Game {
    state: SharedState,
}

impl Game {
    /// Create a match using the standard role catalog.
    pub fn new(config: GameConfig) -> Result<Self, GameError> {
        Self::with_catalog(config, RoleCatalog::standard())
    }

    /// Create a match dealing roles from `catalog`.
    pub fn with_catalog(config: GameConfig, catalog: RoleCatalog) -> Result<Self, GameError> {
        Ok(Self {
            state: GameState::new(&config, catalog)?,
        })
    }

    /// Match identifier.
    pub async fn id(&self) -> Uuid {
        self.state.session().await.meta.id
    }

    /// Current phase of the state machine.
    pub async fn phase(&self) -> GamePhase {
        self.state.session().await.machine.phase()
    }

    /// Phase, version and outstanding transition of the state machine.
    pub async fn snapshot(&self) -> Snapshot {
        self.state.session().await.machine.snapshot()
    }

    /// Seat a player; only possible before the match starts.
    pub async fn add_player(&self, id: &str) -> Result<(), GameError> {
        game_service::add_player(&self.state, id).await
    }

    /// Unseat a player before the match starts.
    pub async fn remove_player(&self, id: &str) -> Result<(), GameError> {
        game_service::remove_player(&self.state, id).await
    }

    /// Start the match, dealing `requested` special roles besides the seer and the assassin.
    pub async fn start(&self, requested: &[RoleId]) -> Result<PendingTransition, GameError> {
        game_service::start(&self.state, requested).await
    }

    /// Leader adds `id` to the proposed team or removes them.
    pub async fn toggle_teammate_proposition(
        &self,
        leader_id: &str,
        id: &str,
    ) -> Result<(), GameError> {
        game_service::toggle_teammate_proposition(&self.state, leader_id, id).await
    }

    /// Leader clears the proposed team.
    pub async fn reset_proposed_teammates(&self, leader_id: &str) -> Result<(), GameError> {
        game_service::reset_proposed_teammates(&self.state, leader_id).await
    }

    /// Leader submits the proposed team.
    pub async fn submit_team(&self, leader_id: &str) -> Result<PendingTransition, GameError> {
        game_service::submit_team(&self.state, leader_id).await
    }

    /// Approve (`true`) or reject the submitted team.
    pub async fn vote_for_team(
        &self,
        id: &str,
        value: bool,
    ) -> Result<PendingTransition, GameError> {
        game_service::vote_for_team(&self.state, id, value).await
    }

    /// Team member succeeds (`true`) or sabotages the quest.
    pub async fn vote_for_quest(
        &self,
        id: &str,
        value: bool,
    ) -> Result<PendingTransition, GameError> {
        game_service::vote_for_quest(&self.state, id, value).await
    }

    /// Assassin designates `victim_id`, or clears the designation.
    pub async fn toggle_victim_proposition(
        &self,
        assassin_id: &str,
        victim_id: &str,
    ) -> Result<(), GameError> {
        game_service::toggle_victim_proposition(&self.state, assassin_id, victim_id).await
    }

    /// Assassin strikes the designated victim and settles the match.
    pub async fn assassinate(&self, assassin_id: &str) -> Result<PendingTransition, GameError> {
        game_service::assassinate(&self.state, assassin_id).await
    }

    /// Match as seen by `viewer_id`; unseated viewers get the spectator view.
    pub async fn serialize(&self, viewer_id: &str) -> GameView {
        game_service::serialize(&self.state, viewer_id).await
    }

    /// Receive every subsequent state-change event.
    pub fn subscribe(&self) -> broadcast::Receiver<StateChangedEvent> {
        self.state.events().subscribe()
    }

    /// Subsequent state-change events as a stream.
    pub fn stream(&self) -> impl Stream<Item = StateChangedEvent> + use<> {
        self.state.events().stream()
    }

    /// Call `callback` on every state change until [`Game::off`] is called.
    ///
    /// Callbacks run while the match is locked and must not call back into it.
    pub fn on<F>(&self, callback: F) -> ListenerId
    where
        F: Fn(&StateChangedEvent) + Send + Sync + 'static,
    {
        self.state.events().on(callback)
    }

    /// Unregister a callback; `false` if it was not registered.
    pub fn off(&self, id: ListenerId) -> bool {
        self.state.events().off(id)
    }
}
