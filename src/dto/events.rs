use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{dto::phase::VisibleGamePhase, state::Snapshot};

/// Broadcast whenever a phase handler is installed or the match state changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateChangedEvent {
    /// Match the event belongs to.
    pub game_id: Uuid,
    /// Phase the state machine is in.
    pub phase: VisibleGamePhase,
    /// Phase a delayed transition is heading to, if one is outstanding.
    pub pending_phase: Option<VisibleGamePhase>,
    /// State machine version; increments on every applied transition.
    pub version: usize,
}

impl StateChangedEvent {
    /// Describe the state machine `snapshot` of match `game_id`.
    pub fn new(game_id: Uuid, snapshot: Snapshot) -> Self {
        Self {
            game_id,
            phase: snapshot.phase.into(),
            pending_phase: snapshot.pending.map(Into::into),
            version: snapshot.version,
        }
    }
}
