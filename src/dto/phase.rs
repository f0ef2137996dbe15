use serde::{Deserialize, Serialize};

use crate::state::state_machine::GamePhase;

/// Publicly visible game phase exposed to subscribers and serialized views.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VisibleGamePhase {
    /// Players are being seated.
    Preparation,
    /// The leader composes a team.
    TeamProposition,
    /// Every player votes on the proposed team.
    TeamVoting,
    /// The final-round team is approved without a ballot.
    TeamVotingPreApproved,
    /// The team decides the outcome of the quest.
    QuestVoting,
    /// The assassin looks for the seer.
    Assassination,
    /// Evil won.
    GameLost,
    /// Good won.
    GameWon,
}

impl From<GamePhase> for VisibleGamePhase {
    fn from(value: GamePhase) -> Self {
        match value {
            GamePhase::Preparation => VisibleGamePhase::Preparation,
            GamePhase::TeamProposition => VisibleGamePhase::TeamProposition,
            GamePhase::TeamVoting => VisibleGamePhase::TeamVoting,
            GamePhase::TeamVotingPreApproved => VisibleGamePhase::TeamVotingPreApproved,
            GamePhase::QuestVoting => VisibleGamePhase::QuestVoting,
            GamePhase::Assassination => VisibleGamePhase::Assassination,
            GamePhase::GameLost => VisibleGamePhase::GameLost,
            GamePhase::GameWon => VisibleGamePhase::GameWon,
        }
    }
}
