use crate::state::state_machine::GamePhase;

/// Operation set currently accepted by the match.
///
/// Every operation matches on this enum without a catch-all arm, so a new
/// variant has to decide explicitly what each operation does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseHandler {
    /// Seating players and starting the match.
    Preparation,
    /// Leader composes and submits a team.
    TeamProposition,
    /// Seated players vote on the submitted team.
    TeamVoting,
    /// Team members cast quest ballots.
    QuestVoting,
    /// Assassin picks and strikes a victim.
    Assassination,
    /// A delayed transition is outstanding; nothing can change.
    Frozen,
    /// The match is over.
    Finished,
}

/// Whether outcomes of the current quest may be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultsVisibility {
    /// Ballot values and status of the current quest are hidden.
    Concealed,
    /// Everything recorded so far is public.
    Revealed,
}

impl PhaseHandler {
    /// Handler installed once `phase` becomes active.
    pub fn for_phase(phase: GamePhase) -> Self {
        match phase {
            GamePhase::Preparation => PhaseHandler::Preparation,
            GamePhase::TeamProposition => PhaseHandler::TeamProposition,
            GamePhase::TeamVoting => PhaseHandler::TeamVoting,
            GamePhase::TeamVotingPreApproved => PhaseHandler::Frozen,
            GamePhase::QuestVoting => PhaseHandler::QuestVoting,
            GamePhase::Assassination => PhaseHandler::Assassination,
            GamePhase::GameLost | GamePhase::GameWon => PhaseHandler::Finished,
        }
    }

    /// Results visibility for serialized views.
    pub fn results(&self) -> ResultsVisibility {
        match self {
            PhaseHandler::TeamProposition
            | PhaseHandler::Assassination
            | PhaseHandler::Finished => ResultsVisibility::Revealed,
            PhaseHandler::Preparation
            | PhaseHandler::TeamVoting
            | PhaseHandler::QuestVoting
            | PhaseHandler::Frozen => ResultsVisibility::Concealed,
        }
    }

    /// Whether every role is shown to every viewer.
    pub fn reveals_roles(&self) -> bool {
        match self {
            PhaseHandler::Finished => true,
            PhaseHandler::Preparation
            | PhaseHandler::TeamProposition
            | PhaseHandler::TeamVoting
            | PhaseHandler::QuestVoting
            | PhaseHandler::Assassination
            | PhaseHandler::Frozen => false,
        }
    }
}
