use thiserror::Error;

use crate::state::{
    AbortError, ApplyError, PlanError,
    preset::{MAX_PLAYERS, MIN_PLAYERS},
};

/// Errors returned when a caller intent is rejected by the engine.
///
/// Every variant is raised synchronously at the point of the illegal call and
/// leaves the match untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// The match left the preparation phase already.
    #[error("game has already started")]
    AlreadyStartedGame,
    /// The roster size is outside the supported range.
    #[error("players amount must be between {MIN_PLAYERS} and {MAX_PLAYERS}, got {actual}")]
    PlayersAmountIncorrect {
        /// Number of seated players at the time of the call.
        actual: usize,
    },
    /// The roster is full.
    #[error("players maximum of {MAX_PLAYERS} reached")]
    PlayersMaximumReached,
    /// A player with the same identifier is already seated.
    #[error("player `{0}` already exists")]
    AlreadyExistsPlayer(String),
    /// No seated player carries this identifier.
    #[error("player `{0}` is missing")]
    PlayerMissing(String),

    /// The voter already cast a ballot in the open round.
    #[error("player `{0}` has already voted")]
    AlreadyVoted(String),
    /// The proposed team does not have the size required by the current quest.
    #[error("team must contain exactly {expected} teammates, got {actual}")]
    RequiredCorrectTeammatesAmount {
        /// Team size required by the current quest.
        expected: usize,
        /// Number of proposed players.
        actual: usize,
    },

    /// Teammates can only be proposed during team proposition.
    #[error("it is not the time for teammate proposition")]
    NoTimeForTeammateProposition,
    /// Teams can only be submitted during team proposition.
    #[error("it is not the time for team submission")]
    NoTimeForTeamSubmission,
    /// Team ballots can only be cast during team voting.
    #[error("it is not the time for team voting")]
    NoTimeForTeamVoting,
    /// Quest ballots can only be cast during quest voting.
    #[error("it is not the time for quest voting")]
    NoTimeForQuestVoting,
    /// Victims can only be proposed during the assassination.
    #[error("it is not the time for victim proposition")]
    NoTimeForVictimProposition,
    /// The assassination can only happen once the good side completed three quests.
    #[error("it is not the time for assassination")]
    NoTimeForAssassination,

    /// Only the leader may propose teammates.
    #[error("player `{0}` is not allowed to propose teammates")]
    DeniedTeammateProposition(String),
    /// Only the leader may submit the team.
    #[error("player `{0}` is not allowed to submit the team")]
    DeniedTeamSubmission(String),
    /// The caller is not a seated player.
    #[error("player `{0}` is not allowed to vote for the team")]
    DeniedTeamVoting(String),
    /// The caller is not part of the approved team.
    #[error("player `{0}` is not allowed to vote for the quest")]
    DeniedQuestVoting(String),
    /// Only the assassin may choose a victim.
    #[error("player `{0}` is not allowed to propose a victim")]
    DeniedVictimProposition(String),
    /// The assassin targeted themselves.
    #[error("the assassin cannot sacrifice themselves")]
    DeniedSelfSacrifice,
    /// Only the assassin may strike.
    #[error("player `{0}` is not allowed to assassinate")]
    DeniedAssassination(String),
    /// Assassination requested before a victim was chosen.
    #[error("a victim must be chosen before the assassination")]
    RequiredVictim,

    /// The role identifier is not part of the catalog.
    #[error("unknown role `{0}`")]
    UnknownRole(String),
    /// Generic roles are filled in automatically and cannot be requested.
    #[error("role `{0}` cannot be requested explicitly")]
    RoleNotSelectable(String),
    /// Requested special roles do not fit in the level preset.
    #[error(
        "requested roles need {good} good and {evil} evil slots, preset offers {good_slots} and {evil_slots}"
    )]
    RolesAmountIncorrect {
        /// Good slots taken by requested roles.
        good: usize,
        /// Evil slots taken by requested roles.
        evil: usize,
        /// Good slots offered by the preset.
        good_slots: usize,
        /// Evil slots offered by the preset.
        evil_slots: usize,
    },
    /// A delayed phase transition is still outstanding.
    #[error("a phase transition is already pending")]
    TransitionPending,
    /// The engine reached a state it should never be in.
    #[error("invalid state: {0}")]
    InvalidState(String),
}

impl GameError {
    /// Stable machine-readable code for the error, suitable for transport layers.
    pub fn code(&self) -> &'static str {
        match self {
            GameError::AlreadyStartedGame => "ALREADY_STARTED_GAME",
            GameError::PlayersAmountIncorrect { .. } => "PLAYERS_AMOUNT_INCORRECT",
            GameError::PlayersMaximumReached => "PLAYERS_MAXIMUM_REACHED",
            GameError::AlreadyExistsPlayer(_) => "ALREADY_EXISTS_PLAYER",
            GameError::PlayerMissing(_) => "PLAYER_MISSING",
            GameError::AlreadyVoted(_) => "ALREADY_VOTED",
            GameError::RequiredCorrectTeammatesAmount { .. } => {
                "REQUIRED_CORRECT_TEAMMATES_AMOUNT"
            }
            GameError::NoTimeForTeammateProposition => "NO_TIME_FOR_TEAMMATE_PROPOSITION",
            GameError::NoTimeForTeamSubmission => "NO_TIME_FOR_TEAM_SUBMISSION",
            GameError::NoTimeForTeamVoting => "NO_TIME_FOR_TEAM_VOTING",
            GameError::NoTimeForQuestVoting => "NO_TIME_FOR_QUEST_VOTING",
            GameError::NoTimeForVictimProposition => "NO_TIME_FOR_VICTIM_PROPOSITION",
            GameError::NoTimeForAssassination => "NO_TIME_FOR_ASSASSINATION",
            GameError::DeniedTeammateProposition(_) => "DENIED_TEAMMATE_PROPOSITION",
            GameError::DeniedTeamSubmission(_) => "DENIED_TEAM_SUBMISSION",
            GameError::DeniedTeamVoting(_) => "DENIED_TEAM_VOTING",
            GameError::DeniedQuestVoting(_) => "DENIED_QUEST_VOTING",
            GameError::DeniedVictimProposition(_) => "DENIED_VICTIM_PROPOSITION",
            GameError::DeniedSelfSacrifice => "DENIED_SELF_SACRIFICE",
            GameError::DeniedAssassination(_) => "DENIED_ASSASSINATION",
            GameError::RequiredVictim => "REQUIRED_VICTIM",
            GameError::UnknownRole(_) => "UNKNOWN_ROLE",
            GameError::RoleNotSelectable(_) => "ROLE_NOT_SELECTABLE",
            GameError::RolesAmountIncorrect { .. } => "ROLES_AMOUNT_INCORRECT",
            GameError::TransitionPending => "TRANSITION_PENDING",
            GameError::InvalidState(_) => "INVALID_STATE",
        }
    }
}

impl From<PlanError> for GameError {
    fn from(err: PlanError) -> Self {
        match err {
            PlanError::AlreadyPending => GameError::TransitionPending,
            PlanError::InvalidTransition(invalid) => GameError::InvalidState(invalid.to_string()),
        }
    }
}

impl From<ApplyError> for GameError {
    fn from(err: ApplyError) -> Self {
        match err {
            ApplyError::NoPending => GameError::InvalidState("no transition is pending".into()),
            ApplyError::IdMismatch { .. } => {
                GameError::InvalidState("pending transition does not match".into())
            }
            ApplyError::PhaseMismatch { expected, actual } => GameError::InvalidState(format!(
                "state changed during transition (expected {expected:?}, got {actual:?})"
            )),
            ApplyError::VersionMismatch { expected, actual } => GameError::InvalidState(format!(
                "state version mismatch during transition (expected {expected}, got {actual})"
            )),
        }
    }
}

impl From<AbortError> for GameError {
    fn from(err: AbortError) -> Self {
        match err {
            AbortError::NoPending => GameError::InvalidState("no pending transition".into()),
            AbortError::IdMismatch { .. } => {
                GameError::InvalidState("transition plan does not match".into())
            }
        }
    }
}
