use std::collections::HashMap;

use thiserror::Error;
use tokio::time::Instant;
use uuid::Uuid;

/// Phases a match goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GamePhase {
    /// Players are being seated.
    Preparation,
    /// The leader composes a team.
    TeamProposition,
    /// Every player votes on the proposed team.
    TeamVoting,
    /// The proposed team is approved without a ballot (final round).
    TeamVotingPreApproved,
    /// The team decides the outcome of the quest.
    QuestVoting,
    /// Good completed three quests; the assassin looks for the seer.
    Assassination,
    /// Evil won.
    GameLost,
    /// Good won.
    GameWon,
}

impl GamePhase {
    /// No transition leaves a terminal phase.
    pub fn is_terminal(&self) -> bool {
        matches!(self, GamePhase::GameLost | GamePhase::GameWon)
    }
}

/// Events that can be applied to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameEvent {
    /// Roster is complete and roles have been dealt.
    Start,
    /// The leader submitted a team that has to be voted on.
    TeamSubmitted,
    /// The leader submitted a team on the final round.
    TeamSubmittedOnLastRound,
    /// The team vote closed with a majority.
    TeamApproved,
    /// The team vote closed without a majority.
    TeamRejected,
    /// The final-round team received its automatic approval.
    TeamAutoApproved,
    /// A quest resolved without settling the match.
    QuestResolved,
    /// Good completed three quests.
    QuestsWon,
    /// Evil sabotaged three quests.
    QuestsLost,
    /// The assassin named the seer.
    SeerAssassinated,
    /// The assassin missed.
    AssassinationMissed,
}

/// Directed edges every transition table has to cover exactly.
pub const LEGAL_EDGES: &[(GamePhase, GamePhase)] = &[
    (GamePhase::Preparation, GamePhase::TeamProposition),
    (GamePhase::TeamProposition, GamePhase::TeamVoting),
    (GamePhase::TeamProposition, GamePhase::TeamVotingPreApproved),
    (GamePhase::TeamVoting, GamePhase::TeamProposition),
    (GamePhase::TeamVoting, GamePhase::QuestVoting),
    (GamePhase::TeamVotingPreApproved, GamePhase::QuestVoting),
    (GamePhase::QuestVoting, GamePhase::TeamProposition),
    (GamePhase::QuestVoting, GamePhase::Assassination),
    (GamePhase::QuestVoting, GamePhase::GameLost),
    (GamePhase::Assassination, GamePhase::GameLost),
    (GamePhase::Assassination, GamePhase::GameWon),
];

/// Transition table of the match.
pub const TRANSITIONS: &[(GamePhase, GameEvent, GamePhase)] = &[
    (GamePhase::Preparation, GameEvent::Start, GamePhase::TeamProposition),
    (GamePhase::TeamProposition, GameEvent::TeamSubmitted, GamePhase::TeamVoting),
    (
        GamePhase::TeamProposition,
        GameEvent::TeamSubmittedOnLastRound,
        GamePhase::TeamVotingPreApproved,
    ),
    (GamePhase::TeamVoting, GameEvent::TeamRejected, GamePhase::TeamProposition),
    (GamePhase::TeamVoting, GameEvent::TeamApproved, GamePhase::QuestVoting),
    (
        GamePhase::TeamVotingPreApproved,
        GameEvent::TeamAutoApproved,
        GamePhase::QuestVoting,
    ),
    (GamePhase::QuestVoting, GameEvent::QuestResolved, GamePhase::TeamProposition),
    (GamePhase::QuestVoting, GameEvent::QuestsWon, GamePhase::Assassination),
    (GamePhase::QuestVoting, GameEvent::QuestsLost, GamePhase::GameLost),
    (GamePhase::Assassination, GameEvent::SeerAssassinated, GamePhase::GameLost),
    (GamePhase::Assassination, GameEvent::AssassinationMissed, GamePhase::GameWon),
];

/// Error returned when a transition table does not match [`LEGAL_EDGES`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    /// Two entries share the same source phase and event.
    #[error("duplicate entry for {event:?} in {from:?}")]
    Duplicate {
        /// Source phase.
        from: GamePhase,
        /// Event handled twice.
        event: GameEvent,
    },
    /// An entry describes an edge that is not allowed.
    #[error("illegal edge {from:?} -> {to:?}")]
    IllegalEdge {
        /// Source phase.
        from: GamePhase,
        /// Target phase.
        to: GamePhase,
    },
    /// A legal edge is not reachable through any event.
    #[error("edge {from:?} -> {to:?} is not covered")]
    UncoveredEdge {
        /// Source phase.
        from: GamePhase,
        /// Target phase.
        to: GamePhase,
    },
}

/// Lookup from `(phase, event)` to the next phase.
#[derive(Debug, Clone)]
pub struct TransitionTable {
    entries: HashMap<(GamePhase, GameEvent), GamePhase>,
}

impl TransitionTable {
    /// Build and validate a table against [`LEGAL_EDGES`].
    pub fn new(entries: &[(GamePhase, GameEvent, GamePhase)]) -> Result<Self, TableError> {
        let mut table = HashMap::with_capacity(entries.len());
        for &(from, event, to) in entries {
            if !LEGAL_EDGES.contains(&(from, to)) {
                return Err(TableError::IllegalEdge { from, to });
            }
            if table.insert((from, event), to).is_some() {
                return Err(TableError::Duplicate { from, event });
            }
        }

        for &(from, to) in LEGAL_EDGES {
            if !table.iter().any(|(&(f, _), &t)| f == from && t == to) {
                return Err(TableError::UncoveredEdge { from, to });
            }
        }

        Ok(Self { entries: table })
    }

    fn next(&self, from: GamePhase, event: GameEvent) -> Option<GamePhase> {
        self.entries.get(&(from, event)).copied()
    }
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the state machine was in when the invalid event was received.
    pub from: GamePhase,
    /// The event that cannot be applied from this phase.
    pub event: GameEvent,
}

/// Errors that can occur when planning a state machine transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    /// A transition is already pending and must be applied or aborted.
    AlreadyPending,
    /// The requested transition is not valid from the current phase.
    InvalidTransition(InvalidTransition),
}

/// Errors that can occur when applying a planned state machine transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyError {
    /// No transition is currently pending.
    NoPending,
    /// Plan ID does not match the pending plan.
    IdMismatch {
        /// Expected plan ID.
        expected: PlanId,
        /// Provided plan ID.
        got: PlanId,
    },
    /// State machine phase changed since the plan was created.
    PhaseMismatch {
        /// Phase when plan was created.
        expected: GamePhase,
        /// Current phase.
        actual: GamePhase,
    },
    /// State machine version changed since the plan was created.
    VersionMismatch {
        /// Version when plan was created.
        expected: usize,
        /// Current version.
        actual: usize,
    },
}

/// Errors that can occur when aborting a planned state machine transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortError {
    /// No transition is currently pending.
    NoPending,
    /// Plan ID does not match the pending plan.
    IdMismatch {
        /// Expected plan ID.
        expected: PlanId,
        /// Provided plan ID.
        got: PlanId,
    },
}

/// Unique identifier for a planned state transition.
pub type PlanId = Uuid;

/// A planned state machine transition that has been validated but not yet applied.
#[derive(Debug, Clone)]
pub struct Plan {
    /// Unique identifier for this plan.
    pub id: PlanId,
    /// Phase the state machine is currently in.
    pub from: GamePhase,
    /// Phase the state machine will transition to.
    pub to: GamePhase,
    /// Event that triggered this transition.
    pub event: GameEvent,
    /// Version number after applying this transition.
    pub version_next: usize,
    /// When this plan was created; follows the Tokio clock, so paused time is honoured.
    pub pending_since: Instant,
}

/// Snapshot of the current state machine state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Current phase of the state machine.
    pub phase: GamePhase,
    /// Version number of the state machine (increments on each transition).
    pub version: usize,
    /// Pending transition phase, if a transition is planned but not yet applied.
    pub pending: Option<GamePhase>,
}

/// State machine implementing the match flow.
///
/// A transition is planned first and applied later; in between the machine
/// refuses any other plan, which is how a delayed phase change stays the only
/// one outstanding.
#[derive(Debug, Clone)]
pub struct GameStateMachine {
    table: TransitionTable,
    phase: GamePhase,
    version: usize,
    pending: Option<Plan>,
}

impl GameStateMachine {
    /// Create a state machine in the preparation phase using [`TRANSITIONS`].
    pub fn new() -> Result<Self, TableError> {
        Self::with_table(TRANSITIONS)
    }

    /// Create a state machine from a custom table, validated against [`LEGAL_EDGES`].
    pub fn with_table(entries: &[(GamePhase, GameEvent, GamePhase)]) -> Result<Self, TableError> {
        Ok(Self {
            table: TransitionTable::new(entries)?,
            phase: GamePhase::Preparation,
            version: 0,
            pending: None,
        })
    }

    /// Inspect the current phase.
    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Create a snapshot of the current state machine state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase,
            version: self.version,
            pending: self.pending.as_ref().map(|plan| plan.to),
        }
    }

    /// Plan a transition by validating that the event can be applied from the current phase.
    /// Returns a Plan that can later be applied or aborted.
    pub fn plan(&mut self, event: GameEvent) -> Result<Plan, PlanError> {
        if self.pending.is_some() {
            return Err(PlanError::AlreadyPending);
        }

        let next = self
            .table
            .next(self.phase, event)
            .ok_or(PlanError::InvalidTransition(InvalidTransition {
                from: self.phase,
                event,
            }))?;

        let plan = Plan {
            id: Uuid::new_v4(),
            from: self.phase,
            to: next,
            event,
            version_next: self.version + 1,
            pending_since: Instant::now(),
        };

        self.pending = Some(plan.clone());

        Ok(plan)
    }

    /// Apply a planned transition, moving the state machine to the next phase.
    /// Returns the new phase after the transition.
    ///
    /// The pending plan is only consumed on success; every rejection leaves it
    /// in place so its owner can still apply or abort it.
    pub fn apply(&mut self, plan_id: PlanId) -> Result<GamePhase, ApplyError> {
        let plan = self.pending.as_ref().ok_or(ApplyError::NoPending)?;

        if plan.id != plan_id {
            return Err(ApplyError::IdMismatch {
                expected: plan.id,
                got: plan_id,
            });
        }

        if self.phase != plan.from {
            return Err(ApplyError::PhaseMismatch {
                expected: plan.from,
                actual: self.phase,
            });
        }

        if self.version + 1 != plan.version_next {
            return Err(ApplyError::VersionMismatch {
                expected: plan.version_next,
                actual: self.version + 1,
            });
        }

        self.phase = plan.to;
        self.version = plan.version_next;
        self.pending = None;

        Ok(self.phase)
    }

    /// Abort a planned transition without applying it, returning the state machine to its previous state.
    pub fn abort(&mut self, plan_id: PlanId) -> Result<(), AbortError> {
        let plan = self.pending.as_ref().ok_or(AbortError::NoPending)?;

        if plan.id != plan_id {
            return Err(AbortError::IdMismatch {
                expected: plan.id,
                got: plan_id,
            });
        }

        self.pending = None;
        Ok(())
    }
}
