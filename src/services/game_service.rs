//! Operations accepted by a match. Each one locks the session, dispatches on
//! the installed [`PhaseHandler`] and either notifies subscribers or asks the
//! state machine for the transition its phase-ending condition calls for.

use tracing::{debug, info};

use crate::{
    dto::game::GameView,
    error::GameError,
    state::{
        SharedState,
        assigner::RoleAssigner,
        game::GameSession,
        handler::PhaseHandler,
        preset::LevelPreset,
        quests::{QUESTS_TO_WIN, Quests},
        roles::RoleId,
        scheduler::PendingTransition,
        state_machine::GameEvent,
        transitions::{notify, run_transition, transition},
    },
};

// ---------------------------------------------------------------------------
// Preparation
// ---------------------------------------------------------------------------

/// Seat a new player; the first one becomes the creator of the match.
pub async fn add_player(state: &SharedState, id: &str) -> Result<(), GameError> {
    let mut guard = state.session().await;
    let session = &mut *guard;

    match session.handler {
        PhaseHandler::Preparation => {
            session.roster.add(id)?;
            session.meta.set_creator(id);
            debug!(game_id = %session.meta.id, player_id = %id, "player joined");
            notify(state, session);
            Ok(())
        }
        PhaseHandler::TeamProposition
        | PhaseHandler::TeamVoting
        | PhaseHandler::QuestVoting
        | PhaseHandler::Assassination
        | PhaseHandler::Frozen
        | PhaseHandler::Finished => Err(GameError::AlreadyStartedGame),
    }
}

/// Remove a seated player before the match starts.
pub async fn remove_player(state: &SharedState, id: &str) -> Result<(), GameError> {
    let mut guard = state.session().await;
    let session = &mut *guard;

    match session.handler {
        PhaseHandler::Preparation => {
            session.roster.remove(id)?;
            debug!(game_id = %session.meta.id, player_id = %id, "player left");
            notify(state, session);
            Ok(())
        }
        PhaseHandler::TeamProposition
        | PhaseHandler::TeamVoting
        | PhaseHandler::QuestVoting
        | PhaseHandler::Assassination
        | PhaseHandler::Frozen
        | PhaseHandler::Finished => Err(GameError::AlreadyStartedGame),
    }
}

/// Deal roles, open the quests and move on to the first team proposition.
///
/// `requested` names the special roles to include on top of the seer and the
/// assassin, which are always dealt.
pub async fn start(
    state: &SharedState,
    requested: &[RoleId],
) -> Result<PendingTransition, GameError> {
    let mut guard = state.session().await;
    let session = &mut *guard;

    match session.handler {
        PhaseHandler::Preparation => {
            let preset = LevelPreset::for_players(session.roster.len())?;
            let roles = RoleAssigner::new(&session.catalog, &preset)
                .deal(requested, &mut session.rng)?;

            let ((), pending) = run_transition(state, session, GameEvent::Start, move |session| {
                session.roster.assign_roles(roles)?;
                session.quests = Quests::new(&preset);
                session.meta.start(preset);
                Ok(())
            })?;

            info!(
                game_id = %session.meta.id,
                players = session.roster.len(),
                good = preset.good_count,
                evil = preset.evil_count,
                "game started"
            );
            Ok(pending)
        }
        PhaseHandler::TeamProposition
        | PhaseHandler::TeamVoting
        | PhaseHandler::QuestVoting
        | PhaseHandler::Assassination
        | PhaseHandler::Frozen
        | PhaseHandler::Finished => Err(GameError::AlreadyStartedGame),
    }
}

// ---------------------------------------------------------------------------
// Team proposition
// ---------------------------------------------------------------------------

/// Add `id` to the proposed team or take them off it.
pub async fn toggle_teammate_proposition(
    state: &SharedState,
    leader_id: &str,
    id: &str,
) -> Result<(), GameError> {
    let mut guard = state.session().await;
    let session = &mut *guard;

    match session.handler {
        PhaseHandler::TeamProposition => {
            session.roster.toggle_teammate_proposition(leader_id, id)?;
            notify(state, session);
            Ok(())
        }
        PhaseHandler::Preparation
        | PhaseHandler::TeamVoting
        | PhaseHandler::QuestVoting
        | PhaseHandler::Assassination
        | PhaseHandler::Frozen
        | PhaseHandler::Finished => Err(GameError::NoTimeForTeammateProposition),
    }
}

/// Clear the proposed team.
pub async fn reset_proposed_teammates(state: &SharedState, leader_id: &str) -> Result<(), GameError> {
    let mut guard = state.session().await;
    let session = &mut *guard;

    match session.handler {
        PhaseHandler::TeamProposition => {
            session.roster.reset_proposed_teammates(leader_id)?;
            notify(state, session);
            Ok(())
        }
        PhaseHandler::Preparation
        | PhaseHandler::TeamVoting
        | PhaseHandler::QuestVoting
        | PhaseHandler::Assassination
        | PhaseHandler::Frozen
        | PhaseHandler::Finished => Err(GameError::NoTimeForTeammateProposition),
    }
}

/// Submit the proposed team for the vote, or straight to the quest on the final round.
///
/// Only the current leader may submit; anyone else is denied whatever the phase.
pub async fn submit_team(
    state: &SharedState,
    leader_id: &str,
) -> Result<PendingTransition, GameError> {
    let mut guard = state.session().await;
    let session = &mut *guard;

    if !session
        .roster
        .leader()
        .is_some_and(|leader| leader.id == leader_id)
    {
        return Err(GameError::DeniedTeamSubmission(leader_id.to_string()));
    }

    match session.handler {
        PhaseHandler::TeamProposition => {
            let votes_needed = session.quests.votes_needed()?;
            let event = if session.quests.is_last_round() {
                GameEvent::TeamSubmittedOnLastRound
            } else {
                GameEvent::TeamSubmitted
            };

            let leader_id = leader_id.to_string();
            let ((), pending) = run_transition(state, session, event, move |session| {
                session.roster.submit_team(&leader_id, votes_needed)
            })?;
            Ok(pending)
        }
        PhaseHandler::Preparation
        | PhaseHandler::TeamVoting
        | PhaseHandler::QuestVoting
        | PhaseHandler::Assassination
        | PhaseHandler::Frozen
        | PhaseHandler::Finished => Err(GameError::NoTimeForTeamSubmission),
    }
}

// ---------------------------------------------------------------------------
// Ballots
// ---------------------------------------------------------------------------

/// Cast a team ballot; closes the round once every seated player voted.
pub async fn vote_for_team(
    state: &SharedState,
    id: &str,
    value: bool,
) -> Result<PendingTransition, GameError> {
    let mut guard = state.session().await;
    let session = &mut *guard;

    match session.handler {
        PhaseHandler::TeamVoting => {
            if !session.quests.is_team_voting_open() {
                return Err(GameError::NoTimeForTeamVoting);
            }
            let vote = session.roster.vote_for_team(id, value)?;
            session.quests.add_vote(vote)?;

            if session.quests.is_team_voting_succeeded() {
                transition(state, session, GameEvent::TeamApproved)
            } else if session.quests.is_team_voting_failed() {
                transition(state, session, GameEvent::TeamRejected)
            } else {
                notify(state, session);
                Ok(PendingTransition::ready())
            }
        }
        PhaseHandler::Preparation
        | PhaseHandler::TeamProposition
        | PhaseHandler::QuestVoting
        | PhaseHandler::Assassination
        | PhaseHandler::Frozen
        | PhaseHandler::Finished => Err(GameError::NoTimeForTeamVoting),
    }
}

/// Cast a quest ballot; resolves the quest once every team member voted.
pub async fn vote_for_quest(
    state: &SharedState,
    id: &str,
    value: bool,
) -> Result<PendingTransition, GameError> {
    let mut guard = state.session().await;
    let session = &mut *guard;

    match session.handler {
        PhaseHandler::QuestVoting => {
            if !session.quests.is_quest_voting_open() {
                return Err(GameError::NoTimeForQuestVoting);
            }
            let vote = session.roster.vote_for_quest(id, value)?;
            session.quests.add_vote(vote)?;

            if session.quests.is_quest_voting_closed() {
                let event = quest_outcome(session);
                transition(state, session, event)
            } else {
                notify(state, session);
                Ok(PendingTransition::ready())
            }
        }
        PhaseHandler::Preparation
        | PhaseHandler::TeamProposition
        | PhaseHandler::TeamVoting
        | PhaseHandler::Assassination
        | PhaseHandler::Frozen
        | PhaseHandler::Finished => Err(GameError::NoTimeForQuestVoting),
    }
}

fn quest_outcome(session: &GameSession) -> GameEvent {
    if session.quests.failed_count() >= QUESTS_TO_WIN {
        GameEvent::QuestsLost
    } else if session.quests.succeeded_count() >= QUESTS_TO_WIN {
        GameEvent::QuestsWon
    } else {
        GameEvent::QuestResolved
    }
}

// ---------------------------------------------------------------------------
// Assassination
// ---------------------------------------------------------------------------

/// Designate the assassination victim, or clear the designation.
pub async fn toggle_victim_proposition(
    state: &SharedState,
    assassin_id: &str,
    victim_id: &str,
) -> Result<(), GameError> {
    let mut guard = state.session().await;
    let session = &mut *guard;

    match session.handler {
        PhaseHandler::Assassination => {
            session
                .roster
                .toggle_victim_proposition(assassin_id, victim_id)?;
            notify(state, session);
            Ok(())
        }
        PhaseHandler::Preparation
        | PhaseHandler::TeamProposition
        | PhaseHandler::TeamVoting
        | PhaseHandler::QuestVoting
        | PhaseHandler::Frozen
        | PhaseHandler::Finished => Err(GameError::NoTimeForVictimProposition),
    }
}

/// Strike the designated victim and settle the match.
pub async fn assassinate(
    state: &SharedState,
    assassin_id: &str,
) -> Result<PendingTransition, GameError> {
    let mut guard = state.session().await;
    let session = &mut *guard;

    match session.handler {
        PhaseHandler::Assassination => {
            let seer_hit = session.roster.assassinate(assassin_id)?;
            info!(
                game_id = %session.meta.id,
                assassin_id = %assassin_id,
                victim_id = session.roster.victim_id().unwrap_or_default(),
                seer_hit,
                "assassination"
            );
            let event = if seer_hit {
                GameEvent::SeerAssassinated
            } else {
                GameEvent::AssassinationMissed
            };
            transition(state, session, event)
        }
        PhaseHandler::Preparation
        | PhaseHandler::TeamProposition
        | PhaseHandler::TeamVoting
        | PhaseHandler::QuestVoting
        | PhaseHandler::Frozen
        | PhaseHandler::Finished => Err(GameError::NoTimeForAssassination),
    }
}

// ---------------------------------------------------------------------------
// Read-only projections
// ---------------------------------------------------------------------------

/// Match as seen by `viewer_id`.
pub async fn serialize(state: &SharedState, viewer_id: &str) -> GameView {
    let session = state.session().await;
    GameView::new(&session, viewer_id)
}
