use std::sync::Arc;

use tracing::{error, info, warn};

use crate::{
    dto::events::StateChangedEvent,
    error::GameError,
    state::{
        Plan, SharedState,
        game::{GameSession, GameStatus},
        handler::PhaseHandler,
        scheduler::PendingTransition,
        state_machine::{GameEvent, GamePhase},
    },
};

/// Plan `event`, run `work` against the session and commit the transition.
///
/// The plan is taken before `work` runs so a refused transition leaves the
/// session untouched; a failing `work` aborts the plan.
pub fn run_transition<F, T>(
    state: &SharedState,
    session: &mut GameSession,
    event: GameEvent,
    work: F,
) -> Result<(T, PendingTransition), GameError>
where
    F: FnOnce(&mut GameSession) -> Result<T, GameError>,
{
    let plan = session.machine.plan(event)?;

    match work(session) {
        Ok(value) => {
            let pending = commit(state, session, plan)?;
            Ok((value, pending))
        }
        Err(err) => {
            if let Err(abort_err) = session.machine.abort(plan.id) {
                warn!(
                    event = ?event,
                    plan_id = %plan.id,
                    error = ?abort_err,
                    "failed to abort transition after work error"
                );
            }
            Err(err)
        }
    }
}

/// Plan and commit `event` without additional work.
pub fn transition(
    state: &SharedState,
    session: &mut GameSession,
    event: GameEvent,
) -> Result<PendingTransition, GameError> {
    run_transition(state, session, event, |_| Ok(())).map(|((), pending)| pending)
}

/// Apply `plan` now, or freeze the match and apply it once the configured wait elapsed.
fn commit(
    state: &SharedState,
    session: &mut GameSession,
    plan: Plan,
) -> Result<PendingTransition, GameError> {
    let wait = state.wait_after(plan.from);
    if wait.is_zero() {
        settle(state, session, plan)?;
        return Ok(PendingTransition::ready());
    }

    info!(
        game_id = %session.meta.id,
        from = ?plan.from,
        to = ?plan.to,
        wait = ?wait,
        "phase transition delayed"
    );
    install(state, session, PhaseHandler::Frozen);

    let shared = Arc::clone(state);
    Ok(state.scheduler().schedule(wait, async move {
        let mut session = shared.session().await;
        let (game_id, from, to) = (session.meta.id, plan.from, plan.to);
        if let Err(err) = settle(&shared, &mut session, plan) {
            error!(
                game_id = %game_id,
                from = ?from,
                to = ?to,
                error = %err,
                "delayed phase transition failed"
            );
        }
    }))
}

/// Apply `plan` to the state machine and run the effect of entering its target phase.
fn settle(state: &SharedState, session: &mut GameSession, plan: Plan) -> Result<(), GameError> {
    let to = session.machine.apply(plan.id)?;
    info!(
        game_id = %session.meta.id,
        event = ?plan.event,
        from = ?plan.from,
        to = ?to,
        waited = ?plan.pending_since.elapsed(),
        "phase transition"
    );
    enter(state, session, plan.from, to)
}

fn enter(
    state: &SharedState,
    session: &mut GameSession,
    from: GamePhase,
    to: GamePhase,
) -> Result<(), GameError> {
    match to {
        GamePhase::Preparation => install(state, session, PhaseHandler::Preparation),
        GamePhase::TeamProposition => {
            match from {
                GamePhase::TeamVoting => session.quests.next_team_voting_round()?,
                GamePhase::QuestVoting => session.quests.next_quest()?,
                GamePhase::Preparation
                | GamePhase::TeamProposition
                | GamePhase::TeamVotingPreApproved
                | GamePhase::Assassination
                | GamePhase::GameLost
                | GamePhase::GameWon => {}
            }
            session.roster.reset_votes();
            session.roster.clear_proposition();
            let leader_id = session.roster.next_leader(&mut session.rng)?.id.clone();
            info!(
                game_id = %session.meta.id,
                leader_id = %leader_id,
                quest = session.quests.current_index(),
                round = session.quests.team_voting_round_index(),
                "team proposition opened"
            );
            install(state, session, PhaseHandler::TeamProposition);
        }
        GamePhase::TeamVoting => {
            session.roster.reset_votes();
            install(state, session, PhaseHandler::TeamVoting);
        }
        GamePhase::TeamVotingPreApproved => {
            session.roster.reset_votes();
            let ids: Vec<String> = session.roster.players().map(|p| p.id.clone()).collect();
            for id in ids {
                let vote = session.roster.vote_for_team(&id, true)?;
                session.quests.add_vote(vote)?;
            }
            info!(game_id = %session.meta.id, "final-round team approved automatically");
            let _ready = transition(state, session, GameEvent::TeamAutoApproved)?;
        }
        GamePhase::QuestVoting => {
            session.roster.reset_votes();
            install(state, session, PhaseHandler::QuestVoting);
        }
        GamePhase::Assassination => {
            session.roster.reset_votes();
            install(state, session, PhaseHandler::Assassination);
        }
        GamePhase::GameLost | GamePhase::GameWon => {
            let status = if to == GamePhase::GameWon {
                GameStatus::Won
            } else {
                GameStatus::Lost
            };
            session.meta.finish(status);
            info!(game_id = %session.meta.id, status = ?status, "game finished");
            install(state, session, PhaseHandler::Finished);
        }
    }
    Ok(())
}

/// Install `handler` and announce it.
fn install(state: &SharedState, session: &mut GameSession, handler: PhaseHandler) {
    session.handler = handler;
    notify(state, session);
}

/// Publish the current phase of the match to every subscriber.
pub fn notify(state: &SharedState, session: &GameSession) {
    let event = StateChangedEvent::new(session.meta.id, session.machine.snapshot());
    state.events().broadcast(event);
}
