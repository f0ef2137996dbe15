//! Bots playing a whole match through the public [`Game`] surface.

use std::collections::HashMap;

use rand::{Rng, seq::IndexedRandom};
use tracing::debug;

use crate::{
    dto::game::GameView,
    error::GameError,
    game::Game,
    state::{
        roles::{Allegiance, RoleId},
        roster::ASSASSIN_ROLE,
        state_machine::GamePhase,
    },
};

/// Upper bound on bot decisions before a simulated match is considered stuck.
const MAX_STEPS: usize = 1_000;

/// How bots cast their ballots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotStrategy {
    /// Every ballot is a coin flip, sabotage included.
    Random,
    /// Good approves and succeeds; evil rejects teams and sabotages quests.
    Allegiance,
}

/// Final state of a simulated match.
#[derive(Debug, Clone)]
pub struct SimulationReport {
    /// Terminal phase reached.
    pub outcome: GamePhase,
    /// Final view, with every role revealed.
    pub view: GameView,
}

/// Seat `players` bots named `player-1`, `player-2`, ... and play the match to its end.
///
/// Every pending transition is awaited before the next decision, so configured
/// waits slow the simulation down but do not change its course.
pub async fn simulate<R: Rng + ?Sized>(
    game: &Game,
    players: usize,
    strategy: BotStrategy,
    rng: &mut R,
) -> Result<SimulationReport, GameError> {
    let ids: Vec<String> = (1..=players).map(|n| format!("player-{n}")).collect();
    for id in &ids {
        game.add_player(id).await?;
    }
    game.start(&[]).await?.finished().await?;

    let mut allegiances = HashMap::with_capacity(ids.len());
    let mut assassin_id = None;
    for id in &ids {
        let view = game.serialize(id).await;
        let own = view
            .players
            .collection
            .iter()
            .find(|player| &player.id == id)
            .ok_or_else(|| GameError::PlayerMissing(id.clone()))?;
        if own.role.id == ASSASSIN_ROLE {
            assassin_id = Some(id.clone());
        }
        allegiances.insert(id.clone(), own.role.allegiance);
    }
    let assassin_id = assassin_id
        .ok_or_else(|| GameError::InvalidState("no assassin was dealt".into()))?;
    let is_evil = |id: &str| allegiances.get(id) == Some(&Allegiance::Evil);

    for step in 0..MAX_STEPS {
        let phase = game.phase().await;
        debug!(step, phase = ?phase, "bot turn");

        match phase {
            GamePhase::TeamProposition => {
                let view = game.serialize("").await;
                let leader_id = view
                    .players
                    .leader_id
                    .clone()
                    .ok_or_else(|| GameError::InvalidState("no leader designated".into()))?;
                let needed = view
                    .quests
                    .collection
                    .get(view.quests.current_quest_index)
                    .map(|quest| quest.votes_needed_count)
                    .ok_or_else(|| GameError::InvalidState("no current quest".into()))?;

                for id in team_for(&ids, &leader_id, needed) {
                    game.toggle_teammate_proposition(&leader_id, id).await?;
                }
                game.submit_team(&leader_id).await?.finished().await?;
            }
            GamePhase::TeamVoting => {
                for id in &ids {
                    let value = match strategy {
                        BotStrategy::Random => rng.random_bool(0.5),
                        BotStrategy::Allegiance => !is_evil(id.as_str()),
                    };
                    game.vote_for_team(id, value).await?.finished().await?;
                }
            }
            GamePhase::QuestVoting => {
                let view = game.serialize("").await;
                for id in &view.players.proposed_ids {
                    let value = match (strategy, is_evil(id.as_str())) {
                        (_, false) => true,
                        (BotStrategy::Random, true) => rng.random_bool(0.5),
                        (BotStrategy::Allegiance, true) => false,
                    };
                    game.vote_for_quest(id, value).await?.finished().await?;
                }
            }
            GamePhase::Assassination => {
                let view = game.serialize(&assassin_id).await;
                let suspects: Vec<&str> = view
                    .players
                    .collection
                    .iter()
                    .filter(|player| player.id != assassin_id && player.role.id == RoleId::Unknown)
                    .map(|player| player.id.as_str())
                    .collect();
                let victim = suspects
                    .choose(rng)
                    .copied()
                    .ok_or_else(|| GameError::InvalidState("nobody left to assassinate".into()))?;

                game.toggle_victim_proposition(&assassin_id, victim).await?;
                game.assassinate(&assassin_id).await?.finished().await?;
            }
            GamePhase::GameLost | GamePhase::GameWon => {
                return Ok(SimulationReport {
                    outcome: phase,
                    view: game.serialize("").await,
                });
            }
            GamePhase::Preparation | GamePhase::TeamVotingPreApproved => {
                return Err(GameError::InvalidState(format!(
                    "simulation cannot act in {phase:?}"
                )));
            }
        }
    }

    Err(GameError::InvalidState(format!(
        "simulation did not finish within {MAX_STEPS} steps"
    )))
}

/// The leader and the players seated after them, wrapping around the table.
fn team_for<'a>(ids: &'a [String], leader_id: &str, size: usize) -> Vec<&'a str> {
    let start = ids.iter().position(|id| id == leader_id).unwrap_or(0);
    ids.iter()
        .cycle()
        .skip(start)
        .take(size.min(ids.len()))
        .map(String::as_str)
        .collect()
}
