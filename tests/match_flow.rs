use std::{collections::HashMap, time::Duration};

use avalon_engine::{
    Game, GameConfig, GameError,
    config::PhaseWaits,
    dto::{
        events::StateChangedEvent,
        game::{GameStatusView, QuestStatusView, VoteView},
        phase::VisibleGamePhase,
    },
    state::{
        roles::{RoleCatalog, RoleId},
        scheduler::PendingTransition,
        state_machine::GamePhase,
    },
};
use tokio::sync::broadcast::{Receiver, error::TryRecvError};
use tokio_stream::StreamExt;

fn seeded(seed: u64) -> GameConfig {
    GameConfig {
        rng_seed: Some(seed),
        ..GameConfig::default()
    }
}

fn player_ids(count: usize) -> Vec<String> {
    (1..=count).map(|n| format!("p{n}")).collect()
}

async fn seated(config: GameConfig, count: usize) -> (Game, Vec<String>) {
    let game = Game::new(config).unwrap();
    let ids = player_ids(count);
    for id in &ids {
        game.add_player(id).await.unwrap();
    }
    (game, ids)
}

async fn started(config: GameConfig, count: usize, requested: &[RoleId]) -> (Game, Vec<String>) {
    let (game, ids) = seated(config, count).await;
    game.start(requested).await.unwrap().finished().await.unwrap();
    (game, ids)
}

/// Each player's own role, read from their own view.
async fn own_roles(game: &Game, ids: &[String]) -> HashMap<String, RoleId> {
    let mut roles = HashMap::new();
    for id in ids {
        let view = game.serialize(id).await;
        let own = view.players.collection.iter().find(|p| &p.id == id).unwrap();
        roles.insert(id.clone(), own.role.id);
    }
    roles
}

async fn leader(game: &Game) -> String {
    game.serialize("").await.players.leader_id.unwrap()
}

/// Leader proposes themselves and the players seated after them.
async fn propose(game: &Game, ids: &[String]) -> String {
    let view = game.serialize("").await;
    let leader_id = view.players.leader_id.clone().unwrap();
    let needed = view.quests.collection[view.quests.current_quest_index].votes_needed_count;
    let start = ids.iter().position(|id| *id == leader_id).unwrap();

    for id in ids.iter().cycle().skip(start).take(needed) {
        game.toggle_teammate_proposition(&leader_id, id).await.unwrap();
    }
    leader_id
}

async fn propose_and_submit(game: &Game, ids: &[String]) -> String {
    let leader_id = propose(game, ids).await;
    game.submit_team(&leader_id).await.unwrap().finished().await.unwrap();
    leader_id
}

async fn all_vote_for_team(game: &Game, ids: &[String], value: bool) {
    for id in ids {
        game.vote_for_team(id, value).await.unwrap().finished().await.unwrap();
    }
}

/// Play the current quest up to its last ballot and return that ballot's transition.
///
/// `saboteur` joins the team and fails the quest; everyone else succeeds it.
async fn play_quest(game: &Game, ids: &[String], saboteur: Option<&str>) -> PendingTransition {
    let view = game.serialize("").await;
    let leader_id = view.players.leader_id.clone().unwrap();
    let needed = view.quests.collection[view.quests.current_quest_index].votes_needed_count;
    let team: Vec<&str> = saboteur
        .into_iter()
        .chain(ids.iter().map(String::as_str).filter(|id| Some(*id) != saboteur))
        .take(needed)
        .collect();
    for id in &team {
        game.toggle_teammate_proposition(&leader_id, id).await.unwrap();
    }
    game.submit_team(&leader_id).await.unwrap().finished().await.unwrap();
    all_vote_for_team(game, ids, true).await;

    let (last, rest) = team.split_last().unwrap();
    for id in rest {
        let value = Some(*id) != saboteur;
        game.vote_for_quest(id, value).await.unwrap().finished().await.unwrap();
    }
    game.vote_for_quest(last, Some(*last) != saboteur).await.unwrap()
}

fn with_waits(seed: u64, waits: PhaseWaits) -> GameConfig {
    GameConfig {
        waits,
        rng_seed: Some(seed),
    }
}

/// Drain every event received so far as `(phase, pending phase)` pairs.
fn drain(rx: &mut Receiver<StateChangedEvent>) -> Vec<(VisibleGamePhase, Option<VisibleGamePhase>)> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push((event.phase, event.pending_phase));
    }
    events
}

async fn team_succeeds_quest(game: &Game, ids: &[String]) {
    propose_and_submit(game, ids).await;
    all_vote_for_team(game, ids, true).await;
    let team = game.serialize("").await.players.proposed_ids;
    for id in &team {
        game.vote_for_quest(id, true).await.unwrap().finished().await.unwrap();
    }
}

#[tokio::test]
async fn start_requires_five_to_ten_players() {
    let (game, _) = seated(seeded(1), 4).await;
    assert_eq!(
        game.start(&[]).await.unwrap_err(),
        GameError::PlayersAmountIncorrect { actual: 4 }
    );
    assert_eq!(game.phase().await, GamePhase::Preparation);

    let (game, _) = seated(seeded(1), 10).await;
    assert_eq!(game.add_player("p11").await.unwrap_err(), GameError::PlayersMaximumReached);
    assert_eq!(
        game.add_player("p1").await.unwrap_err(),
        GameError::AlreadyExistsPlayer("p1".into())
    );
    game.remove_player("p10").await.unwrap();
    assert_eq!(
        game.remove_player("p10").await.unwrap_err(),
        GameError::PlayerMissing("p10".into())
    );
}

#[tokio::test]
async fn roster_is_frozen_once_started() {
    let (game, _) = started(seeded(2), 5, &[]).await;
    assert_eq!(game.phase().await, GamePhase::TeamProposition);
    assert_eq!(game.add_player("late").await.unwrap_err(), GameError::AlreadyStartedGame);
    assert_eq!(game.remove_player("p1").await.unwrap_err(), GameError::AlreadyStartedGame);
    assert_eq!(game.start(&[]).await.unwrap_err(), GameError::AlreadyStartedGame);

    let view = game.serialize("p1").await;
    assert_eq!(view.meta.creator_id.as_deref(), Some("p1"));
    assert_eq!(view.meta.level_preset.good_count, Some(3));
    assert_eq!(view.meta.level_preset.evil_count, Some(2));
    assert!(view.meta.started_at.is_some());
    assert_eq!(view.quests.collection.len(), 5);
}

#[tokio::test]
async fn fifth_proposition_skips_the_vote() {
    let (game, ids) = started(seeded(3), 5, &[]).await;

    for round in 0..4 {
        assert_eq!(game.serialize("").await.quests.team_voting_round_index, round);
        propose_and_submit(&game, &ids).await;
        assert_eq!(game.phase().await, GamePhase::TeamVoting);
        all_vote_for_team(&game, &ids, false).await;
        assert_eq!(game.phase().await, GamePhase::TeamProposition);
    }

    propose_and_submit(&game, &ids).await;
    assert_eq!(game.phase().await, GamePhase::QuestVoting);

    let view = game.serialize("").await;
    assert_eq!(view.quests.team_voting_round_index, 4);
    let quest = &view.quests.collection[0];
    assert_eq!(quest.team_votes.len(), 5);
    assert_eq!(quest.team_votes[4].len(), 5);
    assert!(quest.team_votes[..4]
        .iter()
        .flatten()
        .all(|vote| vote.value == Some(false)));
    assert_eq!(view.players.proposed_ids.len(), 2);
}

#[tokio::test]
async fn leadership_rotates_after_a_rejection() {
    let (game, ids) = started(seeded(4), 6, &[]).await;
    let first = propose_and_submit(&game, &ids).await;
    all_vote_for_team(&game, &ids, false).await;

    let second = leader(&game).await;
    let index = ids.iter().position(|id| *id == first).unwrap();
    assert_eq!(second, ids[(index + 1) % ids.len()]);

    let view = game.serialize("").await;
    assert!(view.players.proposed_ids.is_empty());
    assert!(!view.players.is_submitted);
    assert_eq!(view.players.collection.iter().filter(|p| p.is_leader).count(), 1);
}

async fn play_to_assassination(seed: u64) -> (Game, Vec<String>, HashMap<String, RoleId>) {
    let (game, ids) = started(seeded(seed), 7, &[RoleId::Percival, RoleId::Morgana]).await;
    for quest in 0..3 {
        assert_eq!(game.serialize("").await.quests.current_quest_index, quest);
        team_succeeds_quest(&game, &ids).await;
    }
    assert_eq!(game.phase().await, GamePhase::Assassination);
    let roles = own_roles(&game, &ids).await;
    (game, ids, roles)
}

fn holder(roles: &HashMap<String, RoleId>, role: RoleId) -> String {
    roles
        .iter()
        .find(|(_, id)| **id == role)
        .map(|(player, _)| player.clone())
        .unwrap()
}

#[tokio::test]
async fn assassinating_the_seer_loses_the_game() {
    let (game, _, roles) = play_to_assassination(5).await;
    let assassin = holder(&roles, RoleId::Assassin);
    let seer = holder(&roles, RoleId::Merlin);

    assert_eq!(game.assassinate(&assassin).await.unwrap_err(), GameError::RequiredVictim);
    game.toggle_victim_proposition(&assassin, &seer).await.unwrap();
    game.assassinate(&assassin).await.unwrap().finished().await.unwrap();

    assert_eq!(game.phase().await, GamePhase::GameLost);
    let view = game.serialize("").await;
    assert_eq!(view.meta.status, GameStatusView::Lost);
    assert!(view.meta.finished_at.is_some());
    assert_eq!(
        view.quests
            .collection
            .iter()
            .filter(|q| q.status == QuestStatusView::Won)
            .count(),
        3
    );
}

#[tokio::test]
async fn missing_the_seer_wins_the_game() {
    let (game, _, roles) = play_to_assassination(6).await;
    let assassin = holder(&roles, RoleId::Assassin);
    let percival = holder(&roles, RoleId::Percival);

    game.toggle_victim_proposition(&assassin, &percival).await.unwrap();
    assert_eq!(game.serialize("").await.players.victim_id, Some(percival.clone()));
    game.assassinate(&assassin).await.unwrap().finished().await.unwrap();

    assert_eq!(game.phase().await, GamePhase::GameWon);
    assert_eq!(game.serialize("").await.meta.status, GameStatusView::Won);
}

#[tokio::test]
async fn only_the_assassin_strikes() {
    let (game, _, roles) = play_to_assassination(7).await;
    let assassin = holder(&roles, RoleId::Assassin);
    let seer = holder(&roles, RoleId::Merlin);

    assert_eq!(
        game.toggle_victim_proposition(&seer, &assassin).await.unwrap_err(),
        GameError::DeniedVictimProposition(seer.clone())
    );
    assert_eq!(
        game.toggle_victim_proposition(&assassin, &assassin).await.unwrap_err(),
        GameError::DeniedSelfSacrifice
    );
    assert_eq!(
        game.assassinate(&seer).await.unwrap_err(),
        GameError::DeniedAssassination(seer.clone())
    );

    game.toggle_victim_proposition(&assassin, &seer).await.unwrap();
    game.toggle_victim_proposition(&assassin, &seer).await.unwrap();
    assert_eq!(game.serialize("").await.players.victim_id, None);
}

#[tokio::test]
async fn three_failed_quests_lose_the_game() {
    let (game, ids) = started(seeded(8), 5, &[]).await;
    let roles = own_roles(&game, &ids).await;
    let assassin = holder(&roles, RoleId::Assassin);

    for _ in 0..3 {
        let view = game.serialize("").await;
        let leader_id = view.players.leader_id.clone().unwrap();
        let needed = view.quests.collection[view.quests.current_quest_index].votes_needed_count;
        game.toggle_teammate_proposition(&leader_id, &assassin).await.unwrap();
        for id in ids.iter().filter(|id| **id != assassin).take(needed - 1) {
            game.toggle_teammate_proposition(&leader_id, id).await.unwrap();
        }
        game.submit_team(&leader_id).await.unwrap().finished().await.unwrap();
        all_vote_for_team(&game, &ids, true).await;

        for id in game.serialize("").await.players.proposed_ids {
            let succeed = id != assassin;
            game.vote_for_quest(&id, succeed).await.unwrap().finished().await.unwrap();
        }
    }

    assert_eq!(game.phase().await, GamePhase::GameLost);
    let view = game.serialize("").await;
    assert!(view.players.collection.iter().all(|p| p.role.id != RoleId::Unknown));
}

#[tokio::test]
async fn non_leaders_cannot_submit() {
    let (game, ids) = seated(seeded(9), 5).await;
    assert_eq!(
        game.submit_team("p1").await.unwrap_err(),
        GameError::DeniedTeamSubmission("p1".into())
    );

    game.start(&[]).await.unwrap().finished().await.unwrap();
    let leader_id = leader(&game).await;
    let other = ids.iter().find(|id| **id != leader_id).unwrap().clone();
    let needed = game.serialize("").await.quests.collection[0].votes_needed_count;
    for id in ids.iter().take(needed) {
        game.toggle_teammate_proposition(&leader_id, id).await.unwrap();
    }
    assert_eq!(
        game.submit_team(&other).await.unwrap_err(),
        GameError::DeniedTeamSubmission(other.clone())
    );
    assert_eq!(
        game.toggle_teammate_proposition(&other, &other).await.unwrap_err(),
        GameError::DeniedTeammateProposition(other.clone())
    );

    game.submit_team(&leader_id).await.unwrap().finished().await.unwrap();
    assert_eq!(
        game.submit_team(&other).await.unwrap_err(),
        GameError::DeniedTeamSubmission(other.clone())
    );
    assert_eq!(
        game.submit_team(&leader_id).await.unwrap_err(),
        GameError::NoTimeForTeamSubmission
    );
}

#[tokio::test]
async fn wrong_team_size_leaves_state_untouched() {
    let (game, ids) = started(seeded(10), 5, &[]).await;
    let leader_id = leader(&game).await;
    game.toggle_teammate_proposition(&leader_id, &ids[0]).await.unwrap();
    let before = game.snapshot().await;

    assert_eq!(
        game.submit_team(&leader_id).await.unwrap_err(),
        GameError::RequiredCorrectTeammatesAmount {
            expected: 2,
            actual: 1
        }
    );
    assert_eq!(game.snapshot().await, before);
    assert_eq!(before.pending, None);
    assert!(!game.serialize("").await.players.is_submitted);
}

#[tokio::test]
async fn quest_ballots_are_cast_once_by_team_members() {
    let (game, ids) = started(seeded(11), 5, &[]).await;
    assert_eq!(
        game.vote_for_quest("p1", true).await.unwrap_err(),
        GameError::NoTimeForQuestVoting
    );

    propose_and_submit(&game, &ids).await;
    assert_eq!(
        game.vote_for_quest("p1", true).await.unwrap_err(),
        GameError::NoTimeForQuestVoting
    );
    game.vote_for_team("p1", true).await.unwrap().finished().await.unwrap();
    assert_eq!(
        game.vote_for_team("p1", true).await.unwrap_err(),
        GameError::AlreadyVoted("p1".into())
    );
    assert_eq!(
        game.vote_for_team("stranger", true).await.unwrap_err(),
        GameError::DeniedTeamVoting("stranger".into())
    );
    all_vote_for_team(&game, &ids[1..], true).await;
    assert_eq!(game.phase().await, GamePhase::QuestVoting);

    let team = game.serialize("").await.players.proposed_ids;
    let outsider = ids.iter().find(|id| !team.contains(id)).unwrap();
    assert_eq!(
        game.vote_for_quest(outsider, true).await.unwrap_err(),
        GameError::DeniedQuestVoting(outsider.clone())
    );

    game.vote_for_quest(&team[0], false).await.unwrap().finished().await.unwrap();
    assert_eq!(
        game.vote_for_quest(&team[0], true).await.unwrap_err(),
        GameError::AlreadyVoted(team[0].clone())
    );
}

#[tokio::test]
async fn views_follow_the_visibility_graph() {
    let (game, ids) =
        started(seeded(12), 8, &[RoleId::Percival, RoleId::Mordred, RoleId::Oberon]).await;
    let catalog = RoleCatalog::standard();
    let roles = own_roles(&game, &ids).await;

    for viewer in &ids {
        let viewer_role = catalog.get(roles[viewer]).unwrap();
        let view = game.serialize(viewer).await;
        for player in &view.players.collection {
            let subject = catalog.get(roles[&player.id]).unwrap();
            if viewer_role.can_see(subject) {
                assert_eq!(player.role.id, subject.id);
            } else {
                assert_eq!(player.role.id, RoleId::Unknown);
                assert_eq!(player.role.name, "Unknown");
            }
        }
        assert_eq!(game.serialize(viewer).await, view);
    }

    let spectator = game.serialize("spectator").await;
    assert!(spectator.players.collection.iter().all(|p| p.role.id == RoleId::Unknown));
}

#[tokio::test]
async fn open_ballots_stay_concealed() {
    let (game, ids) = started(seeded(13), 5, &[]).await;
    propose_and_submit(&game, &ids).await;
    for id in &ids[..3] {
        game.vote_for_team(id, false).await.unwrap().finished().await.unwrap();
    }

    let view = game.serialize("").await;
    let round = &view.quests.collection[0].team_votes[0];
    assert_eq!(round.len(), 3);
    assert!(round.iter().all(|v| v.id.is_some() && v.value.is_none()));

    all_vote_for_team(&game, &ids[3..], true).await;
    assert_eq!(game.phase().await, GamePhase::TeamProposition);
    let view = game.serialize("").await;
    let round = &view.quests.collection[0].team_votes[0];
    assert_eq!(round.iter().filter(|v| v.value == Some(false)).count(), 3);
    assert_eq!(view.quests.collection[0].status, QuestStatusView::Unresolved);
}

#[tokio::test]
async fn every_handler_install_is_announced() {
    let (game, ids) = seated(seeded(14), 5).await;
    let mut rx = game.subscribe();

    game.start(&[]).await.unwrap().finished().await.unwrap();
    let event = rx.try_recv().unwrap();
    assert_eq!(event.phase, VisibleGamePhase::TeamProposition);
    assert_eq!(event.version, 1);
    assert_eq!(event.pending_phase, None);
    assert_eq!(rx.try_recv().unwrap_err(), TryRecvError::Empty);

    let leader_id = leader(&game).await;
    game.toggle_teammate_proposition(&leader_id, &ids[0]).await.unwrap();
    assert_eq!(rx.try_recv().unwrap().version, 1);
    game.reset_proposed_teammates(&leader_id).await.unwrap();
    assert_eq!(rx.try_recv().unwrap().phase, VisibleGamePhase::TeamProposition);
}

#[tokio::test(start_paused = true)]
async fn delayed_transitions_freeze_the_match() {
    let config = GameConfig {
        waits: PhaseWaits {
            after_team_proposition: Duration::from_secs(2),
            after_team_voting: Duration::from_secs(3),
            after_quest_voting: Duration::from_secs(3),
        },
        rng_seed: Some(15),
    };
    let (game, ids) = started(config, 5, &[]).await;
    let mut rx = game.subscribe();

    let leader_id = leader(&game).await;
    let needed = game.serialize("").await.quests.collection[0].votes_needed_count;
    for id in ids.iter().take(needed) {
        game.toggle_teammate_proposition(&leader_id, id).await.unwrap();
    }
    while rx.try_recv().is_ok() {}

    let pending = game.submit_team(&leader_id).await.unwrap();
    assert!(pending.is_pending());

    let frozen = rx.try_recv().unwrap();
    assert_eq!(frozen.phase, VisibleGamePhase::TeamProposition);
    assert_eq!(frozen.pending_phase, Some(VisibleGamePhase::TeamVoting));
    assert_eq!(game.snapshot().await.pending, Some(GamePhase::TeamVoting));
    assert_eq!(
        game.vote_for_team(&ids[0], true).await.unwrap_err(),
        GameError::NoTimeForTeamVoting
    );
    assert_eq!(
        game.reset_proposed_teammates(&leader_id).await.unwrap_err(),
        GameError::NoTimeForTeammateProposition
    );

    pending.finished().await.unwrap();
    let settled = rx.try_recv().unwrap();
    assert_eq!(settled.phase, VisibleGamePhase::TeamVoting);
    assert_eq!(settled.pending_phase, None);
    assert_eq!(rx.try_recv().unwrap_err(), TryRecvError::Empty);
    assert_eq!(game.phase().await, GamePhase::TeamVoting);
}

#[tokio::test(start_paused = true)]
async fn delayed_final_round_is_approved_after_the_freeze() {
    let waits = PhaseWaits {
        after_team_proposition: Duration::from_secs(2),
        ..PhaseWaits::default()
    };
    let (game, ids) = started(with_waits(18, waits), 5, &[]).await;
    for _ in 0..4 {
        propose_and_submit(&game, &ids).await;
        all_vote_for_team(&game, &ids, false).await;
    }
    let leader_id = propose(&game, &ids).await;
    let mut rx = game.subscribe();

    let pending = game.submit_team(&leader_id).await.unwrap();
    assert!(pending.is_pending());
    assert_eq!(
        drain(&mut rx),
        vec![(
            VisibleGamePhase::TeamProposition,
            Some(VisibleGamePhase::TeamVotingPreApproved)
        )]
    );
    assert_eq!(
        game.vote_for_team(&ids[0], true).await.unwrap_err(),
        GameError::NoTimeForTeamVoting
    );
    let frozen = game.serialize("").await;
    assert!(frozen.quests.collection[0].team_votes[4].is_empty());

    pending.finished().await.unwrap();
    assert_eq!(drain(&mut rx), vec![(VisibleGamePhase::QuestVoting, None)]);
    assert_eq!(game.phase().await, GamePhase::QuestVoting);

    let view = game.serialize("").await;
    let round = &view.quests.collection[0].team_votes[4];
    assert_eq!(round.len(), 5);
    assert!(round.iter().all(|vote| vote.value == Some(true)));
}

#[tokio::test]
async fn immediate_final_round_announces_quest_voting_once() {
    let (game, ids) = started(seeded(18), 5, &[]).await;
    for _ in 0..4 {
        propose_and_submit(&game, &ids).await;
        all_vote_for_team(&game, &ids, false).await;
    }
    let leader_id = propose(&game, &ids).await;
    let mut rx = game.subscribe();

    let pending = game.submit_team(&leader_id).await.unwrap();
    assert!(!pending.is_pending());
    assert_eq!(drain(&mut rx), vec![(VisibleGamePhase::QuestVoting, None)]);
}

#[tokio::test(start_paused = true)]
async fn resolved_quest_stays_sealed_until_the_next_quest_opens() {
    let waits = PhaseWaits {
        after_quest_voting: Duration::from_secs(3),
        ..PhaseWaits::default()
    };
    let (game, ids) = started(with_waits(19, waits), 5, &[]).await;
    let mut rx = game.subscribe();

    let pending = play_quest(&game, &ids, None).await;
    assert!(pending.is_pending());
    assert_eq!(
        drain(&mut rx).last(),
        Some(&(VisibleGamePhase::QuestVoting, Some(VisibleGamePhase::TeamProposition)))
    );

    let frozen = game.serialize("").await;
    assert_eq!(frozen.quests.current_quest_index, 0);
    let quest = &frozen.quests.collection[0];
    assert_eq!(quest.status, QuestStatusView::Unresolved);
    assert_eq!(quest.quest_votes.len(), quest.votes_needed_count);
    assert!(quest.quest_votes.iter().all(|vote| *vote == VoteView { id: None, value: None }));
    assert!(quest.team_votes[0].iter().all(|vote| vote.value == Some(true)));

    pending.finished().await.unwrap();
    assert_eq!(drain(&mut rx), vec![(VisibleGamePhase::TeamProposition, None)]);

    let view = game.serialize("").await;
    assert_eq!(view.quests.current_quest_index, 1);
    assert_eq!(view.quests.team_voting_round_index, 0);
    let quest = &view.quests.collection[0];
    assert_eq!(quest.status, QuestStatusView::Won);
    assert!(quest.quest_votes.iter().all(|vote| vote.value == Some(true)));
}

#[tokio::test(start_paused = true)]
async fn third_won_quest_opens_the_assassination_after_the_wait() {
    let waits = PhaseWaits {
        after_quest_voting: Duration::from_secs(3),
        ..PhaseWaits::default()
    };
    let (game, ids) = started(with_waits(20, waits), 7, &[]).await;
    for _ in 0..2 {
        play_quest(&game, &ids, None).await.finished().await.unwrap();
    }

    let pending = play_quest(&game, &ids, None).await;
    assert!(pending.is_pending());
    assert_eq!(game.snapshot().await.pending, Some(GamePhase::Assassination));
    assert_eq!(game.phase().await, GamePhase::QuestVoting);
    assert_eq!(
        game.serialize("").await.quests.collection[2].status,
        QuestStatusView::Unresolved
    );

    pending.finished().await.unwrap();
    assert_eq!(game.phase().await, GamePhase::Assassination);
    let view = game.serialize("").await;
    assert_eq!(view.quests.current_quest_index, 2);
    assert!(view.quests.collection[..3].iter().all(|q| q.status == QuestStatusView::Won));
}

#[tokio::test(start_paused = true)]
async fn third_lost_quest_ends_the_match_after_the_wait() {
    let waits = PhaseWaits {
        after_quest_voting: Duration::from_secs(3),
        ..PhaseWaits::default()
    };
    let (game, ids) = started(with_waits(8, waits), 5, &[]).await;
    let assassin = holder(&own_roles(&game, &ids).await, RoleId::Assassin);
    for _ in 0..2 {
        play_quest(&game, &ids, Some(&assassin)).await.finished().await.unwrap();
    }

    let pending = play_quest(&game, &ids, Some(&assassin)).await;
    assert!(pending.is_pending());
    assert_eq!(game.snapshot().await.pending, Some(GamePhase::GameLost));
    let frozen = game.serialize("").await;
    assert_eq!(frozen.meta.status, GameStatusView::Unfinished);
    assert_eq!(frozen.quests.collection[2].status, QuestStatusView::Unresolved);
    assert!(frozen.players.collection.iter().all(|p| p.role.id == RoleId::Unknown));

    pending.finished().await.unwrap();
    assert_eq!(game.phase().await, GamePhase::GameLost);
    let view = game.serialize("").await;
    assert_eq!(view.meta.status, GameStatusView::Lost);
    assert!(view.quests.collection[..3].iter().all(|q| q.status == QuestStatusView::Lost));
    assert!(view.players.collection.iter().all(|p| p.role.id != RoleId::Unknown));
}

#[tokio::test(start_paused = true)]
async fn team_ballots_surface_once_the_vote_settles() {
    let waits = PhaseWaits {
        after_team_voting: Duration::from_secs(3),
        ..PhaseWaits::default()
    };
    let (game, ids) = started(with_waits(21, waits), 5, &[]).await;
    propose_and_submit(&game, &ids).await;

    let (last, rest) = ids.split_last().unwrap();
    all_vote_for_team(&game, rest, true).await;
    let pending = game.vote_for_team(last, true).await.unwrap();
    assert!(pending.is_pending());

    let frozen = game.serialize("").await;
    let round = &frozen.quests.collection[0].team_votes[0];
    assert_eq!(round.len(), 5);
    assert!(round.iter().all(|vote| vote.id.is_some() && vote.value.is_none()));

    pending.finished().await.unwrap();
    assert_eq!(game.phase().await, GamePhase::QuestVoting);
    let view = game.serialize("").await;
    let quest = &view.quests.collection[0];
    assert!(quest.team_votes[0].iter().all(|vote| vote.value == Some(true)));
    assert_eq!(quest.status, QuestStatusView::Unresolved);
}

#[tokio::test]
async fn stream_yields_subsequent_events() {
    let game = Game::new(seeded(22)).unwrap();
    game.add_player("p1").await.unwrap();

    let stream = game.stream();
    tokio::pin!(stream);
    game.add_player("p2").await.unwrap();
    game.remove_player("p1").await.unwrap();

    let first = stream.next().await.unwrap();
    assert_eq!(first.game_id, game.id().await);
    assert_eq!(first.phase, VisibleGamePhase::Preparation);
    assert_eq!(first.version, 0);
    assert_eq!(stream.next().await.unwrap().phase, VisibleGamePhase::Preparation);

    drop(game);
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn callbacks_receive_events_until_removed() {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    let game = Game::new(seeded(16)).unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let listener = game.on(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    game.add_player("p1").await.unwrap();
    game.add_player("p2").await.unwrap();
    assert!(game.off(listener));
    game.add_player("p3").await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn same_seed_same_match() {
    let (first, ids) = started(seeded(17), 9, &[RoleId::Morgana]).await;
    let (second, _) = started(seeded(17), 9, &[RoleId::Morgana]).await;

    assert_eq!(own_roles(&first, &ids).await, own_roles(&second, &ids).await);
    assert_eq!(leader(&first).await, leader(&second).await);
}
