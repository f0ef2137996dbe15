use serde::Serialize;
use uuid::Uuid;

use crate::{
    dto::{format_system_time, phase::VisibleGamePhase},
    state::{
        game::{GameMeta, GameSession, GameStatus},
        handler::ResultsVisibility,
        quest::{Quest, QuestStatus, Vote},
        quests::Quests,
        roles::{Allegiance, Role, RoleId},
        roster::{Player, Roster},
        state_machine::GamePhase,
    },
};

/// Match as seen by one viewer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameView {
    pub meta: MetaView,
    pub phase: VisibleGamePhase,
    pub quests: QuestsView,
    pub players: PlayersView,
}

impl GameView {
    /// Build the view of `session` for `viewer_id`.
    ///
    /// Unknown viewers are treated as spectators and only see concealed roles.
    pub fn new(session: &GameSession, viewer_id: &str) -> Self {
        let results = session.handler.results();
        let viewer_role = session
            .roster
            .get(viewer_id)
            .map(|player| player.role.clone())
            .unwrap_or_else(Role::unknown);
        let reveal_roles = session.handler.reveals_roles();
        // The team round stays open until the team vote settles, frozen or not.
        let team_round_open = session.machine.phase() == GamePhase::TeamVoting;

        Self {
            meta: MetaView::from(&session.meta),
            phase: session.machine.phase().into(),
            quests: QuestsView::new(&session.quests, results, team_round_open),
            players: PlayersView::new(&session.roster, |player| {
                if reveal_roles || viewer_role.can_see(&player.role) {
                    RoleView::from(&player.role)
                } else {
                    RoleView::from(&Role::unknown())
                }
            }),
        }
    }
}

/// Outcome of the match in serialized form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatusView {
    Unfinished,
    Won,
    Lost,
}

impl From<GameStatus> for GameStatusView {
    fn from(value: GameStatus) -> Self {
        match value {
            GameStatus::Unfinished => GameStatusView::Unfinished,
            GameStatus::Won => GameStatusView::Won,
            GameStatus::Lost => GameStatusView::Lost,
        }
    }
}

/// Side counts of the preset in use; null before the match starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelPresetView {
    pub good_count: Option<usize>,
    pub evil_count: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaView {
    pub id: Uuid,
    pub created_at: String,
    pub started_at: Option<String>,
    pub finished_at: Option<String>,
    pub level_preset: LevelPresetView,
    pub status: GameStatusView,
    pub creator_id: Option<String>,
}

impl From<&GameMeta> for MetaView {
    fn from(meta: &GameMeta) -> Self {
        Self {
            id: meta.id,
            created_at: format_system_time(meta.created_at),
            started_at: meta.started_at.map(format_system_time),
            finished_at: meta.finished_at.map(format_system_time),
            level_preset: LevelPresetView {
                good_count: meta.level_preset.map(|preset| preset.good_count),
                evil_count: meta.level_preset.map(|preset| preset.evil_count),
            },
            status: meta.status.into(),
            creator_id: meta.creator_id().map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestStatusView {
    Unresolved,
    Won,
    Lost,
}

impl From<QuestStatus> for QuestStatusView {
    fn from(value: QuestStatus) -> Self {
        match value {
            QuestStatus::Unresolved => QuestStatusView::Unresolved,
            QuestStatus::Won => QuestStatusView::Won,
            QuestStatus::Lost => QuestStatusView::Lost,
        }
    }
}

/// A ballot; either field is null when it must not be shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoteView {
    pub id: Option<String>,
    pub value: Option<bool>,
}

impl VoteView {
    fn open(vote: &Vote) -> Self {
        Self {
            id: Some(vote.id.clone()),
            value: Some(vote.value),
        }
    }

    fn hidden_value(vote: &Vote) -> Self {
        Self {
            id: Some(vote.id.clone()),
            value: None,
        }
    }

    fn anonymous(vote: &Vote) -> Self {
        Self {
            id: None,
            value: Some(vote.value),
        }
    }

    fn sealed() -> Self {
        Self {
            id: None,
            value: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestView {
    pub status: QuestStatusView,
    pub votes_needed_count: usize,
    pub fails_needed_count: usize,
    pub team_votes: Vec<Vec<VoteView>>,
    pub quest_votes: Vec<VoteView>,
}

impl QuestView {
    /// Serialize `quest`; a concealed quest hides its quest ballots and status,
    /// and the values of its current team round while that round is open.
    fn new(quest: &Quest, concealed: bool, team_round_open: bool) -> Self {
        let current_round = quest.team_voting_round_index();
        let team_votes = quest
            .team_votes()
            .iter()
            .enumerate()
            .map(|(index, round)| {
                let hide = concealed && team_round_open && index == current_round;
                round
                    .iter()
                    .map(|vote| {
                        if hide {
                            VoteView::hidden_value(vote)
                        } else {
                            VoteView::open(vote)
                        }
                    })
                    .collect()
            })
            .collect();

        let quest_votes = if concealed {
            quest.quest_votes().iter().map(|_| VoteView::sealed()).collect()
        } else {
            let mut ballots: Vec<&Vote> = quest.quest_votes().iter().collect();
            ballots.sort_by_key(|vote| !vote.value);
            ballots.into_iter().map(VoteView::anonymous).collect()
        };

        Self {
            status: if concealed {
                QuestStatusView::Unresolved
            } else {
                quest.status().into()
            },
            votes_needed_count: quest.votes_needed(),
            fails_needed_count: quest.fails_needed(),
            team_votes,
            quest_votes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestsView {
    pub collection: Vec<QuestView>,
    pub team_voting_round_index: usize,
    pub current_quest_index: usize,
}

impl QuestsView {
    fn new(quests: &Quests, results: ResultsVisibility, team_round_open: bool) -> Self {
        let current = quests.current_index();
        let collection = quests
            .collection()
            .iter()
            .enumerate()
            .map(|(index, quest)| {
                let concealed = results == ResultsVisibility::Concealed && index == current;
                QuestView::new(quest, concealed, team_round_open)
            })
            .collect();

        Self {
            collection,
            team_voting_round_index: quests.team_voting_round_index(),
            current_quest_index: current,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleView {
    pub id: RoleId,
    pub name: String,
    pub description: String,
    pub allegiance: Allegiance,
}

impl From<&Role> for RoleView {
    fn from(role: &Role) -> Self {
        Self {
            id: role.id,
            name: role.name.clone(),
            description: role.description.clone(),
            allegiance: role.allegiance,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub id: String,
    pub role: RoleView,
    pub is_leader: bool,
    pub is_proposed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayersView {
    pub collection: Vec<PlayerView>,
    pub proposed_ids: Vec<String>,
    pub leader_id: Option<String>,
    pub is_submitted: bool,
    pub victim_id: Option<String>,
}

impl PlayersView {
    fn new(roster: &Roster, role_of: impl Fn(&Player) -> RoleView) -> Self {
        Self {
            collection: roster
                .players()
                .map(|player| PlayerView {
                    id: player.id.clone(),
                    role: role_of(player),
                    is_leader: player.is_leader,
                    is_proposed: player.is_proposed,
                })
                .collect(),
            proposed_ids: roster.proposed_ids(),
            leader_id: roster.leader().map(|leader| leader.id.clone()),
            is_submitted: roster.is_submitted(),
            victim_id: roster.victim_id().map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::preset::QuestPreset;

    fn quest_with_ballots() -> Quest {
        let mut quest = Quest::new(
            QuestPreset {
                votes_needed: 2,
                fails_needed: 1,
            },
            3,
        );
        for id in ["a", "b", "c"] {
            quest.add_vote(Vote::new(id, true)).unwrap();
        }
        quest.add_vote(Vote::new("a", false)).unwrap();
        quest.add_vote(Vote::new("b", true)).unwrap();
        quest
    }

    #[test]
    fn concealed_quest_hides_values_and_status() {
        let view = QuestView::new(&quest_with_ballots(), true, true);
        assert_eq!(view.status, QuestStatusView::Unresolved);
        assert!(view.team_votes[0].iter().all(|v| v.id.is_some() && v.value.is_none()));
        assert_eq!(view.quest_votes, vec![VoteView::sealed(), VoteView::sealed()]);
    }

    #[test]
    fn settled_team_round_is_shown_while_quest_ballots_stay_sealed() {
        let view = QuestView::new(&quest_with_ballots(), true, false);
        assert_eq!(view.status, QuestStatusView::Unresolved);
        assert!(view.team_votes[0].iter().all(|v| v.id.is_some() && v.value == Some(true)));
        assert_eq!(view.quest_votes, vec![VoteView::sealed(), VoteView::sealed()]);
    }

    #[test]
    fn earlier_rounds_stay_visible_during_a_vote() {
        let mut quest = Quest::new(
            QuestPreset {
                votes_needed: 2,
                fails_needed: 1,
            },
            3,
        );
        for id in ["a", "b", "c"] {
            quest.add_vote(Vote::new(id, false)).unwrap();
        }
        quest.next_team_voting_round().unwrap();
        quest.add_vote(Vote::new("b", true)).unwrap();

        let view = QuestView::new(&quest, true, true);
        assert!(view.team_votes[0].iter().all(|v| v.value == Some(false)));
        assert_eq!(view.team_votes[1], vec![VoteView {
            id: Some("b".into()),
            value: None
        }]);
    }

    #[test]
    fn revealed_quest_ballots_are_anonymous_and_sorted() {
        let view = QuestView::new(&quest_with_ballots(), false, false);
        assert_eq!(view.status, QuestStatusView::Lost);
        assert_eq!(
            view.quest_votes,
            vec![
                VoteView {
                    id: None,
                    value: Some(true)
                },
                VoteView {
                    id: None,
                    value: Some(false)
                },
            ]
        );
        assert!(view.team_votes[0].iter().all(|v| v.value == Some(true)));
    }
}
