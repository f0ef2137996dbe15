//! A single quest: team-voting rounds followed by the secret quest ballot.

use crate::{error::GameError, state::preset::QuestPreset};

/// Maximum number of team-voting rounds a quest can go through.
pub const TEAM_VOTING_ROUNDS: usize = 5;

/// A single ballot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vote {
    /// Identifier of the voter.
    pub id: String,
    /// Approval (`true`) or rejection/sabotage (`false`).
    pub value: bool,
}

impl Vote {
    /// Build a ballot for `id`.
    pub fn new(id: impl Into<String>, value: bool) -> Self {
        Self {
            id: id.into(),
            value,
        }
    }
}

/// Outcome of a quest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestStatus {
    /// Team or quest voting is still open.
    Unresolved,
    /// Fewer sabotage ballots than required to fail.
    Won,
    /// Enough sabotage ballots were cast.
    Lost,
}

/// One mission of the match.
#[derive(Debug, Clone)]
pub struct Quest {
    votes_needed: usize,
    fails_needed: usize,
    total_players: usize,
    team_votes: Vec<Vec<Vote>>,
    quest_votes: Vec<Vote>,
}

impl Quest {
    /// Start a quest with its first team-voting round open.
    pub fn new(preset: QuestPreset, total_players: usize) -> Self {
        Self {
            votes_needed: preset.votes_needed,
            fails_needed: preset.fails_needed,
            total_players,
            team_votes: vec![Vec::new()],
            quest_votes: Vec::new(),
        }
    }

    /// Team size for this quest.
    pub fn votes_needed(&self) -> usize {
        self.votes_needed
    }

    /// Sabotage ballots needed to fail this quest.
    pub fn fails_needed(&self) -> usize {
        self.fails_needed
    }

    /// Index of the current team-voting round (0-based, at most 4).
    pub fn team_voting_round_index(&self) -> usize {
        self.team_votes.len() - 1
    }

    /// Ballots of every team-voting round so far.
    pub fn team_votes(&self) -> &[Vec<Vote>] {
        &self.team_votes
    }

    /// Quest ballots collected so far.
    pub fn quest_votes(&self) -> &[Vote] {
        &self.quest_votes
    }

    /// Whether the current round is the fifth and final one.
    pub fn is_last_round(&self) -> bool {
        self.team_voting_round_index() == TEAM_VOTING_ROUNDS - 1
    }

    fn current_round(&self) -> &[Vote] {
        self.team_votes.last().map(Vec::as_slice).unwrap_or_default()
    }

    /// Every seated player voted in the current round.
    pub fn is_team_voting_round_closed(&self) -> bool {
        self.current_round().len() >= self.total_players
    }

    /// The current round closed with a majority, or it is the final round.
    pub fn is_team_voting_succeeded(&self) -> bool {
        if !self.is_team_voting_round_closed() {
            return false;
        }
        if self.is_last_round() {
            return true;
        }

        let rejections = self.current_round().iter().filter(|v| !v.value).count();
        rejections < self.total_players.div_ceil(2)
    }

    /// The current round closed without a majority.
    pub fn is_team_voting_failed(&self) -> bool {
        self.is_team_voting_round_closed() && !self.is_team_voting_succeeded()
    }

    /// Ballots are still accepted in the current round.
    pub fn is_team_voting_open(&self) -> bool {
        !self.is_team_voting_round_closed()
    }

    /// Team approved and quest ballots are still missing.
    pub fn is_quest_voting_open(&self) -> bool {
        self.is_team_voting_succeeded() && self.quest_votes.len() < self.votes_needed
    }

    /// Every team member cast a quest ballot.
    pub fn is_quest_voting_closed(&self) -> bool {
        self.quest_votes.len() >= self.votes_needed
    }

    /// Outcome of the quest so far.
    pub fn status(&self) -> QuestStatus {
        if !self.is_quest_voting_closed() {
            return QuestStatus::Unresolved;
        }

        let fails = self.quest_votes.iter().filter(|v| !v.value).count();
        if fails < self.fails_needed {
            QuestStatus::Won
        } else {
            QuestStatus::Lost
        }
    }

    /// Record a ballot in the team vote while it is unresolved, in the quest vote afterwards.
    pub fn add_vote(&mut self, vote: Vote) -> Result<(), GameError> {
        if self.is_team_voting_succeeded() {
            self.add_quest_vote(vote)
        } else {
            self.add_team_vote(vote)
        }
    }

    fn add_team_vote(&mut self, vote: Vote) -> Result<(), GameError> {
        if !self.is_team_voting_open() {
            return Err(GameError::NoTimeForTeamVoting);
        }
        if self.current_round().iter().any(|v| v.id == vote.id) {
            return Err(GameError::AlreadyVoted(vote.id));
        }

        if let Some(round) = self.team_votes.last_mut() {
            round.push(vote);
        }
        Ok(())
    }

    fn add_quest_vote(&mut self, vote: Vote) -> Result<(), GameError> {
        if !self.is_quest_voting_open() {
            return Err(GameError::NoTimeForQuestVoting);
        }
        if self.quest_votes.iter().any(|v| v.id == vote.id) {
            return Err(GameError::AlreadyVoted(vote.id));
        }

        self.quest_votes.push(vote);
        Ok(())
    }

    /// Open the next team-voting round after a rejected team.
    pub fn next_team_voting_round(&mut self) -> Result<(), GameError> {
        if !self.is_team_voting_failed() {
            return Err(GameError::InvalidState(
                "a new team-voting round needs the current one to be rejected".into(),
            ));
        }
        if self.is_last_round() {
            return Err(GameError::InvalidState(format!(
                "a quest holds at most {TEAM_VOTING_ROUNDS} team-voting rounds"
            )));
        }

        self.team_votes.push(Vec::new());
        Ok(())
    }
}
