use crate::{
    error::GameError,
    state::{
        preset::LevelPreset,
        quest::{Quest, QuestStatus, Vote},
    },
};

/// Quests needed by either side to settle the match.
pub const QUESTS_TO_WIN: usize = 3;

/// Ordered quests of a match and the pointer to the one being played.
///
/// The pointer only moves through [`Quests::next_quest`]; deciding when is up to
/// the phase that resolves a quest.
#[derive(Debug, Clone, Default)]
pub struct Quests {
    collection: Vec<Quest>,
    current_index: usize,
}

impl Quests {
    /// Build the five quests of `preset`.
    pub fn new(preset: &LevelPreset) -> Self {
        let players = preset.players();
        Self {
            collection: preset
                .quests
                .iter()
                .map(|quest| Quest::new(*quest, players))
                .collect(),
            current_index: 0,
        }
    }

    /// All quests, resolved or not.
    pub fn collection(&self) -> &[Quest] {
        &self.collection
    }

    /// Index of the quest being played.
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// The quest being played.
    pub fn current(&self) -> Result<&Quest, GameError> {
        self.collection
            .get(self.current_index)
            .ok_or_else(|| GameError::InvalidState("quests are not initialised".into()))
    }

    fn current_mut(&mut self) -> Result<&mut Quest, GameError> {
        self.collection
            .get_mut(self.current_index)
            .ok_or_else(|| GameError::InvalidState("quests are not initialised".into()))
    }

    /// Quests won by the good side.
    pub fn succeeded_count(&self) -> usize {
        self.count(QuestStatus::Won)
    }

    /// Quests sabotaged by the evil side.
    pub fn failed_count(&self) -> usize {
        self.count(QuestStatus::Lost)
    }

    fn count(&self, status: QuestStatus) -> usize {
        self.collection
            .iter()
            .filter(|quest| quest.status() == status)
            .count()
    }

    /// Team size of the current quest.
    pub fn votes_needed(&self) -> Result<usize, GameError> {
        Ok(self.current()?.votes_needed())
    }

    /// Current team-voting round of the current quest, 0 before the match starts.
    pub fn team_voting_round_index(&self) -> usize {
        self.current()
            .map(Quest::team_voting_round_index)
            .unwrap_or_default()
    }

    /// Whether the current quest is on its final team-voting round.
    pub fn is_last_round(&self) -> bool {
        self.current().is_ok_and(Quest::is_last_round)
    }

    /// Whether the current round still accepts team ballots.
    pub fn is_team_voting_open(&self) -> bool {
        self.current().is_ok_and(Quest::is_team_voting_open)
    }

    /// Whether the current team was approved.
    pub fn is_team_voting_succeeded(&self) -> bool {
        self.current().is_ok_and(Quest::is_team_voting_succeeded)
    }

    /// Whether the current team was rejected.
    pub fn is_team_voting_failed(&self) -> bool {
        self.current().is_ok_and(Quest::is_team_voting_failed)
    }

    /// Whether the current quest still accepts quest ballots.
    pub fn is_quest_voting_open(&self) -> bool {
        self.current().is_ok_and(Quest::is_quest_voting_open)
    }

    /// Whether the current quest collected every quest ballot.
    pub fn is_quest_voting_closed(&self) -> bool {
        self.current().is_ok_and(Quest::is_quest_voting_closed)
    }

    /// Record a ballot on the current quest.
    pub fn add_vote(&mut self, vote: Vote) -> Result<(), GameError> {
        self.current_mut()?.add_vote(vote)
    }

    /// Open the next team-voting round of the current quest.
    pub fn next_team_voting_round(&mut self) -> Result<(), GameError> {
        self.current_mut()?.next_team_voting_round()
    }

    /// Move on to the following quest.
    pub fn next_quest(&mut self) -> Result<(), GameError> {
        if self.current()?.status() == QuestStatus::Unresolved {
            return Err(GameError::InvalidState(
                "the current quest is not resolved yet".into(),
            ));
        }
        if self.current_index + 1 >= self.collection.len() {
            return Err(GameError::InvalidState("no quest left to play".into()));
        }

        self.current_index += 1;
        Ok(())
    }
}
