//! Per-player-count balance: allegiance split and quest difficulty.

use crate::error::GameError;

/// Fewest players a match can start with.
pub const MIN_PLAYERS: usize = 5;
/// Most players a match can seat.
pub const MAX_PLAYERS: usize = 10;
/// Number of quests in a match.
pub const QUESTS_PER_GAME: usize = 5;

/// Difficulty of a single quest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestPreset {
    /// Team size the leader has to propose.
    pub votes_needed: usize,
    /// Sabotage ballots needed to fail the quest.
    pub fails_needed: usize,
}

/// Allegiance split and quest table for one supported player count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelPreset {
    /// Number of good players.
    pub good_count: usize,
    /// Number of evil players.
    pub evil_count: usize,
    /// The five quests, in play order.
    pub quests: [QuestPreset; QUESTS_PER_GAME],
}

const fn q(votes_needed: usize, fails_needed: usize) -> QuestPreset {
    QuestPreset {
        votes_needed,
        fails_needed,
    }
}

const LARGE_TABLE: [QuestPreset; QUESTS_PER_GAME] = [q(3, 1), q(4, 1), q(4, 1), q(5, 2), q(5, 1)];

impl LevelPreset {
    /// Preset for `players` seated players.
    pub fn for_players(players: usize) -> Result<Self, GameError> {
        let preset = match players {
            5 => Self {
                good_count: 3,
                evil_count: 2,
                quests: [q(2, 1), q(3, 1), q(2, 1), q(3, 1), q(3, 1)],
            },
            6 => Self {
                good_count: 4,
                evil_count: 2,
                quests: [q(2, 1), q(3, 1), q(4, 1), q(3, 1), q(4, 1)],
            },
            7 => Self {
                good_count: 4,
                evil_count: 3,
                quests: [q(2, 1), q(3, 1), q(3, 1), q(4, 2), q(4, 1)],
            },
            8 => Self {
                good_count: 5,
                evil_count: 3,
                quests: LARGE_TABLE,
            },
            9 => Self {
                good_count: 6,
                evil_count: 3,
                quests: LARGE_TABLE,
            },
            10 => Self {
                good_count: 6,
                evil_count: 4,
                quests: LARGE_TABLE,
            },
            actual => return Err(GameError::PlayersAmountIncorrect { actual }),
        };

        Ok(preset)
    }

    /// Total players the preset is built for.
    pub fn players(&self) -> usize {
        self.good_count + self.evil_count
    }
}
