//! Seated players, leader rotation, team proposition and the assassination target.

use indexmap::IndexMap;
use rand::Rng;

use crate::{
    error::GameError,
    state::{
        preset::MAX_PLAYERS,
        quest::Vote,
        roles::{Role, RoleId},
    },
};

/// Role that may pick and strike the assassination victim.
pub const ASSASSIN_ROLE: RoleId = RoleId::Assassin;
/// Role whose assassination flips the outcome.
pub const SEER_ROLE: RoleId = RoleId::Merlin;

/// One seated participant.
#[derive(Debug, Clone)]
pub struct Player {
    /// Stable opaque identifier, unique within the match.
    pub id: String,
    /// Assigned role, [`RoleId::Unknown`] until the match starts.
    pub role: Role,
    /// Ballot cast in the phase currently open.
    pub vote: Option<Vote>,
    /// Whether the player belongs to the proposed team.
    pub is_proposed: bool,
    /// Whether the player leads the current proposition.
    pub is_leader: bool,
}

impl Player {
    /// Seat a new player holding the concealed role.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: Role::unknown(),
            vote: None,
            is_proposed: false,
            is_leader: false,
        }
    }
}

/// Player collection in seating order plus the proposition state.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    players: IndexMap<String, Player>,
    leader_index: Option<usize>,
    is_submitted: bool,
    victim_id: Option<String>,
}

impl Roster {
    /// Create an empty roster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seated players in seating order.
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    /// Number of seated players.
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// Whether nobody is seated.
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Look a seated player up.
    pub fn get(&self, id: &str) -> Option<&Player> {
        self.players.get(id)
    }

    fn require(&self, id: &str) -> Result<&Player, GameError> {
        self.get(id)
            .ok_or_else(|| GameError::PlayerMissing(id.to_string()))
    }

    /// Seat a player at the end of the table.
    pub fn add(&mut self, id: &str) -> Result<(), GameError> {
        if self.players.contains_key(id) {
            return Err(GameError::AlreadyExistsPlayer(id.to_string()));
        }
        if self.players.len() >= MAX_PLAYERS {
            return Err(GameError::PlayersMaximumReached);
        }

        self.players.insert(id.to_string(), Player::new(id));
        Ok(())
    }

    /// Remove a player, keeping the seating order of the others.
    pub fn remove(&mut self, id: &str) -> Result<Player, GameError> {
        self.players
            .shift_remove(id)
            .ok_or_else(|| GameError::PlayerMissing(id.to_string()))
    }

    /// Hand out one role per player, in seating order, popping from the end of `roles`.
    pub fn assign_roles(&mut self, mut roles: Vec<Role>) -> Result<(), GameError> {
        if roles.len() != self.players.len() {
            return Err(GameError::InvalidState(format!(
                "{} roles dealt for {} players",
                roles.len(),
                self.players.len()
            )));
        }

        for player in self.players.values_mut() {
            if let Some(role) = roles.pop() {
                player.role = role;
            }
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Leader rotation
    // ---------------------------------------------------------------------

    /// Current leader, if one was designated.
    pub fn leader(&self) -> Option<&Player> {
        self.leader_index
            .and_then(|index| self.players.get_index(index))
            .map(|(_, player)| player)
    }

    /// Pass leadership on to the next seat, or pick a random first leader.
    pub fn next_leader<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<&Player, GameError> {
        if self.players.is_empty() {
            return Err(GameError::InvalidState(
                "cannot designate a leader without players".into(),
            ));
        }

        let next = match self.leader_index {
            Some(index) => (index + 1) % self.players.len(),
            None => rng.random_range(0..self.players.len()),
        };

        for (index, player) in self.players.values_mut().enumerate() {
            player.is_leader = index == next;
        }
        self.leader_index = Some(next);

        self.leader()
            .ok_or_else(|| GameError::InvalidState("leader index out of range".into()))
    }

    fn ensure_leader(&self, id: &str) -> bool {
        self.leader().is_some_and(|leader| leader.id == id)
    }

    // ---------------------------------------------------------------------
    // Team proposition
    // ---------------------------------------------------------------------

    /// Identifiers of the proposed players, in seating order.
    pub fn proposed_ids(&self) -> Vec<String> {
        self.players
            .values()
            .filter(|player| player.is_proposed)
            .map(|player| player.id.clone())
            .collect()
    }

    /// Whether the leader submitted the proposition.
    pub fn is_submitted(&self) -> bool {
        self.is_submitted
    }

    /// Add `id` to the proposed team, or remove it if already there.
    pub fn toggle_teammate_proposition(
        &mut self,
        leader_id: &str,
        id: &str,
    ) -> Result<(), GameError> {
        if !self.ensure_leader(leader_id) {
            return Err(GameError::DeniedTeammateProposition(leader_id.to_string()));
        }

        let player = self
            .players
            .get_mut(id)
            .ok_or_else(|| GameError::PlayerMissing(id.to_string()))?;
        player.is_proposed = !player.is_proposed;
        Ok(())
    }

    /// Clear the proposed team.
    pub fn reset_proposed_teammates(&mut self, leader_id: &str) -> Result<(), GameError> {
        if !self.ensure_leader(leader_id) {
            return Err(GameError::DeniedTeammateProposition(leader_id.to_string()));
        }

        self.clear_proposition();
        Ok(())
    }

    /// Lock in the proposed team once it has exactly `votes_needed` members.
    pub fn submit_team(&mut self, leader_id: &str, votes_needed: usize) -> Result<(), GameError> {
        if !self.ensure_leader(leader_id) {
            return Err(GameError::DeniedTeamSubmission(leader_id.to_string()));
        }

        let actual = self.players.values().filter(|p| p.is_proposed).count();
        if actual != votes_needed {
            return Err(GameError::RequiredCorrectTeammatesAmount {
                expected: votes_needed,
                actual,
            });
        }

        self.is_submitted = true;
        Ok(())
    }

    /// Forget the proposed team and its submission.
    pub fn clear_proposition(&mut self) {
        for player in self.players.values_mut() {
            player.is_proposed = false;
        }
        self.is_submitted = false;
    }

    // ---------------------------------------------------------------------
    // Ballots
    // ---------------------------------------------------------------------

    /// Record a team ballot for any seated player who has not voted in this round.
    pub fn vote_for_team(&mut self, id: &str, value: bool) -> Result<Vote, GameError> {
        let player = self
            .players
            .get_mut(id)
            .ok_or_else(|| GameError::DeniedTeamVoting(id.to_string()))?;

        Self::cast(player, value)
    }

    /// Record a quest ballot for a proposed player who has not voted on this quest.
    pub fn vote_for_quest(&mut self, id: &str, value: bool) -> Result<Vote, GameError> {
        let player = self
            .players
            .get_mut(id)
            .filter(|player| player.is_proposed)
            .ok_or_else(|| GameError::DeniedQuestVoting(id.to_string()))?;

        Self::cast(player, value)
    }

    fn cast(player: &mut Player, value: bool) -> Result<Vote, GameError> {
        if player.vote.is_some() {
            return Err(GameError::AlreadyVoted(player.id.clone()));
        }

        let vote = Vote::new(player.id.clone(), value);
        player.vote = Some(vote.clone());
        Ok(vote)
    }

    /// Whether `id` already cast a ballot in the open phase.
    pub fn has_voted(&self, id: &str) -> bool {
        self.get(id).is_some_and(|player| player.vote.is_some())
    }

    /// Drop every player's ballot.
    pub fn reset_votes(&mut self) {
        for player in self.players.values_mut() {
            player.vote = None;
        }
    }

    // ---------------------------------------------------------------------
    // Assassination
    // ---------------------------------------------------------------------

    /// Player currently designated as the victim.
    pub fn victim_id(&self) -> Option<&str> {
        self.victim_id.as_deref()
    }

    fn is_assassin(&self, id: &str) -> bool {
        self.get(id).is_some_and(|player| player.role.id == ASSASSIN_ROLE)
    }

    /// Designate `victim_id`, or clear it if it is already designated.
    pub fn toggle_victim_proposition(
        &mut self,
        assassin_id: &str,
        victim_id: &str,
    ) -> Result<(), GameError> {
        if !self.is_assassin(assassin_id) {
            return Err(GameError::DeniedVictimProposition(assassin_id.to_string()));
        }
        if assassin_id == victim_id {
            return Err(GameError::DeniedSelfSacrifice);
        }
        self.require(victim_id)?;

        if self.victim_id.as_deref() == Some(victim_id) {
            self.victim_id = None;
        } else {
            self.victim_id = Some(victim_id.to_string());
        }
        Ok(())
    }

    /// Strike the designated victim; `true` when the seer was hit.
    pub fn assassinate(&self, assassin_id: &str) -> Result<bool, GameError> {
        if !self.is_assassin(assassin_id) {
            return Err(GameError::DeniedAssassination(assassin_id.to_string()));
        }

        let victim_id = self.victim_id.as_deref().ok_or(GameError::RequiredVictim)?;
        let victim = self.require(victim_id)?;
        Ok(victim.role.id == SEER_ROLE)
    }
}
