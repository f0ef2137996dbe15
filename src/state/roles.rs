//! Role catalog and the fixed visibility graph between roles.

use std::{collections::HashMap, fmt, str::FromStr};

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};

use crate::error::GameError;

/// Side a role plays for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Allegiance {
    /// Loyal servants; win by completing three quests and surviving the assassination.
    Good,
    /// Minions; win by failing three quests or by assassinating the seer.
    Evil,
    /// Placeholder allegiance of the concealed role.
    Unknown,
}

/// Identifier of every role known to the engine.
///
/// Generic roles are numbered so identifiers stay unique within one match.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, SerializeDisplay, DeserializeFromStr,
)]
pub enum RoleId {
    /// Concealed placeholder shown instead of hidden roles.
    Unknown,
    /// The seer; knows evil except Mordred and must stay hidden from the assassin.
    Merlin,
    /// Knows Merlin and Morgana without telling them apart.
    Percival,
    /// Generic loyal servant.
    Servant1,
    /// Generic loyal servant.
    Servant2,
    /// Generic loyal servant.
    Servant3,
    /// Generic loyal servant.
    Servant4,
    /// Generic loyal servant.
    Servant5,
    /// Saboteur leader; decides the final assassination.
    Assassin,
    /// Evil role hidden from Merlin.
    Mordred,
    /// Evil role appearing to Percival as a possible Merlin.
    Morgana,
    /// Evil role unknown to the other evil roles.
    Oberon,
    /// Generic minion.
    Minion1,
    /// Generic minion.
    Minion2,
    /// Generic minion.
    Minion3,
}

/// Generic good roles used to fill the remaining good slots.
pub const SERVANTS: [RoleId; 5] = [
    RoleId::Servant1,
    RoleId::Servant2,
    RoleId::Servant3,
    RoleId::Servant4,
    RoleId::Servant5,
];

/// Generic evil roles used to fill the remaining evil slots.
pub const MINIONS: [RoleId; 3] = [RoleId::Minion1, RoleId::Minion2, RoleId::Minion3];

impl RoleId {
    /// Every identifier, in declaration order.
    pub const ALL: [RoleId; 15] = [
        RoleId::Unknown,
        RoleId::Merlin,
        RoleId::Percival,
        RoleId::Servant1,
        RoleId::Servant2,
        RoleId::Servant3,
        RoleId::Servant4,
        RoleId::Servant5,
        RoleId::Assassin,
        RoleId::Mordred,
        RoleId::Morgana,
        RoleId::Oberon,
        RoleId::Minion1,
        RoleId::Minion2,
        RoleId::Minion3,
    ];

    /// Kebab-case identifier used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleId::Unknown => "unknown",
            RoleId::Merlin => "merlin",
            RoleId::Percival => "percival",
            RoleId::Servant1 => "servant-1",
            RoleId::Servant2 => "servant-2",
            RoleId::Servant3 => "servant-3",
            RoleId::Servant4 => "servant-4",
            RoleId::Servant5 => "servant-5",
            RoleId::Assassin => "assassin",
            RoleId::Mordred => "mordred",
            RoleId::Morgana => "morgana",
            RoleId::Oberon => "oberon",
            RoleId::Minion1 => "minion-1",
            RoleId::Minion2 => "minion-2",
            RoleId::Minion3 => "minion-3",
        }
    }

    /// Whether the role can be explicitly requested when the match starts.
    pub fn is_selectable(&self) -> bool {
        matches!(
            self,
            RoleId::Merlin
                | RoleId::Percival
                | RoleId::Assassin
                | RoleId::Mordred
                | RoleId::Morgana
                | RoleId::Oberon
        )
    }
}

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoleId {
    type Err = GameError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        RoleId::ALL
            .into_iter()
            .find(|id| id.as_str() == value)
            .ok_or_else(|| GameError::UnknownRole(value.to_string()))
    }
}

/// Immutable description of a role and the roles it may observe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    /// Catalog identifier.
    pub id: RoleId,
    /// Display name.
    pub name: String,
    /// Short rules summary shown to the holder.
    pub description: String,
    /// Side the role plays for.
    pub allegiance: Allegiance,
    visible: IndexSet<RoleId>,
}

impl Role {
    fn new(
        id: RoleId,
        name: &str,
        description: &str,
        allegiance: Allegiance,
        visible: &[RoleId],
    ) -> Self {
        Self {
            id,
            name: name.to_string(),
            description: description.to_string(),
            allegiance,
            visible: visible.iter().copied().collect(),
        }
    }

    /// The concealed placeholder every player holds before roles are dealt.
    pub fn unknown() -> Self {
        Self::new(
            RoleId::Unknown,
            "Unknown",
            "The role of this player is hidden from you.",
            Allegiance::Unknown,
            &[],
        )
    }

    /// Whether a holder of this role may observe the holder of `subject`.
    ///
    /// Self-visibility always holds.
    pub fn can_see(&self, subject: &Role) -> bool {
        self.id == subject.id || self.visible.contains(&subject.id)
    }

    /// Role identifiers this role observes.
    pub fn visible_roles(&self) -> impl Iterator<Item = RoleId> + '_ {
        self.visible.iter().copied()
    }
}

/// Static lookup from role identifier to role definition.
#[derive(Debug, Clone)]
pub struct RoleCatalog {
    roles: HashMap<RoleId, Role>,
}

impl Default for RoleCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl RoleCatalog {
    /// Build a catalog from arbitrary role definitions.
    pub fn new(roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            roles: roles.into_iter().map(|role| (role.id, role)).collect(),
        }
    }

    /// The classic rule set.
    pub fn standard() -> Self {
        use RoleId::*;

        let mut roles = vec![
            Role::unknown(),
            Role::new(
                Merlin,
                "Merlin",
                "Knows the minions of Mordred, except Mordred himself. Must stay hidden from the assassin.",
                Allegiance::Good,
                &[Assassin, Morgana, Oberon, Minion1, Minion2, Minion3],
            ),
            Role::new(
                Percival,
                "Percival",
                "Sees Merlin and Morgana, without knowing which is which.",
                Allegiance::Good,
                &[Merlin, Morgana],
            ),
            Role::new(
                Assassin,
                "Assassin",
                "Leads the minions. Gets one chance to name Merlin once three quests succeed.",
                Allegiance::Evil,
                &[Mordred, Morgana, Minion1, Minion2, Minion3],
            ),
            Role::new(
                Mordred,
                "Mordred",
                "Hidden from Merlin. Knows the other minions.",
                Allegiance::Evil,
                &[Assassin, Morgana, Minion1, Minion2, Minion3],
            ),
            Role::new(
                Morgana,
                "Morgana",
                "Appears as Merlin to Percival. Knows the other minions.",
                Allegiance::Evil,
                &[Assassin, Mordred, Minion1, Minion2, Minion3],
            ),
            Role::new(
                Oberon,
                "Oberon",
                "Works alone: neither knows the other minions nor is known by them.",
                Allegiance::Evil,
                &[],
            ),
        ];

        roles.extend(SERVANTS.into_iter().enumerate().map(|(index, id)| {
            Role::new(
                id,
                &format!("Loyal Servant {}", index + 1),
                "Knows nothing but their own loyalty to Arthur.",
                Allegiance::Good,
                &[],
            )
        }));

        roles.extend(MINIONS.into_iter().enumerate().map(|(index, id)| {
            let mut visible = vec![Assassin, Mordred, Morgana];
            visible.extend(MINIONS.into_iter().filter(|other| *other != id));
            Role::new(
                id,
                &format!("Minion of Mordred {}", index + 1),
                "Knows the other minions, except Oberon.",
                Allegiance::Evil,
                &visible,
            )
        }));

        Self::new(roles)
    }

    /// Look a role up by identifier.
    pub fn get(&self, id: RoleId) -> Result<&Role, GameError> {
        self.roles
            .get(&id)
            .ok_or_else(|| GameError::UnknownRole(id.to_string()))
    }

    /// Look a role up by its wire identifier.
    pub fn find(&self, id: &str) -> Result<&Role, GameError> {
        self.get(id.parse()?)
    }
}
