use indexmap::IndexSet;
use rand::{Rng, seq::SliceRandom};

use crate::{
    error::GameError,
    state::{
        preset::LevelPreset,
        roles::{Allegiance, MINIONS, Role, RoleCatalog, RoleId, SERVANTS},
        roster::{ASSASSIN_ROLE, SEER_ROLE},
    },
};

/// Turns a requested role subset into one unique role per player.
pub struct RoleAssigner<'a> {
    catalog: &'a RoleCatalog,
    preset: &'a LevelPreset,
}

impl<'a> RoleAssigner<'a> {
    /// Prepare an assignment for `preset` using definitions from `catalog`.
    pub fn new(catalog: &'a RoleCatalog, preset: &'a LevelPreset) -> Self {
        Self { catalog, preset }
    }

    /// Build the shuffled role deck.
    ///
    /// The seer and the assassin are always dealt. Remaining good slots are
    /// filled with servants and remaining evil slots with minions, both drawn
    /// at random from their pools.
    pub fn deal<R: Rng + ?Sized>(
        &self,
        requested: &[RoleId],
        rng: &mut R,
    ) -> Result<Vec<Role>, GameError> {
        let mut special: IndexSet<RoleId> = IndexSet::from([SEER_ROLE, ASSASSIN_ROLE]);
        for id in requested {
            if !id.is_selectable() {
                return Err(GameError::RoleNotSelectable(id.to_string()));
            }
            special.insert(*id);
        }

        let mut roles = special
            .into_iter()
            .map(|id| self.catalog.get(id).cloned())
            .collect::<Result<Vec<_>, _>>()?;

        let good = roles
            .iter()
            .filter(|role| role.allegiance == Allegiance::Good)
            .count();
        let evil = roles.len() - good;
        if good > self.preset.good_count || evil > self.preset.evil_count {
            return Err(GameError::RolesAmountIncorrect {
                good,
                evil,
                good_slots: self.preset.good_count,
                evil_slots: self.preset.evil_count,
            });
        }

        roles.extend(self.fill(&SERVANTS, self.preset.good_count - good, rng)?);
        roles.extend(self.fill(&MINIONS, self.preset.evil_count - evil, rng)?);
        roles.shuffle(rng);

        Ok(roles)
    }

    fn fill<R: Rng + ?Sized>(
        &self,
        pool: &[RoleId],
        count: usize,
        rng: &mut R,
    ) -> Result<Vec<Role>, GameError> {
        if count > pool.len() {
            return Err(GameError::InvalidState(format!(
                "{count} generic roles needed but the pool holds {}",
                pool.len()
            )));
        }

        let mut pool = pool.to_vec();
        pool.shuffle(rng);
        pool.truncate(count);
        pool.into_iter()
            .map(|id| self.catalog.get(id).cloned())
            .collect()
    }
}
