//! The [`ClaimIndex`]: claims by id, claim ids by chunk key.

use std::collections::BTreeMap;

use tracing::debug;

use dominion_types::{Claim, ClaimFlag, ChunkKey, ClaimId, TownId};

use crate::ClaimError;

/// The claim registry holding all claims and their spatial index.
///
/// Provides occupancy and ownership queries, flag mutation, and the
/// permission evaluation described in the crate docs. Insert and remove
/// maintain both internal maps as a single atomic unit.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct ClaimIndex {
    /// All claims indexed by their identifier.
    claims: BTreeMap<ClaimId, Claim>,
    /// Spatial index: chunk key -> claim id.
    by_key: BTreeMap<ChunkKey, ClaimId>,
}

impl ClaimIndex {
    /// Create an empty index.
    pub const fn new() -> Self {
        Self {
            claims: BTreeMap::new(),
            by_key: BTreeMap::new(),
        }
    }

    // -------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------

    /// Get a claim by id.
    pub fn get(&self, id: ClaimId) -> Option<&Claim> {
        self.claims.get(&id)
    }

    /// Get the claim covering `key`, if any.
    pub fn get_at(&self, key: &ChunkKey) -> Option<&Claim> {
        self.by_key.get(key).and_then(|id| self.claims.get(id))
    }

    /// Whether any town has claimed `key`.
    pub fn is_claimed(&self, key: &ChunkKey) -> bool {
        self.by_key.contains_key(key)
    }

    /// The town owning the claim at `key`, if any.
    pub fn town_at(&self, key: &ChunkKey) -> Option<TownId> {
        self.get_at(key).map(Claim::town_id)
    }

    /// Whether `key` is claimed by exactly `town_id`.
    pub fn is_town_claim(&self, key: &ChunkKey, town_id: TownId) -> bool {
        self.town_at(key) == Some(town_id)
    }

    /// Number of claims in the index.
    pub fn len(&self) -> usize {
        self.claims.len()
    }

    /// Whether the index holds no claims.
    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }

    /// Iterate over all claims.
    pub fn iter(&self) -> impl Iterator<Item = &Claim> {
        self.claims.values()
    }

    // -------------------------------------------------------------------
    // Mutation
    // -------------------------------------------------------------------

    /// Insert a claim, registering both the id map and the spatial index.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimError::AlreadyClaimed`] if the chunk is occupied, or
    /// [`ClaimError::DuplicateClaimId`] if the id is already present. On
    /// error neither map changes.
    pub fn insert(&mut self, claim: Claim) -> Result<(), ClaimError> {
        if self.by_key.contains_key(claim.key()) {
            return Err(ClaimError::AlreadyClaimed {
                key: claim.key().clone(),
            });
        }
        if self.claims.contains_key(&claim.id()) {
            return Err(ClaimError::DuplicateClaimId(claim.id()));
        }

        debug!(claim = %claim.id(), key = %claim.key(), town = %claim.town_id(), "claim registered");
        self.by_key.insert(claim.key().clone(), claim.id());
        self.claims.insert(claim.id(), claim);
        Ok(())
    }

    /// Remove a claim by id, deregistering both maps, and return the
    /// removed record.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimError::ClaimNotFound`] if the id is unknown; nothing
    /// changes in that case.
    pub fn remove(&mut self, id: ClaimId) -> Result<Claim, ClaimError> {
        let claim = self.claims.remove(&id).ok_or(ClaimError::ClaimNotFound(id))?;
        self.by_key.remove(claim.key());
        debug!(claim = %id, key = %claim.key(), "claim removed");
        Ok(claim)
    }

    /// Set a flag on a claim.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimError::ClaimNotFound`] if the id is unknown -- the
    /// only way this operation fails.
    pub fn set_flag(
        &mut self,
        id: ClaimId,
        flag: ClaimFlag,
        value: bool,
    ) -> Result<(), ClaimError> {
        let claim = self
            .claims
            .get_mut(&id)
            .ok_or(ClaimError::ClaimNotFound(id))?;
        claim.set_flag(flag, value);
        Ok(())
    }

    // -------------------------------------------------------------------
    // Permission evaluation
    // -------------------------------------------------------------------

    /// Whether a viewer belonging to `viewer_town` may place or break
    /// blocks at `key`.
    ///
    /// Unclaimed chunks allow everyone. Residents of the owning town are
    /// always allowed; everyone else falls through to the `Build` flag.
    pub fn can_build(&self, key: &ChunkKey, viewer_town: Option<TownId>) -> bool {
        self.get_at(key).is_none_or(|claim| {
            viewer_town == Some(claim.town_id()) || claim.flag(ClaimFlag::Build)
        })
    }

    /// Whether a viewer belonging to `viewer_town` may interact with
    /// blocks at `key`.
    ///
    /// Same membership override as [`Self::can_build`], falling through to
    /// the `Interact` flag.
    pub fn can_interact(&self, key: &ChunkKey, viewer_town: Option<TownId>) -> bool {
        self.get_at(key).is_none_or(|claim| {
            viewer_town == Some(claim.town_id()) || claim.flag(ClaimFlag::Interact)
        })
    }

    /// Whether `PvP` combat is allowed at `key`. Flag-only; membership
    /// does not override.
    pub fn is_pvp_allowed(&self, key: &ChunkKey) -> bool {
        self.environmental_flag(key, ClaimFlag::Pvp)
    }

    /// Whether explosions are allowed at `key`.
    pub fn are_explosions_allowed(&self, key: &ChunkKey) -> bool {
        self.environmental_flag(key, ClaimFlag::Explosions)
    }

    /// Whether hostile creatures may spawn at `key`.
    pub fn is_mob_spawning_allowed(&self, key: &ChunkKey) -> bool {
        self.environmental_flag(key, ClaimFlag::MobSpawning)
    }

    /// Whether fire spreads at `key`.
    pub fn is_fire_spread_allowed(&self, key: &ChunkKey) -> bool {
        self.environmental_flag(key, ClaimFlag::FireSpread)
    }

    /// Environmental toggles: unclaimed chunks allow everything, claimed
    /// chunks answer from the flag alone.
    fn environmental_flag(&self, key: &ChunkKey, flag: ClaimFlag) -> bool {
        self.get_at(key).is_none_or(|claim| claim.flag(flag))
    }
}
