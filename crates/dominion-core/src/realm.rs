//! The [`Realm`]: the coordinating service over all four registries.
//!
//! Every operation that touches more than one registry -- founding and
//! deleting towns and nations, membership movement, claim grant and
//! revocation -- runs entirely inside a single `&mut self` method here.
//! Registries expose no public path that mutates one side of a
//! bidirectional relationship alone, so the cross-referencing invariants
//! (resident.town agrees with town.residents, claim index agrees with
//! town.claims, nation.towns agrees with town.nation) hold between any two
//! public calls.
//!
//! # Veto ordering
//!
//! Cancellable operations consult their [`RealmHooks`] callback after all
//! precondition checks and *before the first mutation*. A veto therefore
//! fails the operation with untouched state -- there is no rollback path
//! because there is nothing to roll back.
//!
//! # Concurrency
//!
//! The realm is deliberately not `Sync`-clever: all mutation is `&mut
//! self`, which makes the one-logical-mutation-at-a-time discipline a
//! compile-time property. Callers that need sharing wrap the whole realm
//! in their own lock.

use rust_decimal::Decimal;
use tracing::{debug, info};

use dominion_claims::{ClaimError, ClaimIndex};
use dominion_types::{
    Claim, ChunkKey, ClaimFlag, ClaimId, Nation, NationId, NationRole, ResidentId, SpawnPoint,
    Town, TownId, TownRole,
};

use crate::config::{ClaimSettings, PayPriority};
use crate::economy::CurrencyProvider;
use crate::error::RealmError;
use crate::hooks::{AllowAll, RealmHooks};
use crate::nation::NationRegistry;
use crate::resident::ResidentRegistry;
use crate::town::TownRegistry;

/// The authority core: registries, claim index, policy hooks, and claim
/// cost settings, coordinated behind one mutation discipline.
pub struct Realm {
    pub(crate) residents: ResidentRegistry,
    pub(crate) towns: TownRegistry,
    pub(crate) nations: NationRegistry,
    pub(crate) claims: ClaimIndex,
    hooks: Box<dyn RealmHooks>,
    claim_settings: ClaimSettings,
}

impl core::fmt::Debug for Realm {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Realm")
            .field("residents", &self.residents.len())
            .field("towns", &self.towns.len())
            .field("nations", &self.nations.len())
            .field("claims", &self.claims.len())
            .finish_non_exhaustive()
    }
}

impl Default for Realm {
    fn default() -> Self {
        Self::new()
    }
}

impl Realm {
    /// Create an empty realm with allow-all hooks and default claim
    /// settings.
    pub fn new() -> Self {
        Self::with_hooks(Box::new(AllowAll))
    }

    /// Create an empty realm with the given policy hooks.
    pub fn with_hooks(hooks: Box<dyn RealmHooks>) -> Self {
        Self {
            residents: ResidentRegistry::new(),
            towns: TownRegistry::new(),
            nations: NationRegistry::new(),
            claims: ClaimIndex::new(),
            hooks,
            claim_settings: ClaimSettings::default(),
        }
    }

    /// Replace the paid-claim settings.
    pub fn set_claim_settings(&mut self, settings: ClaimSettings) {
        self.claim_settings = settings;
    }

    // -------------------------------------------------------------------
    // Registry access
    // -------------------------------------------------------------------

    /// The resident registry, read-only.
    pub const fn residents(&self) -> &ResidentRegistry {
        &self.residents
    }

    /// The resident registry with its safe public mutators (creation,
    /// chat toggles, last-active stamping, eviction).
    pub fn residents_mut(&mut self) -> &mut ResidentRegistry {
        &mut self.residents
    }

    /// The town registry, read-only.
    pub const fn towns(&self) -> &TownRegistry {
        &self.towns
    }

    /// The town registry with its safe public mutators (bank, tax rate,
    /// visibility).
    pub fn towns_mut(&mut self) -> &mut TownRegistry {
        &mut self.towns
    }

    /// The nation registry, read-only.
    pub const fn nations(&self) -> &NationRegistry {
        &self.nations
    }

    /// The nation registry with its safe public mutators.
    pub fn nations_mut(&mut self) -> &mut NationRegistry {
        &mut self.nations
    }

    /// The claim index, read-only. All index mutation goes through the
    /// claim operations below so the town claim sets stay in lockstep.
    pub const fn claims(&self) -> &ClaimIndex {
        &self.claims
    }

    // -------------------------------------------------------------------
    // Town operations
    // -------------------------------------------------------------------

    /// Found a town with `founder_id` as owner and sole member.
    ///
    /// # Errors
    ///
    /// Fails if the name is taken (case-insensitive), the founder is
    /// unknown or already in a town, or the town-create hook vetoes.
    pub fn create_town(
        &mut self,
        name: &str,
        founder_id: ResidentId,
    ) -> Result<TownId, RealmError> {
        if self.towns.name_taken(name) {
            return Err(RealmError::NameTaken {
                name: name.to_owned(),
            });
        }
        let founder = self
            .residents
            .get(founder_id)
            .ok_or(RealmError::ResidentNotFound(founder_id))?;
        if founder.has_town() {
            return Err(RealmError::AlreadyInTown(founder_id));
        }

        let town = Town::new(TownId::new(), name, founder_id);
        if !self.hooks.town_create(&town, founder_id) {
            return Err(RealmError::Vetoed {
                hook: "town-create",
            });
        }

        let town_id = town.id();
        self.residents
            .add_to_town(founder_id, town_id, TownRole::Owner)?;
        self.towns.insert(town)?;

        info!(town = %town_id, name, founder = %founder_id, "town created");
        Ok(town_id)
    }

    /// Delete a town, cascading through nation membership, residents, and
    /// claims.
    ///
    /// If the town is a nation's capital the whole nation is deleted with
    /// it; otherwise the town is released from its nation and its members
    /// leave the nation alongside the town. Every member's town state is
    /// reset and every claim is revoked.
    ///
    /// # Errors
    ///
    /// Fails if the town is unknown, the town-delete hook vetoes, or -- for
    /// capitals -- the nation-delete hook vetoes the cascade. A vetoed
    /// cascade aborts the whole deletion with nothing changed.
    pub fn delete_town(
        &mut self,
        town_id: TownId,
        actor: Option<ResidentId>,
    ) -> Result<(), RealmError> {
        let town = self
            .towns
            .get(town_id)
            .ok_or(RealmError::TownNotFound(town_id))?;
        if !self.hooks.town_delete(town, actor) {
            return Err(RealmError::Vetoed {
                hook: "town-delete",
            });
        }

        // Pre-check the cascade so a veto can still abort cleanly.
        let nation_id = town.nation_id;
        let deletes_nation = match nation_id.and_then(|id| self.nations.get(id)) {
            Some(nation) if nation.capital_id() == town_id => {
                if !self.hooks.nation_delete(nation, actor) {
                    return Err(RealmError::Vetoed {
                        hook: "nation-delete",
                    });
                }
                true
            }
            _ => false,
        };

        // Commit. Nation side first so resident nation state is settled
        // before town teardown.
        if let Some(nation_id) = nation_id {
            if deletes_nation {
                self.delete_nation_unchecked(nation_id);
            } else {
                self.release_town_from_nation(nation_id, town_id);
            }
        }

        let Some(town) = self.towns.remove(town_id) else {
            return Err(RealmError::TownNotFound(town_id));
        };
        for resident_id in town.residents() {
            if let Some(resident) = self.residents.get_mut(*resident_id) {
                resident.leave_town();
            }
        }
        for claim_id in town.claims() {
            self.claims.remove(*claim_id).ok();
        }

        info!(town = %town_id, name = town.name(), "town deleted");
        Ok(())
    }

    /// Add a resident to a town as a Member.
    ///
    /// # Errors
    ///
    /// Fails if either side is unknown or the resident already has a town.
    pub fn join_town(
        &mut self,
        town_id: TownId,
        resident_id: ResidentId,
    ) -> Result<(), RealmError> {
        let resident = self
            .residents
            .get(resident_id)
            .ok_or(RealmError::ResidentNotFound(resident_id))?;
        if resident.has_town() {
            return Err(RealmError::AlreadyInTown(resident_id));
        }
        let town = self
            .towns
            .get_mut(town_id)
            .ok_or(RealmError::TownNotFound(town_id))?;

        town.add_resident(resident_id);
        self.residents
            .add_to_town(resident_id, town_id, TownRole::Member)?;

        debug!(town = %town_id, resident = %resident_id, "resident joined town");
        Ok(())
    }

    /// Remove a resident from a town (leave or kick).
    ///
    /// # Errors
    ///
    /// Fails if the resident is not in this town, or is the owner -- owners
    /// only leave via ownership transfer or town deletion.
    pub fn remove_resident_from_town(
        &mut self,
        town_id: TownId,
        resident_id: ResidentId,
    ) -> Result<(), RealmError> {
        let resident = self
            .residents
            .get(resident_id)
            .ok_or(RealmError::ResidentNotFound(resident_id))?;
        if resident.town_id != Some(town_id) {
            return Err(RealmError::NotInTown(resident_id));
        }
        let town = self
            .towns
            .get_mut(town_id)
            .ok_or(RealmError::TownNotFound(town_id))?;
        if town.owner_id() == resident_id {
            return Err(RealmError::CannotRemoveOwner(resident_id));
        }

        town.remove_resident(resident_id);
        self.residents.remove_from_town(resident_id)?;

        debug!(town = %town_id, resident = %resident_id, "resident left town");
        Ok(())
    }

    /// Promote `target_id` one town rank on behalf of `actor_id`.
    ///
    /// The actor must hold Mayor or better, strictly outrank the target,
    /// and share the target's town. Nobody is promoted into Owner here --
    /// that is [`Self::transfer_town_ownership`].
    ///
    /// # Errors
    ///
    /// Policy violations and hook vetoes leave the roles untouched.
    pub fn promote_resident(
        &mut self,
        actor_id: ResidentId,
        target_id: ResidentId,
    ) -> Result<TownRole, RealmError> {
        let (town_id, from) = self.check_town_rank_change(actor_id, target_id)?;
        if from == TownRole::Mayor {
            return Err(RealmError::TopRankTransferOnly);
        }
        let to = from
            .successor()
            .ok_or(RealmError::AtRoleCeiling(target_id))?;

        let town = self
            .towns
            .get(town_id)
            .ok_or(RealmError::TownNotFound(town_id))?;
        let target = self
            .residents
            .get(target_id)
            .ok_or(RealmError::ResidentNotFound(target_id))?;
        if !self.hooks.town_promote(town, target, from, to, actor_id) {
            return Err(RealmError::Vetoed {
                hook: "town-promote",
            });
        }

        self.residents.promote_town_role(target_id)
    }

    /// Demote `target_id` one town rank on behalf of `actor_id`.
    ///
    /// Same permission rule as promotion. Owners cannot be demoted (nobody
    /// outranks them); Members are already at the floor.
    pub fn demote_resident(
        &mut self,
        actor_id: ResidentId,
        target_id: ResidentId,
    ) -> Result<TownRole, RealmError> {
        let (town_id, from) = self.check_town_rank_change(actor_id, target_id)?;
        let to = from.predecessor().ok_or(RealmError::AtRoleFloor(target_id))?;

        let town = self
            .towns
            .get(town_id)
            .ok_or(RealmError::TownNotFound(town_id))?;
        let target = self
            .residents
            .get(target_id)
            .ok_or(RealmError::ResidentNotFound(target_id))?;
        if !self.hooks.town_demote(town, target, from, to, actor_id) {
            return Err(RealmError::Vetoed {
                hook: "town-demote",
            });
        }

        self.residents.demote_town_role(target_id)
    }

    /// Shared validation for town promote/demote: both residents exist,
    /// share a town, and the actor is Mayor+ strictly outranking the
    /// target. Returns the town and the target's current role.
    fn check_town_rank_change(
        &self,
        actor_id: ResidentId,
        target_id: ResidentId,
    ) -> Result<(TownId, TownRole), RealmError> {
        let actor = self
            .residents
            .get(actor_id)
            .ok_or(RealmError::ResidentNotFound(actor_id))?;
        let target = self
            .residents
            .get(target_id)
            .ok_or(RealmError::ResidentNotFound(target_id))?;
        let town_id = actor.town_id.ok_or(RealmError::NotInTown(actor_id))?;
        if target.town_id != Some(town_id) {
            return Err(RealmError::NotInTown(target_id));
        }
        if !actor.town_role.is_at_least(TownRole::Mayor)
            || actor.town_role.level() <= target.town_role.level()
        {
            return Err(RealmError::InsufficientRank(actor_id));
        }
        Ok((town_id, target.town_role))
    }

    /// Transfer town ownership from `current_owner_id` to `new_owner_id`.
    ///
    /// Atomic swap: the incoming owner takes the Owner role, the outgoing
    /// owner drops to Mayor, and the town record's owner changes -- all in
    /// one operation.
    ///
    /// # Errors
    ///
    /// Fails unless both residents share the town, the current owner
    /// actually owns it, and the new owner is already a member.
    pub fn transfer_town_ownership(
        &mut self,
        current_owner_id: ResidentId,
        new_owner_id: ResidentId,
    ) -> Result<(), RealmError> {
        let current = self
            .residents
            .get(current_owner_id)
            .ok_or(RealmError::ResidentNotFound(current_owner_id))?;
        let incoming = self
            .residents
            .get(new_owner_id)
            .ok_or(RealmError::ResidentNotFound(new_owner_id))?;
        let town_id = current
            .town_id
            .ok_or(RealmError::NotInTown(current_owner_id))?;
        if incoming.town_id != Some(town_id) {
            return Err(RealmError::NotInTown(new_owner_id));
        }

        let town = self
            .towns
            .get_mut(town_id)
            .ok_or(RealmError::TownNotFound(town_id))?;
        if town.owner_id() != current_owner_id {
            return Err(RealmError::NotTownOwner(current_owner_id));
        }
        if !town.transfer_ownership(new_owner_id) {
            return Err(RealmError::NotInTown(new_owner_id));
        }

        if let Some(outgoing) = self.residents.get_mut(current_owner_id) {
            outgoing.town_role = TownRole::Mayor;
        }
        if let Some(incoming) = self.residents.get_mut(new_owner_id) {
            incoming.town_role = TownRole::Owner;
        }

        info!(town = %town_id, from = %current_owner_id, to = %new_owner_id, "town ownership transferred");
        Ok(())
    }

    /// Set a town's spawn point.
    ///
    /// # Errors
    ///
    /// Fails with [`RealmError::SpawnOutsideClaims`] unless the point falls
    /// inside a chunk claimed by this town.
    pub fn set_town_spawn(
        &mut self,
        town_id: TownId,
        spawn: SpawnPoint,
    ) -> Result<(), RealmError> {
        if self.towns.get(town_id).is_none() {
            return Err(RealmError::TownNotFound(town_id));
        }
        if !self.claims.is_town_claim(&spawn.chunk_key(), town_id) {
            return Err(RealmError::SpawnOutsideClaims);
        }
        if let Some(town) = self.towns.get_mut(town_id) {
            town.spawn = Some(spawn);
        }
        Ok(())
    }

    // -------------------------------------------------------------------
    // Nation operations
    // -------------------------------------------------------------------

    /// Found a nation with `capital_town_id` as capital.
    ///
    /// The founder must own the capital town; they become King and every
    /// other capital resident becomes a nation Member.
    ///
    /// # Errors
    ///
    /// Fails if the name is taken, the capital is unknown or already in a
    /// nation, the founder does not own it, or the nation-create hook
    /// vetoes.
    pub fn create_nation(
        &mut self,
        name: &str,
        capital_town_id: TownId,
        founder_id: ResidentId,
    ) -> Result<NationId, RealmError> {
        if self.nations.name_taken(name) {
            return Err(RealmError::NameTaken {
                name: name.to_owned(),
            });
        }
        let capital = self
            .towns
            .get(capital_town_id)
            .ok_or(RealmError::TownNotFound(capital_town_id))?;
        if capital.has_nation() {
            return Err(RealmError::TownAlreadyInNation(capital_town_id));
        }
        if capital.owner_id() != founder_id {
            return Err(RealmError::NotTownOwner(founder_id));
        }
        let member_ids: Vec<ResidentId> = capital.residents().iter().copied().collect();

        let nation = Nation::new(NationId::new(), name, capital_town_id, founder_id);
        if !self.hooks.nation_create(&nation, founder_id) {
            return Err(RealmError::Vetoed {
                hook: "nation-create",
            });
        }

        let nation_id = nation.id();
        self.nations.insert(nation)?;
        if let Some(town) = self.towns.get_mut(capital_town_id) {
            town.nation_id = Some(nation_id);
        }
        for resident_id in member_ids {
            let role = if resident_id == founder_id {
                NationRole::King
            } else {
                NationRole::Member
            };
            // Evicted (offline) members are skipped; their nation state is
            // settled when they are next loaded.
            self.residents.add_to_nation(resident_id, nation_id, role).ok();
        }

        info!(nation = %nation_id, name, capital = %capital_town_id, founder = %founder_id, "nation founded");
        Ok(nation_id)
    }

    /// Delete a nation, releasing every member town and their residents.
    ///
    /// # Errors
    ///
    /// Fails if the nation is unknown or the nation-delete hook vetoes.
    pub fn delete_nation(
        &mut self,
        nation_id: NationId,
        actor: Option<ResidentId>,
    ) -> Result<(), RealmError> {
        let nation = self
            .nations
            .get(nation_id)
            .ok_or(RealmError::NationNotFound(nation_id))?;
        if !self.hooks.nation_delete(nation, actor) {
            return Err(RealmError::Vetoed {
                hook: "nation-delete",
            });
        }
        self.delete_nation_unchecked(nation_id);
        Ok(())
    }

    /// Commit half of nation deletion: release every member town and the
    /// residents that belonged to the nation, then drop the record. The
    /// caller has already passed the hook check.
    fn delete_nation_unchecked(&mut self, nation_id: NationId) {
        let Some(nation) = self.nations.remove(nation_id) else {
            return;
        };
        for town_id in nation.towns() {
            self.release_town_members_from_nation(nation_id, *town_id);
            if let Some(town) = self.towns.get_mut(*town_id) {
                town.nation_id = None;
            }
        }
        info!(nation = %nation_id, name = nation.name(), "nation deleted");
    }

    /// Release one town (and its nation-member residents) from a nation
    /// that continues to exist.
    fn release_town_from_nation(&mut self, nation_id: NationId, town_id: TownId) {
        if let Some(nation) = self.nations.get_mut(nation_id) {
            nation.remove_town(town_id);
        }
        if let Some(town) = self.towns.get_mut(town_id) {
            town.nation_id = None;
        }
        self.release_town_members_from_nation(nation_id, town_id);
    }

    /// Reset nation membership for every resident of `town_id` that
    /// belongs to `nation_id`.
    fn release_town_members_from_nation(&mut self, nation_id: NationId, town_id: TownId) {
        let member_ids: Vec<ResidentId> = self
            .towns
            .get(town_id)
            .map(|town| town.residents().iter().copied().collect())
            .unwrap_or_default();
        for resident_id in member_ids {
            if let Some(resident) = self.residents.get_mut(resident_id) {
                if resident.nation_id == Some(nation_id) {
                    resident.leave_nation();
                }
            }
        }
    }

    /// Add a town to a nation; every town resident joins as a nation
    /// Member.
    ///
    /// # Errors
    ///
    /// Fails if either side is unknown or the town already has a nation.
    pub fn add_town_to_nation(
        &mut self,
        nation_id: NationId,
        town_id: TownId,
    ) -> Result<(), RealmError> {
        if self.nations.get(nation_id).is_none() {
            return Err(RealmError::NationNotFound(nation_id));
        }
        let town = self
            .towns
            .get(town_id)
            .ok_or(RealmError::TownNotFound(town_id))?;
        if town.has_nation() {
            return Err(RealmError::TownAlreadyInNation(town_id));
        }
        let member_ids: Vec<ResidentId> = town.residents().iter().copied().collect();

        if let Some(nation) = self.nations.get_mut(nation_id) {
            nation.add_town(town_id);
        }
        if let Some(town) = self.towns.get_mut(town_id) {
            town.nation_id = Some(nation_id);
        }
        for resident_id in member_ids {
            self.residents
                .add_to_nation(resident_id, nation_id, NationRole::Member)
                .ok();
        }

        info!(nation = %nation_id, town = %town_id, "town joined nation");
        Ok(())
    }

    /// Remove a town from a nation (leave or kick). The capital can never
    /// be removed; delete the nation or move the capital first.
    pub fn remove_town_from_nation(
        &mut self,
        nation_id: NationId,
        town_id: TownId,
    ) -> Result<(), RealmError> {
        let nation = self
            .nations
            .get(nation_id)
            .ok_or(RealmError::NationNotFound(nation_id))?;
        let town = self
            .towns
            .get(town_id)
            .ok_or(RealmError::TownNotFound(town_id))?;
        if town.nation_id != Some(nation_id) {
            return Err(RealmError::TownNotInNation(town_id));
        }
        if nation.capital_id() == town_id {
            return Err(RealmError::CannotRemoveCapital(town_id));
        }

        self.release_town_from_nation(nation_id, town_id);

        info!(nation = %nation_id, town = %town_id, "town left nation");
        Ok(())
    }

    /// Move a nation's capital to another member town.
    ///
    /// # Errors
    ///
    /// Fails unless the new capital is already a member of this nation.
    pub fn change_capital(
        &mut self,
        nation_id: NationId,
        new_capital_id: TownId,
    ) -> Result<(), RealmError> {
        let town = self
            .towns
            .get(new_capital_id)
            .ok_or(RealmError::TownNotFound(new_capital_id))?;
        if town.nation_id != Some(nation_id) {
            return Err(RealmError::TownNotInNation(new_capital_id));
        }
        let nation = self
            .nations
            .get_mut(nation_id)
            .ok_or(RealmError::NationNotFound(nation_id))?;
        if !nation.change_capital(new_capital_id) {
            return Err(RealmError::TownNotInNation(new_capital_id));
        }

        info!(nation = %nation_id, capital = %new_capital_id, "capital changed");
        Ok(())
    }

    /// Transfer nation leadership from `current_leader_id` to
    /// `new_leader_id`: the incoming leader becomes King, the outgoing one
    /// drops to Officer.
    pub fn transfer_nation_leadership(
        &mut self,
        current_leader_id: ResidentId,
        new_leader_id: ResidentId,
    ) -> Result<(), RealmError> {
        let current = self
            .residents
            .get(current_leader_id)
            .ok_or(RealmError::ResidentNotFound(current_leader_id))?;
        let incoming = self
            .residents
            .get(new_leader_id)
            .ok_or(RealmError::ResidentNotFound(new_leader_id))?;
        let nation_id = current
            .nation_id
            .ok_or(RealmError::NotInNation(current_leader_id))?;
        if incoming.nation_id != Some(nation_id) {
            return Err(RealmError::NotInNation(new_leader_id));
        }

        let nation = self
            .nations
            .get_mut(nation_id)
            .ok_or(RealmError::NationNotFound(nation_id))?;
        if nation.leader_id() != current_leader_id {
            return Err(RealmError::NotNationLeader(current_leader_id));
        }
        nation.set_leader(new_leader_id);

        if let Some(outgoing) = self.residents.get_mut(current_leader_id) {
            outgoing.nation_role = NationRole::Officer;
        }
        if let Some(incoming) = self.residents.get_mut(new_leader_id) {
            incoming.nation_role = NationRole::King;
        }

        info!(nation = %nation_id, from = %current_leader_id, to = %new_leader_id, "nation leadership transferred");
        Ok(())
    }

    /// Promote `target_id` one nation rank on behalf of `actor_id`.
    ///
    /// Officer+ required, strict outranking, same nation; nobody is
    /// promoted into King here -- that is
    /// [`Self::transfer_nation_leadership`].
    pub fn promote_nation_resident(
        &mut self,
        actor_id: ResidentId,
        target_id: ResidentId,
    ) -> Result<NationRole, RealmError> {
        let (nation_id, from) = self.check_nation_rank_change(actor_id, target_id)?;
        if from == NationRole::Officer {
            return Err(RealmError::TopRankTransferOnly);
        }
        let to = from
            .successor()
            .ok_or(RealmError::AtRoleCeiling(target_id))?;

        let nation = self
            .nations
            .get(nation_id)
            .ok_or(RealmError::NationNotFound(nation_id))?;
        let target = self
            .residents
            .get(target_id)
            .ok_or(RealmError::ResidentNotFound(target_id))?;
        if !self.hooks.nation_promote(nation, target, from, to, actor_id) {
            return Err(RealmError::Vetoed {
                hook: "nation-promote",
            });
        }

        self.residents.promote_nation_role(target_id)
    }

    /// Demote `target_id` one nation rank on behalf of `actor_id`.
    pub fn demote_nation_resident(
        &mut self,
        actor_id: ResidentId,
        target_id: ResidentId,
    ) -> Result<NationRole, RealmError> {
        let (nation_id, from) = self.check_nation_rank_change(actor_id, target_id)?;
        let to = from.predecessor().ok_or(RealmError::AtRoleFloor(target_id))?;

        let nation = self
            .nations
            .get(nation_id)
            .ok_or(RealmError::NationNotFound(nation_id))?;
        let target = self
            .residents
            .get(target_id)
            .ok_or(RealmError::ResidentNotFound(target_id))?;
        if !self.hooks.nation_demote(nation, target, from, to, actor_id) {
            return Err(RealmError::Vetoed {
                hook: "nation-demote",
            });
        }

        self.residents.demote_nation_role(target_id)
    }

    /// Shared validation for nation promote/demote.
    fn check_nation_rank_change(
        &self,
        actor_id: ResidentId,
        target_id: ResidentId,
    ) -> Result<(NationId, NationRole), RealmError> {
        let actor = self
            .residents
            .get(actor_id)
            .ok_or(RealmError::ResidentNotFound(actor_id))?;
        let target = self
            .residents
            .get(target_id)
            .ok_or(RealmError::ResidentNotFound(target_id))?;
        let nation_id = actor.nation_id.ok_or(RealmError::NotInNation(actor_id))?;
        if target.nation_id != Some(nation_id) {
            return Err(RealmError::NotInNation(target_id));
        }
        if !actor.nation_role.is_at_least(NationRole::Officer)
            || actor.nation_role.level() <= target.nation_role.level()
        {
            return Err(RealmError::InsufficientRank(actor_id));
        }
        Ok((nation_id, target.nation_role))
    }

    /// Set a nation's spawn point. The point must sit inside a claim owned
    /// by one of the nation's member towns.
    pub fn set_nation_spawn(
        &mut self,
        nation_id: NationId,
        spawn: SpawnPoint,
    ) -> Result<(), RealmError> {
        if self.nations.get(nation_id).is_none() {
            return Err(RealmError::NationNotFound(nation_id));
        }
        let owning_town = self
            .claims
            .town_at(&spawn.chunk_key())
            .ok_or(RealmError::SpawnOutsideClaims)?;
        let in_nation = self
            .towns
            .get(owning_town)
            .is_some_and(|town| town.nation_id == Some(nation_id));
        if !in_nation {
            return Err(RealmError::SpawnOutsideClaims);
        }
        if let Some(nation) = self.nations.get_mut(nation_id) {
            nation.spawn = Some(spawn);
        }
        Ok(())
    }

    // -------------------------------------------------------------------
    // Claim operations
    // -------------------------------------------------------------------

    /// Claim a chunk for a town with no cost applied.
    ///
    /// The claim registers in the spatial index and the town's claim set
    /// as one atomic unit: validation and the hook check complete before
    /// either side mutates, and the two insertions cannot fail once they
    /// begin.
    ///
    /// # Errors
    ///
    /// Fails if the chunk is occupied, the town is at its derived claim
    /// limit, the actor is not a Knight+ member of that town, or the
    /// claim-added hook vetoes.
    pub fn claim_chunk(
        &mut self,
        key: ChunkKey,
        town_id: TownId,
        actor_id: ResidentId,
    ) -> Result<ClaimId, RealmError> {
        let claim = self.validate_claim(key, town_id, actor_id)?;
        if !self.hooks.claim_added(&claim, actor_id) {
            return Err(RealmError::Vetoed {
                hook: "claim-added",
            });
        }
        self.commit_claim(claim)
    }

    /// Claim a chunk, charging the configured cost beyond the free
    /// allowance.
    ///
    /// The first `free_claims` chunks per town are free. Past that, the
    /// flat `claim_cost` is taken from the town bank or the actor's
    /// wallet, in the configured priority order. Nothing mutates -- no
    /// charge, no claim -- unless the whole operation goes through.
    ///
    /// # Errors
    ///
    /// As [`Self::claim_chunk`], plus [`RealmError::CannotAfford`] when
    /// neither funding source covers the cost.
    pub fn claim_chunk_paid(
        &mut self,
        key: ChunkKey,
        town_id: TownId,
        actor_id: ResidentId,
        currency: &mut dyn CurrencyProvider,
    ) -> Result<ClaimId, RealmError> {
        let claim = self.validate_claim(key, town_id, actor_id)?;
        if !self.hooks.claim_added(&claim, actor_id) {
            return Err(RealmError::Vetoed {
                hook: "claim-added",
            });
        }

        let free = self
            .towns
            .get(town_id)
            .is_some_and(|town| town.claim_count() < self.claim_settings.free_claims);
        if !free {
            let cost = self.claim_settings.claim_cost;
            if !self.charge_claim_cost(town_id, actor_id, cost, currency) {
                return Err(RealmError::CannotAfford { cost });
            }
            debug!(town = %town_id, actor = %actor_id, %cost, "claim cost charged");
        }

        self.commit_claim(claim)
    }

    /// Validation shared by the claim paths: chunk free, town under its
    /// limit, actor a Knight+ member of that exact town. Returns the
    /// ready-to-commit claim without touching any registry.
    fn validate_claim(
        &self,
        key: ChunkKey,
        town_id: TownId,
        actor_id: ResidentId,
    ) -> Result<Claim, RealmError> {
        if self.claims.is_claimed(&key) {
            return Err(ClaimError::AlreadyClaimed { key }.into());
        }
        let town = self
            .towns
            .get(town_id)
            .ok_or(RealmError::TownNotFound(town_id))?;
        if !town.can_claim_more() {
            return Err(RealmError::ClaimLimitReached(town_id));
        }
        let actor = self
            .residents
            .get(actor_id)
            .ok_or(RealmError::ResidentNotFound(actor_id))?;
        if actor.town_id != Some(town_id) {
            return Err(RealmError::NotInTown(actor_id));
        }
        if !actor.has_town_permission(TownRole::Knight) {
            return Err(RealmError::InsufficientRank(actor_id));
        }
        Ok(Claim::new(ClaimId::new(), key, town_id))
    }

    /// Attempt to pay `cost` from the configured sources in priority
    /// order. Returns whether a source covered it.
    fn charge_claim_cost(
        &mut self,
        town_id: TownId,
        actor_id: ResidentId,
        cost: Decimal,
        currency: &mut dyn CurrencyProvider,
    ) -> bool {
        let from_town = |towns: &mut TownRegistry| {
            towns
                .get_mut(town_id)
                .is_some_and(|town| town.bank.withdraw(cost).is_ok())
        };
        let from_wallet = |currency: &mut dyn CurrencyProvider| {
            currency.has(actor_id, cost) && currency.withdraw(actor_id, cost)
        };

        match self.claim_settings.pay_priority {
            PayPriority::TownFirst => from_town(&mut self.towns) || from_wallet(currency),
            PayPriority::ActorFirst => from_wallet(currency) || from_town(&mut self.towns),
        }
    }

    /// Commit a validated claim to both sides of the pairing.
    fn commit_claim(&mut self, claim: Claim) -> Result<ClaimId, RealmError> {
        let claim_id = claim.id();
        let town_id = claim.town_id();
        let key = claim.key().clone();

        self.claims.insert(claim)?;
        if let Some(town) = self.towns.get_mut(town_id) {
            town.add_claim(claim_id);
        }

        info!(claim = %claim_id, %key, town = %town_id, "chunk claimed");
        Ok(claim_id)
    }

    /// Revoke the claim covering `key` on behalf of `actor_id`.
    ///
    /// # Errors
    ///
    /// Fails if no claim covers the chunk, the actor is not a Knight+
    /// member of the owning town, or the claim-removed hook vetoes.
    pub fn unclaim_chunk(
        &mut self,
        key: &ChunkKey,
        actor_id: ResidentId,
    ) -> Result<(), RealmError> {
        let claim_id = self
            .claims
            .get_at(key)
            .ok_or_else(|| ClaimError::NoClaimAt { key: key.clone() })?
            .id();
        self.unclaim_checked(claim_id, actor_id)
    }

    /// Revoke a claim by id on behalf of `actor_id`.
    pub fn unclaim_by_id(
        &mut self,
        claim_id: ClaimId,
        actor_id: ResidentId,
    ) -> Result<(), RealmError> {
        if self.claims.get(claim_id).is_none() {
            return Err(ClaimError::ClaimNotFound(claim_id).into());
        }
        self.unclaim_checked(claim_id, actor_id)
    }

    /// Permission and hook checks, then the two-sided removal.
    fn unclaim_checked(
        &mut self,
        claim_id: ClaimId,
        actor_id: ResidentId,
    ) -> Result<(), RealmError> {
        let claim = self
            .claims
            .get(claim_id)
            .ok_or(ClaimError::ClaimNotFound(claim_id))?;
        let town_id = claim.town_id();

        let actor = self
            .residents
            .get(actor_id)
            .ok_or(RealmError::ResidentNotFound(actor_id))?;
        if actor.town_id != Some(town_id) {
            return Err(RealmError::NotInTown(actor_id));
        }
        if !actor.has_town_permission(TownRole::Knight) {
            return Err(RealmError::InsufficientRank(actor_id));
        }
        if !self.hooks.claim_removed(claim, actor_id) {
            return Err(RealmError::Vetoed {
                hook: "claim-removed",
            });
        }

        let removed = self.claims.remove(claim_id)?;
        if let Some(town) = self.towns.get_mut(town_id) {
            town.remove_claim(claim_id);
        }

        info!(claim = %claim_id, key = %removed.key(), town = %town_id, "chunk unclaimed");
        Ok(())
    }

    /// Set a flag on a claim. Fails only if the claim does not exist.
    pub fn set_claim_flag(
        &mut self,
        claim_id: ClaimId,
        flag: ClaimFlag,
        value: bool,
    ) -> Result<(), RealmError> {
        self.claims.set_flag(claim_id, flag, value)?;
        Ok(())
    }

    // -------------------------------------------------------------------
    // Permission queries
    // -------------------------------------------------------------------

    /// Whether `actor_id` may place or break blocks at `key`.
    ///
    /// Unclaimed chunks allow anyone, known or not. On claimed chunks an
    /// unknown actor is denied; members of the owning town are allowed;
    /// everyone else needs the claim's `Build` flag.
    pub fn can_build(&self, key: &ChunkKey, actor_id: ResidentId) -> bool {
        if !self.claims.is_claimed(key) {
            return true;
        }
        self.residents
            .get(actor_id)
            .is_some_and(|resident| self.claims.can_build(key, resident.town_id))
    }

    /// Whether `actor_id` may interact with blocks at `key`. Same shape as
    /// [`Self::can_build`] over the `Interact` flag.
    pub fn can_interact(&self, key: &ChunkKey, actor_id: ResidentId) -> bool {
        if !self.claims.is_claimed(key) {
            return true;
        }
        self.residents
            .get(actor_id)
            .is_some_and(|resident| self.claims.can_interact(key, resident.town_id))
    }

    /// Whether `PvP` combat is allowed at `key` (flag-only, no membership
    /// override).
    pub fn is_pvp_allowed(&self, key: &ChunkKey) -> bool {
        self.claims.is_pvp_allowed(key)
    }

    /// Whether explosions are allowed at `key`.
    pub fn are_explosions_allowed(&self, key: &ChunkKey) -> bool {
        self.claims.are_explosions_allowed(key)
    }

    /// Whether hostile creatures may spawn at `key`.
    pub fn is_mob_spawning_allowed(&self, key: &ChunkKey) -> bool {
        self.claims.is_mob_spawning_allowed(key)
    }

    /// Whether fire spreads at `key`.
    pub fn is_fire_spread_allowed(&self, key: &ChunkKey) -> bool {
        self.claims.is_fire_spread_allowed(key)
    }
}
