//! The resident registry: actor id to membership/role record.
//!
//! Residents are created lazily on first contact
//! ([`ResidentRegistry::get_or_create`]) and destroyed only by explicit
//! eviction ([`ResidentRegistry::evict`]), which returns
//! the record so the caller can hand it to the persistence collaborator
//! first (save-then-evict).
//!
//! Membership fields are written here exclusively on behalf of the realm
//! service -- command-side code never reaches these mutators directly.

use chrono::Utc;
use tracing::debug;

use dominion_types::{NationId, NationRole, Resident, ResidentId, TownId, TownRole};

use crate::error::RealmError;

/// Registry of every resident known to the core.
#[derive(Debug, Clone, Default)]
pub struct ResidentRegistry {
    residents: std::collections::BTreeMap<ResidentId, Resident>,
}

impl ResidentRegistry {
    /// Create an empty registry.
    pub const fn new() -> Self {
        Self {
            residents: std::collections::BTreeMap::new(),
        }
    }

    // -------------------------------------------------------------------
    // Lookup
    // -------------------------------------------------------------------

    /// Get a resident by actor id.
    pub fn get(&self, id: ResidentId) -> Option<&Resident> {
        self.residents.get(&id)
    }

    /// Get a mutable resident by actor id.
    pub(crate) fn get_mut(&mut self, id: ResidentId) -> Option<&mut Resident> {
        self.residents.get_mut(&id)
    }

    /// Find a resident by display name.
    ///
    /// An exact-case match wins over a case-insensitive one, so a lookup
    /// for a connected player's exact name never lands on a similarly
    /// named offline record.
    pub fn get_by_name(&self, name: &str) -> Option<&Resident> {
        self.residents
            .values()
            .find(|resident| resident.name == name)
            .or_else(|| {
                self.residents
                    .values()
                    .find(|resident| resident.name.eq_ignore_ascii_case(name))
            })
    }

    /// Number of residents in the registry.
    pub fn len(&self) -> usize {
        self.residents.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.residents.is_empty()
    }

    /// Iterate over all residents.
    pub fn iter(&self) -> impl Iterator<Item = &Resident> {
        self.residents.values()
    }

    // -------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------

    /// Fetch an existing record or create a fresh one for a first-contact
    /// actor. A stale display name is refreshed on the way through.
    pub fn get_or_create(&mut self, id: ResidentId, name: &str) -> &Resident {
        let resident = self
            .residents
            .entry(id)
            .or_insert_with(|| Resident::new(id, name));
        if resident.name != name {
            resident.name = name.to_owned();
        }
        &*resident
    }

    /// Insert a fully-formed record (snapshot restore path).
    pub(crate) fn insert(&mut self, resident: Resident) {
        self.residents.insert(resident.id, resident);
    }

    /// Stamp a resident's last-active time with the current instant.
    pub fn update_last_active(&mut self, id: ResidentId) {
        if let Some(resident) = self.residents.get_mut(&id) {
            resident.last_active = Utc::now();
        }
    }

    /// Remove a resident record entirely, returning it for persistence.
    ///
    /// This is the evict half of save-then-evict: the caller saves the
    /// returned record before dropping it. Town and nation member sets may
    /// still reference the id -- an evicted resident is simply offline, and
    /// is reconstructed from persistence on next contact.
    pub fn evict(&mut self, id: ResidentId) -> Option<Resident> {
        self.residents.remove(&id)
    }

    // -------------------------------------------------------------------
    // Membership (realm-driven)
    // -------------------------------------------------------------------

    /// Point a resident at a town with the given starting role.
    pub(crate) fn add_to_town(
        &mut self,
        id: ResidentId,
        town_id: TownId,
        role: TownRole,
    ) -> Result<(), RealmError> {
        let resident = self
            .residents
            .get_mut(&id)
            .ok_or(RealmError::ResidentNotFound(id))?;
        resident.town_id = Some(town_id);
        resident.town_role = role;
        Ok(())
    }

    /// Clear a resident's town membership (role reset, chat flag cleared).
    pub(crate) fn remove_from_town(&mut self, id: ResidentId) -> Result<(), RealmError> {
        let resident = self
            .residents
            .get_mut(&id)
            .ok_or(RealmError::ResidentNotFound(id))?;
        if !resident.has_town() {
            return Err(RealmError::NotInTown(id));
        }
        resident.leave_town();
        Ok(())
    }

    /// Point a resident at a nation with the given starting role.
    pub(crate) fn add_to_nation(
        &mut self,
        id: ResidentId,
        nation_id: NationId,
        role: NationRole,
    ) -> Result<(), RealmError> {
        let resident = self
            .residents
            .get_mut(&id)
            .ok_or(RealmError::ResidentNotFound(id))?;
        resident.nation_id = Some(nation_id);
        resident.nation_role = role;
        Ok(())
    }

    /// Clear a resident's nation membership (role reset, chat flag
    /// cleared).
    pub(crate) fn remove_from_nation(&mut self, id: ResidentId) -> Result<(), RealmError> {
        let resident = self
            .residents
            .get_mut(&id)
            .ok_or(RealmError::ResidentNotFound(id))?;
        if !resident.has_nation() {
            return Err(RealmError::NotInNation(id));
        }
        resident.leave_nation();
        Ok(())
    }

    // -------------------------------------------------------------------
    // Roles (one level at a time)
    // -------------------------------------------------------------------

    /// Raise a resident's town role by exactly one level.
    ///
    /// # Errors
    ///
    /// Fails at the Owner ceiling, when the resident is unknown, or when
    /// they have no town.
    pub(crate) fn promote_town_role(&mut self, id: ResidentId) -> Result<TownRole, RealmError> {
        let resident = self
            .residents
            .get_mut(&id)
            .ok_or(RealmError::ResidentNotFound(id))?;
        if !resident.has_town() {
            return Err(RealmError::NotInTown(id));
        }
        let next = resident
            .town_role
            .successor()
            .ok_or(RealmError::AtRoleCeiling(id))?;
        resident.town_role = next;
        debug!(resident = %id, role = next.display_name(), "town role promoted");
        Ok(next)
    }

    /// Lower a resident's town role by exactly one level.
    pub(crate) fn demote_town_role(&mut self, id: ResidentId) -> Result<TownRole, RealmError> {
        let resident = self
            .residents
            .get_mut(&id)
            .ok_or(RealmError::ResidentNotFound(id))?;
        if !resident.has_town() {
            return Err(RealmError::NotInTown(id));
        }
        let previous = resident
            .town_role
            .predecessor()
            .ok_or(RealmError::AtRoleFloor(id))?;
        resident.town_role = previous;
        debug!(resident = %id, role = previous.display_name(), "town role demoted");
        Ok(previous)
    }

    /// Raise a resident's nation role by exactly one level.
    pub(crate) fn promote_nation_role(
        &mut self,
        id: ResidentId,
    ) -> Result<NationRole, RealmError> {
        let resident = self
            .residents
            .get_mut(&id)
            .ok_or(RealmError::ResidentNotFound(id))?;
        if !resident.has_nation() {
            return Err(RealmError::NotInNation(id));
        }
        let next = resident
            .nation_role
            .successor()
            .ok_or(RealmError::AtRoleCeiling(id))?;
        resident.nation_role = next;
        debug!(resident = %id, role = next.display_name(), "nation role promoted");
        Ok(next)
    }

    /// Lower a resident's nation role by exactly one level.
    pub(crate) fn demote_nation_role(
        &mut self,
        id: ResidentId,
    ) -> Result<NationRole, RealmError> {
        let resident = self
            .residents
            .get_mut(&id)
            .ok_or(RealmError::ResidentNotFound(id))?;
        if !resident.has_nation() {
            return Err(RealmError::NotInNation(id));
        }
        let previous = resident
            .nation_role
            .predecessor()
            .ok_or(RealmError::AtRoleFloor(id))?;
        resident.nation_role = previous;
        debug!(resident = %id, role = previous.display_name(), "nation role demoted");
        Ok(previous)
    }

    // -------------------------------------------------------------------
    // Chat channels
    // -------------------------------------------------------------------

    /// Toggle the town chat channel, returning the new state.
    ///
    /// Enabling town chat always disables nation chat; the two channels are
    /// mutually exclusive.
    pub fn toggle_town_chat(&mut self, id: ResidentId) -> Result<bool, RealmError> {
        let resident = self
            .residents
            .get_mut(&id)
            .ok_or(RealmError::ResidentNotFound(id))?;
        if !resident.has_town() {
            return Err(RealmError::NotInTown(id));
        }
        resident.town_chat = !resident.town_chat;
        if resident.town_chat {
            resident.nation_chat = false;
        }
        Ok(resident.town_chat)
    }

    /// Toggle the nation chat channel, returning the new state.
    ///
    /// Enabling nation chat always disables town chat.
    pub fn toggle_nation_chat(&mut self, id: ResidentId) -> Result<bool, RealmError> {
        let resident = self
            .residents
            .get_mut(&id)
            .ok_or(RealmError::ResidentNotFound(id))?;
        if !resident.has_nation() {
            return Err(RealmError::NotInNation(id));
        }
        resident.nation_chat = !resident.nation_chat;
        if resident.nation_chat {
            resident.town_chat = false;
        }
        Ok(resident.nation_chat)
    }
}
