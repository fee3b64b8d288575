//! The town registry: id map plus unique case-insensitive name map.
//!
//! This layer owns lookup and the single-town operations (bank movement,
//! tax rate, visibility). Anything that touches a second registry -- member
//! joins, claims, nation membership, deletion cascades -- belongs to the
//! realm service, which keeps both sides of those updates in one operation.

use rust_decimal::Decimal;

use dominion_types::{Town, TownId};

use crate::error::RealmError;

/// Registry of all towns, indexed by id and by lowercase name.
#[derive(Debug, Clone, Default)]
pub struct TownRegistry {
    towns: std::collections::BTreeMap<TownId, Town>,
    name_to_id: std::collections::BTreeMap<String, TownId>,
}

impl TownRegistry {
    /// Create an empty registry.
    pub const fn new() -> Self {
        Self {
            towns: std::collections::BTreeMap::new(),
            name_to_id: std::collections::BTreeMap::new(),
        }
    }

    // -------------------------------------------------------------------
    // Lookup
    // -------------------------------------------------------------------

    /// Get a town by id.
    pub fn get(&self, id: TownId) -> Option<&Town> {
        self.towns.get(&id)
    }

    /// Get a mutable town by id.
    pub(crate) fn get_mut(&mut self, id: TownId) -> Option<&mut Town> {
        self.towns.get_mut(&id)
    }

    /// Get a town by name, case-insensitively.
    pub fn get_by_name(&self, name: &str) -> Option<&Town> {
        let id = self.name_to_id.get(&name.to_lowercase())?;
        self.towns.get(id)
    }

    /// Whether a town name is already registered (case-insensitive).
    pub fn name_taken(&self, name: &str) -> bool {
        self.name_to_id.contains_key(&name.to_lowercase())
    }

    /// Number of towns.
    pub fn len(&self) -> usize {
        self.towns.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.towns.is_empty()
    }

    /// Iterate over all towns.
    pub fn iter(&self) -> impl Iterator<Item = &Town> {
        self.towns.values()
    }

    /// All town ids, in id order.
    pub fn ids(&self) -> Vec<TownId> {
        self.towns.keys().copied().collect()
    }

    // -------------------------------------------------------------------
    // Record lifecycle (realm-driven)
    // -------------------------------------------------------------------

    /// Register a town record and its name mapping.
    ///
    /// # Errors
    ///
    /// Returns [`RealmError::NameTaken`] if the name is already registered;
    /// nothing changes in that case.
    pub(crate) fn insert(&mut self, town: Town) -> Result<(), RealmError> {
        let key = town.name().to_lowercase();
        if self.name_to_id.contains_key(&key) {
            return Err(RealmError::NameTaken {
                name: town.name().to_owned(),
            });
        }
        self.name_to_id.insert(key, town.id());
        self.towns.insert(town.id(), town);
        Ok(())
    }

    /// Drop a town record and its name mapping, returning the record.
    pub(crate) fn remove(&mut self, id: TownId) -> Option<Town> {
        let town = self.towns.remove(&id)?;
        self.name_to_id.remove(&town.name().to_lowercase());
        Some(town)
    }

    // -------------------------------------------------------------------
    // Single-town operations
    // -------------------------------------------------------------------

    /// Deposit into a town's bank.
    pub fn deposit(&mut self, id: TownId, amount: Decimal) -> Result<(), RealmError> {
        let town = self.towns.get_mut(&id).ok_or(RealmError::TownNotFound(id))?;
        town.bank.deposit(amount)?;
        Ok(())
    }

    /// Withdraw from a town's bank.
    pub fn withdraw(&mut self, id: TownId, amount: Decimal) -> Result<(), RealmError> {
        let town = self.towns.get_mut(&id).ok_or(RealmError::TownNotFound(id))?;
        town.bank.withdraw(amount)?;
        Ok(())
    }

    /// Set a town's tax rate (clamped to 0--100 by the record).
    pub fn set_tax_rate(&mut self, id: TownId, rate: Decimal) -> Result<(), RealmError> {
        let town = self.towns.get_mut(&id).ok_or(RealmError::TownNotFound(id))?;
        town.set_tax_rate(rate);
        Ok(())
    }

    /// Set a town's public-visibility flag.
    pub fn set_public(&mut self, id: TownId, public: bool) -> Result<(), RealmError> {
        let town = self.towns.get_mut(&id).ok_or(RealmError::TownNotFound(id))?;
        town.public = public;
        Ok(())
    }
}
