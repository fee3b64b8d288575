//! The nation registry: id map plus unique case-insensitive name map.
//!
//! Structurally the town registry one level up. Cross-registry operations
//! (founding, deletion cascades, member-town movement, leadership) live in
//! the realm service.

use rust_decimal::Decimal;

use dominion_types::{Nation, NationId};

use crate::error::RealmError;

/// Registry of all nations, indexed by id and by lowercase name.
#[derive(Debug, Clone, Default)]
pub struct NationRegistry {
    nations: std::collections::BTreeMap<NationId, Nation>,
    name_to_id: std::collections::BTreeMap<String, NationId>,
}

impl NationRegistry {
    /// Create an empty registry.
    pub const fn new() -> Self {
        Self {
            nations: std::collections::BTreeMap::new(),
            name_to_id: std::collections::BTreeMap::new(),
        }
    }

    // -------------------------------------------------------------------
    // Lookup
    // -------------------------------------------------------------------

    /// Get a nation by id.
    pub fn get(&self, id: NationId) -> Option<&Nation> {
        self.nations.get(&id)
    }

    /// Get a mutable nation by id.
    pub(crate) fn get_mut(&mut self, id: NationId) -> Option<&mut Nation> {
        self.nations.get_mut(&id)
    }

    /// Get a nation by name, case-insensitively.
    pub fn get_by_name(&self, name: &str) -> Option<&Nation> {
        let id = self.name_to_id.get(&name.to_lowercase())?;
        self.nations.get(id)
    }

    /// Whether a nation name is already registered (case-insensitive).
    pub fn name_taken(&self, name: &str) -> bool {
        self.name_to_id.contains_key(&name.to_lowercase())
    }

    /// Number of nations.
    pub fn len(&self) -> usize {
        self.nations.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.nations.is_empty()
    }

    /// Iterate over all nations.
    pub fn iter(&self) -> impl Iterator<Item = &Nation> {
        self.nations.values()
    }

    /// All nation ids, in id order.
    pub fn ids(&self) -> Vec<NationId> {
        self.nations.keys().copied().collect()
    }

    // -------------------------------------------------------------------
    // Record lifecycle (realm-driven)
    // -------------------------------------------------------------------

    /// Register a nation record and its name mapping.
    ///
    /// # Errors
    ///
    /// Returns [`RealmError::NameTaken`] if the name is already registered.
    pub(crate) fn insert(&mut self, nation: Nation) -> Result<(), RealmError> {
        let key = nation.name().to_lowercase();
        if self.name_to_id.contains_key(&key) {
            return Err(RealmError::NameTaken {
                name: nation.name().to_owned(),
            });
        }
        self.name_to_id.insert(key, nation.id());
        self.nations.insert(nation.id(), nation);
        Ok(())
    }

    /// Drop a nation record and its name mapping, returning the record.
    pub(crate) fn remove(&mut self, id: NationId) -> Option<Nation> {
        let nation = self.nations.remove(&id)?;
        self.name_to_id.remove(&nation.name().to_lowercase());
        Some(nation)
    }

    // -------------------------------------------------------------------
    // Single-nation operations
    // -------------------------------------------------------------------

    /// Deposit into a nation's bank.
    pub fn deposit(&mut self, id: NationId, amount: Decimal) -> Result<(), RealmError> {
        let nation = self
            .nations
            .get_mut(&id)
            .ok_or(RealmError::NationNotFound(id))?;
        nation.bank.deposit(amount)?;
        Ok(())
    }

    /// Withdraw from a nation's bank.
    pub fn withdraw(&mut self, id: NationId, amount: Decimal) -> Result<(), RealmError> {
        let nation = self
            .nations
            .get_mut(&id)
            .ok_or(RealmError::NationNotFound(id))?;
        nation.bank.withdraw(amount)?;
        Ok(())
    }

    /// Set a nation's tax rate (clamped to 0--100 by the record).
    pub fn set_tax_rate(&mut self, id: NationId, rate: Decimal) -> Result<(), RealmError> {
        let nation = self
            .nations
            .get_mut(&id)
            .ok_or(RealmError::NationNotFound(id))?;
        nation.set_tax_rate(rate);
        Ok(())
    }

    /// Set a nation's public-visibility flag.
    pub fn set_public(&mut self, id: NationId, public: bool) -> Result<(), RealmError> {
        let nation = self
            .nations
            .get_mut(&id)
            .ok_or(RealmError::NationNotFound(id))?;
        nation.public = public;
        Ok(())
    }
}
