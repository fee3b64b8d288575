//! Snapshot capture and restore for the persistence collaborator.
//!
//! The core does not talk to disk or a database. Instead it hands the
//! caller a [`RealmSnapshot`] -- a plain serde container of every record --
//! and can rebuild itself from one, reconstructing the derived indexes
//! (name maps, the chunk-key index) along the way. Identities, membership
//! sets, ledgers, flags, and timestamps round-trip exactly.

use dominion_types::RealmSnapshot;

use crate::error::RealmError;
use crate::hooks::RealmHooks;
use crate::realm::Realm;

impl Realm {
    /// Capture the full registry state.
    pub fn snapshot(&self) -> RealmSnapshot {
        RealmSnapshot {
            residents: self.residents.iter().cloned().collect(),
            towns: self.towns.iter().cloned().collect(),
            nations: self.nations.iter().cloned().collect(),
            claims: self.claims.iter().cloned().collect(),
        }
    }

    /// Rebuild a realm from a snapshot, with allow-all hooks.
    ///
    /// # Errors
    ///
    /// Returns the underlying registry error if the snapshot is internally
    /// inconsistent (duplicate names, overlapping claims).
    pub fn from_snapshot(snapshot: RealmSnapshot) -> Result<Self, RealmError> {
        Self::from_snapshot_with_hooks(snapshot, Box::new(crate::hooks::AllowAll))
    }

    /// Rebuild a realm from a snapshot with the given policy hooks.
    ///
    /// # Errors
    ///
    /// As [`Self::from_snapshot`].
    pub fn from_snapshot_with_hooks(
        snapshot: RealmSnapshot,
        hooks: Box<dyn RealmHooks>,
    ) -> Result<Self, RealmError> {
        let mut realm = Self::with_hooks(hooks);
        for resident in snapshot.residents {
            realm.residents.insert(resident);
        }
        for town in snapshot.towns {
            realm.towns.insert(town)?;
        }
        for nation in snapshot.nations {
            realm.nations.insert(nation)?;
        }
        for claim in snapshot.claims {
            realm.claims.insert(claim)?;
        }
        Ok(realm)
    }
}
