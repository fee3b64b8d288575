//! Shared type definitions for the Dominion territorial hierarchy.
//!
//! This crate is the single source of truth for the vocabulary used across
//! the Dominion workspace: typed identifiers, the two role hierarchies,
//! claim permission flags, and the entity records themselves.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for all entity identifiers
//! - [`enums`] -- Role hierarchies ([`TownRole`], [`NationRole`]) and
//!   per-claim permission flags ([`ClaimFlag`])
//! - [`structs`] -- Entity records (residents, towns, nations, claims),
//!   spatial keys, spawn points, and the snapshot container

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{ClaimFlag, NationRole, TownRole};
pub use ids::{ClaimId, NationId, ResidentId, TownId};
pub use structs::{
    Claim, ChunkKey, Nation, ParseChunkKeyError, RealmSnapshot, Resident, SpawnPoint, Town,
};
