//! Spatial claim index and permission evaluation.
//!
//! The [`ClaimIndex`] is the spatial backbone of the hierarchy: it owns
//! every [`Claim`] record and the mapping from [`ChunkKey`] to claim,
//! enforcing that a chunk belongs to at most one town at any time.
//!
//! # Exclusivity
//!
//! The index keeps two maps in lockstep by construction -- claims by id and
//! claim ids by chunk key. Both are private and only mutated by
//! [`ClaimIndex::insert`] and [`ClaimIndex::remove`], which update the pair
//! as one unit; there is no state where a claim exists in one map and not
//! the other.
//!
//! Lifecycle pairing with the owning town's claim set (a claim id appears
//! in exactly one town's set for exactly as long as it is in this index) is
//! the coordinating service's contract in `dominion-core`; this crate
//! provides the primitives that make the pairing atomic.
//!
//! # Permission model
//!
//! An unclaimed chunk permits everything. On a claimed chunk, build and
//! interact are granted unconditionally to residents of the owning town and
//! fall through to the claim's `Build`/`Interact` flags for everyone else;
//! the environmental toggles (`PvP`, explosions, mob spawning, fire spread)
//! are evaluated purely from the flags with no membership override.
//!
//! [`Claim`]: dominion_types::Claim
//! [`ChunkKey`]: dominion_types::ChunkKey

pub mod index;

pub use index::ClaimIndex;

use dominion_types::{ChunkKey, ClaimId};

/// Errors that can occur when mutating the claim index.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClaimError {
    /// The chunk is already claimed by some town.
    #[error("chunk {key} is already claimed")]
    AlreadyClaimed {
        /// The occupied chunk key.
        key: ChunkKey,
    },

    /// A claim with this id already exists in the index.
    #[error("duplicate claim id: {0}")]
    DuplicateClaimId(ClaimId),

    /// No claim with the given id exists.
    #[error("claim not found: {0}")]
    ClaimNotFound(ClaimId),

    /// No claim covers the given chunk.
    #[error("no claim at {key}")]
    NoClaimAt {
        /// The unclaimed chunk key.
        key: ChunkKey,
    },
}
