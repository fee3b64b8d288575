//! Error types for the core registries and the realm service.
//!
//! Nothing in the core is fatal: every variant is a local, recoverable
//! refusal, and every operation that returns an error leaves all registry
//! state exactly as it found it. The variants group into the four failure
//! categories of the public contract: not-found, policy violation, vetoed,
//! and insufficient funds.

use rust_decimal::Decimal;

use dominion_claims::ClaimError;
use dominion_ledger::LedgerError;
use dominion_types::{NationId, ResidentId, TownId};

/// Errors produced by registry and realm operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RealmError {
    // --- not-found ---
    /// No resident record for the given actor id.
    #[error("resident not found: {0}")]
    ResidentNotFound(ResidentId),

    /// No town with the given id.
    #[error("town not found: {0}")]
    TownNotFound(TownId),

    /// No nation with the given id.
    #[error("nation not found: {0}")]
    NationNotFound(NationId),

    // --- policy violation ---
    /// The town or nation name is already registered (case-insensitive).
    #[error("name already taken: {name}")]
    NameTaken {
        /// The rejected name.
        name: String,
    },

    /// The resident already belongs to a town.
    #[error("resident {0} is already in a town")]
    AlreadyInTown(ResidentId),

    /// The town already belongs to a nation.
    #[error("town {0} is already in a nation")]
    TownAlreadyInNation(TownId),

    /// The resident is not a member of the required town.
    #[error("resident {0} is not in the required town")]
    NotInTown(ResidentId),

    /// The town is not a member of the required nation.
    #[error("town {0} is not in the required nation")]
    TownNotInNation(TownId),

    /// The resident is not a member of the required nation.
    #[error("resident {0} is not in the required nation")]
    NotInNation(ResidentId),

    /// The resident is not the town's owner.
    #[error("resident {0} does not own the town")]
    NotTownOwner(ResidentId),

    /// The resident is not the nation's leader.
    #[error("resident {0} does not lead the nation")]
    NotNationLeader(ResidentId),

    /// Town owners leave only via ownership transfer or town deletion.
    #[error("cannot remove the town owner {0}")]
    CannotRemoveOwner(ResidentId),

    /// Capitals leave only by deleting the nation or moving the capital.
    #[error("cannot remove the capital town {0}")]
    CannotRemoveCapital(TownId),

    /// The target already holds the highest reachable rank.
    #[error("resident {0} is already at the role ceiling")]
    AtRoleCeiling(ResidentId),

    /// The target is already at the Member floor.
    #[error("resident {0} is already at the role floor")]
    AtRoleFloor(ResidentId),

    /// The actor lacks the rank to perform this on the target.
    #[error("resident {0} lacks the rank for this action")]
    InsufficientRank(ResidentId),

    /// The top rank is never granted through the generic promote path.
    #[error("the top rank is only granted via ownership or leadership transfer")]
    TopRankTransferOnly,

    /// The town has reached its derived claim limit.
    #[error("town {0} has reached its claim limit")]
    ClaimLimitReached(TownId),

    /// The spawn point does not fall inside a qualifying claim.
    #[error("spawn point is outside the required claims")]
    SpawnOutsideClaims,

    /// Neither the town bank nor the actor's wallet covers the claim cost.
    #[error("cannot afford claim cost {cost}")]
    CannotAfford {
        /// The configured flat cost of a paid claim.
        cost: Decimal,
    },

    // --- vetoed ---
    /// An external policy hook declined the operation before commit.
    #[error("operation vetoed by the {hook} hook")]
    Vetoed {
        /// Name of the hook that declined.
        hook: &'static str,
    },

    // --- delegated ---
    /// A claim-index operation failed.
    #[error(transparent)]
    Claim(#[from] ClaimError),

    /// A bank-account operation failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}
