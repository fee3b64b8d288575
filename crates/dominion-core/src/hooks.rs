//! Veto hooks: external policy checks fired before the realm commits.
//!
//! Every cancellable operation (town/nation create and delete, promote and
//! demote, claim add and remove) consults its hook with the proposed entity
//! and acting resident *before the first registry mutation*. A `false`
//! return vetoes the operation; the realm then fails with
//! `RealmError::Vetoed` having changed nothing, so there is never
//! speculative state to roll back.
//!
//! This is a synchronous policy callback, not an event bus: observers that
//! merely want to be told about committed changes belong to the caller's
//! plumbing, not here.

use dominion_types::{Claim, Nation, NationRole, Resident, ResidentId, Town, TownRole};

/// External policy checks consulted before cancellable mutations.
///
/// Every method defaults to allow; implementors override only the
/// decisions they care about. Returning `false` vetoes the operation.
pub trait RealmHooks {
    /// A town is about to be created with `founder` as owner.
    fn town_create(&self, _town: &Town, _founder: ResidentId) -> bool {
        true
    }

    /// A town is about to be deleted. `actor` is `None` for system-driven
    /// deletion.
    fn town_delete(&self, _town: &Town, _actor: Option<ResidentId>) -> bool {
        true
    }

    /// A nation is about to be founded with `founder` as King.
    fn nation_create(&self, _nation: &Nation, _founder: ResidentId) -> bool {
        true
    }

    /// A nation is about to be deleted (directly or via capital cascade).
    fn nation_delete(&self, _nation: &Nation, _actor: Option<ResidentId>) -> bool {
        true
    }

    /// `target` is about to move from `from` to `to` within `town`.
    fn town_promote(
        &self,
        _town: &Town,
        _target: &Resident,
        _from: TownRole,
        _to: TownRole,
        _actor: ResidentId,
    ) -> bool {
        true
    }

    /// `target` is about to be demoted from `from` to `to` within `town`.
    fn town_demote(
        &self,
        _town: &Town,
        _target: &Resident,
        _from: TownRole,
        _to: TownRole,
        _actor: ResidentId,
    ) -> bool {
        true
    }

    /// `target` is about to move from `from` to `to` within `nation`.
    fn nation_promote(
        &self,
        _nation: &Nation,
        _target: &Resident,
        _from: NationRole,
        _to: NationRole,
        _actor: ResidentId,
    ) -> bool {
        true
    }

    /// `target` is about to be demoted from `from` to `to` within `nation`.
    fn nation_demote(
        &self,
        _nation: &Nation,
        _target: &Resident,
        _from: NationRole,
        _to: NationRole,
        _actor: ResidentId,
    ) -> bool {
        true
    }

    /// A claim is about to be granted to its town.
    fn claim_added(&self, _claim: &Claim, _actor: ResidentId) -> bool {
        true
    }

    /// A claim is about to be revoked by `actor`.
    fn claim_removed(&self, _claim: &Claim, _actor: ResidentId) -> bool {
        true
    }
}

/// The default hook set: allows everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl RealmHooks for AllowAll {}
