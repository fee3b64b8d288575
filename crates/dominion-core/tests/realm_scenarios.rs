//! End-to-end scenarios over the realm service.
//!
//! Each test drives the public operations the way command handlers would,
//! then checks the cross-registry invariants: bidirectional membership,
//! claim-set/index lockstep, derived claim limits, and the strict
//! no-partial-mutation guarantee on every failure path.

// Integration tests use expect/unwrap extensively for clarity -- panicking
// on failure is the correct behavior in test code.
#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::items_after_statements,
    clippy::missing_panics_doc,
    clippy::too_many_lines
)]

use chrono::{TimeDelta, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use dominion_core::{
    ClaimSettings, PayPriority, Realm, RealmError, RealmHooks, TaxCollector, TaxNotice,
    TaxSchedule, TaxSettings, WalletBank,
};
use dominion_types::{
    ChunkKey, ClaimFlag, Nation, NationRole, Resident, ResidentId, Town, TownId, TownRole,
};

// =============================================================================
// Helpers
// =============================================================================

/// Register a resident and return their id.
fn resident(realm: &mut Realm, name: &str) -> ResidentId {
    let id = ResidentId::new();
    realm.residents_mut().get_or_create(id, name);
    id
}

/// Found a town with a fresh resident as owner.
fn town_with_founder(realm: &mut Realm, town: &str, founder_name: &str) -> (TownId, ResidentId) {
    let founder = resident(realm, founder_name);
    let town_id = realm.create_town(town, founder).expect("town created");
    (town_id, founder)
}

/// Assert every cross-registry invariant, in both directions.
fn assert_invariants(realm: &Realm) {
    for res in realm.residents().iter() {
        if let Some(town_id) = res.town_id {
            let town = realm.towns().get(town_id).expect("resident's town exists");
            assert!(
                town.is_resident(res.id),
                "resident {} points at a town that does not list them",
                res.id
            );
        } else {
            assert!(
                realm.towns().iter().all(|town| !town.is_resident(res.id)),
                "town-less resident {} appears in a member set",
                res.id
            );
        }
        if let Some(nation_id) = res.nation_id {
            assert!(realm.nations().get(nation_id).is_some());
        }
    }

    for town in realm.towns().iter() {
        assert!(town.is_resident(town.owner_id()), "owner must be a member");
        assert!(
            town.claim_count() <= town.max_claims(),
            "town {} exceeds its claim limit",
            town.name()
        );
        for claim_id in town.claims() {
            assert_eq!(
                realm.claims().get(*claim_id).map(|claim| claim.town_id()),
                Some(town.id()),
                "town claim set references a claim the index disagrees about"
            );
        }
        if let Some(nation_id) = town.nation_id {
            assert!(
                realm
                    .nations()
                    .get(nation_id)
                    .is_some_and(|nation| nation.has_town(town.id())),
                "town {} points at a nation that does not list it",
                town.name()
            );
        }
    }

    for claim in realm.claims().iter() {
        let town = realm
            .towns()
            .get(claim.town_id())
            .expect("claims are never orphaned");
        assert!(town.has_claim(claim.id()));
    }

    for nation in realm.nations().iter() {
        assert!(nation.has_town(nation.capital_id()), "capital is a member");
        for town_id in nation.towns() {
            assert_eq!(
                realm.towns().get(*town_id).and_then(|town| town.nation_id),
                Some(nation.id()),
                "nation lists a town that does not point back"
            );
        }
    }
}

// =============================================================================
// Town lifecycle
// =============================================================================

#[test]
fn founding_a_town_makes_the_founder_its_owner() {
    let mut realm = Realm::new();
    let (town_id, founder) = town_with_founder(&mut realm, "Alba", "Finn");

    let town = realm.towns().get(town_id).unwrap();
    assert_eq!(town.name(), "Alba");
    assert_eq!(town.owner_id(), founder);
    assert_eq!(town.resident_count(), 1);
    assert_eq!(town.claim_count(), 0);

    let founder_record = realm.residents().get(founder).unwrap();
    assert_eq!(founder_record.town_id, Some(town_id));
    assert_eq!(founder_record.town_role, TownRole::Owner);
    assert_invariants(&realm);
}

#[test]
fn town_names_are_unique_case_insensitively() {
    let mut realm = Realm::new();
    town_with_founder(&mut realm, "Alba", "Finn");
    let other = resident(&mut realm, "Maren");

    assert!(matches!(
        realm.create_town("ALBA", other),
        Err(RealmError::NameTaken { .. })
    ));
    // The would-be founder is untouched by the failure.
    let record = realm.residents().get(other).unwrap();
    assert!(record.town_id.is_none());
    assert_eq!(record.town_role, TownRole::Member);
    assert_invariants(&realm);
}

#[test]
fn a_resident_can_only_belong_to_one_town() {
    let mut realm = Realm::new();
    let (_, founder) = town_with_founder(&mut realm, "Alba", "Finn");
    let (second_town, _) = town_with_founder(&mut realm, "Brel", "Maren");

    assert_eq!(
        realm.join_town(second_town, founder),
        Err(RealmError::AlreadyInTown(founder))
    );
    assert_invariants(&realm);
}

#[test]
fn joining_and_leaving_keeps_both_sides_in_step() {
    let mut realm = Realm::new();
    let (town_id, _) = town_with_founder(&mut realm, "Alba", "Finn");
    let joiner = resident(&mut realm, "Maren");

    realm.join_town(town_id, joiner).unwrap();
    assert!(realm.towns().get(town_id).unwrap().is_resident(joiner));
    assert_eq!(
        realm.residents().get(joiner).unwrap().town_id,
        Some(town_id)
    );
    assert_invariants(&realm);

    realm.remove_resident_from_town(town_id, joiner).unwrap();
    assert!(!realm.towns().get(town_id).unwrap().is_resident(joiner));
    assert!(realm.residents().get(joiner).unwrap().town_id.is_none());
    assert_invariants(&realm);
}

#[test]
fn the_owner_cannot_be_kicked() {
    let mut realm = Realm::new();
    let (town_id, founder) = town_with_founder(&mut realm, "Alba", "Finn");

    assert_eq!(
        realm.remove_resident_from_town(town_id, founder),
        Err(RealmError::CannotRemoveOwner(founder))
    );
    assert!(realm.towns().get(town_id).unwrap().is_resident(founder));
}

#[test]
fn deleting_a_town_resets_members_and_revokes_claims() {
    let mut realm = Realm::new();
    let (town_id, founder) = town_with_founder(&mut realm, "Alba", "Finn");
    let joiner = resident(&mut realm, "Maren");
    realm.join_town(town_id, joiner).unwrap();
    realm
        .claim_chunk(ChunkKey::new("w", 0, 0), town_id, founder)
        .unwrap();
    realm
        .claim_chunk(ChunkKey::new("w", 0, 1), town_id, founder)
        .unwrap();

    realm.delete_town(town_id, Some(founder)).unwrap();

    assert!(realm.towns().get(town_id).is_none());
    assert!(!realm.towns().name_taken("alba"));
    assert!(realm.claims().is_empty());
    for id in [founder, joiner] {
        let record = realm.residents().get(id).unwrap();
        assert!(record.town_id.is_none());
        assert_eq!(record.town_role, TownRole::Member);
    }
    assert_invariants(&realm);
}

// =============================================================================
// Roles and transfers
// =============================================================================

#[test]
fn promotion_requires_rank_and_strict_outranking() {
    let mut realm = Realm::new();
    let (town_id, owner) = town_with_founder(&mut realm, "Alba", "Finn");
    let member = resident(&mut realm, "Maren");
    let peer = resident(&mut realm, "Orin");
    realm.join_town(town_id, member).unwrap();
    realm.join_town(town_id, peer).unwrap();

    // A plain member cannot promote anyone.
    assert_eq!(
        realm.promote_resident(member, peer),
        Err(RealmError::InsufficientRank(member))
    );

    // The owner can: Member -> Knight -> Mayor.
    assert_eq!(realm.promote_resident(owner, member), Ok(TownRole::Knight));
    assert_eq!(realm.promote_resident(owner, member), Ok(TownRole::Mayor));

    // Nobody is promoted into Owner through this path.
    assert_eq!(
        realm.promote_resident(owner, member),
        Err(RealmError::TopRankTransferOnly)
    );

    // A Mayor cannot touch a fellow Mayor (no strict outranking).
    assert_eq!(realm.promote_resident(owner, peer), Ok(TownRole::Knight));
    assert_eq!(realm.promote_resident(owner, peer), Ok(TownRole::Mayor));
    assert_eq!(
        realm.demote_resident(member, peer),
        Err(RealmError::InsufficientRank(member))
    );
    assert_invariants(&realm);
}

#[test]
fn demotion_stops_at_the_member_floor() {
    let mut realm = Realm::new();
    let (town_id, owner) = town_with_founder(&mut realm, "Alba", "Finn");
    let member = resident(&mut realm, "Maren");
    realm.join_town(town_id, member).unwrap();

    assert_eq!(
        realm.demote_resident(owner, member),
        Err(RealmError::AtRoleFloor(member))
    );
}

#[test]
fn ownership_transfer_swaps_the_top_two_roles_atomically() {
    let mut realm = Realm::new();
    let (town_id, owner) = town_with_founder(&mut realm, "Alba", "Finn");
    let heir = resident(&mut realm, "Maren");
    realm.join_town(town_id, heir).unwrap();

    realm.transfer_town_ownership(owner, heir).unwrap();

    let town = realm.towns().get(town_id).unwrap();
    assert_eq!(town.owner_id(), heir);
    assert_eq!(
        realm.residents().get(heir).unwrap().town_role,
        TownRole::Owner
    );
    assert_eq!(
        realm.residents().get(owner).unwrap().town_role,
        TownRole::Mayor
    );
    assert_invariants(&realm);
}

#[test]
fn only_the_actual_owner_can_transfer() {
    let mut realm = Realm::new();
    let (town_id, _) = town_with_founder(&mut realm, "Alba", "Finn");
    let impostor = resident(&mut realm, "Maren");
    let heir = resident(&mut realm, "Orin");
    realm.join_town(town_id, impostor).unwrap();
    realm.join_town(town_id, heir).unwrap();

    assert_eq!(
        realm.transfer_town_ownership(impostor, heir),
        Err(RealmError::NotTownOwner(impostor))
    );
}

// =============================================================================
// Claims
// =============================================================================

#[test]
fn claiming_registers_index_and_town_set_together() {
    let mut realm = Realm::new();
    let (town_id, founder) = town_with_founder(&mut realm, "Alba", "Finn");

    let claim_id = realm
        .claim_chunk(ChunkKey::new("w", 3, 4), town_id, founder)
        .unwrap();

    assert!(realm.claims().is_claimed(&ChunkKey::new("w", 3, 4)));
    assert_eq!(realm.towns().get(town_id).unwrap().claim_count(), 1);
    assert!(realm.towns().get(town_id).unwrap().has_claim(claim_id));
    assert_invariants(&realm);
}

#[test]
fn a_claimed_chunk_cannot_be_claimed_again_by_anyone() {
    let mut realm = Realm::new();
    let (alba, finn) = town_with_founder(&mut realm, "Alba", "Finn");
    let (brel, maren) = town_with_founder(&mut realm, "Brel", "Maren");

    realm
        .claim_chunk(ChunkKey::new("w", 3, 4), alba, finn)
        .unwrap();

    // The same town and a rival both fail, mutating nothing.
    for (town_id, actor) in [(alba, finn), (brel, maren)] {
        let result = realm.claim_chunk(ChunkKey::new("w", 3, 4), town_id, actor);
        assert!(matches!(result, Err(RealmError::Claim(_))));
    }
    assert_eq!(realm.claims().len(), 1);
    assert_eq!(realm.towns().get(alba).unwrap().claim_count(), 1);
    assert_eq!(realm.towns().get(brel).unwrap().claim_count(), 0);
    assert_invariants(&realm);
}

#[test]
fn claiming_needs_knight_rank_in_that_exact_town() {
    let mut realm = Realm::new();
    let (town_id, _) = town_with_founder(&mut realm, "Alba", "Finn");
    let member = resident(&mut realm, "Maren");
    let outsider = resident(&mut realm, "Orin");
    realm.join_town(town_id, member).unwrap();

    assert_eq!(
        realm.claim_chunk(ChunkKey::new("w", 1, 1), town_id, member),
        Err(RealmError::InsufficientRank(member))
    );
    assert_eq!(
        realm.claim_chunk(ChunkKey::new("w", 1, 1), town_id, outsider),
        Err(RealmError::NotInTown(outsider))
    );
    assert!(realm.claims().is_empty());
}

#[test]
fn the_claim_limit_is_enforced_and_grows_with_residents() {
    let mut realm = Realm::new();
    let (town_id, founder) = town_with_founder(&mut realm, "Alba", "Finn");

    // One resident: 5 + 10 = 15 claims.
    for x in 0..15 {
        realm
            .claim_chunk(ChunkKey::new("w", x, 0), town_id, founder)
            .unwrap();
    }
    assert_eq!(
        realm.claim_chunk(ChunkKey::new("w", 99, 0), town_id, founder),
        Err(RealmError::ClaimLimitReached(town_id))
    );

    // Another member raises the cap by 10.
    let joiner = resident(&mut realm, "Maren");
    realm.join_town(town_id, joiner).unwrap();
    realm
        .claim_chunk(ChunkKey::new("w", 99, 0), town_id, founder)
        .unwrap();
    assert_invariants(&realm);
}

#[test]
fn unclaiming_clears_both_sides() {
    let mut realm = Realm::new();
    let (town_id, founder) = town_with_founder(&mut realm, "Alba", "Finn");
    let key = ChunkKey::new("w", 2, 2);
    realm.claim_chunk(key.clone(), town_id, founder).unwrap();

    realm.unclaim_chunk(&key, founder).unwrap();
    assert!(realm.claims().is_empty());
    assert_eq!(realm.towns().get(town_id).unwrap().claim_count(), 0);
    assert_invariants(&realm);
}

#[test]
fn permission_queries_follow_membership_and_flags() {
    let mut realm = Realm::new();
    let (town_id, founder) = town_with_founder(&mut realm, "Alba", "Finn");
    let outsider = resident(&mut realm, "Orin");
    let key = ChunkKey::new("w", 7, 7);
    let claim_id = realm.claim_chunk(key.clone(), town_id, founder).unwrap();

    // Members build; outsiders need the flag.
    assert!(realm.can_build(&key, founder));
    assert!(!realm.can_build(&key, outsider));
    realm.set_claim_flag(claim_id, ClaimFlag::Build, true).unwrap();
    assert!(realm.can_build(&key, outsider));

    // Unknown actors are denied on claimed chunks, allowed on wild ones.
    let stranger = ResidentId::new();
    assert!(!realm.can_interact(&key, stranger));
    assert!(realm.can_interact(&ChunkKey::new("w", 8, 8), stranger));

    // Environmental toggles ignore membership entirely.
    assert!(!realm.is_pvp_allowed(&key));
    realm.set_claim_flag(claim_id, ClaimFlag::Pvp, true).unwrap();
    assert!(realm.is_pvp_allowed(&key));
}

#[test]
fn town_spawn_must_sit_inside_an_own_claim() {
    let mut realm = Realm::new();
    let (town_id, founder) = town_with_founder(&mut realm, "Alba", "Finn");
    realm
        .claim_chunk(ChunkKey::new("w", 3, 4), town_id, founder)
        .unwrap();

    let inside = dominion_types::SpawnPoint {
        world: String::from("w"),
        x: 3.0 * 16.0 + 8.0,
        y: 64.0,
        z: 4.0 * 16.0 + 8.0,
        yaw: 0.0,
        pitch: 0.0,
    };
    realm.set_town_spawn(town_id, inside).unwrap();
    assert!(realm.towns().get(town_id).unwrap().spawn.is_some());

    let outside = dominion_types::SpawnPoint {
        world: String::from("w"),
        x: 1000.0,
        y: 64.0,
        z: 1000.0,
        yaw: 0.0,
        pitch: 0.0,
    };
    assert_eq!(
        realm.set_town_spawn(town_id, outside),
        Err(RealmError::SpawnOutsideClaims)
    );
}

// =============================================================================
// Paid claims
// =============================================================================

fn paid_realm(priority: PayPriority) -> Realm {
    let mut realm = Realm::new();
    realm.set_claim_settings(ClaimSettings {
        free_claims: 1,
        claim_cost: dec!(25),
        pay_priority: priority,
    });
    realm
}

#[test]
fn claims_within_the_free_allowance_cost_nothing() {
    let mut realm = paid_realm(PayPriority::TownFirst);
    let (town_id, founder) = town_with_founder(&mut realm, "Alba", "Finn");
    let mut wallet = WalletBank::new();

    realm
        .claim_chunk_paid(ChunkKey::new("w", 0, 0), town_id, founder, &mut wallet)
        .unwrap();
    assert_eq!(
        realm.towns().get(town_id).unwrap().bank.balance(),
        Decimal::ZERO
    );
    assert_eq!(wallet.balance_of(founder), Decimal::ZERO);
}

#[test]
fn paid_claims_charge_town_bank_first_then_wallet() {
    let mut realm = paid_realm(PayPriority::TownFirst);
    let (town_id, founder) = town_with_founder(&mut realm, "Alba", "Finn");
    let mut wallet = WalletBank::new();
    wallet.set_balance(founder, dec!(30));
    realm.towns_mut().deposit(town_id, dec!(25)).unwrap();

    // Claim 1 is free; claim 2 drains the town bank; claim 3 the wallet.
    realm
        .claim_chunk_paid(ChunkKey::new("w", 0, 0), town_id, founder, &mut wallet)
        .unwrap();
    realm
        .claim_chunk_paid(ChunkKey::new("w", 0, 1), town_id, founder, &mut wallet)
        .unwrap();
    assert_eq!(
        realm.towns().get(town_id).unwrap().bank.balance(),
        Decimal::ZERO
    );
    assert_eq!(wallet.balance_of(founder), dec!(30));

    realm
        .claim_chunk_paid(ChunkKey::new("w", 0, 2), town_id, founder, &mut wallet)
        .unwrap();
    assert_eq!(wallet.balance_of(founder), dec!(5));

    // Nothing left anywhere: clean failure, no partial state.
    let result =
        realm.claim_chunk_paid(ChunkKey::new("w", 0, 3), town_id, founder, &mut wallet);
    assert_eq!(result, Err(RealmError::CannotAfford { cost: dec!(25) }));
    assert_eq!(realm.claims().len(), 3);
    assert_eq!(realm.towns().get(town_id).unwrap().claim_count(), 3);
    assert_eq!(wallet.balance_of(founder), dec!(5));
    assert_invariants(&realm);
}

#[test]
fn actor_first_priority_spends_the_wallet_before_the_bank() {
    let mut realm = paid_realm(PayPriority::ActorFirst);
    let (town_id, founder) = town_with_founder(&mut realm, "Alba", "Finn");
    let mut wallet = WalletBank::new();
    wallet.set_balance(founder, dec!(25));
    realm.towns_mut().deposit(town_id, dec!(25)).unwrap();

    realm
        .claim_chunk_paid(ChunkKey::new("w", 0, 0), town_id, founder, &mut wallet)
        .unwrap();
    realm
        .claim_chunk_paid(ChunkKey::new("w", 0, 1), town_id, founder, &mut wallet)
        .unwrap();

    assert_eq!(wallet.balance_of(founder), Decimal::ZERO);
    assert_eq!(realm.towns().get(town_id).unwrap().bank.balance(), dec!(25));
}

// =============================================================================
// Nations
// =============================================================================

#[test]
fn founding_a_nation_crowns_the_capital_owner() {
    let mut realm = Realm::new();
    let (alba, finn) = town_with_founder(&mut realm, "Alba", "Finn");
    let citizen = resident(&mut realm, "Maren");
    realm.join_town(alba, citizen).unwrap();

    let caldera = realm.create_nation("Caldera", alba, finn).unwrap();

    let nation = realm.nations().get(caldera).unwrap();
    assert_eq!(nation.capital_id(), alba);
    assert_eq!(nation.leader_id(), finn);
    assert_eq!(nation.town_count(), 1);

    assert_eq!(
        realm.residents().get(finn).unwrap().nation_role,
        NationRole::King
    );
    assert_eq!(
        realm.residents().get(citizen).unwrap().nation_role,
        NationRole::Member
    );
    assert_eq!(
        realm.towns().get(alba).unwrap().nation_id,
        Some(caldera)
    );
    assert_invariants(&realm);
}

#[test]
fn founding_requires_owning_a_nation_less_capital() {
    let mut realm = Realm::new();
    let (alba, finn) = town_with_founder(&mut realm, "Alba", "Finn");
    let (brel, maren) = town_with_founder(&mut realm, "Brel", "Maren");
    realm.create_nation("Caldera", alba, finn).unwrap();

    // Capital already spoken for.
    assert_eq!(
        realm.create_nation("Vorn", alba, finn),
        Err(RealmError::TownAlreadyInNation(alba))
    );
    // Founder must own the capital town.
    assert_eq!(
        realm.create_nation("Vorn", brel, finn),
        Err(RealmError::NotTownOwner(finn))
    );
    realm.create_nation("Vorn", brel, maren).unwrap();
    assert_invariants(&realm);
}

#[test]
fn towns_join_and_leave_nations_with_their_residents() {
    let mut realm = Realm::new();
    let (alba, finn) = town_with_founder(&mut realm, "Alba", "Finn");
    let (brel, maren) = town_with_founder(&mut realm, "Brel", "Maren");
    let caldera = realm.create_nation("Caldera", alba, finn).unwrap();

    realm.add_town_to_nation(caldera, brel).unwrap();
    assert_eq!(realm.towns().get(brel).unwrap().nation_id, Some(caldera));
    assert_eq!(
        realm.residents().get(maren).unwrap().nation_id,
        Some(caldera)
    );
    assert_eq!(
        realm.residents().get(maren).unwrap().nation_role,
        NationRole::Member
    );
    assert_invariants(&realm);

    realm.remove_town_from_nation(caldera, brel).unwrap();
    assert!(realm.towns().get(brel).unwrap().nation_id.is_none());
    assert!(realm.residents().get(maren).unwrap().nation_id.is_none());
    assert_invariants(&realm);
}

#[test]
fn the_capital_cannot_be_removed_from_its_nation() {
    let mut realm = Realm::new();
    let (alba, finn) = town_with_founder(&mut realm, "Alba", "Finn");
    let caldera = realm.create_nation("Caldera", alba, finn).unwrap();

    assert_eq!(
        realm.remove_town_from_nation(caldera, alba),
        Err(RealmError::CannotRemoveCapital(alba))
    );
    assert_invariants(&realm);
}

#[test]
fn changing_capital_unlocks_removing_the_old_one() {
    let mut realm = Realm::new();
    let (alba, finn) = town_with_founder(&mut realm, "Alba", "Finn");
    let (brel, _) = town_with_founder(&mut realm, "Brel", "Maren");
    let caldera = realm.create_nation("Caldera", alba, finn).unwrap();
    realm.add_town_to_nation(caldera, brel).unwrap();

    realm.change_capital(caldera, brel).unwrap();
    assert_eq!(realm.nations().get(caldera).unwrap().capital_id(), brel);
    realm.remove_town_from_nation(caldera, alba).unwrap();
    assert_invariants(&realm);
}

#[test]
fn deleting_the_capital_town_cascades_to_the_nation() {
    let mut realm = Realm::new();
    let (alba, finn) = town_with_founder(&mut realm, "Alba", "Finn");
    let (brel, maren) = town_with_founder(&mut realm, "Brel", "Maren");
    let caldera = realm.create_nation("Caldera", alba, finn).unwrap();
    realm.add_town_to_nation(caldera, brel).unwrap();

    realm.delete_town(alba, Some(finn)).unwrap();

    // The nation went down with its capital.
    assert!(realm.nations().get(caldera).is_none());
    assert!(!realm.nations().name_taken("caldera"));
    assert!(realm.residents().get(finn).unwrap().nation_id.is_none());
    // The surviving town is released, not deleted.
    let brel_town = realm.towns().get(brel).unwrap();
    assert!(brel_town.nation_id.is_none());
    assert!(realm.residents().get(maren).unwrap().nation_id.is_none());
    assert_invariants(&realm);
}

#[test]
fn deleting_a_non_capital_town_only_releases_it() {
    let mut realm = Realm::new();
    let (alba, finn) = town_with_founder(&mut realm, "Alba", "Finn");
    let (brel, maren) = town_with_founder(&mut realm, "Brel", "Maren");
    let caldera = realm.create_nation("Caldera", alba, finn).unwrap();
    realm.add_town_to_nation(caldera, brel).unwrap();

    realm.delete_town(brel, Some(maren)).unwrap();

    let nation = realm.nations().get(caldera).unwrap();
    assert_eq!(nation.town_count(), 1);
    assert!(nation.has_town(alba));
    assert!(realm.residents().get(maren).unwrap().nation_id.is_none());
    assert_invariants(&realm);
}

#[test]
fn leadership_transfer_swaps_king_and_officer() {
    let mut realm = Realm::new();
    let (alba, finn) = town_with_founder(&mut realm, "Alba", "Finn");
    let heir = resident(&mut realm, "Maren");
    realm.join_town(alba, heir).unwrap();
    let caldera = realm.create_nation("Caldera", alba, finn).unwrap();

    realm.transfer_nation_leadership(finn, heir).unwrap();

    assert_eq!(realm.nations().get(caldera).unwrap().leader_id(), heir);
    assert_eq!(
        realm.residents().get(heir).unwrap().nation_role,
        NationRole::King
    );
    assert_eq!(
        realm.residents().get(finn).unwrap().nation_role,
        NationRole::Officer
    );
    assert_invariants(&realm);
}

#[test]
fn nation_promotion_mirrors_the_town_rules() {
    let mut realm = Realm::new();
    let (alba, finn) = town_with_founder(&mut realm, "Alba", "Finn");
    let citizen = resident(&mut realm, "Maren");
    realm.join_town(alba, citizen).unwrap();
    realm.create_nation("Caldera", alba, finn).unwrap();

    assert_eq!(
        realm.promote_nation_resident(finn, citizen),
        Ok(NationRole::Knight)
    );
    assert_eq!(
        realm.promote_nation_resident(finn, citizen),
        Ok(NationRole::Officer)
    );
    assert_eq!(
        realm.promote_nation_resident(finn, citizen),
        Err(RealmError::TopRankTransferOnly)
    );
    assert_eq!(
        realm.promote_nation_resident(citizen, finn),
        Err(RealmError::InsufficientRank(citizen))
    );
}

// =============================================================================
// Veto hooks
// =============================================================================

/// Hooks that deny exactly one operation kind.
#[derive(Debug, Clone, Copy)]
enum Deny {
    TownCreate,
    NationDelete,
    ClaimAdded,
    TownPromote,
}

impl RealmHooks for Deny {
    fn town_create(&self, _town: &Town, _founder: ResidentId) -> bool {
        !matches!(self, Self::TownCreate)
    }
    fn nation_delete(&self, _nation: &Nation, _actor: Option<ResidentId>) -> bool {
        !matches!(self, Self::NationDelete)
    }
    fn claim_added(&self, _claim: &dominion_types::Claim, _actor: ResidentId) -> bool {
        !matches!(self, Self::ClaimAdded)
    }
    fn town_promote(
        &self,
        _town: &Town,
        _target: &Resident,
        _from: TownRole,
        _to: TownRole,
        _actor: ResidentId,
    ) -> bool {
        !matches!(self, Self::TownPromote)
    }
}

#[test]
fn a_vetoed_town_create_leaves_the_founder_untouched() {
    let mut realm = Realm::with_hooks(Box::new(Deny::TownCreate));
    let founder = resident(&mut realm, "Finn");

    assert_eq!(
        realm.create_town("Alba", founder),
        Err(RealmError::Vetoed {
            hook: "town-create"
        })
    );
    assert!(realm.towns().is_empty());
    assert!(!realm.towns().name_taken("alba"));
    let record = realm.residents().get(founder).unwrap();
    assert!(record.town_id.is_none());
    assert_eq!(record.town_role, TownRole::Member);
}

#[test]
fn a_vetoed_claim_commits_nothing() {
    let mut realm = Realm::with_hooks(Box::new(Deny::ClaimAdded));
    let (town_id, founder) = town_with_founder(&mut realm, "Alba", "Finn");

    assert_eq!(
        realm.claim_chunk(ChunkKey::new("w", 0, 0), town_id, founder),
        Err(RealmError::Vetoed {
            hook: "claim-added"
        })
    );
    assert!(realm.claims().is_empty());
    assert_eq!(realm.towns().get(town_id).unwrap().claim_count(), 0);
}

#[test]
fn a_vetoed_promotion_changes_no_roles() {
    let mut realm = Realm::with_hooks(Box::new(Deny::TownPromote));
    let (town_id, owner) = town_with_founder(&mut realm, "Alba", "Finn");
    let member = resident(&mut realm, "Maren");
    realm.join_town(town_id, member).unwrap();

    assert_eq!(
        realm.promote_resident(owner, member),
        Err(RealmError::Vetoed {
            hook: "town-promote"
        })
    );
    assert_eq!(
        realm.residents().get(member).unwrap().town_role,
        TownRole::Member
    );
}

#[test]
fn a_vetoed_nation_cascade_aborts_the_whole_town_deletion() {
    let mut realm = Realm::with_hooks(Box::new(Deny::NationDelete));
    let (alba, finn) = town_with_founder(&mut realm, "Alba", "Finn");
    let caldera = realm.create_nation("Caldera", alba, finn).unwrap();

    // Deleting the capital would cascade into the vetoed nation delete, so
    // nothing at all happens.
    assert_eq!(
        realm.delete_town(alba, Some(finn)),
        Err(RealmError::Vetoed {
            hook: "nation-delete"
        })
    );
    assert!(realm.towns().get(alba).is_some());
    assert!(realm.nations().get(caldera).is_some());
    assert_invariants(&realm);
}

// =============================================================================
// Tax sweeps
// =============================================================================

fn collector() -> TaxCollector {
    TaxCollector::new(TaxSchedule::from_settings(&TaxSettings {
        enabled: true,
        town_interval_secs: 3_600,
        nation_interval_secs: 3_600,
    }))
}

#[test]
fn town_taxes_move_from_wallets_to_the_town_bank() {
    let mut realm = Realm::new();
    let (town_id, _) = town_with_founder(&mut realm, "Alba", "Finn");
    let payer = resident(&mut realm, "Maren");
    let broke = resident(&mut realm, "Orin");
    realm.join_town(town_id, payer).unwrap();
    realm.join_town(town_id, broke).unwrap();
    realm.towns_mut().set_tax_rate(town_id, dec!(10)).unwrap();

    let mut wallet = WalletBank::new();
    wallet.set_balance(payer, dec!(50));
    wallet.set_balance(broke, dec!(3));

    let later = Utc::now() + TimeDelta::try_hours(2).unwrap();
    let report = collector().check_and_collect(&mut realm, &mut wallet, later);

    assert_eq!(wallet.balance_of(payer), dec!(40));
    assert_eq!(wallet.balance_of(broke), dec!(3));
    assert_eq!(realm.towns().get(town_id).unwrap().bank.balance(), dec!(10));
    assert!(report.notices.contains(&TaxNotice::ResidentPaid {
        resident: payer,
        town: town_id,
        amount: dec!(10),
    }));
    assert!(report.notices.contains(&TaxNotice::ResidentDefaulted {
        resident: broke,
        town: town_id,
        amount: dec!(10),
    }));
    assert!(report.notices.contains(&TaxNotice::TownCollected {
        town: town_id,
        total: dec!(10),
    }));
}

#[test]
fn the_owner_is_exempt_from_town_taxes() {
    let mut realm = Realm::new();
    let (town_id, owner) = town_with_founder(&mut realm, "Alba", "Finn");
    realm.towns_mut().set_tax_rate(town_id, dec!(10)).unwrap();

    let mut wallet = WalletBank::new();
    wallet.set_balance(owner, dec!(100));

    let later = Utc::now() + TimeDelta::try_hours(2).unwrap();
    let report = collector().check_and_collect(&mut realm, &mut wallet, later);

    assert_eq!(wallet.balance_of(owner), dec!(100));
    assert_eq!(
        realm.towns().get(town_id).unwrap().bank.balance(),
        Decimal::ZERO
    );
    assert_eq!(report.towns_collected, 1);
}

#[test]
fn a_sweep_within_the_same_window_collects_nothing_twice() {
    let mut realm = Realm::new();
    let (town_id, _) = town_with_founder(&mut realm, "Alba", "Finn");
    let payer = resident(&mut realm, "Maren");
    realm.join_town(town_id, payer).unwrap();
    realm.towns_mut().set_tax_rate(town_id, dec!(10)).unwrap();

    let mut wallet = WalletBank::new();
    wallet.set_balance(payer, dec!(100));

    let later = Utc::now() + TimeDelta::try_hours(2).unwrap();
    let taxman = collector();
    let first = taxman.check_and_collect(&mut realm, &mut wallet, later);
    let second = taxman.check_and_collect(&mut realm, &mut wallet, later);

    assert_eq!(first.towns_collected, 1);
    assert_eq!(second.towns_collected, 0);
    assert!(second.notices.is_empty());
    assert_eq!(wallet.balance_of(payer), dec!(90));
}

#[test]
fn a_defaulting_town_still_advances_the_nation_timer() {
    let mut realm = Realm::new();
    let (alba, finn) = town_with_founder(&mut realm, "Alba", "Finn");
    let (brel, _) = town_with_founder(&mut realm, "Brel", "Maren");
    let caldera = realm.create_nation("Caldera", alba, finn).unwrap();
    realm.add_town_to_nation(caldera, brel).unwrap();
    realm.nations_mut().set_tax_rate(caldera, dec!(10)).unwrap();
    realm.towns_mut().deposit(brel, dec!(5)).unwrap();

    let mut wallet = WalletBank::new();
    let later = Utc::now() + TimeDelta::try_hours(2).unwrap();
    let report = collector().check_and_collect(&mut realm, &mut wallet, later);

    // The town could not pay: nothing moved, no penalty applied.
    assert_eq!(realm.towns().get(brel).unwrap().bank.balance(), dec!(5));
    assert_eq!(
        realm.nations().get(caldera).unwrap().bank.balance(),
        Decimal::ZERO
    );
    assert!(report.notices.contains(&TaxNotice::TownDefaulted {
        town: brel,
        nation: caldera,
        amount: dec!(10),
    }));
    // The timer still advanced: no retry storm next sweep.
    assert_eq!(
        realm.nations().get(caldera).unwrap().last_tax_collection,
        later
    );
    let again = collector().check_and_collect(&mut realm, &mut wallet, later);
    assert_eq!(again.nations_collected, 0);
}

#[test]
fn nation_taxes_spare_the_capital_and_fill_the_nation_bank() {
    let mut realm = Realm::new();
    let (alba, finn) = town_with_founder(&mut realm, "Alba", "Finn");
    let (brel, _) = town_with_founder(&mut realm, "Brel", "Maren");
    let caldera = realm.create_nation("Caldera", alba, finn).unwrap();
    realm.add_town_to_nation(caldera, brel).unwrap();
    realm.nations_mut().set_tax_rate(caldera, dec!(10)).unwrap();
    realm.towns_mut().deposit(alba, dec!(100)).unwrap();
    realm.towns_mut().deposit(brel, dec!(100)).unwrap();

    let mut wallet = WalletBank::new();
    let later = Utc::now() + TimeDelta::try_hours(2).unwrap();
    let report = collector().check_and_collect(&mut realm, &mut wallet, later);

    // Capital untouched, member town levied.
    assert_eq!(realm.towns().get(alba).unwrap().bank.balance(), dec!(100));
    assert_eq!(realm.towns().get(brel).unwrap().bank.balance(), dec!(90));
    assert_eq!(
        realm.nations().get(caldera).unwrap().bank.balance(),
        dec!(10)
    );
    assert!(report.notices.contains(&TaxNotice::NationCollected {
        nation: caldera,
        total: dec!(10),
    }));
}

#[test]
fn disabled_taxes_make_the_sweep_a_no_op() {
    let mut realm = Realm::new();
    let (town_id, _) = town_with_founder(&mut realm, "Alba", "Finn");
    let payer = resident(&mut realm, "Maren");
    realm.join_town(town_id, payer).unwrap();
    realm.towns_mut().set_tax_rate(town_id, dec!(10)).unwrap();

    let mut wallet = WalletBank::new();
    wallet.set_balance(payer, dec!(100));

    let off = TaxCollector::new(TaxSchedule::from_settings(&TaxSettings {
        enabled: false,
        town_interval_secs: 3_600,
        nation_interval_secs: 3_600,
    }));
    let later = Utc::now() + TimeDelta::try_hours(2).unwrap();
    let report = off.check_and_collect(&mut realm, &mut wallet, later);

    assert_eq!(report, dominion_core::TaxSweepReport::default());
    assert_eq!(wallet.balance_of(payer), dec!(100));
}
