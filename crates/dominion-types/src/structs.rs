//! Core entity records: residents, towns, nations, claims.
//!
//! These structs carry the data and the *local* guards -- the checks that
//! involve only the record itself (an owner cannot be dropped from the
//! member set, a capital cannot be dropped from the town set, a tax rate is
//! clamped to 0--100). Every cross-record rule lives in the coordinating
//! `Realm` service in `dominion-core`, which is the only caller of the
//! guarded mutators here.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use dominion_ledger::BankAccount;

use crate::enums::{ClaimFlag, NationRole, TownRole};
use crate::ids::{ClaimId, NationId, ResidentId, TownId};

// ---------------------------------------------------------------------------
// ChunkKey
// ---------------------------------------------------------------------------

/// Canonical spatial coordinate of a claim: one cell of the chunk grid.
///
/// The world name is case-sensitive. Keys are ordered and hashable so they
/// can index the claim map directly, and they serialize as their wire form
/// `"world:x:z"` so key-indexed maps survive JSON.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChunkKey {
    /// Name of the world this chunk belongs to.
    pub world: String,
    /// Chunk grid x coordinate.
    pub x: i32,
    /// Chunk grid z coordinate.
    pub z: i32,
}

impl ChunkKey {
    /// Create a key from a world name and grid coordinates.
    pub fn new(world: impl Into<String>, x: i32, z: i32) -> Self {
        Self {
            world: world.into(),
            x,
            z,
        }
    }
}

impl core::fmt::Display for ChunkKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}:{}:{}", self.world, self.x, self.z)
    }
}

/// A chunk-key wire string that did not parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseChunkKeyError {
    /// The rejected input.
    pub input: String,
}

impl core::fmt::Display for ParseChunkKeyError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "invalid chunk key: {:?}", self.input)
    }
}

impl std::error::Error for ParseChunkKeyError {}

impl core::str::FromStr for ChunkKey {
    type Err = ParseChunkKeyError;

    /// Parse the `"world:x:z"` wire form. The coordinates are taken from
    /// the right so world names containing `:` survive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.rsplitn(3, ':');
        let z = parts.next().and_then(|part| part.parse::<i32>().ok());
        let x = parts.next().and_then(|part| part.parse::<i32>().ok());
        let world = parts.next();
        match (world, x, z) {
            (Some(world), Some(x), Some(z)) if !world.is_empty() => {
                Ok(Self::new(world, x, z))
            }
            _ => Err(ParseChunkKeyError {
                input: s.to_owned(),
            }),
        }
    }
}

impl Serialize for ChunkKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ChunkKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// SpawnPoint
// ---------------------------------------------------------------------------

/// A precise teleport destination inside a world.
///
/// Block coordinates are continuous; the enclosing chunk is derived by
/// floor-dividing the x/z block coordinates by 16.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnPoint {
    /// Name of the world (case-sensitive).
    pub world: String,
    /// Block x coordinate.
    pub x: f64,
    /// Block y coordinate.
    pub y: f64,
    /// Block z coordinate.
    pub z: f64,
    /// Horizontal facing angle in degrees.
    pub yaw: f32,
    /// Vertical facing angle in degrees.
    pub pitch: f32,
}

impl SpawnPoint {
    /// The chunk this point falls inside.
    pub fn chunk_key(&self) -> ChunkKey {
        ChunkKey {
            world: self.world.clone(),
            x: block_to_chunk(self.x),
            z: block_to_chunk(self.z),
        }
    }
}

/// Floor-divide a block coordinate by the chunk edge length (16).
#[allow(clippy::cast_possible_truncation)]
fn block_to_chunk(block: f64) -> i32 {
    (block.floor() as i64).div_euclid(16) as i32
}

// ---------------------------------------------------------------------------
// Resident
// ---------------------------------------------------------------------------

/// Per-actor membership and role record.
///
/// Created on an actor's first contact with the core; membership fields are
/// mutated only by the registries, never by command-side code holding a
/// reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resident {
    /// Stable opaque actor identifier.
    pub id: ResidentId,
    /// Current display name. Refreshed when the actor reconnects renamed.
    pub name: String,
    /// Town this resident belongs to, if any.
    pub town_id: Option<TownId>,
    /// Rank within the town. Meaningless while `town_id` is `None`.
    pub town_role: TownRole,
    /// Nation this resident belongs to, if any.
    pub nation_id: Option<NationId>,
    /// Rank within the nation. Meaningless while `nation_id` is `None`.
    pub nation_role: NationRole,
    /// Last time the actor was seen by the platform.
    pub last_active: DateTime<Utc>,
    /// Whether outgoing chat is routed to the town channel.
    pub town_chat: bool,
    /// Whether outgoing chat is routed to the nation channel.
    ///
    /// Mutually exclusive with `town_chat`; the registry toggles enforce it.
    pub nation_chat: bool,
}

impl Resident {
    /// Create a fresh record for an actor with no memberships.
    pub fn new(id: ResidentId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            town_id: None,
            town_role: TownRole::Member,
            nation_id: None,
            nation_role: NationRole::Member,
            last_active: Utc::now(),
            town_chat: false,
            nation_chat: false,
        }
    }

    /// Whether the resident currently belongs to a town.
    pub const fn has_town(&self) -> bool {
        self.town_id.is_some()
    }

    /// Whether the resident currently belongs to a nation.
    pub const fn has_nation(&self) -> bool {
        self.nation_id.is_some()
    }

    /// Reset town membership: clears the town id, drops the role back to
    /// Member, and leaves the town chat channel. Nation state is untouched.
    pub fn leave_town(&mut self) {
        self.town_id = None;
        self.town_role = TownRole::Member;
        self.town_chat = false;
    }

    /// Reset nation membership: clears the nation id, drops the role back
    /// to Member, and leaves the nation chat channel. Town state is
    /// untouched.
    pub fn leave_nation(&mut self) {
        self.nation_id = None;
        self.nation_role = NationRole::Member;
        self.nation_chat = false;
    }

    /// Whether the resident is in a town and holds at least `required`.
    pub fn has_town_permission(&self, required: TownRole) -> bool {
        self.has_town() && self.town_role.is_at_least(required)
    }

    /// Whether the resident is in a nation and holds at least `required`.
    pub fn has_nation_permission(&self, required: NationRole) -> bool {
        self.has_nation() && self.nation_role.is_at_least(required)
    }
}

// ---------------------------------------------------------------------------
// Town
// ---------------------------------------------------------------------------

/// A collective of residents owning a bank account and a set of chunk
/// claims.
///
/// The member and claim sets are private: the owner can never be dropped
/// from the member set through this type, and the claim set only changes in
/// lockstep with the claim index (the `Realm` guarantees the pairing).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Town {
    id: TownId,
    name: String,
    owner_id: ResidentId,
    residents: BTreeSet<ResidentId>,
    claims: BTreeSet<ClaimId>,
    tax_rate: Decimal,
    /// The town's bank account. The account enforces its own non-negative
    /// invariant.
    pub bank: BankAccount,
    /// Teleport destination inside one of the town's claims, if set.
    pub spawn: Option<SpawnPoint>,
    /// Nation this town belongs to, if any.
    pub nation_id: Option<NationId>,
    /// Last time the tax collector ran a pass over this town.
    pub last_tax_collection: DateTime<Utc>,
    /// Whether the town is open for anyone to join.
    pub public: bool,
}

impl Town {
    /// Base number of claims every town may hold.
    pub const BASE_CLAIM_LIMIT: usize = 5;
    /// Additional claims granted per resident.
    pub const CLAIMS_PER_RESIDENT: usize = 10;
    /// Bonus claims granted once the resident count reaches
    /// [`Self::BONUS_RESIDENT_THRESHOLD`].
    pub const RESIDENT_BONUS_CLAIMS: usize = 15;
    /// Resident count at which the bonus applies.
    pub const BONUS_RESIDENT_THRESHOLD: usize = 5;

    /// Create a town with the founder as owner and sole member.
    pub fn new(id: TownId, name: impl Into<String>, owner_id: ResidentId) -> Self {
        let mut residents = BTreeSet::new();
        residents.insert(owner_id);
        Self {
            id,
            name: name.into(),
            owner_id,
            residents,
            claims: BTreeSet::new(),
            tax_rate: Decimal::ZERO,
            bank: BankAccount::new(id.into_inner()),
            spawn: None,
            nation_id: None,
            last_tax_collection: Utc::now(),
            public: false,
        }
    }

    /// The town's identifier.
    pub const fn id(&self) -> TownId {
        self.id
    }

    /// The town's display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The resident who owns the town. Always a member.
    pub const fn owner_id(&self) -> ResidentId {
        self.owner_id
    }

    /// Whether this town belongs to a nation.
    pub const fn has_nation(&self) -> bool {
        self.nation_id.is_some()
    }

    /// The member set, read-only.
    pub const fn residents(&self) -> &BTreeSet<ResidentId> {
        &self.residents
    }

    /// Number of members.
    pub fn resident_count(&self) -> usize {
        self.residents.len()
    }

    /// Whether `resident_id` is a member.
    pub fn is_resident(&self, resident_id: ResidentId) -> bool {
        self.residents.contains(&resident_id)
    }

    /// Add a member. Returns `false` if already present.
    pub fn add_resident(&mut self, resident_id: ResidentId) -> bool {
        self.residents.insert(resident_id)
    }

    /// Remove a member.
    ///
    /// The owner can never be removed this way -- only ownership transfer
    /// or town deletion detaches an owner. Returns `false` if the target is
    /// the owner or not a member.
    pub fn remove_resident(&mut self, resident_id: ResidentId) -> bool {
        if resident_id == self.owner_id {
            return false;
        }
        self.residents.remove(&resident_id)
    }

    /// The claim set, read-only.
    pub const fn claims(&self) -> &BTreeSet<ClaimId> {
        &self.claims
    }

    /// Number of claims held.
    pub fn claim_count(&self) -> usize {
        self.claims.len()
    }

    /// Whether the town holds `claim_id`.
    pub fn has_claim(&self, claim_id: ClaimId) -> bool {
        self.claims.contains(&claim_id)
    }

    /// Register a claim id. Returns `false` if already present.
    pub fn add_claim(&mut self, claim_id: ClaimId) -> bool {
        self.claims.insert(claim_id)
    }

    /// Deregister a claim id. Returns `false` if absent.
    pub fn remove_claim(&mut self, claim_id: ClaimId) -> bool {
        self.claims.remove(&claim_id)
    }

    /// Maximum number of claims this town may hold, derived from its
    /// resident count: a base allowance, a per-resident bonus, and an
    /// extra bonus at five residents.
    pub fn max_claims(&self) -> usize {
        let residents = self.resident_count();
        let mut limit = Self::BASE_CLAIM_LIMIT
            .saturating_add(residents.saturating_mul(Self::CLAIMS_PER_RESIDENT));
        if residents >= Self::BONUS_RESIDENT_THRESHOLD {
            limit = limit.saturating_add(Self::RESIDENT_BONUS_CLAIMS);
        }
        limit
    }

    /// Whether the town is under its derived claim limit.
    pub fn can_claim_more(&self) -> bool {
        self.claims.len() < self.max_claims()
    }

    /// Current tax rate (0--100), levied per member per collection.
    pub const fn tax_rate(&self) -> Decimal {
        self.tax_rate
    }

    /// Set the tax rate, clamped to the 0--100 range.
    pub fn set_tax_rate(&mut self, rate: Decimal) {
        self.tax_rate = rate.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED);
    }

    /// Hand the town to a new owner.
    ///
    /// The new owner must already be a member; returns `false` otherwise.
    /// Role changes for both parties are the caller's responsibility.
    pub fn transfer_ownership(&mut self, new_owner_id: ResidentId) -> bool {
        if !self.residents.contains(&new_owner_id) {
            return false;
        }
        self.owner_id = new_owner_id;
        true
    }
}

// ---------------------------------------------------------------------------
// Nation
// ---------------------------------------------------------------------------

/// A federation of towns with a permanently-privileged capital.
///
/// The town set is private for the same reason as [`Town`]'s member set:
/// the capital can never be dropped through this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Nation {
    id: NationId,
    name: String,
    capital_id: TownId,
    leader_id: ResidentId,
    towns: BTreeSet<TownId>,
    tax_rate: Decimal,
    /// The nation's bank account.
    pub bank: BankAccount,
    /// Teleport destination inside a member town's claim, if set.
    pub spawn: Option<SpawnPoint>,
    /// Last time the tax collector ran a pass over this nation.
    pub last_tax_collection: DateTime<Utc>,
    /// Whether the nation is open for any town to join.
    pub public: bool,
}

impl Nation {
    /// Create a nation with the capital as its first member town.
    pub fn new(
        id: NationId,
        name: impl Into<String>,
        capital_id: TownId,
        leader_id: ResidentId,
    ) -> Self {
        let mut towns = BTreeSet::new();
        towns.insert(capital_id);
        Self {
            id,
            name: name.into(),
            capital_id,
            leader_id,
            towns,
            tax_rate: Decimal::ZERO,
            bank: BankAccount::new(id.into_inner()),
            spawn: None,
            last_tax_collection: Utc::now(),
            public: false,
        }
    }

    /// The nation's identifier.
    pub const fn id(&self) -> NationId {
        self.id
    }

    /// The nation's display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The capital town. Always a member.
    pub const fn capital_id(&self) -> TownId {
        self.capital_id
    }

    /// The resident leading the nation (King).
    pub const fn leader_id(&self) -> ResidentId {
        self.leader_id
    }

    /// Install a new leader. Role changes are the caller's responsibility.
    pub fn set_leader(&mut self, leader_id: ResidentId) {
        self.leader_id = leader_id;
    }

    /// The member town set, read-only.
    pub const fn towns(&self) -> &BTreeSet<TownId> {
        &self.towns
    }

    /// Number of member towns.
    pub fn town_count(&self) -> usize {
        self.towns.len()
    }

    /// Whether `town_id` is a member.
    pub fn has_town(&self, town_id: TownId) -> bool {
        self.towns.contains(&town_id)
    }

    /// Add a member town. Returns `false` if already present.
    pub fn add_town(&mut self, town_id: TownId) -> bool {
        self.towns.insert(town_id)
    }

    /// Remove a member town.
    ///
    /// The capital can never be removed; deleting the capital deletes the
    /// nation instead. Returns `false` for the capital or a non-member.
    pub fn remove_town(&mut self, town_id: TownId) -> bool {
        if town_id == self.capital_id {
            return false;
        }
        self.towns.remove(&town_id)
    }

    /// Move the capital to another member town.
    ///
    /// Returns `false` if the town is not a member.
    pub fn change_capital(&mut self, new_capital_id: TownId) -> bool {
        if !self.towns.contains(&new_capital_id) {
            return false;
        }
        self.capital_id = new_capital_id;
        true
    }

    /// Current tax rate (0--100), levied per member town per collection.
    pub const fn tax_rate(&self) -> Decimal {
        self.tax_rate
    }

    /// Set the tax rate, clamped to the 0--100 range.
    pub fn set_tax_rate(&mut self, rate: Decimal) {
        self.tax_rate = rate.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED);
    }
}

// ---------------------------------------------------------------------------
// Claim
// ---------------------------------------------------------------------------

/// An exclusively-owned chunk of the world grid.
///
/// The spatial key is immutable and is the canonical equality and hash
/// basis: two claims are the same claim iff they cover the same chunk,
/// regardless of which town currently owns them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claim {
    id: ClaimId,
    key: ChunkKey,
    town_id: TownId,
    flags: BTreeMap<ClaimFlag, bool>,
}

impl Claim {
    /// Create a claim over `key` for `town_id`, with every flag at its
    /// compiled-in default.
    pub fn new(id: ClaimId, key: ChunkKey, town_id: TownId) -> Self {
        let flags = ClaimFlag::ALL
            .iter()
            .map(|flag| (*flag, flag.default_value()))
            .collect();
        Self {
            id,
            key,
            town_id,
            flags,
        }
    }

    /// The claim's identifier.
    pub const fn id(&self) -> ClaimId {
        self.id
    }

    /// The chunk this claim covers.
    pub const fn key(&self) -> &ChunkKey {
        &self.key
    }

    /// The town that owns this claim.
    pub const fn town_id(&self) -> TownId {
        self.town_id
    }

    /// Read a flag, falling back to its compiled-in default when unset.
    pub fn flag(&self, flag: ClaimFlag) -> bool {
        self.flags
            .get(&flag)
            .copied()
            .unwrap_or_else(|| flag.default_value())
    }

    /// Set a flag explicitly.
    pub fn set_flag(&mut self, flag: ClaimFlag, value: bool) {
        self.flags.insert(flag, value);
    }

    /// Snapshot of the full flag table (defaults materialized).
    pub fn flags(&self) -> BTreeMap<ClaimFlag, bool> {
        ClaimFlag::ALL
            .iter()
            .map(|flag| (*flag, self.flag(*flag)))
            .collect()
    }
}

impl PartialEq for Claim {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Claim {}

impl core::hash::Hash for Claim {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

// ---------------------------------------------------------------------------
// RealmSnapshot
// ---------------------------------------------------------------------------

/// Full capture of the registry state for the persistence collaborator.
///
/// Restoring a snapshot rebuilds every derived index (name maps, the
/// chunk-key index) from these records; nothing outside this container is
/// needed to reconstruct the realm exactly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RealmSnapshot {
    /// Every resident record.
    pub residents: Vec<Resident>,
    /// Every town record.
    pub towns: Vec<Town>,
    /// Every nation record.
    pub nations: Vec<Nation>,
    /// Every claim record.
    pub claims: Vec<Claim>,
}
