//! Role hierarchies and claim permission flags.
//!
//! Two independent total orders govern authority: [`TownRole`] within a
//! town and [`NationRole`] within a nation. Each is a closed enumeration
//! with a numeric level strictly increasing from the Member floor to the
//! Owner/King ceiling. Promotion and demotion always move exactly one
//! level; the top rank is only ever reached through the explicit
//! ownership/leadership transfer operations.
//!
//! [`ClaimFlag`] is the closed set of per-claim behavior toggles. Each flag
//! carries a compiled-in default applied when a claim has no explicit value
//! for it.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// TownRole
// ---------------------------------------------------------------------------

/// Rank of a resident within their town.
///
/// Ordering follows the numeric level: Member < Knight < Mayor < Owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TownRole {
    /// Baseline rank; no special privileges.
    Member,
    /// May claim and unclaim chunks for the town.
    Knight,
    /// May invite, kick, promote, and demote lower ranks.
    Mayor,
    /// The single town owner. Reached only via ownership transfer.
    Owner,
}

impl TownRole {
    /// Numeric level of this role (Member = 0 .. Owner = 3).
    pub const fn level(self) -> u8 {
        match self {
            Self::Member => 0,
            Self::Knight => 1,
            Self::Mayor => 2,
            Self::Owner => 3,
        }
    }

    /// Whether this role's level is at least `other`'s.
    pub const fn is_at_least(self, other: Self) -> bool {
        self.level() >= other.level()
    }

    /// Look a role up by numeric level.
    ///
    /// Unknown or out-of-range levels clamp to [`TownRole::Member`] -- the
    /// permissive fallback -- rather than erroring.
    pub const fn from_level(level: u8) -> Self {
        match level {
            1 => Self::Knight,
            2 => Self::Mayor,
            3 => Self::Owner,
            _ => Self::Member,
        }
    }

    /// The role one level up, or `None` at the Owner ceiling.
    pub const fn successor(self) -> Option<Self> {
        match self {
            Self::Member => Some(Self::Knight),
            Self::Knight => Some(Self::Mayor),
            Self::Mayor => Some(Self::Owner),
            Self::Owner => None,
        }
    }

    /// The role one level down, or `None` at the Member floor.
    pub const fn predecessor(self) -> Option<Self> {
        match self {
            Self::Member => None,
            Self::Knight => Some(Self::Member),
            Self::Mayor => Some(Self::Knight),
            Self::Owner => Some(Self::Mayor),
        }
    }

    /// Human-readable rank name.
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Member => "Member",
            Self::Knight => "Knight",
            Self::Mayor => "Mayor",
            Self::Owner => "Owner",
        }
    }
}

// ---------------------------------------------------------------------------
// NationRole
// ---------------------------------------------------------------------------

/// Rank of a resident within their nation.
///
/// Ordering follows the numeric level: Member < Knight < Officer < King.
/// The mid-tier name differs from the town hierarchy but holds the same
/// class of privileges (invites, promotions of lower ranks).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NationRole {
    /// Baseline rank; no special privileges.
    Member,
    /// Trusted rank below officer.
    Knight,
    /// May invite towns and promote or demote lower ranks.
    Officer,
    /// The single nation leader. Reached only via leadership transfer.
    King,
}

impl NationRole {
    /// Numeric level of this role (Member = 0 .. King = 3).
    pub const fn level(self) -> u8 {
        match self {
            Self::Member => 0,
            Self::Knight => 1,
            Self::Officer => 2,
            Self::King => 3,
        }
    }

    /// Whether this role's level is at least `other`'s.
    pub const fn is_at_least(self, other: Self) -> bool {
        self.level() >= other.level()
    }

    /// Look a role up by numeric level, clamping unknown levels to
    /// [`NationRole::Member`].
    pub const fn from_level(level: u8) -> Self {
        match level {
            1 => Self::Knight,
            2 => Self::Officer,
            3 => Self::King,
            _ => Self::Member,
        }
    }

    /// The role one level up, or `None` at the King ceiling.
    pub const fn successor(self) -> Option<Self> {
        match self {
            Self::Member => Some(Self::Knight),
            Self::Knight => Some(Self::Officer),
            Self::Officer => Some(Self::King),
            Self::King => None,
        }
    }

    /// The role one level down, or `None` at the Member floor.
    pub const fn predecessor(self) -> Option<Self> {
        match self {
            Self::Member => None,
            Self::Knight => Some(Self::Member),
            Self::Officer => Some(Self::Knight),
            Self::King => Some(Self::Officer),
        }
    }

    /// Human-readable rank name.
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Member => "Member",
            Self::Knight => "Knight",
            Self::Officer => "Officer",
            Self::King => "King",
        }
    }
}

// ---------------------------------------------------------------------------
// ClaimFlag
// ---------------------------------------------------------------------------

/// Per-claim behavior toggles.
///
/// A closed set: flags are never defined at runtime. Each flag carries a
/// compiled-in default applied when a claim has no explicit value, and a
/// stable wire id used by the persistence collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ClaimFlag {
    /// Allow player-versus-player combat inside the claim.
    Pvp,
    /// Allow explosions inside the claim.
    Explosions,
    /// Allow hostile creatures to spawn inside the claim.
    MobSpawning,
    /// Allow fire to spread inside the claim.
    FireSpread,
    /// Allow building by residents of other towns.
    Build,
    /// Allow block interaction by residents of other towns.
    Interact,
    /// Allow anyone to teleport to this claim.
    PublicSpawn,
}

impl ClaimFlag {
    /// All flags, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::Pvp,
        Self::Explosions,
        Self::MobSpawning,
        Self::FireSpread,
        Self::Build,
        Self::Interact,
        Self::PublicSpawn,
    ];

    /// Stable wire id for configuration and persistence.
    pub const fn wire_id(self) -> &'static str {
        match self {
            Self::Pvp => "pvp",
            Self::Explosions => "explosions",
            Self::MobSpawning => "mob-spawning",
            Self::FireSpread => "fire-spread",
            Self::Build => "build",
            Self::Interact => "interact",
            Self::PublicSpawn => "public-spawn",
        }
    }

    /// Human-readable description of the toggle.
    pub const fn description(self) -> &'static str {
        match self {
            Self::Pvp => "Allow PvP combat in the claim",
            Self::Explosions => "Allow explosions in the claim",
            Self::MobSpawning => "Allow mob spawning in the claim",
            Self::FireSpread => "Allow fire to spread in the claim",
            Self::Build => "Allow building by non-town members",
            Self::Interact => "Allow interactions by non-town members",
            Self::PublicSpawn => "Allow anyone to teleport to this claim",
        }
    }

    /// The compiled-in default applied when a claim has no explicit value.
    ///
    /// Mob spawning defaults on; every other toggle defaults off.
    pub const fn default_value(self) -> bool {
        matches!(self, Self::MobSpawning)
    }

    /// Look a flag up by its wire id. Returns `None` for unknown ids.
    pub fn from_wire(id: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|flag| flag.wire_id() == id)
    }
}
