//! Registries, the coordinating realm service, and tax collection.
//!
//! This crate is the in-memory authority core of the Dominion hierarchy.
//! It owns the resident, town, and nation registries, composes them with
//! the spatial claim index from `dominion-claims`, and exposes every
//! cross-registry operation through the [`Realm`] service so that the
//! bidirectional invariants are maintained inside single operations --
//! never split across calls a caller could interleave.
//!
//! # Modules
//!
//! - [`resident`] -- Resident registry: lookup, lifecycle, roles, chat
//! - [`town`] -- Town registry: id + name maps, bank, tax rate
//! - [`nation`] -- Nation registry: the same one level up
//! - [`realm`] -- The coordinating service ([`Realm`])
//! - [`hooks`] -- Pre-commit veto callbacks ([`RealmHooks`])
//! - [`economy`] -- Currency-provider seam ([`CurrencyProvider`],
//!   [`WalletBank`])
//! - [`tax`] -- The periodic tax collector ([`TaxCollector`])
//! - [`snapshot`] -- Full-state capture and restore
//! - [`config`] -- YAML-backed configuration ([`DominionConfig`])
//! - [`error`] -- The core error taxonomy ([`RealmError`])

pub mod config;
pub mod economy;
pub mod error;
pub mod hooks;
pub mod nation;
pub mod realm;
pub mod resident;
pub mod snapshot;
pub mod tax;
pub mod town;

// Re-export primary types at crate root for convenience.
pub use config::{ClaimSettings, ConfigError, DominionConfig, EngineSettings, PayPriority, TaxSettings};
pub use economy::{CurrencyProvider, WalletBank};
pub use error::RealmError;
pub use hooks::{AllowAll, RealmHooks};
pub use nation::NationRegistry;
pub use realm::Realm;
pub use resident::ResidentRegistry;
pub use tax::{TaxCollector, TaxNotice, TaxSchedule, TaxSweepReport};
pub use town::TownRegistry;
