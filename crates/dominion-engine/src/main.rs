//! Engine shell for the Dominion hierarchy.
//!
//! This binary wires the realm together for a standalone deployment: it
//! loads configuration and the last snapshot, then drives the tax
//! collector on a fixed cadence until shutdown, at which point the realm
//! is snapshotted back to disk. Command handlers and the game-server event
//! loop are external; they call into the realm this process hosts.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `dominion-config.yaml`
//! 3. Restore the realm from the snapshot file, if one exists
//! 4. Apply claim settings and build the tax collector
//! 5. Run the sweep loop until ctrl-c
//! 6. Snapshot the realm back to disk

mod error;

use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use dominion_core::{
    DominionConfig, Realm, TaxCollector, TaxSchedule, WalletBank,
};
use dominion_types::RealmSnapshot;

use crate::error::EngineError;

/// Configuration file consulted at startup.
const CONFIG_PATH: &str = "dominion-config.yaml";

/// Application entry point for the engine shell.
///
/// # Errors
///
/// Returns an error if configuration or snapshot handling fails; the
/// sweep loop itself never errors.
#[tokio::main]
async fn main() -> Result<(), EngineError> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("dominion-engine starting");

    // 2. Load configuration.
    let config = load_config()?;
    info!(
        taxes_enabled = config.taxes.enabled,
        town_interval_secs = config.taxes.town_interval_secs,
        nation_interval_secs = config.taxes.nation_interval_secs,
        sweep_interval_secs = config.engine.sweep_interval_secs,
        "Configuration loaded"
    );

    let DominionConfig {
        taxes,
        claims,
        engine,
    } = config;

    // 3. Restore the realm from the last snapshot, if present.
    let snapshot_path = engine.snapshot_path;
    let mut realm = load_realm(Path::new(&snapshot_path))?;
    info!(
        residents = realm.residents().len(),
        towns = realm.towns().len(),
        nations = realm.nations().len(),
        claims = realm.claims().len(),
        "Realm ready"
    );

    // 4. Apply claim settings and build the collector.
    realm.set_claim_settings(claims);
    let collector = TaxCollector::new(TaxSchedule::from_settings(&taxes));

    // The in-process currency provider. Deployments with an external
    // economy plug their own CurrencyProvider here.
    let mut wallets = WalletBank::new();

    // 5. Sweep loop.
    let mut ticker =
        tokio::time::interval(Duration::from_secs(engine.sweep_interval_secs.max(1)));
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let report = collector.check_and_collect(&mut realm, &mut wallets, Utc::now());
                if report.towns_collected > 0 || report.nations_collected > 0 {
                    info!(
                        towns = report.towns_collected,
                        nations = report.nations_collected,
                        notices = report.notices.len(),
                        "Tax sweep collected"
                    );
                }
            }
            result = tokio::signal::ctrl_c() => {
                if let Err(source) = result {
                    warn!(error = %source, "ctrl-c handler failed, shutting down");
                }
                break;
            }
        }
    }

    // 6. Snapshot the realm back to disk.
    save_realm(&realm, Path::new(&snapshot_path))?;
    info!(path = %snapshot_path, "Realm snapshot saved, goodbye");
    Ok(())
}

/// Load configuration, falling back to defaults when no file exists.
fn load_config() -> Result<DominionConfig, EngineError> {
    let path = Path::new(CONFIG_PATH);
    if path.exists() {
        Ok(DominionConfig::load(path)?)
    } else {
        info!(path = CONFIG_PATH, "No config file, using defaults");
        Ok(DominionConfig::default())
    }
}

/// Restore the realm from a snapshot file, or start empty.
fn load_realm(path: &Path) -> Result<Realm, EngineError> {
    if !path.exists() {
        info!(path = %path.display(), "No snapshot, starting an empty realm");
        return Ok(Realm::new());
    }
    let contents = std::fs::read_to_string(path)?;
    let snapshot: RealmSnapshot = serde_json::from_str(&contents)?;
    Ok(Realm::from_snapshot(snapshot)?)
}

/// Write the realm snapshot to disk as JSON.
fn save_realm(realm: &Realm, path: &Path) -> Result<(), EngineError> {
    let snapshot = realm.snapshot();
    let contents = serde_json::to_string_pretty(&snapshot)?;
    std::fs::write(path, contents)?;
    Ok(())
}
