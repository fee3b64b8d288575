//! Periodic tax collection over towns and nations.
//!
//! The collector sweeps on an external cadence. Each sweep walks every
//! town, then every nation; an entity whose elapsed time since its last
//! collection has reached its configured interval gets one collection
//! pass, and its timer resets *regardless of the pass outcome* -- a
//! zero-rate or fully-defaulted pass still advances the timer, which is
//! what prevents retry storms.
//!
//! Town passes levy the flat `tax_rate` from every member except the
//! owner, via the external currency provider; members that cannot pay
//! simply contribute nothing. Nation passes levy the nation's `tax_rate`
//! from every member town's bank except the capital's; a town that cannot
//! cover it is in default, and the core applies no penalty beyond the
//! report entry.
//!
//! Nothing is retried mid-sweep, and one member's failure never blocks the
//! rest of the pass. The sweep returns a [`TaxSweepReport`] of typed
//! notices; rendering them to players is the caller's concern.

use chrono::{DateTime, TimeDelta, Utc};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use dominion_types::{NationId, ResidentId, TownId};

use crate::config::TaxSettings;
use crate::economy::CurrencyProvider;
use crate::realm::Realm;

/// Interval floor: collections never run more often than this.
const MIN_INTERVAL_SECS: u64 = 300;

/// Resolved tax timing, with the five-minute floor applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaxSchedule {
    /// Master switch; a disabled schedule makes every sweep a no-op.
    pub enabled: bool,
    town_interval: TimeDelta,
    nation_interval: TimeDelta,
}

impl TaxSchedule {
    /// Build a schedule from configuration, clamping both intervals to the
    /// five-minute floor.
    pub fn from_settings(settings: &TaxSettings) -> Self {
        Self {
            enabled: settings.enabled,
            town_interval: clamp_interval(settings.town_interval_secs),
            nation_interval: clamp_interval(settings.nation_interval_secs),
        }
    }

    /// The effective town collection interval.
    pub const fn town_interval(&self) -> TimeDelta {
        self.town_interval
    }

    /// The effective nation collection interval.
    pub const fn nation_interval(&self) -> TimeDelta {
        self.nation_interval
    }
}

impl Default for TaxSchedule {
    fn default() -> Self {
        Self::from_settings(&TaxSettings::default())
    }
}

/// Clamp a configured interval to the floor and convert to a [`TimeDelta`].
fn clamp_interval(secs: u64) -> TimeDelta {
    let secs = secs.max(MIN_INTERVAL_SECS);
    TimeDelta::try_seconds(i64::try_from(secs).unwrap_or(i64::MAX))
        .unwrap_or(TimeDelta::MAX)
}

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

/// One notification-worthy event from a sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaxNotice {
    /// A member paid their town levy.
    ResidentPaid {
        /// The paying member.
        resident: ResidentId,
        /// The collecting town.
        town: TownId,
        /// Amount moved into the town bank.
        amount: Decimal,
    },
    /// A member could not cover their town levy and contributed nothing.
    ResidentDefaulted {
        /// The defaulting member.
        resident: ResidentId,
        /// The collecting town.
        town: TownId,
        /// The levy they could not cover.
        amount: Decimal,
    },
    /// A town pass finished with a non-zero aggregate.
    TownCollected {
        /// The collecting town.
        town: TownId,
        /// Sum of all member payments this pass.
        total: Decimal,
    },
    /// A member town paid its nation levy.
    TownPaidNation {
        /// The paying town.
        town: TownId,
        /// The collecting nation.
        nation: NationId,
        /// Amount moved from town bank to nation bank.
        amount: Decimal,
    },
    /// A member town's bank could not cover the nation levy.
    ///
    /// No penalty is applied by the core; downstream policy may act on the
    /// notice.
    TownDefaulted {
        /// The defaulting town.
        town: TownId,
        /// The collecting nation.
        nation: NationId,
        /// The levy the town could not cover.
        amount: Decimal,
    },
    /// A nation pass finished with a non-zero aggregate.
    NationCollected {
        /// The collecting nation.
        nation: NationId,
        /// Sum of all town payments this pass.
        total: Decimal,
    },
}

/// Summary of a single sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaxSweepReport {
    /// Everything worth telling someone about, in occurrence order.
    pub notices: Vec<TaxNotice>,
    /// Towns whose interval had elapsed and were passed over.
    pub towns_collected: u32,
    /// Nations whose interval had elapsed and were passed over.
    pub nations_collected: u32,
}

// ---------------------------------------------------------------------------
// Collector
// ---------------------------------------------------------------------------

/// The periodic tax collector.
///
/// Holds only the schedule; all entity state lives in the realm. The
/// caller guarantees sweeps are serialized (one finishes before the next
/// starts) -- overlapping sweeps would double-charge.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaxCollector {
    schedule: TaxSchedule,
}

impl TaxCollector {
    /// Create a collector with the given schedule.
    pub const fn new(schedule: TaxSchedule) -> Self {
        Self { schedule }
    }

    /// The active schedule.
    pub const fn schedule(&self) -> &TaxSchedule {
        &self.schedule
    }

    /// Run one sweep at time `now`.
    ///
    /// Every town and nation whose interval has elapsed gets exactly one
    /// collection pass and a timer reset. Entities still inside their
    /// window are untouched, which makes a second sweep in the same window
    /// a no-op for already-collected entities.
    pub fn check_and_collect(
        &self,
        realm: &mut Realm,
        currency: &mut dyn CurrencyProvider,
        now: DateTime<Utc>,
    ) -> TaxSweepReport {
        let mut report = TaxSweepReport::default();
        if !self.schedule.enabled {
            return report;
        }

        for town_id in realm.towns.ids() {
            let due = realm
                .towns
                .get(town_id)
                .is_some_and(|town| {
                    now.signed_duration_since(town.last_tax_collection)
                        >= self.schedule.town_interval
                });
            if !due {
                continue;
            }
            collect_town_tax(realm, currency, town_id, &mut report);
            if let Some(town) = realm.towns.get_mut(town_id) {
                // Reset even when nothing was collected.
                town.last_tax_collection = now;
            }
            report.towns_collected = report.towns_collected.saturating_add(1);
        }

        for nation_id in realm.nations.ids() {
            let due = realm
                .nations
                .get(nation_id)
                .is_some_and(|nation| {
                    now.signed_duration_since(nation.last_tax_collection)
                        >= self.schedule.nation_interval
                });
            if !due {
                continue;
            }
            collect_nation_tax(realm, nation_id, &mut report);
            if let Some(nation) = realm.nations.get_mut(nation_id) {
                nation.last_tax_collection = now;
            }
            report.nations_collected = report.nations_collected.saturating_add(1);
        }

        info!(
            towns = report.towns_collected,
            nations = report.nations_collected,
            notices = report.notices.len(),
            "tax sweep finished"
        );
        report
    }
}

/// One collection pass over a town: levy the tax rate from every member
/// except the owner.
fn collect_town_tax(
    realm: &mut Realm,
    currency: &mut dyn CurrencyProvider,
    town_id: TownId,
    report: &mut TaxSweepReport,
) {
    let Some(town) = realm.towns.get(town_id) else {
        return;
    };
    let rate = town.tax_rate();
    if rate <= Decimal::ZERO {
        return;
    }
    let owner_id = town.owner_id();
    let member_ids: Vec<ResidentId> = town.residents().iter().copied().collect();

    let mut total = Decimal::ZERO;
    for resident_id in member_ids {
        if resident_id == owner_id {
            continue;
        }
        if realm.residents.get(resident_id).is_none() {
            continue;
        }

        if currency.has(resident_id, rate) && currency.withdraw(resident_id, rate) {
            let deposited = realm
                .towns
                .get_mut(town_id)
                .is_some_and(|town| town.bank.deposit(rate).is_ok());
            if deposited {
                total = total.saturating_add(rate);
                report.notices.push(TaxNotice::ResidentPaid {
                    resident: resident_id,
                    town: town_id,
                    amount: rate,
                });
            } else {
                // The town bank refused the deposit; hand the money back
                // rather than destroy it.
                currency.deposit(resident_id, rate);
                warn!(town = %town_id, resident = %resident_id, "town bank refused tax deposit, refunded");
            }
        } else {
            report.notices.push(TaxNotice::ResidentDefaulted {
                resident: resident_id,
                town: town_id,
                amount: rate,
            });
        }
    }

    if total > Decimal::ZERO {
        debug!(town = %town_id, %total, "town taxes collected");
        report.notices.push(TaxNotice::TownCollected {
            town: town_id,
            total,
        });
    }
}

/// One collection pass over a nation: levy the tax rate from every member
/// town's bank except the capital's.
fn collect_nation_tax(realm: &mut Realm, nation_id: NationId, report: &mut TaxSweepReport) {
    let Some(nation) = realm.nations.get(nation_id) else {
        return;
    };
    let rate = nation.tax_rate();
    if rate <= Decimal::ZERO {
        return;
    }
    let capital_id = nation.capital_id();
    let town_ids: Vec<TownId> = nation.towns().iter().copied().collect();

    let mut total = Decimal::ZERO;
    for town_id in town_ids {
        if town_id == capital_id {
            continue;
        }

        let can_pay = realm
            .towns
            .get(town_id)
            .is_some_and(|town| town.bank.has_funds(rate));
        if !can_pay {
            if realm.towns.get(town_id).is_some() {
                report.notices.push(TaxNotice::TownDefaulted {
                    town: town_id,
                    nation: nation_id,
                    amount: rate,
                });
            }
            continue;
        }

        let withdrawn = realm
            .towns
            .get_mut(town_id)
            .is_some_and(|town| town.bank.withdraw(rate).is_ok());
        if !withdrawn {
            continue;
        }
        let deposited = realm
            .nations
            .get_mut(nation_id)
            .is_some_and(|nation| nation.bank.deposit(rate).is_ok());
        if deposited {
            total = total.saturating_add(rate);
            report.notices.push(TaxNotice::TownPaidNation {
                town: town_id,
                nation: nation_id,
                amount: rate,
            });
        } else {
            // Never strand withdrawn money: put it back in the town bank.
            if let Some(town) = realm.towns.get_mut(town_id) {
                town.bank.deposit(rate).ok();
            }
            warn!(nation = %nation_id, town = %town_id, "nation bank refused tax deposit, refunded");
        }
    }

    if total > Decimal::ZERO {
        debug!(nation = %nation_id, %total, "nation taxes collected");
        report.notices.push(TaxNotice::NationCollected {
            nation: nation_id,
            total,
        });
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn intervals_clamp_to_the_five_minute_floor() {
        let schedule = TaxSchedule::from_settings(&TaxSettings {
            enabled: true,
            town_interval_secs: 1,
            nation_interval_secs: 0,
        });
        assert_eq!(schedule.town_interval(), TimeDelta::try_seconds(300).unwrap());
        assert_eq!(
            schedule.nation_interval(),
            TimeDelta::try_seconds(300).unwrap()
        );
    }

    #[test]
    fn default_schedule_is_daily_and_enabled() {
        let schedule = TaxSchedule::default();
        assert!(schedule.enabled);
        assert_eq!(
            schedule.town_interval(),
            TimeDelta::try_seconds(86_400).unwrap()
        );
    }
}
