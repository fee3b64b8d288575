//! Currency-provider interface and the in-memory wallet implementation.
//!
//! Resident personal balances live outside the core: town taxes and paid
//! claims charge actors through the [`CurrencyProvider`] seam. Each call is
//! transactional on its own -- the core never retries a failed call and
//! never assumes a `has` answer still holds without re-checking at the
//! withdraw.
//!
//! [`WalletBank`] is the in-process implementation used by the engine
//! binary and the test suites.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use dominion_types::ResidentId;

/// External economy seam for resident personal balances.
pub trait CurrencyProvider {
    /// Whether the resident's balance covers `amount`.
    fn has(&self, resident: ResidentId, amount: Decimal) -> bool;

    /// Withdraw `amount` from the resident. Returns `false` (and mutates
    /// nothing) if the balance cannot cover it or the amount is not
    /// positive.
    fn withdraw(&mut self, resident: ResidentId, amount: Decimal) -> bool;

    /// Deposit `amount` to the resident. Returns `false` for non-positive
    /// amounts.
    fn deposit(&mut self, resident: ResidentId, amount: Decimal) -> bool;

    /// Render an amount for user-facing messages.
    fn format(&self, amount: Decimal) -> String;
}

/// In-memory currency provider backed by a balance map.
///
/// Unknown residents have a zero balance; deposits create the entry.
#[derive(Debug, Clone, Default)]
pub struct WalletBank {
    balances: BTreeMap<ResidentId, Decimal>,
}

impl WalletBank {
    /// Create an empty wallet bank.
    pub const fn new() -> Self {
        Self {
            balances: BTreeMap::new(),
        }
    }

    /// Current balance of a resident (zero if unknown).
    pub fn balance_of(&self, resident: ResidentId) -> Decimal {
        self.balances.get(&resident).copied().unwrap_or(Decimal::ZERO)
    }

    /// Overwrite a resident's balance. Negative values clamp to zero.
    pub fn set_balance(&mut self, resident: ResidentId, balance: Decimal) {
        self.balances.insert(resident, balance.max(Decimal::ZERO));
    }
}

impl CurrencyProvider for WalletBank {
    fn has(&self, resident: ResidentId, amount: Decimal) -> bool {
        self.balance_of(resident) >= amount
    }

    fn withdraw(&mut self, resident: ResidentId, amount: Decimal) -> bool {
        if amount <= Decimal::ZERO {
            return false;
        }
        let balance = self.balance_of(resident);
        let Some(remaining) = balance.checked_sub(amount) else {
            return false;
        };
        if remaining < Decimal::ZERO {
            return false;
        }
        self.balances.insert(resident, remaining);
        true
    }

    fn deposit(&mut self, resident: ResidentId, amount: Decimal) -> bool {
        if amount <= Decimal::ZERO {
            return false;
        }
        let balance = self.balance_of(resident);
        let Some(updated) = balance.checked_add(amount) else {
            return false;
        };
        self.balances.insert(resident, updated);
        true
    }

    fn format(&self, amount: Decimal) -> String {
        format!("${amount:.2}")
    }
}
