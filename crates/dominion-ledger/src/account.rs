//! The [`BankAccount`] balance cell.
//!
//! One account per entity (town or nation), identified by the owning
//! entity's UUID. The balance field is private: the only paths that touch
//! it are the validated operations below, which is how the non-negative
//! invariant survives arbitrary call sequences.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::LedgerError;

/// A non-negative balance owned by a single entity.
///
/// Operations fail with [`LedgerError`] rather than mutating state when the
/// amount is invalid or the funds are insufficient. Failed operations are
/// strict no-ops.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankAccount {
    /// UUID of the entity (town or nation) that owns this account.
    owner: Uuid,
    /// Current balance. Never negative.
    balance: Decimal,
}

impl BankAccount {
    /// Create an empty account for the given owner.
    pub const fn new(owner: Uuid) -> Self {
        Self {
            owner,
            balance: Decimal::ZERO,
        }
    }

    /// Create an account with a starting balance.
    ///
    /// Negative starting balances are clamped to zero.
    pub fn with_balance(owner: Uuid, balance: Decimal) -> Self {
        Self {
            owner,
            balance: balance.max(Decimal::ZERO),
        }
    }

    /// The UUID of the owning entity.
    pub const fn owner(&self) -> Uuid {
        self.owner
    }

    /// The current balance.
    pub const fn balance(&self) -> Decimal {
        self.balance
    }

    /// Whether the balance can cover `amount`.
    pub fn has_funds(&self, amount: Decimal) -> bool {
        self.balance >= amount
    }

    /// Add `amount` to the balance.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NonPositiveAmount`] if `amount <= 0`, or
    /// [`LedgerError::Overflow`] if the addition overflows. The balance is
    /// unchanged on error.
    pub fn deposit(&mut self, amount: Decimal) -> Result<(), LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::NonPositiveAmount { amount });
        }

        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or(LedgerError::Overflow {
                context: "deposit",
            })?;

        debug!(owner = %self.owner, %amount, balance = %self.balance, "deposit");
        Ok(())
    }

    /// Remove `amount` from the balance.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NonPositiveAmount`] if `amount <= 0`, or
    /// [`LedgerError::InsufficientFunds`] if the balance cannot cover it.
    /// The balance is unchanged on error.
    pub fn withdraw(&mut self, amount: Decimal) -> Result<(), LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::NonPositiveAmount { amount });
        }
        if self.balance < amount {
            return Err(LedgerError::InsufficientFunds {
                requested: amount,
                balance: self.balance,
            });
        }

        self.balance = self
            .balance
            .checked_sub(amount)
            .ok_or(LedgerError::Overflow {
                context: "withdraw",
            })?;

        debug!(owner = %self.owner, %amount, balance = %self.balance, "withdraw");
        Ok(())
    }

    /// Move `amount` from this account into `destination`.
    ///
    /// Composed as withdraw-then-deposit. The withdraw side carries all the
    /// validation; once it succeeds the deposit cannot fail (the amount is
    /// positive by construction and the destination addition is checked
    /// before this account is debited), so money never leaves one account
    /// without arriving in the other.
    ///
    /// # Errors
    ///
    /// Returns the withdraw-side error with neither balance mutated.
    pub fn transfer(
        &mut self,
        destination: &mut Self,
        amount: Decimal,
    ) -> Result<(), LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::NonPositiveAmount { amount });
        }
        if self.balance < amount {
            return Err(LedgerError::InsufficientFunds {
                requested: amount,
                balance: self.balance,
            });
        }

        // Validate both sides before touching either balance.
        let debited = self
            .balance
            .checked_sub(amount)
            .ok_or(LedgerError::Overflow {
                context: "transfer debit",
            })?;
        let credited = destination
            .balance
            .checked_add(amount)
            .ok_or(LedgerError::Overflow {
                context: "transfer credit",
            })?;

        self.balance = debited;
        destination.balance = credited;

        debug!(
            from = %self.owner,
            to = %destination.owner,
            %amount,
            "transfer"
        );
        Ok(())
    }

    /// Administrative override of the balance.
    ///
    /// Negative values are clamped to zero; the non-negative invariant holds
    /// even against operator error.
    pub fn set_balance(&mut self, balance: Decimal) {
        self.balance = balance.max(Decimal::ZERO);
    }
}
