//! Bank accounts and money movement for the Dominion hierarchy.
//!
//! Every town and nation owns exactly one [`BankAccount`]: a non-negative
//! [`Decimal`] balance with deposit, withdraw, and transfer operations.
//! Money is never created or destroyed by accident -- a withdrawal that
//! would push the balance below zero is refused with no mutation, and a
//! transfer either moves the full amount or moves nothing.
//!
//! # Invariants
//!
//! 1. The balance is never negative after any sequence of operations.
//! 2. Amounts are strictly positive (zero and negative amounts are refused).
//! 3. A transfer never withdraws without depositing: the withdraw side is
//!    validated first, and the deposit side cannot fail once the amount is
//!    known to be positive.
//!
//! The account never panics; every failure is a typed [`LedgerError`] and
//! leaves the balance untouched.
//!
//! # Usage
//!
//! ```
//! use dominion_ledger::BankAccount;
//! use rust_decimal::Decimal;
//! use uuid::Uuid;
//!
//! let mut town = BankAccount::new(Uuid::now_v7());
//! let mut nation = BankAccount::new(Uuid::now_v7());
//!
//! town.deposit(Decimal::new(100, 0)).ok();
//! town.transfer(&mut nation, Decimal::new(40, 0)).ok();
//!
//! assert_eq!(town.balance(), Decimal::new(60, 0));
//! assert_eq!(nation.balance(), Decimal::new(40, 0));
//! ```

pub mod account;

pub use account::BankAccount;

use rust_decimal::Decimal;

/// Errors that can occur when moving money through a [`BankAccount`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// The amount was zero or negative.
    #[error("amount must be positive, got {amount}")]
    NonPositiveAmount {
        /// The rejected amount.
        amount: Decimal,
    },

    /// The account balance cannot cover the requested withdrawal.
    #[error("insufficient funds: wanted {requested} but balance is {balance}")]
    InsufficientFunds {
        /// The amount the caller tried to withdraw.
        requested: Decimal,
        /// The balance at the time of the attempt.
        balance: Decimal,
    },

    /// A balance computation overflowed the [`Decimal`] range.
    #[error("balance arithmetic overflow: {context}")]
    Overflow {
        /// Description of the operation that overflowed.
        context: &'static str,
    },
}
