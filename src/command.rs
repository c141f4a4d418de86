use rust_decimal::Decimal;
use thiserror::Error;

use crate::account::AccountId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveFundsAction {
    Deposit,
    Withdraw,
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Amount must be positive for {action:?}")]
    NonPositiveAmount { action: MoveFundsAction },
    #[error("Amount must be positive for a transfer")]
    NonPositiveTransferAmount,
    #[error("Transfers to the same account are not allowed")]
    SelfTransfer,
    #[error("Initial deposit must not be negative")]
    NegativeInitialDeposit,
}

/// A validated deposit or withdrawal against a single account.
#[derive(Debug, Clone, Copy)]
pub struct MoveFundsCommand {
    pub action: MoveFundsAction,
    pub amount: Decimal,
}

impl MoveFundsCommand {
    pub fn new(action: MoveFundsAction, amount: Decimal) -> Result<Self, CommandError> {
        if amount <= Decimal::ZERO {
            return Err(CommandError::NonPositiveAmount { action });
        }
        Ok(Self { action, amount })
    }
}

/// A validated transfer between two distinct accounts.
#[derive(Debug, Clone, Copy)]
pub struct TransferCommand {
    pub source: AccountId,
    pub target: AccountId,
    pub amount: Decimal,
}

impl TransferCommand {
    pub fn new(
        source: AccountId,
        target: AccountId,
        amount: Decimal,
    ) -> Result<Self, CommandError> {
        if amount <= Decimal::ZERO {
            return Err(CommandError::NonPositiveTransferAmount);
        }
        if source == target {
            return Err(CommandError::SelfTransfer);
        }
        Ok(Self {
            source,
            target,
            amount,
        })
    }
}
