use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::command::{MoveFundsAction, MoveFundsCommand, TransferCommand};

pub type AccountId = u32;

/// Account number handed out when the store is empty; later accounts get
/// `max(existing) + 1`.
pub const BASE_ACCOUNT_ID: AccountId = 100_001;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountCategory {
    Savings,
    Current,
}

impl FromStr for AccountCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "savings" => Ok(Self::Savings),
            "current" => Ok(Self::Current),
            other => Err(format!("Unknown account type `{other}`")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerEventKind {
    Deposited,
    Withdrawn,
    TransferredOut { counterparty: AccountId },
    TransferReceived { counterparty: AccountId },
}

/// A committed-to balance change. Events are produced by the pure
/// `handle_*` methods and are the only way an [`Account`] balance moves.
#[derive(Debug, Clone)]
pub struct LedgerEvent {
    amount: Decimal,
    kind: LedgerEventKind,
}

impl LedgerEvent {
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn kind(&self) -> LedgerEventKind {
        self.kind
    }
}

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("Insufficient funds")]
    InsufficientFunds,
}

/// One account record. Field order is the on-disk column order, so it must
/// stay stable for round-trips through the CSV store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    id: AccountId,
    display_name: String,
    credential_digest: String,
    balance: Decimal,
    category: AccountCategory,
}

impl Account {
    pub fn new(
        id: AccountId,
        display_name: String,
        credential_digest: String,
        balance: Decimal,
        category: AccountCategory,
    ) -> Self {
        Self {
            id,
            display_name,
            credential_digest,
            balance,
            category,
        }
    }

    pub fn id(&self) -> AccountId {
        self.id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn credential_digest(&self) -> &str {
        &self.credential_digest
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    pub fn category(&self) -> AccountCategory {
        self.category
    }

    pub(crate) fn set_credential_digest(&mut self, digest: String) {
        self.credential_digest = digest;
    }

    pub fn apply(&mut self, event: &LedgerEvent) {
        match event.kind {
            LedgerEventKind::Deposited | LedgerEventKind::TransferReceived { .. } => {
                self.balance += event.amount;
            }
            LedgerEventKind::Withdrawn | LedgerEventKind::TransferredOut { .. } => {
                self.balance -= event.amount;
            }
        }
    }

    pub fn handle_move_funds(
        &self,
        command: MoveFundsCommand,
    ) -> Result<LedgerEvent, AccountError> {
        match command.action {
            MoveFundsAction::Deposit => Ok(LedgerEvent {
                amount: command.amount,
                kind: LedgerEventKind::Deposited,
            }),
            MoveFundsAction::Withdraw => {
                if self.balance >= command.amount {
                    Ok(LedgerEvent {
                        amount: command.amount,
                        kind: LedgerEventKind::Withdrawn,
                    })
                } else {
                    Err(AccountError::InsufficientFunds)
                }
            }
        }
    }

    /// Sender side of a transfer; fails when the balance does not cover it.
    pub fn handle_transfer_out(
        &self,
        command: &TransferCommand,
    ) -> Result<LedgerEvent, AccountError> {
        if self.balance >= command.amount {
            Ok(LedgerEvent {
                amount: command.amount,
                kind: LedgerEventKind::TransferredOut {
                    counterparty: command.target,
                },
            })
        } else {
            Err(AccountError::InsufficientFunds)
        }
    }

    /// Receiver side of a transfer. Infallible: a credit cannot overdraw.
    pub fn handle_transfer_received(&self, command: &TransferCommand) -> LedgerEvent {
        LedgerEvent {
            amount: command.amount,
            kind: LedgerEventKind::TransferReceived {
                counterparty: command.source,
            },
        }
    }
}
