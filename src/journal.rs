use std::fs::{File, OpenOptions};
use std::path::Path;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::account::{AccountId, LedgerEvent, LedgerEventKind};
use crate::store::StoreError;

/// One audit row: who, what (including the counterparty for transfers),
/// how much, when.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionRecord {
    pub account_id: AccountId,
    pub description: String,
    pub amount: Decimal,
    pub timestamp: DateTime<Utc>,
}

impl TransactionRecord {
    pub fn new(account_id: AccountId, description: String, amount: Decimal) -> Self {
        Self {
            account_id,
            description,
            amount,
            timestamp: Utc::now(),
        }
    }

    pub fn from_event(account_id: AccountId, event: &LedgerEvent) -> Self {
        let description = match event.kind() {
            LedgerEventKind::Deposited => "Deposit".to_string(),
            LedgerEventKind::Withdrawn => "Withdrawal".to_string(),
            LedgerEventKind::TransferredOut { counterparty } => {
                format!("Transfer to {counterparty}")
            }
            LedgerEventKind::TransferReceived { counterparty } => {
                format!("Received from {counterparty}")
            }
        };
        Self::new(account_id, description, event.amount())
    }
}

/// Append-only audit trail. The core only ever writes it; rows are never
/// rewritten or compacted.
pub trait TransactionJournal {
    fn append(&mut self, record: &TransactionRecord) -> Result<(), StoreError>;
}

/// Collects records in memory; test double and embedding default.
#[derive(Debug, Default)]
pub struct MemoryJournal {
    pub records: Vec<TransactionRecord>,
}

impl TransactionJournal for MemoryJournal {
    fn append(&mut self, record: &TransactionRecord) -> Result<(), StoreError> {
        self.records.push(record.clone());
        Ok(())
    }
}

/// Appends headerless CSV rows to a file, one per record, flushed before
/// the call returns so the row is durable before the operation commits.
pub struct CsvJournal {
    writer: csv::Writer<File>,
}

impl CsvJournal {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path.as_ref())?;
        let writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        Ok(Self { writer })
    }
}

impl TransactionJournal for CsvJournal {
    fn append(&mut self, record: &TransactionRecord) -> Result<(), StoreError> {
        self.writer.serialize(record)?;
        self.writer.flush()?;
        Ok(())
    }
}
