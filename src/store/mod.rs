use std::collections::BTreeMap;
use std::io;

use thiserror::Error;

use crate::account::{Account, AccountId, BASE_ACCOUNT_ID};

pub mod csv_store;
pub mod memory_store;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Account {0} already exists")]
    DuplicateId(AccountId),
    #[error("Failed to persist ledger state: {0}")]
    Io(#[from] io::Error),
    #[error("Failed to encode ledger state: {0}")]
    Csv(#[from] csv::Error),
}

/// Durable keyed mapping from account id to record; the single source of
/// truth for balances. Mutations are atomic per call: after `create`,
/// `upsert_many`, `remove` or `replace_all` returns, `list_all` reflects
/// the change, and on error nothing changed.
pub trait AccountStore {
    /// Next free account number, re-derived from the current persisted
    /// contents on every call rather than cached.
    fn allocate_id(&self) -> Result<AccountId, StoreError>;

    fn create(&mut self, record: Account) -> Result<(), StoreError>;

    fn get(&self, id: AccountId) -> Result<Option<Account>, StoreError>;

    fn find_by_credentials(
        &self,
        id: AccountId,
        digest: &str,
    ) -> Result<Option<Account>, StoreError> {
        Ok(self.get(id)?.filter(|acc| acc.credential_digest() == digest))
    }

    /// Commits every given record in a single store write. A transfer's
    /// debit and credit go through here together so they cannot be
    /// committed half-way.
    fn upsert_many(&mut self, records: &[Account]) -> Result<(), StoreError>;

    fn upsert(&mut self, record: Account) -> Result<(), StoreError> {
        self.upsert_many(std::slice::from_ref(&record))
    }

    fn remove(&mut self, id: AccountId) -> Result<(), StoreError>;

    /// All records in id order.
    fn list_all(&self) -> Result<Vec<Account>, StoreError>;

    fn replace_all(&mut self, records: Vec<Account>) -> Result<(), StoreError>;
}

pub(crate) fn next_id(accounts: &BTreeMap<AccountId, Account>) -> AccountId {
    accounts
        .keys()
        .next_back()
        .map_or(BASE_ACCOUNT_ID, |last| last + 1)
}
