use std::collections::BTreeMap;

use crate::account::{Account, AccountId};

use super::{AccountStore, StoreError, next_id};

/// Keyed in-memory store. Used directly by tests, and a reasonable backend
/// for embedding the engine without a data directory.
#[derive(Debug, Default)]
pub struct MemoryAccountStore {
    accounts: BTreeMap<AccountId, Account>,
}

impl AccountStore for MemoryAccountStore {
    fn allocate_id(&self) -> Result<AccountId, StoreError> {
        Ok(next_id(&self.accounts))
    }

    fn create(&mut self, record: Account) -> Result<(), StoreError> {
        if self.accounts.contains_key(&record.id()) {
            return Err(StoreError::DuplicateId(record.id()));
        }
        self.accounts.insert(record.id(), record);
        Ok(())
    }

    fn get(&self, id: AccountId) -> Result<Option<Account>, StoreError> {
        Ok(self.accounts.get(&id).cloned())
    }

    fn upsert_many(&mut self, records: &[Account]) -> Result<(), StoreError> {
        for record in records {
            self.accounts.insert(record.id(), record.clone());
        }
        Ok(())
    }

    fn remove(&mut self, id: AccountId) -> Result<(), StoreError> {
        self.accounts.remove(&id);
        Ok(())
    }

    fn list_all(&self) -> Result<Vec<Account>, StoreError> {
        Ok(self.accounts.values().cloned().collect())
    }

    fn replace_all(&mut self, records: Vec<Account>) -> Result<(), StoreError> {
        self.accounts = records.into_iter().map(|acc| (acc.id(), acc)).collect();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use crate::account::{AccountCategory, BASE_ACCOUNT_ID};

    use super::*;

    fn record(id: AccountId) -> Account {
        Account::new(
            id,
            format!("acct-{id}"),
            "digest".to_string(),
            dec!(0),
            AccountCategory::Savings,
        )
    }

    #[test]
    fn allocates_monotonic_ids() {
        let mut store = MemoryAccountStore::default();
        assert_eq!(store.allocate_id().unwrap(), BASE_ACCOUNT_ID);
        store.create(record(BASE_ACCOUNT_ID)).unwrap();
        assert_eq!(store.allocate_id().unwrap(), BASE_ACCOUNT_ID + 1);
        store.create(record(BASE_ACCOUNT_ID + 7)).unwrap();
        assert_eq!(store.allocate_id().unwrap(), BASE_ACCOUNT_ID + 8);
    }

    #[test]
    fn create_rejects_duplicate_id() {
        let mut store = MemoryAccountStore::default();
        store.create(record(BASE_ACCOUNT_ID)).unwrap();
        let err = store.create(record(BASE_ACCOUNT_ID)).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateId(id) if id == BASE_ACCOUNT_ID));
    }

    #[test]
    fn find_by_credentials_requires_matching_digest() {
        let mut store = MemoryAccountStore::default();
        store.create(record(BASE_ACCOUNT_ID)).unwrap();
        assert!(
            store
                .find_by_credentials(BASE_ACCOUNT_ID, "digest")
                .unwrap()
                .is_some()
        );
        assert!(
            store
                .find_by_credentials(BASE_ACCOUNT_ID, "wrong")
                .unwrap()
                .is_none()
        );
        assert!(
            store
                .find_by_credentials(BASE_ACCOUNT_ID + 1, "digest")
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn replace_all_of_list_all_is_noop() {
        let mut store = MemoryAccountStore::default();
        store.create(record(BASE_ACCOUNT_ID)).unwrap();
        store.create(record(BASE_ACCOUNT_ID + 1)).unwrap();
        let before = store.list_all().unwrap();
        store.replace_all(before.clone()).unwrap();
        assert_eq!(store.list_all().unwrap(), before);
    }

    #[test]
    fn remove_deletes_the_record() {
        let mut store = MemoryAccountStore::default();
        store.create(record(BASE_ACCOUNT_ID)).unwrap();
        store.remove(BASE_ACCOUNT_ID).unwrap();
        assert!(store.get(BASE_ACCOUNT_ID).unwrap().is_none());
        assert!(store.list_all().unwrap().is_empty());
    }
}
