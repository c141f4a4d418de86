use std::collections::BTreeMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use csv::Trim;

use crate::account::{Account, AccountId};

use super::{AccountStore, StoreError, next_id};

/// CSV-file-backed account store. One headerless row per account, columns
/// in [`Account`] field order.
///
/// The whole table is kept keyed in memory; every mutation rewrites the
/// file through a temp-file-and-rename, so a reader of the path never sees
/// a partially written table and a failed write leaves the old table in
/// place.
#[derive(Debug)]
pub struct CsvAccountStore {
    path: PathBuf,
    accounts: BTreeMap<AccountId, Account>,
}

impl CsvAccountStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let accounts = if path.exists() {
            read_table(&path)?
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, accounts })
    }

    fn persist(&self) -> Result<(), StoreError> {
        let tmp = self.path.with_extension("csv.tmp");
        {
            let file = File::create(&tmp)?;
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(file);
            for account in self.accounts.values() {
                writer.serialize(account)?;
            }
            writer.flush()?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Applies `mutate` and persists; restores the previous table when the
    /// write fails so memory and disk never disagree.
    fn commit(
        &mut self,
        mutate: impl FnOnce(&mut BTreeMap<AccountId, Account>),
    ) -> Result<(), StoreError> {
        let before = self.accounts.clone();
        mutate(&mut self.accounts);
        if let Err(err) = self.persist() {
            tracing::warn!(path = %self.path.display(), %err, "account table write failed");
            self.accounts = before;
            return Err(err);
        }
        Ok(())
    }
}

fn read_table(path: &Path) -> Result<BTreeMap<AccountId, Account>, StoreError> {
    let file = File::open(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(Trim::All)
        .from_reader(file);
    let mut accounts = BTreeMap::new();
    for row in reader.deserialize::<Account>() {
        let account = row?;
        accounts.insert(account.id(), account);
    }
    Ok(accounts)
}

impl AccountStore for CsvAccountStore {
    fn allocate_id(&self) -> Result<AccountId, StoreError> {
        // re-read the file so edits made behind our back are reflected
        let accounts = if self.path.exists() {
            read_table(&self.path)?
        } else {
            BTreeMap::new()
        };
        Ok(next_id(&accounts))
    }

    fn create(&mut self, record: Account) -> Result<(), StoreError> {
        // refresh from the file first; ids are allocated from it, so a
        // record written behind our back must survive the rewrite and
        // still collide on a duplicate id
        if self.path.exists() {
            self.accounts = read_table(&self.path)?;
        }
        if self.accounts.contains_key(&record.id()) {
            return Err(StoreError::DuplicateId(record.id()));
        }
        self.commit(|accounts| {
            accounts.insert(record.id(), record);
        })
    }

    fn get(&self, id: AccountId) -> Result<Option<Account>, StoreError> {
        Ok(self.accounts.get(&id).cloned())
    }

    fn upsert_many(&mut self, records: &[Account]) -> Result<(), StoreError> {
        self.commit(|accounts| {
            for record in records {
                accounts.insert(record.id(), record.clone());
            }
        })
    }

    fn remove(&mut self, id: AccountId) -> Result<(), StoreError> {
        self.commit(|accounts| {
            accounts.remove(&id);
        })
    }

    fn list_all(&self) -> Result<Vec<Account>, StoreError> {
        Ok(self.accounts.values().cloned().collect())
    }

    fn replace_all(&mut self, records: Vec<Account>) -> Result<(), StoreError> {
        self.commit(|accounts| {
            *accounts = records.into_iter().map(|acc| (acc.id(), acc)).collect();
        })
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    use crate::account::{AccountCategory, BASE_ACCOUNT_ID};

    use super::*;

    fn record(id: AccountId, balance: rust_decimal::Decimal) -> Account {
        Account::new(
            id,
            format!("acct-{id}"),
            "0123abcd".to_string(),
            balance,
            AccountCategory::Current,
        )
    }

    #[test]
    fn round_trips_accounts_through_the_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("accounts.csv");

        let mut store = CsvAccountStore::open(&path).unwrap();
        store.create(record(BASE_ACCOUNT_ID, dec!(12.34))).unwrap();
        store.create(record(BASE_ACCOUNT_ID + 1, dec!(0))).unwrap();
        let written = store.list_all().unwrap();

        let reopened = CsvAccountStore::open(&path).unwrap();
        assert_eq!(reopened.list_all().unwrap(), written);
    }

    #[test]
    fn allocate_id_reflects_persisted_contents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("accounts.csv");

        let store = CsvAccountStore::open(&path).unwrap();
        assert_eq!(store.allocate_id().unwrap(), BASE_ACCOUNT_ID);

        // another handle writes a record; the first one must see it
        let mut other = CsvAccountStore::open(&path).unwrap();
        other.create(record(BASE_ACCOUNT_ID + 4, dec!(1))).unwrap();
        assert_eq!(store.allocate_id().unwrap(), BASE_ACCOUNT_ID + 5);
    }

    #[test]
    fn mutations_are_visible_to_immediate_reads() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("accounts.csv");

        let mut store = CsvAccountStore::open(&path).unwrap();
        store.create(record(BASE_ACCOUNT_ID, dec!(5))).unwrap();
        store
            .upsert(record(BASE_ACCOUNT_ID, dec!(9)))
            .unwrap();
        assert_eq!(
            store.get(BASE_ACCOUNT_ID).unwrap().unwrap().balance(),
            dec!(9)
        );

        store.remove(BASE_ACCOUNT_ID).unwrap();
        assert!(store.list_all().unwrap().is_empty());
        assert!(
            CsvAccountStore::open(&path)
                .unwrap()
                .list_all()
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn create_preserves_records_written_by_other_handles() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("accounts.csv");

        let mut first = CsvAccountStore::open(&path).unwrap();
        let mut second = CsvAccountStore::open(&path).unwrap();
        second.create(record(BASE_ACCOUNT_ID, dec!(1))).unwrap();

        let id = first.allocate_id().unwrap();
        assert_eq!(id, BASE_ACCOUNT_ID + 1);
        first.create(record(id, dec!(2))).unwrap();

        let reopened = CsvAccountStore::open(&path).unwrap();
        assert_eq!(reopened.list_all().unwrap().len(), 2);
        assert!(reopened.get(BASE_ACCOUNT_ID).unwrap().is_some());

        // a clashing id written behind our back is still rejected
        let err = first.create(record(BASE_ACCOUNT_ID, dec!(3))).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateId(id) if id == BASE_ACCOUNT_ID));
    }

    #[test]
    fn upsert_many_commits_both_records_in_one_write() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("accounts.csv");

        let mut store = CsvAccountStore::open(&path).unwrap();
        store.create(record(BASE_ACCOUNT_ID, dec!(50))).unwrap();
        store.create(record(BASE_ACCOUNT_ID + 1, dec!(0))).unwrap();
        store
            .upsert_many(&[
                record(BASE_ACCOUNT_ID, dec!(30)),
                record(BASE_ACCOUNT_ID + 1, dec!(20)),
            ])
            .unwrap();

        let reopened = CsvAccountStore::open(&path).unwrap();
        assert_eq!(
            reopened.get(BASE_ACCOUNT_ID).unwrap().unwrap().balance(),
            dec!(30)
        );
        assert_eq!(
            reopened
                .get(BASE_ACCOUNT_ID + 1)
                .unwrap()
                .unwrap()
                .balance(),
            dec!(20)
        );
    }
}
