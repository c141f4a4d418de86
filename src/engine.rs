use std::slice;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::account::{Account, AccountCategory, AccountError, AccountId};
use crate::command::{CommandError, MoveFundsAction, MoveFundsCommand, TransferCommand};
use crate::credentials;
use crate::journal::{TransactionJournal, TransactionRecord};
use crate::store::{AccountStore, StoreError};

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Invalid account number or password")]
    InvalidCredentials,
    #[error("Target account {0} not found")]
    TargetNotFound(AccountId),
    #[error("No account is logged in")]
    NotLoggedIn,
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error(transparent)]
    Account(#[from] AccountError),
    #[error(transparent)]
    Persistence(#[from] StoreError),
}

/// An authenticated account. Owns the working copy of the record for the
/// lifetime of the login; every mutating operation takes the session
/// explicitly, so there is no hidden "current user" anywhere.
#[derive(Debug)]
pub struct Session {
    account: Account,
}

impl Session {
    pub fn account_id(&self) -> AccountId {
        self.account.id()
    }

    pub fn display_name(&self) -> &str {
        self.account.display_name()
    }

    pub fn balance(&self) -> Decimal {
        self.account.balance()
    }
}

/// Applies account operations against a store and a journal.
///
/// Commit order per mutating operation: validate, derive events from the
/// session's working copy, write the staged records to the store in one
/// call, append the journal rows, and only then update session memory.
/// On any failure the store is left (or put back) at its pre-operation
/// contents and the session is untouched, so memory and disk never
/// disagree.
pub struct LedgerEngine<S, J> {
    store: S,
    journal: J,
}

impl<S, J> LedgerEngine<S, J>
where
    S: AccountStore,
    J: TransactionJournal,
{
    pub fn new(store: S, journal: J) -> Self {
        Self { store, journal }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Creates a record under a freshly allocated account number. A zero
    /// initial deposit is allowed; a positive one gets a journal row.
    pub fn open_account(
        &mut self,
        display_name: &str,
        secret: &str,
        category: AccountCategory,
        initial_deposit: Decimal,
    ) -> Result<AccountId, LedgerError> {
        if initial_deposit < Decimal::ZERO {
            return Err(CommandError::NegativeInitialDeposit.into());
        }
        let id = self.store.allocate_id()?;
        let account = Account::new(
            id,
            display_name.to_owned(),
            credentials::digest(secret),
            initial_deposit,
            category,
        );
        self.store.create(account)?;
        if initial_deposit > Decimal::ZERO {
            let record = TransactionRecord::new(id, "Deposit".to_string(), initial_deposit);
            if let Err(err) = self.journal.append(&record) {
                if let Err(rollback_err) = self.store.remove(id) {
                    tracing::error!(account = id, %rollback_err, "rollback of account creation failed");
                }
                return Err(err.into());
            }
        }
        tracing::info!(account = id, "account opened");
        Ok(id)
    }

    pub fn authenticate(&self, id: AccountId, secret: &str) -> Result<Session, LedgerError> {
        let digest = credentials::digest(secret);
        match self.store.find_by_credentials(id, &digest)? {
            Some(account) => {
                tracing::debug!(account = id, "authenticated");
                Ok(Session { account })
            }
            None => Err(LedgerError::InvalidCredentials),
        }
    }

    pub fn deposit(&mut self, session: &mut Session, amount: Decimal) -> Result<(), LedgerError> {
        self.move_funds(session, MoveFundsAction::Deposit, amount)
    }

    pub fn withdraw(&mut self, session: &mut Session, amount: Decimal) -> Result<(), LedgerError> {
        self.move_funds(session, MoveFundsAction::Withdraw, amount)
    }

    fn move_funds(
        &mut self,
        session: &mut Session,
        action: MoveFundsAction,
        amount: Decimal,
    ) -> Result<(), LedgerError> {
        let command = MoveFundsCommand::new(action, amount)?;
        let event = session.account.handle_move_funds(command)?;
        let mut staged = session.account.clone();
        staged.apply(&event);
        let record = TransactionRecord::from_event(staged.id(), &event);
        self.commit(
            slice::from_ref(&staged),
            slice::from_ref(&session.account),
            slice::from_ref(&record),
        )?;
        session.account.apply(&event);
        tracing::info!(account = session.account_id(), ?action, %amount, "funds moved");
        Ok(())
    }

    /// Debits the session and credits the target in a single store commit,
    /// with a linked journal row on each side.
    pub fn transfer(
        &mut self,
        session: &mut Session,
        target_id: AccountId,
        amount: Decimal,
    ) -> Result<(), LedgerError> {
        let command = TransferCommand::new(session.account_id(), target_id, amount)?;
        let target = self
            .store
            .get(target_id)?
            .ok_or(LedgerError::TargetNotFound(target_id))?;

        let out_event = session.account.handle_transfer_out(&command)?;
        let in_event = target.handle_transfer_received(&command);

        let mut staged_sender = session.account.clone();
        staged_sender.apply(&out_event);
        let mut staged_target = target.clone();
        staged_target.apply(&in_event);

        let records = [
            TransactionRecord::from_event(session.account_id(), &out_event),
            TransactionRecord::from_event(target_id, &in_event),
        ];
        let staged = [staged_sender, staged_target];
        let restore = [session.account.clone(), target];
        self.commit(&staged, &restore, &records)?;

        session.account.apply(&out_event);
        tracing::info!(
            account = session.account_id(),
            target = target_id,
            %amount,
            "transfer committed"
        );
        Ok(())
    }

    pub fn change_password(
        &mut self,
        session: &mut Session,
        old_secret: &str,
        new_secret: &str,
    ) -> Result<(), LedgerError> {
        if credentials::digest(old_secret) != session.account.credential_digest() {
            return Err(LedgerError::InvalidCredentials);
        }
        let mut staged = session.account.clone();
        staged.set_credential_digest(credentials::digest(new_secret));
        self.store.upsert(staged.clone())?;
        session.account = staged;
        tracing::info!(account = session.account_id(), "password changed");
        Ok(())
    }

    /// Deletes the record and consumes the session. Irreversible; the
    /// journal keeps the account's history.
    pub fn close_account(&mut self, session: Session) -> Result<(), LedgerError> {
        let id = session.account_id();
        self.store.remove(id)?;
        tracing::info!(account = id, "account closed");
        Ok(())
    }

    /// Discards the session without touching the store.
    pub fn logout(&self, session: Session) {
        tracing::debug!(account = session.account_id(), "logged out");
    }

    fn commit(
        &mut self,
        staged: &[Account],
        restore: &[Account],
        records: &[TransactionRecord],
    ) -> Result<(), LedgerError> {
        self.store.upsert_many(staged)?;
        for record in records {
            if let Err(err) = self.journal.append(record) {
                // put the pre-operation balances back; the audit trail must
                // not disagree with the store in the direction of unlogged
                // balance changes
                if let Err(rollback_err) = self.store.upsert_many(restore) {
                    tracing::error!(%rollback_err, "rollback after journal failure failed");
                }
                return Err(err.into());
            }
        }
        Ok(())
    }
}
