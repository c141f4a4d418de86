//! Interactive menu shell around [`LedgerEngine`]. Lives in the library
//! instead of the binary so integration tests can drive it over in-memory
//! input and output.
//!
//! All parsing of raw user input happens here; the engine only ever sees
//! typed values.

use std::io::{BufRead, Write};

use anyhow::Result;
use rust_decimal::Decimal;

use crate::account::{AccountCategory, AccountId};
use crate::engine::{LedgerEngine, LedgerError, Session};
use crate::journal::TransactionJournal;
use crate::store::AccountStore;

pub struct Shell<'w, R, W: 'w, S, J> {
    pub input: R,
    pub output: &'w mut W,
    pub engine: LedgerEngine<S, J>,
}

impl<'w, R, W, S, J> Shell<'w, R, W, S, J>
where
    R: BufRead,
    W: Write + 'w,
    S: AccountStore,
    J: TransactionJournal,
{
    pub fn run(mut self) -> Result<()> {
        loop {
            writeln!(self.output, "\n===== Banking System =====")?;
            writeln!(self.output, "1. Create Account")?;
            writeln!(self.output, "2. Login")?;
            writeln!(self.output, "3. Exit")?;
            let Some(choice) = self.prompt("Enter choice: ")? else {
                break;
            };
            match choice.as_str() {
                "1" => self.create_account()?,
                "2" => {
                    if let Some(session) = self.login()? {
                        self.account_menu(session)?;
                    }
                }
                "3" => {
                    writeln!(self.output, "Thank you for using the Banking System.")?;
                    break;
                }
                _ => writeln!(self.output, "Invalid choice. Try again.")?,
            }
        }
        Ok(())
    }

    fn account_menu(&mut self, session: Session) -> Result<()> {
        // Option so a failed close degrades to "not logged in" instead of
        // pretending the session is still alive
        let mut session = Some(session);
        loop {
            writeln!(self.output, "\n===== Account Menu =====")?;
            writeln!(self.output, "1. Deposit")?;
            writeln!(self.output, "2. Withdraw")?;
            writeln!(self.output, "3. Balance Inquiry")?;
            writeln!(self.output, "4. Fund Transfer")?;
            writeln!(self.output, "5. Change Password")?;
            writeln!(self.output, "6. Close Account")?;
            writeln!(self.output, "7. Logout")?;
            let Some(choice) = self.prompt("Enter choice: ")? else {
                break;
            };
            match choice.as_str() {
                "1" => self.deposit(&mut session)?,
                "2" => self.withdraw(&mut session)?,
                "3" => self.balance_inquiry(&session)?,
                "4" => self.transfer(&mut session)?,
                "5" => self.change_password(&mut session)?,
                "6" => {
                    if self.close_account(&mut session)? {
                        break;
                    }
                }
                "7" => {
                    if let Some(session) = session.take() {
                        self.engine.logout(session);
                    }
                    writeln!(self.output, "Logged out.")?;
                    break;
                }
                _ => writeln!(self.output, "Invalid choice. Try again.")?,
            }
        }
        Ok(())
    }

    fn create_account(&mut self) -> Result<()> {
        let Some(name) = self.prompt("Enter your name: ")? else {
            return Ok(());
        };
        let Some(secret) = self.prompt("Set a password: ")? else {
            return Ok(());
        };
        let Some(category) = self.prompt("Enter account type (Savings/Current): ")? else {
            return Ok(());
        };
        let category = match category.parse::<AccountCategory>() {
            Ok(category) => category,
            Err(msg) => {
                writeln!(self.output, "{msg}")?;
                return Ok(());
            }
        };
        let Some(amount) = self.prompt_amount("Enter initial deposit: ")? else {
            return Ok(());
        };
        match self.engine.open_account(&name, &secret, category, amount) {
            Ok(id) => writeln!(
                self.output,
                "Account created successfully! Your account number is {id}"
            )?,
            Err(err) => writeln!(self.output, "Error: {err}")?,
        }
        Ok(())
    }

    fn login(&mut self) -> Result<Option<Session>> {
        let Some(id) = self.prompt("Enter account number: ")? else {
            return Ok(None);
        };
        let Ok(id) = id.parse::<AccountId>() else {
            writeln!(self.output, "Invalid account number.")?;
            return Ok(None);
        };
        let Some(secret) = self.prompt("Enter password: ")? else {
            return Ok(None);
        };
        match self.engine.authenticate(id, &secret) {
            Ok(session) => {
                writeln!(self.output, "Welcome {}!", session.display_name())?;
                Ok(Some(session))
            }
            Err(err) => {
                writeln!(self.output, "{err}")?;
                Ok(None)
            }
        }
    }

    fn deposit(&mut self, session: &mut Option<Session>) -> Result<()> {
        let Some(amount) = self.prompt_amount("Enter deposit amount: ")? else {
            return Ok(());
        };
        let result = match session.as_mut() {
            Some(session) => self.engine.deposit(session, amount),
            None => Err(LedgerError::NotLoggedIn),
        };
        self.report(result, "Deposit successful!")
    }

    fn withdraw(&mut self, session: &mut Option<Session>) -> Result<()> {
        let Some(amount) = self.prompt_amount("Enter withdrawal amount: ")? else {
            return Ok(());
        };
        let result = match session.as_mut() {
            Some(session) => self.engine.withdraw(session, amount),
            None => Err(LedgerError::NotLoggedIn),
        };
        self.report(result, "Withdrawal successful!")
    }

    fn balance_inquiry(&mut self, session: &Option<Session>) -> Result<()> {
        match session {
            Some(session) => writeln!(self.output, "Current balance: {}", session.balance())?,
            None => writeln!(self.output, "Error: {}", LedgerError::NotLoggedIn)?,
        }
        Ok(())
    }

    fn transfer(&mut self, session: &mut Option<Session>) -> Result<()> {
        let Some(target) = self.prompt("Enter target account number: ")? else {
            return Ok(());
        };
        let Ok(target) = target.parse::<AccountId>() else {
            writeln!(self.output, "Invalid account number.")?;
            return Ok(());
        };
        let Some(amount) = self.prompt_amount("Enter transfer amount: ")? else {
            return Ok(());
        };
        let result = match session.as_mut() {
            Some(session) => self.engine.transfer(session, target, amount),
            None => Err(LedgerError::NotLoggedIn),
        };
        self.report(result, "Transfer successful!")
    }

    fn change_password(&mut self, session: &mut Option<Session>) -> Result<()> {
        let Some(old_secret) = self.prompt("Enter old password: ")? else {
            return Ok(());
        };
        let Some(new_secret) = self.prompt("Enter new password: ")? else {
            return Ok(());
        };
        let result = match session.as_mut() {
            Some(session) => self
                .engine
                .change_password(session, &old_secret, &new_secret),
            None => Err(LedgerError::NotLoggedIn),
        };
        self.report(result, "Password changed successfully!")
    }

    /// Returns true when the account was closed and the menu should end.
    fn close_account(&mut self, session: &mut Option<Session>) -> Result<bool> {
        let Some(confirm) =
            self.prompt("Are you sure you want to close your account? (yes/no): ")?
        else {
            return Ok(false);
        };
        if !confirm.eq_ignore_ascii_case("yes") {
            return Ok(false);
        }
        let result = match session.take() {
            Some(session) => self.engine.close_account(session),
            None => Err(LedgerError::NotLoggedIn),
        };
        match result {
            Ok(()) => {
                writeln!(self.output, "Account closed successfully.")?;
                Ok(true)
            }
            Err(err) => {
                writeln!(self.output, "Error: {err}")?;
                Ok(false)
            }
        }
    }

    fn report(&mut self, result: Result<(), LedgerError>, success: &str) -> Result<()> {
        match result {
            Ok(()) => writeln!(self.output, "{success}")?,
            Err(err) => writeln!(self.output, "Error: {err}")?,
        }
        Ok(())
    }

    fn prompt(&mut self, text: &str) -> Result<Option<String>> {
        write!(self.output, "{text}")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_owned()))
    }

    fn prompt_amount(&mut self, text: &str) -> Result<Option<Decimal>> {
        let Some(raw) = self.prompt(text)? else {
            return Ok(None);
        };
        match raw.parse::<Decimal>() {
            Ok(amount) => Ok(Some(amount)),
            Err(_) => {
                writeln!(self.output, "Invalid amount.")?;
                Ok(None)
            }
        }
    }
}
