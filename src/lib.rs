/// Account records and balances. State is modified using events, which are
/// created by handling validated commands.
pub mod account;

/// Validated operation commands executed against [`account`].
pub mod command;

/// One-way credential digests; the only form in which secrets exist.
pub mod credentials;

/// The ledger engine: sessions, the account operations, and the commit
/// protocol that keeps the store and session memory in agreement.
pub mod engine;

/// Append-only transaction journal (write-only audit trail).
pub mod journal;

/// Durable account stores: the keyed store trait plus the in-memory and
/// CSV-file-backed implementations.
pub mod store;

/// Ideally, this module would exist in its own crate, as a way to
/// bootstrap the core logic. However, I want to use it for integration
/// tests so I put it here.
pub mod bin_utils;
