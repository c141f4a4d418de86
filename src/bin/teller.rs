use std::path::PathBuf;

use anyhow::{Context, Result};
use teller::bin_utils::Shell;
use teller::engine::LedgerEngine;
use teller::journal::CsvJournal;
use teller::store::csv_store::CsvAccountStore;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let data_dir = PathBuf::from(std::env::args().nth(1).unwrap_or_else(|| ".".to_owned()));
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create data directory `{}`", data_dir.display()))?;

    let store = CsvAccountStore::open(data_dir.join("accounts.csv"))
        .context("Failed to open accounts table")?;
    let journal = CsvJournal::open(data_dir.join("transactions.csv"))
        .context("Failed to open transaction journal")?;

    let stdin = std::io::stdin();
    let shell = Shell {
        input: stdin.lock(),
        output: &mut std::io::stdout(),
        engine: LedgerEngine::new(store, journal),
    };
    shell.run()
}
