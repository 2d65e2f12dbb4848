use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use walletdb::config::Settings;
use walletdb::filter::FlagFilter;
use walletdb::persist::Store;
use walletdb::queries;
use walletdb::rows::TxHash;
use walletdb::Result;

/// Inspect the ledger of a wallet database.
#[derive(Parser, Debug)]
#[command(name = "walletdb", version)]
struct Cli {
    /// Settings file (defaults to walletdb.toml when present)
    #[arg(long)]
    config: Option<String>,
    /// Wallet database file, overrides the settings
    #[arg(long)]
    db: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Balance of an account
    Balance {
        account: i64,
        #[arg(long)]
        flags: Option<i64>,
        #[arg(long)]
        mask: Option<i64>,
    },
    /// Settled history of an account
    History {
        account: i64,
        #[arg(long, value_delimiter = ',')]
        keys: Option<Vec<i64>>,
    },
    /// Keys of an account and their outputs
    Keys {
        account: i64,
        #[arg(long, value_delimiter = ',')]
        keys: Option<Vec<i64>>,
    },
    /// Keys whose open payment request has been paid
    Paid {
        account: i64,
        #[arg(long, value_delimiter = ',', required = true)]
        keys: Vec<i64>,
    },
    /// Value of a transaction per account
    TxValue {
        tx_hash: TxHash,
        #[arg(long)]
        account: Option<i64>,
    },
    /// Transactions and their outputs
    Tx {
        #[arg(required = true)]
        tx_hashes: Vec<TxHash>,
    },
}

#[derive(Serialize)]
struct TransactionView {
    transaction: walletdb::rows::TransactionRow,
    outputs: Vec<walletdb::rows::TransactionOutputRow>,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    println!("{text}");
    Ok(())
}

fn init_tracing(log_filter: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_filter)))
        .with_writer(std::io::stderr)
        .init();
}

fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = Settings::load(cli.config.as_deref())?;
    if cli.db.is_some() {
        settings.database = cli.db.clone();
    }
    Ok(settings)
}

fn run(cli: Cli, settings: Settings) -> Result<()> {
    let store = Store::from_settings(&settings)?;
    match cli.command {
        Command::Balance { account, flags, mask } => {
            let balance = store.read(|reader| {
                queries::read_account_balance(reader, account, FlagFilter::new(flags, mask))
            })?;
            print_json(&balance)
        }
        Command::History { account, keys } => {
            let history = store
                .read(|reader| queries::read_history_list(reader, account, keys.as_deref()))?;
            print_json(&history)
        }
        Command::Keys { account, keys } => {
            let keys = store.read(|reader| queries::read_key_list(reader, account, keys.as_deref()))?;
            print_json(&keys)
        }
        Command::Paid { account, keys } => {
            let paid = store.read(|reader| queries::read_paid_requests(reader, account, &keys))?;
            print_json(&paid)
        }
        Command::TxValue { tx_hash, account } => {
            let values =
                store.read(|reader| queries::read_transaction_value(reader, &tx_hash, account))?;
            print_json(&values)
        }
        Command::Tx { tx_hashes } => {
            let views = store.read(|reader| {
                let mut views = Vec::new();
                for transaction in queries::read_transactions(reader, &tx_hashes)? {
                    let outputs = queries::read_transaction_outputs(reader, &transaction.tx_hash)?;
                    views.push(TransactionView { transaction, outputs });
                }
                Ok(views)
            })?;
            info!(requested = tx_hashes.len(), found = views.len(), "transactions read");
            print_json(&views)
        }
    }
}

fn fail(e: walletdb::WalletDbError) -> ExitCode {
    warn!(error = %e, "walletdb failed");
    eprintln!("error: {e}");
    ExitCode::FAILURE
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let settings = match load_settings(&cli) {
        Ok(settings) => settings,
        Err(e) => {
            init_tracing(&Settings::default().log_filter);
            return fail(e);
        }
    };
    init_tracing(&settings.log_filter);
    match run(cli, settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fail(e),
    }
}
