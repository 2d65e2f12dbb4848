// used for persistence
use rusqlite::Connection;
use rusqlite::limits::Limit;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::error::{Result, WalletDbError};

/// SQLite's historical compile time ceiling on bound parameters. Newer builds
/// allow more, but nothing guarantees the wallet file is opened by one.
pub const DEFAULT_MAX_BIND_PARAMETERS: usize = 999;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PersistenceMode {
    InMemory,
    File(String),
}

// ------------- Persistence -------------
pub struct Store {
    connection: Mutex<Connection>,
    max_bind_parameters: usize,
}

impl Store {
    pub fn new(mode: PersistenceMode) -> Result<Store> {
        Store::open(mode, DEFAULT_MAX_BIND_PARAMETERS)
    }

    pub fn from_settings(settings: &Settings) -> Result<Store> {
        Store::open(settings.persistence_mode(), settings.max_bind_parameters)
    }

    /// Opens the store with a bind parameter ceiling for batched lookups.
    /// A ceiling above the connection's own variable limit is lowered to it.
    pub fn open(mode: PersistenceMode, max_bind_parameters: usize) -> Result<Store> {
        if max_bind_parameters == 0 {
            return Err(WalletDbError::Config(
                "max_bind_parameters must be at least 1".to_string(),
            ));
        }
        let connection = match &mode {
            PersistenceMode::InMemory => Connection::open_in_memory()?,
            PersistenceMode::File(path) => Connection::open(path)?,
        };
        let backend_limit = usize::try_from(connection.limit(Limit::SQLITE_LIMIT_VARIABLE_NUMBER)?)
            .unwrap_or(DEFAULT_MAX_BIND_PARAMETERS);
        let max_bind_parameters = if max_bind_parameters > backend_limit {
            warn!(configured = max_bind_parameters, backend_limit, "bind parameter ceiling capped");
            backend_limit
        } else {
            max_bind_parameters
        };
        create_schema(&connection)?;
        info!(?mode, max_bind_parameters, "wallet store opened");
        Ok(Store {
            connection: Mutex::new(connection),
            max_bind_parameters,
        })
    }

    pub fn max_bind_parameters(&self) -> usize {
        self.max_bind_parameters
    }

    /// Runs `f` against one scoped read view of the store. Every statement
    /// executed inside `f` sees the same snapshot. The connection is released
    /// when `f` returns, whether or not it succeeded.
    pub fn read<T>(&self, f: impl FnOnce(&Reader<'_>) -> Result<T>) -> Result<T> {
        let guard = self.lock()?;
        // dropping the transaction rolls it back, there is nothing to keep
        let transaction = guard.unchecked_transaction()?;
        let reader = Reader {
            connection: &transaction,
            max_bind_parameters: self.max_bind_parameters,
        };
        let result = f(&reader);
        debug!(ok = result.is_ok(), "read view released");
        result
    }

    /// Raw access for the wallet's write path, which lives outside this crate.
    pub fn connection(&self) -> Result<MutexGuard<'_, Connection>> {
        self.lock()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.connection
            .lock()
            .map_err(|e| WalletDbError::Lock(e.to_string()))
    }
}

/// A borrowed, read-only view handed to the query functions.
pub struct Reader<'c> {
    connection: &'c Connection,
    max_bind_parameters: usize,
}

impl<'c> Reader<'c> {
    pub fn new(connection: &'c Connection, max_bind_parameters: usize) -> Reader<'c> {
        Reader {
            connection,
            max_bind_parameters,
        }
    }
    pub fn connection(&self) -> &'c Connection {
        self.connection
    }
    pub fn max_bind_parameters(&self) -> usize {
        self.max_bind_parameters
    }
}

fn create_schema(connection: &Connection) -> Result<()> {
    // The "STRICT" keyword is left out so that the file can still be opened
    // by older tooling.
    connection.execute_batch(
        "
        create table if not exists Transactions (
            tx_hash blob not null,
            flags integer not null,
            block_height integer null,
            block_position integer null,
            fee_value integer null,
            description text null,
            date_added integer not null,
            date_updated integer not null,
            constraint referenceable_Transactions_tx_hash primary key (
                tx_hash
            )
        );
        create table if not exists KeyInstances (
            keyinstance_id integer not null,
            account_id integer not null,
            masterkey_id integer null,
            derivation_type integer not null,
            derivation_data blob not null,
            flags integer not null,
            description text null,
            date_updated integer not null,
            constraint referenceable_KeyInstances_keyinstance_id primary key (
                keyinstance_id
            )
        );
        create table if not exists TransactionOutputs (
            tx_hash blob not null,
            tx_index integer not null,
            value integer not null,
            keyinstance_id integer null,
            script_type integer not null,
            flags integer not null,
            date_updated integer not null,
            constraint TransactionOutput_in_Transaction foreign key (
                tx_hash
            ) references Transactions(tx_hash),
            constraint TransactionOutput_owned_by_KeyInstance foreign key (
                keyinstance_id
            ) references KeyInstances(keyinstance_id),
            constraint unique_TransactionOutputs_outpoint primary key (
                tx_hash,
                tx_index
            )
        );
        create table if not exists AccountTransactions (
            tx_hash blob not null,
            account_id integer not null,
            constraint AccountTransaction_in_Transaction foreign key (
                tx_hash
            ) references Transactions(tx_hash),
            constraint unique_AccountTransactions primary key (
                tx_hash,
                account_id
            )
        );
        create table if not exists TransactionValues (
            tx_hash blob not null,
            account_id integer not null,
            keyinstance_id integer null,
            value integer not null,
            date_updated integer not null,
            constraint TransactionValue_in_Transaction foreign key (
                tx_hash
            ) references Transactions(tx_hash),
            constraint TransactionValue_for_KeyInstance foreign key (
                keyinstance_id
            ) references KeyInstances(keyinstance_id)
        );
        create table if not exists PaymentRequests (
            keyinstance_id integer not null,
            state integer not null,
            value integer null,
            expiration integer null,
            description text null,
            date_updated integer not null,
            constraint PaymentRequest_for_KeyInstance foreign key (
                keyinstance_id
            ) references KeyInstances(keyinstance_id),
            constraint referenceable_PaymentRequests_keyinstance_id primary key (
                keyinstance_id
            )
        );
        create index if not exists idx_TransactionValues_account on TransactionValues (
            account_id,
            tx_hash
        );
        create index if not exists idx_TransactionOutputs_keyinstance on TransactionOutputs (
            keyinstance_id
        );
        create index if not exists idx_KeyInstances_account on KeyInstances (
            account_id
        );
        ",
    )?;
    Ok(())
}
