#![allow(dead_code)]

use rusqlite::params;
use walletdb::flags::{
    DerivationType, KeyInstanceFlags, PaymentFlags, ScriptType, TransactionOutputFlags, TxFlags,
};
use walletdb::persist::{PersistenceMode, Store};
use walletdb::rows::TxHash;

pub const ACCOUNT: i64 = 1;
pub const OTHER_ACCOUNT: i64 = 2;
pub const NOW: i64 = 1_600_000_000;

pub fn hash(n: u8) -> TxHash {
    TxHash([n; 32])
}

pub fn settled() -> TxFlags {
    TxFlags::STATE_SETTLED | TxFlags::HAS_HEIGHT
}

/// A store seeded through raw inserts, standing in for the wallet's write path.
pub struct Ledger {
    pub store: Store,
}

impl Ledger {
    pub fn new() -> Ledger {
        Ledger { store: Store::new(PersistenceMode::InMemory).expect("store") }
    }

    pub fn with_max_bind_parameters(max_bind_parameters: usize) -> Ledger {
        Ledger {
            store: Store::open(PersistenceMode::InMemory, max_bind_parameters).expect("store"),
        }
    }

    fn execute(&self, sql: &str, values: &[&dyn rusqlite::ToSql]) {
        let connection = self.store.connection().expect("connection");
        connection.execute(sql, values).expect("insert");
    }

    pub fn transaction(&self, tx_hash: TxHash, flags: TxFlags, block_height: Option<i64>) -> &Self {
        self.execute(
            "insert into Transactions (tx_hash, flags, block_height, block_position, fee_value, \
             description, date_added, date_updated) values (?, ?, ?, ?, ?, ?, ?, ?)",
            params![tx_hash, flags, block_height, block_height.map(|_| 0i64), None::<i64>, None::<String>, NOW, NOW],
        );
        self
    }

    pub fn key(&self, keyinstance_id: i64, account_id: i64) -> &Self {
        self.execute(
            "insert into KeyInstances (keyinstance_id, account_id, masterkey_id, derivation_type, \
             derivation_data, flags, description, date_updated) values (?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                keyinstance_id,
                account_id,
                Some(1i64),
                DerivationType::BIP32_SUBPATH,
                vec![0u8, keyinstance_id as u8],
                KeyInstanceFlags::IS_ACTIVE,
                None::<String>,
                NOW
            ],
        );
        self
    }

    pub fn output(&self, tx_hash: TxHash, tx_index: i64, value: i64, keyinstance_id: Option<i64>) -> &Self {
        self.execute(
            "insert into TransactionOutputs (tx_hash, tx_index, value, keyinstance_id, script_type, \
             flags, date_updated) values (?, ?, ?, ?, ?, ?, ?)",
            params![tx_hash, tx_index, value, keyinstance_id, ScriptType::P2PKH, TransactionOutputFlags::NONE, NOW],
        );
        self
    }

    pub fn value(&self, tx_hash: TxHash, account_id: i64, keyinstance_id: Option<i64>, value: i64) -> &Self {
        self.execute(
            "insert into TransactionValues (tx_hash, account_id, keyinstance_id, value, date_updated) \
             values (?, ?, ?, ?, ?)",
            params![tx_hash, account_id, keyinstance_id, value, NOW],
        );
        self
    }

    pub fn link(&self, tx_hash: TxHash, account_id: i64) -> &Self {
        self.execute(
            "insert into AccountTransactions (tx_hash, account_id) values (?, ?)",
            params![tx_hash, account_id],
        );
        self
    }

    pub fn request(&self, keyinstance_id: i64, state: PaymentFlags, value: Option<i64>) -> &Self {
        self.execute(
            "insert into PaymentRequests (keyinstance_id, state, value, expiration, description, \
             date_updated) values (?, ?, ?, ?, ?, ?)",
            params![keyinstance_id, state, value, None::<i64>, None::<String>, NOW],
        );
        self
    }
}
