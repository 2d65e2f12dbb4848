//! Walletdb – the read side of a Bitcoin wallet's local ledger.
//!
//! The wallet keeps its ledger in SQLite: transactions, their outputs, the key
//! instances that own those outputs, per-account value deltas and payment
//! requests. This crate answers the questions the rest of the wallet asks of
//! that ledger:
//! * what is the balance of an account (optionally narrowed by transaction flags),
//! * which settled transactions make up its history and what each did to it,
//! * which keys exist and which outputs they hold,
//! * which open payment requests have been paid,
//! * what a single transaction was worth to each account.
//!
//! Nothing here writes to the ledger. The write path lives elsewhere and only
//! shares the [`persist::Store`] connection.
//!
//! ## Modules
//! * [`persist`] – SQLite store, schema and the scoped [`persist::Reader`].
//! * [`queries`] – the read projections themselves.
//! * [`filter`] – the one flag/mask convention every query uses.
//! * [`builder`] – SQL text and bind values kept in step.
//! * [`batch`] – statement execution, chunked for large id sets.
//! * [`rows`] – owned result records and their column mappings.
//! * [`flags`] – flag and enumeration vocabularies.
//! * [`config`] – settings from file and environment.
//!
//! ## Quick Start
//! ```
//! use walletdb::persist::{PersistenceMode, Store};
//! use walletdb::filter::FlagFilter;
//! use walletdb::queries::read_account_balance;
//! let store = Store::new(PersistenceMode::InMemory).unwrap();
//! let balance = store
//!     .read(|reader| read_account_balance(reader, 1, FlagFilter::any()))
//!     .unwrap();
//! assert_eq!(balance.total, 0);
//! ```
//!
//! ## Consistency
//! Each [`persist::Store::read`] call sees one snapshot of the ledger. Two
//! separate calls may observe different states if the wallet wrote in between;
//! run both queries inside one call when they must agree.

pub mod batch;
pub mod builder;
pub mod config;
pub mod error;
pub mod filter;
pub mod flags;
pub mod persist;
pub mod queries;
pub mod rows;

pub use error::{Result, WalletDbError};
