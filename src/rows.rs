//! Owned records produced by the read queries.
//!
//! Each record maps its columns by position through [`FromRow`]. The column
//! order listed on every implementation is the select order the queries in
//! [`crate::queries`] commit to.

use chrono::{DateTime, Utc};
use rusqlite::Row;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Serialize, Serializer};

use std::fmt;
use std::str::FromStr;

use crate::error::WalletDbError;
use crate::flags::{
    DerivationType, KeyInstanceFlags, PaymentFlags, ScriptType, TransactionOutputFlags, TxFlags,
};

/// Maps one result row into an owned record.
pub trait FromRow: Sized {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

// single column id lookups
impl FromRow for i64 {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        row.get(0)
    }
}

/// Converts a stored unix timestamp.
pub fn utc(timestamp: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(timestamp, 0)
}

// Timestamps are written out as RFC 3339, or as the raw number when out of range.
fn serialize_timestamp<S: Serializer>(timestamp: &i64, serializer: S) -> Result<S::Ok, S::Error> {
    match utc(*timestamp) {
        Some(time) => serializer.serialize_str(&time.to_rfc3339()),
        None => serializer.serialize_i64(*timestamp),
    }
}

// output values of an optional join
fn non_negative(row: &Row<'_>, index: usize) -> rusqlite::Result<Option<i64>> {
    match row.get::<_, Option<i64>>(index)? {
        Some(value) if value < 0 => Err(rusqlite::Error::IntegralValueOutOfRange(index, value)),
        value => Ok(value),
    }
}

// ------------- Transaction hash -------------
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TxHash(pub [u8; 32]);

impl TxHash {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}
impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}
impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "TxHash({})", hex::encode(self.0))
    }
}
impl FromStr for TxHash {
    type Err = WalletDbError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|e| WalletDbError::InvalidHash(e.to_string()))?;
        let hash = <[u8; 32]>::try_from(bytes.as_slice()).map_err(|_| {
            WalletDbError::InvalidHash(format!("expected 32 bytes, got {}", bytes.len()))
        })?;
        Ok(TxHash(hash))
    }
}
impl Serialize for TxHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(self.0))
    }
}
impl ToSql for TxHash {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(&self.0[..]))
    }
}
impl FromSql for TxHash {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let blob = value.as_blob()?;
        <[u8; 32]>::try_from(blob)
            .map(TxHash)
            .map_err(|_| FromSqlError::InvalidBlobSize { expected_size: 32, blob_size: blob.len() })
    }
}

// ------------- Entities -------------

/// Columns: tx_hash, flags, block_height, block_position, fee_value,
/// description, date_added, date_updated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TransactionRow {
    pub tx_hash: TxHash,
    pub flags: TxFlags,
    pub block_height: Option<i64>,
    pub block_position: Option<i64>,
    pub fee_value: Option<i64>,
    pub description: Option<String>,
    #[serde(serialize_with = "serialize_timestamp")]
    pub date_added: i64,
    #[serde(serialize_with = "serialize_timestamp")]
    pub date_updated: i64,
}
impl TransactionRow {
    pub fn is_settled(&self) -> bool {
        self.flags.is_settled()
    }
    pub fn added_at(&self) -> Option<DateTime<Utc>> {
        utc(self.date_added)
    }
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        utc(self.date_updated)
    }
}
impl FromRow for TransactionRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            tx_hash: row.get(0)?,
            flags: row.get(1)?,
            block_height: row.get(2)?,
            block_position: row.get(3)?,
            fee_value: row.get(4)?,
            description: row.get(5)?,
            date_added: row.get(6)?,
            date_updated: row.get(7)?,
        })
    }
}

/// Columns: tx_hash, txo_index, value, keyinstance_id, script_type, flags,
/// date_updated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TransactionOutputRow {
    pub tx_hash: TxHash,
    pub txo_index: i64,
    pub value: i64,
    pub keyinstance_id: Option<i64>,
    pub script_type: ScriptType,
    pub flags: TransactionOutputFlags,
    pub date_updated: i64,
}
impl TransactionOutputRow {
    /// Outputs without a key instance are not ours to account for yet.
    pub fn is_claimed(&self) -> bool {
        self.keyinstance_id.is_some()
    }
}
impl FromRow for TransactionOutputRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let value: i64 = row.get(2)?;
        if value < 0 {
            return Err(rusqlite::Error::IntegralValueOutOfRange(2, value));
        }
        Ok(Self {
            tx_hash: row.get(0)?,
            txo_index: row.get(1)?,
            value,
            keyinstance_id: row.get(3)?,
            script_type: row.get(4)?,
            flags: row.get(5)?,
            date_updated: row.get(6)?,
        })
    }
}

/// Columns: keyinstance_id, account_id, masterkey_id, derivation_type,
/// derivation_data, flags, description, date_updated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct KeyInstanceRow {
    pub keyinstance_id: i64,
    pub account_id: i64,
    pub masterkey_id: Option<i64>,
    pub derivation_type: DerivationType,
    pub derivation_data: Vec<u8>,
    pub flags: KeyInstanceFlags,
    pub description: Option<String>,
    #[serde(serialize_with = "serialize_timestamp")]
    pub date_updated: i64,
}
impl KeyInstanceRow {
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        utc(self.date_updated)
    }
}
impl FromRow for KeyInstanceRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            keyinstance_id: row.get(0)?,
            account_id: row.get(1)?,
            masterkey_id: row.get(2)?,
            derivation_type: row.get(3)?,
            derivation_data: row.get(4)?,
            flags: row.get(5)?,
            description: row.get(6)?,
            date_updated: row.get(7)?,
        })
    }
}

/// Columns: tx_hash, account_id, keyinstance_id, value, date_updated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TransactionValueRow {
    pub tx_hash: TxHash,
    pub account_id: i64,
    pub keyinstance_id: Option<i64>,
    pub value: i64,
    pub date_updated: i64,
}
impl FromRow for TransactionValueRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            tx_hash: row.get(0)?,
            account_id: row.get(1)?,
            keyinstance_id: row.get(2)?,
            value: row.get(3)?,
            date_updated: row.get(4)?,
        })
    }
}

/// Columns: keyinstance_id, state, value, expiration, description, date_updated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PaymentRequestRow {
    pub keyinstance_id: i64,
    pub state: PaymentFlags,
    pub value: Option<i64>,
    pub expiration: Option<i64>,
    pub description: Option<String>,
    pub date_updated: i64,
}
impl PaymentRequestRow {
    pub fn is_unpaid(&self) -> bool {
        self.state.intersects(PaymentFlags::UNPAID)
    }
}
impl FromRow for PaymentRequestRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            keyinstance_id: row.get(0)?,
            state: row.get(1)?,
            value: row.get(2)?,
            expiration: row.get(3)?,
            description: row.get(4)?,
            date_updated: row.get(5)?,
        })
    }
}

// ------------- Aggregates -------------

/// Columns: account_id, total, tx_count.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct AccountBalance {
    pub account_id: i64,
    pub total: i64,
    pub tx_count: i64,
}
impl AccountBalance {
    pub fn empty(account_id: i64) -> Self {
        Self { account_id, total: 0, tx_count: 0 }
    }
}
impl FromRow for AccountBalance {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            account_id: row.get(0)?,
            total: row.get(1)?,
            tx_count: row.get(2)?,
        })
    }
}

/// Columns: tx_hash, tx_flags, block_height, block_position, value_delta,
/// date_added.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HistoryListRow {
    pub tx_hash: TxHash,
    pub tx_flags: TxFlags,
    pub block_height: Option<i64>,
    pub block_position: Option<i64>,
    pub value_delta: i64,
    #[serde(serialize_with = "serialize_timestamp")]
    pub date_added: i64,
}
impl HistoryListRow {
    pub fn added_at(&self) -> Option<DateTime<Utc>> {
        utc(self.date_added)
    }
}
impl FromRow for HistoryListRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            tx_hash: row.get(0)?,
            tx_flags: row.get(1)?,
            block_height: row.get(2)?,
            block_position: row.get(3)?,
            value_delta: row.get(4)?,
            date_added: row.get(5)?,
        })
    }
}

/// Columns: keyinstance_id, masterkey_id, derivation_type, derivation_data,
/// flags, date_updated, tx_hash, txo_index, txo_script_type, txo_value.
/// The output columns are null for a key without outputs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct KeyListRow {
    pub keyinstance_id: i64,
    pub masterkey_id: Option<i64>,
    pub derivation_type: DerivationType,
    pub derivation_data: Vec<u8>,
    pub flags: KeyInstanceFlags,
    #[serde(serialize_with = "serialize_timestamp")]
    pub date_updated: i64,
    pub tx_hash: Option<TxHash>,
    pub txo_index: Option<i64>,
    pub txo_script_type: Option<ScriptType>,
    pub txo_value: Option<i64>,
}
impl FromRow for KeyListRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            keyinstance_id: row.get(0)?,
            masterkey_id: row.get(1)?,
            derivation_type: row.get(2)?,
            derivation_data: row.get(3)?,
            flags: row.get(4)?,
            date_updated: row.get(5)?,
            tx_hash: row.get(6)?,
            txo_index: row.get(7)?,
            txo_script_type: row.get(8)?,
            txo_value: non_negative(row, 9)?,
        })
    }
}

/// Columns: account_id, total.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct TransactionDeltaSum {
    pub account_id: i64,
    pub total: i64,
}
impl FromRow for TransactionDeltaSum {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            account_id: row.get(0)?,
            total: row.get(1)?,
        })
    }
}
