//! Read projections over the wallet ledger.
//!
//! Every function takes a [`Reader`] obtained from [`crate::persist::Store::read`]
//! and returns owned records. None of them write. Backend failures are returned
//! as [`WalletDbError::Backend`] and never turned into an empty or zero result.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use tracing::{debug, warn};

use crate::batch::{read_optional_row, read_rows, read_rows_by_id};
use crate::builder::SqlBuilder;
use crate::error::{Result, WalletDbError};
use crate::filter::FlagFilter;
use crate::flags::{PaymentFlags, TxFlags};
use crate::persist::Reader;
use crate::rows::{
    AccountBalance, HistoryListRow, KeyInstanceRow, KeyListRow, PaymentRequestRow,
    TransactionDeltaSum, TransactionOutputRow, TransactionRow, TransactionValueRow, TxHash,
};

/// Sums the value deltas of `account_id`.
///
/// With an empty `filter` every delta counts, including deltas of transactions
/// that are not settled. A non-empty filter joins the transactions and keeps
/// only those whose flags pass it, e.g.
/// `FlagFilter::masked(TxFlags::STATE_SETTLED, TxFlags::STATE_MASK)` for the
/// confirmed balance.
pub fn read_account_balance(
    reader: &Reader<'_>,
    account_id: i64,
    filter: FlagFilter,
) -> Result<AccountBalance> {
    let mut query = SqlBuilder::new(
        "SELECT TXV.account_id, COALESCE(SUM(TXV.value), 0), COUNT(DISTINCT TXV.tx_hash) \
         FROM TransactionValues TXV ",
    );
    let clause = filter.clause("TX.flags");
    if clause.is_some() {
        query.push_sql("INNER JOIN Transactions TX ON TX.tx_hash = TXV.tx_hash ");
    }
    query.push_sql("WHERE TXV.account_id = ").push_bind(account_id);
    if let Some(clause) = &clause {
        query.push_sql(" AND ").push_clause(clause);
    }
    query.push_sql(" GROUP BY TXV.account_id");

    let balance = read_optional_row::<AccountBalance>(reader, &query)?
        .unwrap_or_else(|| AccountBalance::empty(account_id));
    debug!(account_id, filtered = clause.is_some(), total = balance.total, "account balance read");
    Ok(balance)
}

/// One row per settled transaction of the account with its summed delta.
///
/// When `keyinstance_ids` is given only the deltas attributed to those keys
/// contribute, and transactions touching none of them are left out.
pub fn read_history_list(
    reader: &Reader<'_>,
    account_id: i64,
    keyinstance_ids: Option<&[i64]>,
) -> Result<Vec<HistoryListRow>> {
    let mut query = SqlBuilder::new(
        "SELECT TXV.tx_hash, TX.flags, TX.block_height, TX.block_position, \
         COALESCE(SUM(TXV.value), 0), TX.date_added \
         FROM TransactionValues TXV \
         INNER JOIN Transactions TX ON TX.tx_hash = TXV.tx_hash \
         WHERE TXV.account_id = ",
    );
    query.push_bind(account_id);
    if keyinstance_ids.is_some() {
        query.push_sql(" AND TXV.keyinstance_id IN (");
        query.push_id_list()?;
        query.push_sql(")");
    }
    query
        .push_sql(" AND (TX.flags & ")
        .push_bind(TxFlags::STATE_MASK.bits())
        .push_sql(") != 0 GROUP BY TXV.tx_hash ORDER BY TX.block_height IS NULL, TX.block_height, TX.block_position, TX.date_added");

    let rows = match keyinstance_ids {
        // A transaction touching keys in different chunks comes back once per chunk.
        Some(ids) => merge_history_rows(read_rows_by_id(reader, &query, ids)?),
        None => read_rows(reader, &query)?,
    };
    debug!(account_id, keys = ?keyinstance_ids.map(|ids| ids.len()), rows = rows.len(), "history list read");
    Ok(rows)
}

fn merge_history_rows(rows: Vec<HistoryListRow>) -> Vec<HistoryListRow> {
    let mut positions: HashMap<TxHash, usize> = HashMap::new();
    let mut merged: Vec<HistoryListRow> = Vec::with_capacity(rows.len());
    for row in rows {
        match positions.entry(row.tx_hash) {
            Entry::Occupied(entry) => merged[*entry.get()].value_delta += row.value_delta,
            Entry::Vacant(entry) => {
                entry.insert(merged.len());
                merged.push(row);
            }
        }
    }
    merged
}

const KEY_LIST_COLUMNS: &str = "SELECT KI.keyinstance_id, KI.masterkey_id, KI.derivation_type, \
    KI.derivation_data, KI.flags, KI.date_updated, TXO.tx_hash, TXO.tx_index, \
    TXO.script_type, TXO.value \
    FROM KeyInstances AS KI ";

/// Key instances of the account with their outputs.
///
/// With explicit ids there is exactly one row per found key, carrying its first
/// output by outpoint (or none). Without ids every key/output pairing is
/// returned, and keys without outputs appear once with empty output fields.
pub fn read_key_list(
    reader: &Reader<'_>,
    account_id: i64,
    keyinstance_ids: Option<&[i64]>,
) -> Result<Vec<KeyListRow>> {
    let rows = match keyinstance_ids {
        Some(ids) => {
            let mut query = SqlBuilder::new(KEY_LIST_COLUMNS);
            query
                .push_sql(
                    "LEFT JOIN TransactionOutputs TXO ON TXO.rowid = ( \
                     SELECT KTXO.rowid FROM TransactionOutputs KTXO \
                     WHERE KTXO.keyinstance_id = KI.keyinstance_id \
                     ORDER BY KTXO.tx_hash, KTXO.tx_index LIMIT 1) \
                     WHERE KI.account_id = ",
                )
                .push_bind(account_id)
                .push_sql(" AND KI.keyinstance_id IN (");
            query.push_id_list()?;
            query.push_sql(") ORDER BY KI.keyinstance_id");
            read_rows_by_id(reader, &query, ids)?
        }
        None => {
            let mut query = SqlBuilder::new(KEY_LIST_COLUMNS);
            query
                .push_sql(
                    "LEFT JOIN TransactionOutputs TXO ON TXO.keyinstance_id = KI.keyinstance_id \
                     WHERE KI.account_id = ",
                )
                .push_bind(account_id)
                .push_sql(" ORDER BY KI.keyinstance_id, TXO.tx_hash, TXO.tx_index");
            read_rows(reader, &query)?
        }
    };
    debug!(account_id, keys = ?keyinstance_ids.map(|ids| ids.len()), rows = rows.len(), "key list read");
    Ok(rows)
}

/// The subset of `keyinstance_ids` whose unpaid payment request is now covered
/// by outputs on that key within the account's transactions.
///
/// A request without a required value is paid by any output, but a key with
/// no outputs at all is never reported.
pub fn read_paid_requests(
    reader: &Reader<'_>,
    account_id: i64,
    keyinstance_ids: &[i64],
) -> Result<Vec<i64>> {
    if keyinstance_ids.is_empty() {
        warn!(account_id, "paid request lookup without key instances");
        return Err(WalletDbError::Precondition(
            "read_paid_requests needs at least one key instance id".to_string(),
        ));
    }
    let mut query = SqlBuilder::new(
        "SELECT PR.keyinstance_id \
         FROM PaymentRequests PR \
         INNER JOIN TransactionOutputs TXO ON TXO.keyinstance_id = PR.keyinstance_id \
         INNER JOIN AccountTransactions ATX ON ATX.tx_hash = TXO.tx_hash AND ATX.account_id = ",
    );
    query.push_bind(account_id).push_sql(" WHERE PR.keyinstance_id IN (");
    query.push_id_list()?;
    query
        .push_sql(") AND (PR.state & ")
        .push_bind(PaymentFlags::UNPAID.bits())
        .push_sql(
            ") != 0 GROUP BY PR.keyinstance_id \
             HAVING PR.value IS NULL OR PR.value <= SUM(TXO.value)",
        );
    let paid: Vec<i64> = read_rows_by_id(reader, &query, keyinstance_ids)?;
    debug!(account_id, keys = keyinstance_ids.len(), paid = paid.len(), "paid requests read");
    Ok(paid)
}

/// Summed delta of one transaction per account, ordered by account.
pub fn read_transaction_value(
    reader: &Reader<'_>,
    tx_hash: &TxHash,
    account_id: Option<i64>,
) -> Result<Vec<TransactionDeltaSum>> {
    let mut query = SqlBuilder::new(
        "SELECT account_id, COALESCE(SUM(value), 0) FROM TransactionValues WHERE tx_hash = ",
    );
    query.push_bind(tx_hash.as_bytes().to_vec());
    if let Some(account_id) = account_id {
        query.push_sql(" AND account_id = ").push_bind(account_id);
    }
    query.push_sql(" GROUP BY account_id ORDER BY account_id");
    let rows = read_rows(reader, &query)?;
    debug!(%tx_hash, ?account_id, rows = rows.len(), "transaction value read");
    Ok(rows)
}

// ------------- Plain lookups -------------

/// Transactions by hash. Unknown hashes are skipped.
pub fn read_transactions(reader: &Reader<'_>, tx_hashes: &[TxHash]) -> Result<Vec<TransactionRow>> {
    let mut query = SqlBuilder::new(
        "SELECT tx_hash, flags, block_height, block_position, fee_value, description, \
         date_added, date_updated FROM Transactions WHERE tx_hash IN (",
    );
    query.push_id_list()?;
    query.push_sql(")");
    read_rows_by_id(reader, &query, tx_hashes)
}

pub fn read_transaction_outputs(
    reader: &Reader<'_>,
    tx_hash: &TxHash,
) -> Result<Vec<TransactionOutputRow>> {
    let mut query = SqlBuilder::new(
        "SELECT tx_hash, tx_index, value, keyinstance_id, script_type, flags, date_updated \
         FROM TransactionOutputs WHERE tx_hash = ",
    );
    query.push_bind(tx_hash.as_bytes().to_vec()).push_sql(" ORDER BY tx_index");
    read_rows(reader, &query)
}

/// Key instances of the account by id. Ids of other accounts are skipped.
pub fn read_keyinstances(
    reader: &Reader<'_>,
    account_id: i64,
    keyinstance_ids: &[i64],
) -> Result<Vec<KeyInstanceRow>> {
    let mut query = SqlBuilder::new(
        "SELECT keyinstance_id, account_id, masterkey_id, derivation_type, derivation_data, \
         flags, description, date_updated FROM KeyInstances WHERE account_id = ",
    );
    query.push_bind(account_id).push_sql(" AND keyinstance_id IN (");
    query.push_id_list()?;
    query.push_sql(") ORDER BY keyinstance_id");
    read_rows_by_id(reader, &query, keyinstance_ids)
}

/// Payment requests on the account's keys whose state passes `filter`.
pub fn read_payment_requests(
    reader: &Reader<'_>,
    account_id: i64,
    filter: FlagFilter,
) -> Result<Vec<PaymentRequestRow>> {
    let mut query = SqlBuilder::new(
        "SELECT PR.keyinstance_id, PR.state, PR.value, PR.expiration, PR.description, \
         PR.date_updated FROM PaymentRequests PR \
         INNER JOIN KeyInstances KI ON KI.keyinstance_id = PR.keyinstance_id \
         WHERE KI.account_id = ",
    );
    query.push_bind(account_id);
    if let Some(clause) = filter.clause("PR.state") {
        query.push_sql(" AND ").push_clause(&clause);
    }
    query.push_sql(" ORDER BY PR.keyinstance_id");
    read_rows(reader, &query)
}

/// The individual deltas making up one transaction's value for an account.
pub fn read_transaction_values(
    reader: &Reader<'_>,
    account_id: i64,
    tx_hash: &TxHash,
) -> Result<Vec<TransactionValueRow>> {
    let mut query = SqlBuilder::new(
        "SELECT tx_hash, account_id, keyinstance_id, value, date_updated \
         FROM TransactionValues WHERE account_id = ",
    );
    query
        .push_bind(account_id)
        .push_sql(" AND tx_hash = ")
        .push_bind(tx_hash.as_bytes().to_vec())
        .push_sql(" ORDER BY keyinstance_id");
    read_rows(reader, &query)
}
