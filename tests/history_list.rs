mod common;

use chrono::{DateTime, Utc};
use common::{ACCOUNT, Ledger, NOW, OTHER_ACCOUNT, hash, settled};
use walletdb::flags::TxFlags;
use walletdb::queries::read_history_list;

#[test]
fn unsettled_transactions_are_left_out() {
    let ledger = Ledger::new();
    ledger
        .transaction(hash(1), settled(), Some(100))
        .transaction(hash(2), TxFlags::HAS_FEE | TxFlags::HAS_BYTEDATA, None)
        .transaction(hash(3), TxFlags::STATE_CLEARED, None)
        .value(hash(1), ACCOUNT, None, 10)
        .value(hash(2), ACCOUNT, None, 1_000_000)
        .value(hash(3), ACCOUNT, None, -4);
    let history = ledger
        .store
        .read(|reader| read_history_list(reader, ACCOUNT, None))
        .expect("history");
    let hashes: Vec<_> = history.iter().map(|row| row.tx_hash).collect();
    assert_eq!(hashes, vec![hash(1), hash(3)]);
    assert!(history.iter().all(|row| row.tx_flags.is_settled()));
}

#[test]
fn one_row_per_transaction_with_summed_delta() {
    let ledger = Ledger::new();
    ledger
        .transaction(hash(1), settled(), Some(100))
        .transaction(hash(2), settled(), Some(90))
        .key(10, ACCOUNT)
        .key(11, ACCOUNT)
        .value(hash(1), ACCOUNT, Some(10), 70)
        .value(hash(1), ACCOUNT, Some(11), 30)
        .value(hash(2), ACCOUNT, Some(10), -20)
        .value(hash(2), OTHER_ACCOUNT, None, 999);
    let history = ledger
        .store
        .read(|reader| read_history_list(reader, ACCOUNT, None))
        .expect("history");
    assert_eq!(history.len(), 2);
    // ordered by block height
    assert_eq!(history[0].tx_hash, hash(2));
    assert_eq!(history[0].value_delta, -20);
    assert_eq!(history[0].block_height, Some(90));
    assert_eq!(history[1].tx_hash, hash(1));
    assert_eq!(history[1].value_delta, 100);
    assert_eq!(history[1].date_added, NOW);
}

#[test]
fn key_scoped_history_only_counts_those_keys() {
    let ledger = Ledger::new();
    ledger
        .transaction(hash(1), settled(), Some(100))
        .transaction(hash(2), settled(), Some(101))
        .key(10, ACCOUNT)
        .key(11, ACCOUNT)
        .value(hash(1), ACCOUNT, Some(10), 70)
        .value(hash(1), ACCOUNT, Some(11), 30)
        .value(hash(2), ACCOUNT, Some(11), 5);
    let history = ledger
        .store
        .read(|reader| read_history_list(reader, ACCOUNT, Some(&[10i64][..])))
        .expect("history");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].tx_hash, hash(1));
    assert_eq!(history[0].value_delta, 70);
}

#[test]
fn key_scoped_history_merges_rows_across_chunks() {
    // two fixed parameters leave room for a single id per statement
    let ledger = Ledger::with_max_bind_parameters(3);
    ledger
        .transaction(hash(1), settled(), Some(100))
        .transaction(hash(2), TxFlags::HAS_FEE, None)
        .key(10, ACCOUNT)
        .key(11, ACCOUNT)
        .key(12, ACCOUNT)
        .value(hash(1), ACCOUNT, Some(10), 70)
        .value(hash(1), ACCOUNT, Some(11), 30)
        .value(hash(1), ACCOUNT, Some(12), -1)
        .value(hash(2), ACCOUNT, Some(12), 500);
    let history = ledger
        .store
        .read(|reader| read_history_list(reader, ACCOUNT, Some(&[10i64, 11, 12][..])))
        .expect("history");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].tx_hash, hash(1));
    assert_eq!(history[0].value_delta, 99);
}

#[test]
fn empty_key_set_gives_empty_history() {
    let ledger = Ledger::new();
    ledger
        .transaction(hash(1), settled(), Some(100))
        .value(hash(1), ACCOUNT, None, 10);
    let history = ledger
        .store
        .read(|reader| read_history_list(reader, ACCOUNT, Some(&Vec::<i64>::new()[..])))
        .expect("history");
    assert!(history.is_empty());
}

#[test]
fn repeated_key_ids_count_once() {
    for max_bind_parameters in [3, 4, 999] {
        let ledger = Ledger::with_max_bind_parameters(max_bind_parameters);
        ledger
            .transaction(hash(1), settled(), Some(100))
            .key(10, ACCOUNT)
            .key(11, ACCOUNT)
            .value(hash(1), ACCOUNT, Some(10), 70)
            .value(hash(1), ACCOUNT, Some(11), 30);
        let history = ledger
            .store
            .read(|reader| read_history_list(reader, ACCOUNT, Some(&[10i64, 10, 11, 10][..])))
            .expect("history");
        assert_eq!(history.len(), 1, "limit {max_bind_parameters}");
        assert_eq!(history[0].value_delta, 100, "limit {max_bind_parameters}");
    }
}

#[test]
fn repeated_history_reads_agree() {
    let ledger = Ledger::with_max_bind_parameters(3);
    ledger
        .transaction(hash(1), settled(), Some(100))
        .transaction(hash(2), settled(), Some(101))
        .key(10, ACCOUNT)
        .key(11, ACCOUNT)
        .value(hash(1), ACCOUNT, Some(10), 70)
        .value(hash(2), ACCOUNT, Some(11), -30);
    let ids = [11i64, 10];
    let read = || {
        ledger
            .store
            .read(|reader| {
                Ok((
                    read_history_list(reader, ACCOUNT, None)?,
                    read_history_list(reader, ACCOUNT, Some(&ids[..]))?,
                ))
            })
            .expect("history")
    };
    let first = read();
    assert_eq!(first.1.len(), 2);
    assert_eq!(first, read());
}

#[test]
fn dates_are_exposed_as_utc() {
    let ledger = Ledger::new();
    ledger
        .transaction(hash(1), settled(), Some(100))
        .value(hash(1), ACCOUNT, None, 10);
    let history = ledger
        .store
        .read(|reader| read_history_list(reader, ACCOUNT, None))
        .expect("history");
    assert_eq!(history[0].added_at(), DateTime::<Utc>::from_timestamp(NOW, 0));
    let json = serde_json::to_value(&history[0]).expect("json");
    assert_eq!(json["date_added"], "2020-09-13T12:26:40+00:00");
    assert_eq!(json["value_delta"], 10);
}
