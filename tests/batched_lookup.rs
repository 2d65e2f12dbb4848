mod common;

use common::{ACCOUNT, Ledger, OTHER_ACCOUNT};
use walletdb::WalletDbError;
use walletdb::batch::{read_rows, read_rows_by_id};
use walletdb::builder::SqlBuilder;
use walletdb::persist::Reader;
use walletdb::queries::read_keyinstances;

fn missing_table_lookup() -> SqlBuilder {
    let mut query = SqlBuilder::new("SELECT id FROM NoSuchTable WHERE id IN (");
    query.push_id_list().expect("id list");
    query.push_sql(")");
    query
}

#[test]
fn empty_id_set_executes_nothing() {
    let ledger = Ledger::new();
    // the statement would fail if it ever reached the backend
    let rows: Vec<i64> = ledger
        .store
        .read(|reader| read_rows_by_id::<i64, i64>(reader, &missing_table_lookup(), &[]))
        .expect("no statement runs");
    assert!(rows.is_empty());
}

#[test]
fn backend_failures_propagate() {
    let ledger = Ledger::new();
    let result = ledger
        .store
        .read(|reader| read_rows_by_id::<i64, i64>(reader, &missing_table_lookup(), &[1, 2]));
    assert!(matches!(result, Err(WalletDbError::Backend(_))));
}

#[test]
fn statement_without_id_list_is_rejected() {
    let ledger = Ledger::new();
    let query = SqlBuilder::new("SELECT keyinstance_id FROM KeyInstances");
    let result = ledger
        .store
        .read(|reader| read_rows_by_id::<i64, i64>(reader, &query, &[1]));
    assert!(matches!(result, Err(WalletDbError::Precondition(_))));

    // and the other way around
    let result = ledger
        .store
        .read(|reader| read_rows::<i64>(reader, &missing_table_lookup()));
    assert!(matches!(result, Err(WalletDbError::Precondition(_))));
}

#[test]
fn fixed_parameters_must_leave_room_for_ids() {
    let ledger = Ledger::with_max_bind_parameters(2);
    let mut query = SqlBuilder::new("SELECT keyinstance_id FROM KeyInstances WHERE account_id = ");
    query.push_bind(ACCOUNT).push_sql(" AND flags != ").push_bind(0i64).push_sql(" AND keyinstance_id IN (");
    query.push_id_list().expect("id list");
    query.push_sql(")");
    let result = ledger
        .store
        .read(|reader| read_rows_by_id::<i64, i64>(reader, &query, &[1]));
    assert!(matches!(result, Err(WalletDbError::Precondition(_))));
}

#[test]
fn chunked_lookup_matches_single_id_lookups() {
    // one fixed parameter, so four ids per statement
    let ledger = Ledger::with_max_bind_parameters(5);
    for id in 1..=60 {
        let account = if id % 3 == 0 { OTHER_ACCOUNT } else { ACCOUNT };
        ledger.key(id, account);
    }
    let all: Vec<i64> = (1..=70).collect();
    for n in [0usize, 1, 4, 5, 17, 60, 70] {
        let ids = &all[..n];
        let (batched, single) = ledger
            .store
            .read(|reader| {
                let batched = read_keyinstances(reader, ACCOUNT, ids)?;
                let mut single = Vec::new();
                for id in ids {
                    single.extend(read_keyinstances(reader, ACCOUNT, &[*id])?);
                }
                Ok((batched, single))
            })
            .expect("lookups");
        assert_eq!(batched, single, "{n} ids");
        assert!(batched.iter().all(|row| row.account_id == ACCOUNT));
    }
}

#[test]
fn reader_over_a_borrowed_connection() {
    let ledger = Ledger::new();
    ledger.key(1, ACCOUNT).key(2, ACCOUNT).key(3, ACCOUNT);
    let connection = ledger.store.connection().expect("connection");
    let reader = Reader::new(&connection, 1);
    let mut query = SqlBuilder::new("SELECT keyinstance_id FROM KeyInstances WHERE keyinstance_id IN (");
    query.push_id_list().expect("id list");
    query.push_sql(")");
    let rows: Vec<i64> = read_rows_by_id(&reader, &query, &[3i64, 1, 2]).expect("rows");
    // one id per statement, so chunk order is id order
    assert_eq!(rows, vec![3, 1, 2]);
}

#[test]
fn repeated_ids_are_looked_up_once_in_first_seen_order() {
    let ledger = Ledger::new();
    ledger.key(1, ACCOUNT).key(2, ACCOUNT).key(3, ACCOUNT);
    let mut query = SqlBuilder::new("SELECT keyinstance_id FROM KeyInstances WHERE keyinstance_id IN (");
    query.push_id_list().expect("id list");
    query.push_sql(")");
    let connection = ledger.store.connection().expect("connection");
    for max_bind_parameters in [1, 2, 999] {
        let reader = Reader::new(&connection, max_bind_parameters);
        let mut rows: Vec<i64> =
            read_rows_by_id(&reader, &query, &[3i64, 1, 3, 2, 1, 3]).expect("rows");
        if max_bind_parameters == 1 {
            assert_eq!(rows, vec![3, 1, 2]);
        }
        rows.sort();
        assert_eq!(rows, vec![1, 2, 3], "limit {max_bind_parameters}");
    }
}
