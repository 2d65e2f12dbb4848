//! Statement execution, including lookups over id sets of any size.

use rusqlite::ToSql;
use std::collections::HashSet;
use std::hash::Hash;
use tracing::{debug, trace, warn};

use crate::builder::SqlBuilder;
use crate::error::{Result, WalletDbError};
use crate::persist::Reader;
use crate::rows::FromRow;

/// Executes a statement without an id list and maps every row.
pub fn read_rows<T: FromRow>(reader: &Reader<'_>, builder: &SqlBuilder) -> Result<Vec<T>> {
    let params = builder.params();
    let mut statement = reader.connection().prepare_cached(builder.sql()?)?;
    let rows = statement
        .query_map(params.as_slice(), |row| T::from_row(row))?
        .collect::<rusqlite::Result<Vec<T>>>()?;
    Ok(rows)
}

/// Like [`read_rows`] but for statements that produce at most one row.
pub fn read_optional_row<T: FromRow>(reader: &Reader<'_>, builder: &SqlBuilder) -> Result<Option<T>> {
    Ok(read_rows(reader, builder)?.into_iter().next())
}

/// How many ids fit in one statement next to `fixed_params` other values.
pub fn chunk_size(max_bind_parameters: usize, fixed_params: usize) -> Result<usize> {
    match max_bind_parameters.checked_sub(fixed_params) {
        Some(size) if size > 0 => Ok(size),
        _ => Err(WalletDbError::Precondition(format!(
            "{fixed_params} fixed parameters leave no room for ids under a limit of {max_bind_parameters}"
        ))),
    }
}

/// Runs `builder` once per chunk of `ids`, rendering the chunk into its id
/// list, and concatenates the mapped rows in chunk order. Within a chunk rows
/// come back in whatever order the backend produces them.
///
/// Repeated ids are looked up once, at their first position. No statement is
/// executed for an empty id set.
pub fn read_rows_by_id<T: FromRow, I: ToSql + Hash + Eq>(
    reader: &Reader<'_>,
    builder: &SqlBuilder,
    ids: &[I],
) -> Result<Vec<T>> {
    if !builder.has_id_list() {
        warn!("batched lookup requested for a statement without an id list");
        return Err(WalletDbError::Precondition(
            "batched lookups need a statement with an id list".to_string(),
        ));
    }
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let batch_size = chunk_size(reader.max_bind_parameters(), builder.fixed_param_count())?;
    let mut seen = HashSet::with_capacity(ids.len());
    let unique: Vec<&I> = ids.iter().filter(|id| seen.insert(*id)).collect();
    let mut results = Vec::new();
    let mut chunks = 0usize;
    for chunk in unique.chunks(batch_size) {
        let (sql, params) = builder.render(chunk)?;
        let mut statement = reader.connection().prepare_cached(&sql)?;
        let rows = statement.query_map(params.as_slice(), |row| T::from_row(row))?;
        let before = results.len();
        for row in rows {
            results.push(row?);
        }
        chunks += 1;
        trace!(chunk = chunks, ids = chunk.len(), rows = results.len() - before, "chunk read");
    }
    debug!(ids = ids.len(), unique = unique.len(), chunks, rows = results.len(), "batched lookup complete");
    Ok(results)
}
