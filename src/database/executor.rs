//! Statement execution on a leased connection.

use crate::database::result::{CellValue, QueryResult};
use crate::error::{DatabaseError, DbResult};
use mysql_async::prelude::Queryable;
use mysql_async::{Conn, Row};
use tracing::debug;

/// MySQL server error code for an unknown table (ER_NO_SUCH_TABLE).
const ER_NO_SUCH_TABLE: u16 = 1146;

/// Runs one SQL statement and collects the full result set.
///
/// Column names come from the result metadata, never from the input SQL; a
/// statement that produces no result set yields an empty column list.
pub async fn run_query(conn: &mut Conn, sql: &str) -> DbResult<QueryResult> {
    debug!(sql, "executing statement");

    let mut result = conn.query_iter(sql).await.map_err(map_mysql_error)?;

    let columns: Vec<String> = result
        .columns()
        .map(|cols| {
            cols.iter()
                .map(|c| c.name_str().into_owned())
                .collect()
        })
        .unwrap_or_default();

    let raw: Vec<Row> = result.collect().await.map_err(map_mysql_error)?;
    let rows = raw.into_iter().map(row_cells).collect();

    Ok(QueryResult::new(columns, rows))
}

/// Converts a wire row into positional cell values.
fn row_cells(row: Row) -> Vec<CellValue> {
    (0..row.len())
        .map(|i| {
            row.as_ref(i)
                .map(|v| CellValue::from(v.clone()))
                .unwrap_or(CellValue::Null)
        })
        .collect()
}

/// Maps driver errors onto the crate's database error taxonomy.
pub(crate) fn map_mysql_error(err: mysql_async::Error) -> DatabaseError {
    match err {
        mysql_async::Error::Server(ref server) if server.code == ER_NO_SUCH_TABLE => {
            DatabaseError::TableNotFound(server.message.clone())
        }
        other => DatabaseError::QueryFailed(other.to_string()),
    }
}
