//! Table enumeration and per-table schema documents.

use crate::database::executor::run_query;
use crate::database::pool::MysqlPool;
use crate::database::render::markdown_table;
use crate::database::result::{CellValue, ColumnInfo, QueryResult};
use crate::error::{DatabaseError, DbResult};
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Rows fetched for the sample-data section of a schema document.
const SAMPLE_ROW_LIMIT: u32 = 5;

/// Reads table metadata through the shared connection pool.
///
/// Results are never cached; every call re-queries the database. Table names
/// are interpolated into introspection statements without quoting and are
/// trusted to come from a prior enumeration (see DESIGN.md).
pub struct SchemaIntrospector {
    pool: Arc<MysqlPool>,
}

impl SchemaIntrospector {
    pub fn new(pool: Arc<MysqlPool>) -> Self {
        Self { pool }
    }

    /// Enumerates tables in the order the database returns them.
    #[instrument(skip(self))]
    pub async fn list_tables(&self) -> DbResult<Vec<String>> {
        let mut conn = self.pool.acquire().await?;
        let result = run_query(&mut conn, "SHOW TABLES").await?;

        let tables: Vec<String> = result
            .rows
            .iter()
            .filter_map(|row| row.first())
            .map(CellValue::render)
            .collect();

        debug!(count = tables.len(), "listed tables");
        Ok(tables)
    }

    /// Builds the markdown schema document for one table: column metadata,
    /// creation DDL, and up to five sample rows.
    ///
    /// All three sub-steps run on the same lease. Each is an independent
    /// read against possibly-changing state; the document is not a
    /// consistent snapshot.
    #[instrument(skip(self))]
    pub async fn describe_table(&self, table: &str) -> DbResult<String> {
        let mut conn = self.pool.acquire().await?;

        let described = run_query(&mut conn, &format!("DESCRIBE {table}")).await?;
        let columns: Vec<ColumnInfo> = described
            .rows
            .iter()
            .filter_map(|row| ColumnInfo::from_row(row))
            .collect();

        let create = run_query(&mut conn, &format!("SHOW CREATE TABLE {table}")).await?;
        let ddl = create
            .rows
            .first()
            .and_then(|row| row.get(1))
            .map(CellValue::render)
            .ok_or_else(|| DatabaseError::TableNotFound(table.to_string()))?;

        let sample = run_query(
            &mut conn,
            &format!("SELECT * FROM {table} LIMIT {SAMPLE_ROW_LIMIT}"),
        )
        .await?;

        Ok(schema_document(table, &columns, &ddl, &sample))
    }
}

/// Renders the schema document from its already-fetched pieces.
///
/// The sample-data header uses the DESCRIBE field names, in column-metadata
/// order, not the sample result's own metadata.
fn schema_document(
    table: &str,
    columns: &[ColumnInfo],
    ddl: &str,
    sample: &QueryResult,
) -> String {
    let mut doc = String::new();

    let _ = writeln!(doc, "## Table: {table}\n");
    doc.push_str("### Columns:\n\n");
    doc.push_str("| Field | Type | Null | Key | Default | Extra |\n");
    doc.push_str("|-------|------|------|-----|---------|-------|\n");
    for col in columns {
        let default = col.default.as_deref().unwrap_or("NULL");
        let _ = writeln!(
            doc,
            "| {} | {} | {} | {} | {} | {} |",
            col.field, col.column_type, col.null, col.key, default, col.extra
        );
    }

    let _ = write!(doc, "\n### Create Table SQL:\n\n```sql\n{ddl}\n```\n");

    let header: Vec<String> = columns.iter().map(|c| c.field.clone()).collect();
    doc.push_str("\n### Sample Data:\n\n");
    doc.push_str(&markdown_table(&header, &sample.rows));

    doc
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orders_columns() -> Vec<ColumnInfo> {
        vec![
            ColumnInfo {
                field: "id".into(),
                column_type: "int".into(),
                null: "NO".into(),
                key: "PRI".into(),
                default: None,
                extra: "auto_increment".into(),
            },
            ColumnInfo {
                field: "name".into(),
                column_type: "varchar(64)".into(),
                null: "YES".into(),
                key: String::new(),
                default: None,
                extra: String::new(),
            },
        ]
    }

    fn orders_sample() -> QueryResult {
        QueryResult::new(
            vec!["id".into(), "name".into()],
            vec![
                vec![CellValue::Int(1), CellValue::Text("x".into())],
                vec![CellValue::Int(2), CellValue::Text("y".into())],
            ],
        )
    }

    #[test]
    fn test_schema_document_sections() {
        let doc = schema_document(
            "orders",
            &orders_columns(),
            "CREATE TABLE orders (id int, name varchar(64))",
            &orders_sample(),
        );

        assert!(doc.starts_with("## Table: orders\n"));
        assert!(doc.contains("### Columns:"));
        assert!(doc.contains("| id | int | NO | PRI | NULL | auto_increment |"));
        assert!(doc.contains("```sql\nCREATE TABLE orders (id int, name varchar(64))\n```"));
        assert!(doc.contains("### Sample Data:"));
        assert!(doc.contains("| id | name |\n| --- | --- |\n| 1 | x |\n| 2 | y |\n"));
    }

    #[test]
    fn test_sample_header_follows_column_order() {
        // Sample result columns deliberately reversed; the document header
        // must still follow DESCRIBE order.
        let sample = QueryResult::new(
            vec!["name".into(), "id".into()],
            vec![vec![CellValue::Text("x".into()), CellValue::Int(1)]],
        );
        let doc = schema_document("orders", &orders_columns(), "CREATE TABLE orders (...)", &sample);
        assert!(doc.contains("| id | name |\n| --- | --- |"));
    }

    #[test]
    fn test_empty_table_document() {
        let doc = schema_document(
            "empty",
            &orders_columns(),
            "CREATE TABLE empty (...)",
            &QueryResult::new(vec!["id".into(), "name".into()], vec![]),
        );
        // Sample section ends with header and separator only.
        assert!(doc.ends_with("| id | name |\n| --- | --- |\n"));
    }
}
