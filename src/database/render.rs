//! Markdown table rendering for query results.

use crate::database::result::{CellValue, QueryResult};

/// Renders column names and rows as a markdown table.
///
/// Grammar: a header row, a `---` separator per column, then one line per
/// data row, every cell in its canonical string form. An empty result set
/// yields header and separator only. Cell contents are not escaped; a value
/// containing `|` or a newline will corrupt the grid (accepted limitation).
pub fn markdown_table(columns: &[String], rows: &[Vec<CellValue>]) -> String {
    let mut out = String::new();

    out.push_str("| ");
    out.push_str(&columns.join(" | "));
    out.push_str(" |\n");

    out.push_str("| ");
    out.push_str(&vec!["---"; columns.len()].join(" | "));
    out.push_str(" |\n");

    for row in rows {
        let cells: Vec<String> = row.iter().map(CellValue::render).collect();
        out.push_str("| ");
        out.push_str(&cells.join(" | "));
        out.push_str(" |\n");
    }

    out
}

/// Renders a full query result.
pub fn render_result(result: &QueryResult) -> String {
    markdown_table(&result.columns, &result.rows)
}
