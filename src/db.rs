use std::path::Path;

use rusqlite::{Connection, OptionalExtension};

use crate::error::{ComptesError, Result};
use crate::frame::Frame;

pub const ACCOUNTS_TABLE: &str = "comptes";
pub const SALARIES_TABLE: &str = "salaires";

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    Ok(conn)
}

/// Double-quote an identifier; column labels carry accents, spaces and `°`.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

pub fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [table],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

fn table_columns(conn: &Connection, table: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", quote_ident(table)))?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(columns)
}

// Declared type from the first non-null value; all-null columns are TEXT.
fn column_type(frame: &Frame, idx: usize) -> &'static str {
    frame
        .rows
        .iter()
        .find_map(|row| row.get(idx).and_then(|v| v.sql_type()))
        .unwrap_or("TEXT")
}

/// Replace the contents of `table` with `frame` in one transaction and return
/// the table's row count afterwards. The table is created on first load;
/// later loads keep its schema and add any new columns.
pub fn load_to_table(conn: &mut Connection, table: &str, frame: &Frame) -> Result<usize> {
    if frame.columns.is_empty() {
        return Err(ComptesError::Other(format!("nothing to load into {table}: no columns")));
    }
    let name = quote_ident(table);
    let tx = conn.transaction()?;

    if table_exists(&tx, table)? {
        tx.execute(&format!("DELETE FROM {name}"), [])?;
        let existing = table_columns(&tx, table)?;
        for (idx, column) in frame.columns.iter().enumerate() {
            if !existing.contains(column) {
                tracing::debug!(table, column = %column, "adding column");
                tx.execute(
                    &format!(
                        "ALTER TABLE {name} ADD COLUMN {} {}",
                        quote_ident(column),
                        column_type(frame, idx)
                    ),
                    [],
                )?;
            }
        }
    } else {
        let defs: Vec<String> = frame
            .columns
            .iter()
            .enumerate()
            .map(|(idx, c)| format!("{} {}", quote_ident(c), column_type(frame, idx)))
            .collect();
        tx.execute(&format!("CREATE TABLE {name} ({})", defs.join(", ")), [])?;
    }

    {
        let columns: Vec<String> = frame.columns.iter().map(|c| quote_ident(c)).collect();
        let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{i}")).collect();
        let mut stmt = tx.prepare(&format!(
            "INSERT INTO {name} ({}) VALUES ({})",
            columns.join(", "),
            placeholders.join(", ")
        ))?;
        for row in &frame.rows {
            stmt.execute(rusqlite::params_from_iter(row.iter()))?;
        }
    }

    let count: i64 = tx.query_row(&format!("SELECT count(*) FROM {name}"), [], |r| r.get(0))?;
    tx.commit()?;
    Ok(count as usize)
}

/// `None` when the table has not been loaded yet.
pub fn row_count(conn: &Connection, table: &str) -> Result<Option<i64>> {
    if !table_exists(conn, table)? {
        return Ok(None);
    }
    let count = conn.query_row(&format!("SELECT count(*) FROM {}", quote_ident(table)), [], |r| r.get(0))?;
    Ok(Some(count))
}

/// Sum of a numeric column, or `None` when the table or column is missing.
pub fn column_total(conn: &Connection, table: &str, column: &str) -> Result<Option<f64>> {
    if !table_exists(conn, table)? || !table_columns(conn, table)?.iter().any(|c| c == column) {
        return Ok(None);
    }
    let total: Option<f64> = conn.query_row(
        &format!("SELECT sum({}) FROM {}", quote_ident(column), quote_ident(table)),
        [],
        |r| r.get(0),
    )?;
    Ok(Some(total.unwrap_or(0.0)))
}
