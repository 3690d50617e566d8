use std::path::Path;
use std::sync::LazyLock;

use anyhow::{bail, Context, Result};
use chrono::NaiveDateTime;
use regex::Regex;
use rusqlite::Connection;

use crate::models::{NormalizedRecord, CAPTURED_AT_FORMAT};

static TABLE_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Open (creating if needed) the database file and its parent directory.
pub fn connect(path: &Path) -> Result<Connection> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    let conn = Connection::open(path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    Ok(conn)
}

fn checked_table(table: &str) -> Result<&str> {
    if !TABLE_NAME_RE.is_match(table) {
        bail!("invalid table name `{}`", table);
    }
    Ok(table)
}

pub fn init_schema(conn: &Connection, table: &str) -> Result<()> {
    let table = checked_table(table)?;
    conn.execute_batch(&format!(
        "
        CREATE TABLE IF NOT EXISTS {table} (
            id          INTEGER PRIMARY KEY,
            title       TEXT NOT NULL,
            price_local REAL NOT NULL,
            rating      REAL NOT NULL,
            color_count INTEGER NOT NULL,
            size        TEXT NOT NULL,
            gender      TEXT NOT NULL,
            captured_at TIMESTAMP NOT NULL
        );
        "
    ))?;
    Ok(())
}

/// Replace the table contents with `records` in a single transaction.
pub fn replace_products(conn: &Connection, table: &str, records: &[NormalizedRecord]) -> Result<usize> {
    let table = checked_table(table)?;
    let tx = conn.unchecked_transaction()?;
    let mut count = 0;
    {
        tx.execute(&format!("DELETE FROM {table}"), [])?;
        let mut stmt = tx.prepare(&format!(
            "INSERT INTO {table} (title, price_local, rating, color_count, size, gender, captured_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
        ))?;
        for r in records {
            let captured_at = NaiveDateTime::parse_from_str(&r.captured_at, CAPTURED_AT_FORMAT)
                .with_context(|| format!("Bad capture timestamp `{}`", r.captured_at))?;
            count += stmt.execute(rusqlite::params![
                r.title, r.price_local, r.rating, r.color_count, r.size, r.gender, captured_at,
            ])?;
        }
    }
    tx.commit()?;
    Ok(count)
}

/// Connect, ensure the table, replace its rows.
pub fn load(path: &Path, table: &str, records: &[NormalizedRecord]) -> Result<usize> {
    let conn = connect(path)?;
    init_schema(&conn, table)?;
    replace_products(&conn, table, records)
}
