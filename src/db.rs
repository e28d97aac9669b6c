// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::Connection;
use std::fs;
use std::path::PathBuf;

static APP: Lazy<(&str, &str, &str)> =
    Lazy::new(|| ("com.alphavelocity", "Folionav", "folionav"));

pub fn db_path() -> Result<PathBuf> {
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("folionav.sqlite"))
}

pub fn open_or_init() -> Result<Connection> {
    let path = db_path()?;
    let mut conn =
        Connection::open(&path).with_context(|| format!("Open DB at {}", path.display()))?;
    init_schema(&mut conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &mut Connection) -> Result<()> {
    conn.execute_batch(
        r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS settings(
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS portfolios(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        cash TEXT NOT NULL DEFAULT '0',
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    -- Append-only trade ledger. Rows are never updated; dividends are the
    -- only records with a deletion path.
    CREATE TABLE IF NOT EXISTS transactions(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        portfolio_id INTEGER NOT NULL,
        date TEXT NOT NULL,
        ticker TEXT NOT NULL,
        side TEXT NOT NULL CHECK(side IN ('buy','sell')),
        quantity TEXT NOT NULL,
        price TEXT NOT NULL,
        fees TEXT NOT NULL DEFAULT '0',
        note TEXT,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        FOREIGN KEY(portfolio_id) REFERENCES portfolios(id) ON DELETE CASCADE
    );
    CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(date);
    CREATE INDEX IF NOT EXISTS idx_transactions_ticker ON transactions(ticker);

    -- Sparse daily closes; one close per ticker per day, upserted by the
    -- merge path so a re-fetch or backfill supersedes the stored point.
    CREATE TABLE IF NOT EXISTS prices(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        ticker TEXT NOT NULL,
        date TEXT NOT NULL,
        close TEXT NOT NULL,
        source TEXT NOT NULL DEFAULT 'manual',
        UNIQUE(ticker, date)
    );
    CREATE INDEX IF NOT EXISTS idx_prices_date ON prices(date);

    CREATE TABLE IF NOT EXISTS dividends(
        id TEXT PRIMARY KEY,
        portfolio_id INTEGER NOT NULL,
        ticker TEXT NOT NULL,
        date TEXT NOT NULL,
        amount TEXT NOT NULL,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        FOREIGN KEY(portfolio_id) REFERENCES portfolios(id) ON DELETE CASCADE
    );
    CREATE INDEX IF NOT EXISTS idx_dividends_date ON dividends(date);
    "#,
    )?;
    Ok(())
}
