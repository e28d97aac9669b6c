// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{Dividend, PricePoint, Transaction, TxSide};
use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use comfy_table::{Cell, Table, presets::UTF8_FULL};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;

const UA: &str = concat!(
    "folionav/",
    env!("CARGO_PKG_VERSION"),
    " (+https://github.com/alphavelocity/folionav)"
);

pub fn http_client() -> Result<reqwest::blocking::Client> {
    let c = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(15))
        .user_agent(UA)
        .build()?;
    Ok(c)
}

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s))
}

static TICKER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9.^-]{1,12}$").unwrap());

/// Normalize a ticker symbol to uppercase, rejecting anything that could not
/// be a quote symbol before it reaches the ledger or the market-data client.
pub fn parse_ticker(s: &str) -> Result<String> {
    let t = s.trim();
    if !TICKER_RE.is_match(t) {
        return Err(anyhow!("Invalid ticker '{}'", s));
    }
    Ok(t.to_uppercase())
}

pub fn fmt_money(d: &Decimal, symbol: &str) -> String {
    format!("{} {}", d.round_dp(2), symbol)
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // If v is an array, stream each element; else stream single line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}

// Display currency settings (labels only; no conversion happens anywhere)
pub fn currency_symbol(conn: &Connection) -> Result<String> {
    let v: Option<String> = conn
        .query_row(
            "SELECT value FROM settings WHERE key='currency_symbol'",
            [],
            |r| r.get(0),
        )
        .optional()?;
    Ok(v.unwrap_or_else(|| "€".to_string()))
}

pub fn set_currency_symbol(conn: &Connection, symbol: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value) VALUES('currency_symbol', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![symbol],
    )?;
    Ok(())
}

pub fn id_for_portfolio(conn: &Connection, name: &str) -> Result<i64> {
    let mut stmt = conn.prepare("SELECT id FROM portfolios WHERE name=?1")?;
    let id: i64 = stmt
        .query_row(params![name], |r| r.get(0))
        .with_context(|| format!("Portfolio '{}' not found", name))?;
    Ok(id)
}

/// A cash movement or a trade may name a portfolio that does not exist yet;
/// that is how portfolios come to exist in the first place.
pub fn ensure_portfolio(conn: &Connection, name: &str) -> Result<i64> {
    conn.execute(
        "INSERT OR IGNORE INTO portfolios(name) VALUES (?1)",
        params![name],
    )?;
    id_for_portfolio(conn, name)
}

/// Current balance, 0 for a portfolio with no row yet.
pub fn portfolio_cash(conn: &Connection, name: &str) -> Result<Decimal> {
    let v: Option<String> = conn
        .query_row(
            "SELECT cash FROM portfolios WHERE name=?1",
            params![name],
            |r| r.get(0),
        )
        .optional()?;
    match v {
        Some(s) => Decimal::from_str_exact(&s)
            .with_context(|| format!("Invalid stored cash '{}' for portfolio {}", s, name)),
        None => Ok(Decimal::ZERO),
    }
}

/// Apply a signed delta to a portfolio's balance, creating the row when
/// needed. Returns the new balance.
pub fn adjust_cash(conn: &Connection, name: &str, delta: Decimal) -> Result<Decimal> {
    let id = ensure_portfolio(conn, name)?;
    let balance = portfolio_cash(conn, name)? + delta;
    conn.execute(
        "UPDATE portfolios SET cash=?1 WHERE id=?2",
        params![balance.to_string(), id],
    )?;
    Ok(balance)
}

pub fn portfolio_names(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM portfolios ORDER BY name")?;
    let rows = stmt.query_map([], |r| r.get::<_, String>(0))?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

pub fn ledger_tickers(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT DISTINCT ticker FROM transactions ORDER BY ticker")?;
    let rows = stmt.query_map([], |r| r.get::<_, String>(0))?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

pub fn first_trade_date(conn: &Connection, ticker: &str) -> Result<Option<NaiveDate>> {
    let v: Option<String> = conn.query_row(
        "SELECT MIN(date) FROM transactions WHERE ticker=?1",
        params![ticker],
        |r| r.get(0),
    )?;
    match v {
        Some(s) => Ok(Some(parse_date(&s)?)),
        None => Ok(None),
    }
}

/// Full ledger in insertion order; the engine does its own date sorting.
pub fn load_transactions(conn: &Connection) -> Result<Vec<Transaction>> {
    let mut stmt = conn.prepare(
        "SELECT t.id, p.name, t.date, t.ticker, t.side, t.quantity, t.price, t.fees, t.note
         FROM transactions t JOIN portfolios p ON t.portfolio_id=p.id
         ORDER BY t.id",
    )?;
    let rows = stmt.query_map([], |r| {
        Ok((
            r.get::<_, i64>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, String>(3)?,
            r.get::<_, String>(4)?,
            r.get::<_, String>(5)?,
            r.get::<_, String>(6)?,
            r.get::<_, String>(7)?,
            r.get::<_, Option<String>>(8)?,
        ))
    })?;
    let mut out = Vec::new();
    for row in rows {
        let (id, portfolio, date_s, ticker, side_s, qty_s, price_s, fees_s, note) = row?;
        let side = TxSide::parse(&side_s)
            .ok_or_else(|| anyhow!("Unknown trade side '{}' for {}", side_s, ticker))?;
        out.push(Transaction {
            id,
            portfolio,
            date: parse_date(&date_s)
                .with_context(|| format!("Invalid transaction date '{}'", date_s))?,
            ticker: ticker.clone(),
            side,
            quantity: Decimal::from_str_exact(&qty_s)
                .with_context(|| format!("Invalid trade quantity '{}' for {}", qty_s, ticker))?,
            price: Decimal::from_str_exact(&price_s)
                .with_context(|| format!("Invalid trade price '{}' for {}", price_s, ticker))?,
            fees: Decimal::from_str_exact(&fees_s)
                .with_context(|| format!("Invalid trade fees '{}' for {}", fees_s, ticker))?,
            note,
        });
    }
    Ok(out)
}

pub fn load_prices(conn: &Connection) -> Result<Vec<PricePoint>> {
    let mut stmt = conn.prepare("SELECT ticker, date, close FROM prices ORDER BY date, ticker")?;
    let rows = stmt.query_map([], |r| {
        Ok((
            r.get::<_, String>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
        ))
    })?;
    let mut out = Vec::new();
    for row in rows {
        let (ticker, date_s, close_s) = row?;
        out.push(PricePoint {
            date: parse_date(&date_s)
                .with_context(|| format!("Invalid price date '{}' for {}", date_s, ticker))?,
            close: Decimal::from_str_exact(&close_s)
                .with_context(|| format!("Invalid stored close '{}' for {}", close_s, ticker))?,
            ticker,
        });
    }
    Ok(out)
}

pub fn load_dividends(conn: &Connection) -> Result<Vec<Dividend>> {
    let mut stmt = conn.prepare(
        "SELECT d.id, p.name, d.ticker, d.date, d.amount
         FROM dividends d JOIN portfolios p ON d.portfolio_id=p.id
         ORDER BY d.date, d.id",
    )?;
    let rows = stmt.query_map([], |r| {
        Ok((
            r.get::<_, String>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, String>(3)?,
            r.get::<_, String>(4)?,
        ))
    })?;
    let mut out = Vec::new();
    for row in rows {
        let (id, portfolio, ticker, date_s, amount_s) = row?;
        out.push(Dividend {
            date: parse_date(&date_s)
                .with_context(|| format!("Invalid dividend date '{}' for {}", date_s, id))?,
            amount: Decimal::from_str_exact(&amount_s)
                .with_context(|| format!("Invalid dividend amount '{}' for {}", amount_s, id))?,
            id,
            portfolio,
            ticker,
        });
    }
    Ok(out)
}

/// Multi-select portfolio filter from repeated `--portfolio` flags; empty
/// selection means "all portfolios combined".
pub fn portfolio_filter(sub: &clap::ArgMatches) -> Option<Vec<String>> {
    let names: Vec<String> = sub
        .get_many::<String>("portfolio")
        .map(|vals| vals.map(|s| s.trim().to_string()).collect())
        .unwrap_or_default();
    if names.is_empty() { None } else { Some(names) }
}
