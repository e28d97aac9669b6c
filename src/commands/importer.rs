// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::prices::upsert_price;
use crate::models::{PricePoint, TxSide};
use crate::utils::{adjust_cash, ensure_portfolio, parse_date, parse_decimal, parse_ticker};
use anyhow::{Context, Result, anyhow};
use csv::ReaderBuilder;
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use std::collections::{HashMap, hash_map::Entry};

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("transactions", sub)) => import_transactions(conn, sub),
        Some(("prices", sub)) => import_prices(conn, sub),
        _ => Ok(()),
    }
}

/// Columns: portfolio,date,ticker,side,quantity,price,fees,note. Cash settles
/// per row without the balance check a live `tx buy` gets; a backfilled
/// ledger is taken at its word. Any bad row aborts the whole file.
fn import_transactions(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let path = sub.get_one::<String>("path").unwrap().trim();
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("Open CSV {}", path))?;

    let tx = conn.transaction()?;
    let mut portfolio_cache: HashMap<String, i64> = HashMap::new();
    let mut count = 0usize;

    for result in rdr.records() {
        let rec = result?;
        let portfolio = rec.get(0).context("portfolio missing")?.trim().to_string();
        if portfolio.is_empty() {
            return Err(anyhow!("Row {}: empty portfolio name", count + 1));
        }
        let date = parse_date(rec.get(1).context("date missing")?.trim())?;
        let ticker = parse_ticker(rec.get(2).context("ticker missing")?)?;
        let side_raw = rec.get(3).context("side missing")?.trim().to_lowercase();
        let side = TxSide::parse(&side_raw)
            .ok_or_else(|| anyhow!("Unknown side '{}' for {} on {}", side_raw, ticker, date))?;
        let quantity = parse_decimal(rec.get(4).context("quantity missing")?.trim())?;
        let price = parse_decimal(rec.get(5).context("price missing")?.trim())?;
        let fees_raw = rec.get(6).unwrap_or("").trim();
        let fees = if fees_raw.is_empty() {
            Decimal::ZERO
        } else {
            parse_decimal(fees_raw)?
        };
        let note = rec.get(7).unwrap_or("").trim();
        if quantity <= Decimal::ZERO {
            return Err(anyhow!(
                "Non-positive quantity {} for {} on {}",
                quantity,
                ticker,
                date
            ));
        }
        if price < Decimal::ZERO || fees < Decimal::ZERO {
            return Err(anyhow!("Negative price or fees for {} on {}", ticker, date));
        }

        let pid = match portfolio_cache.entry(portfolio.clone()) {
            Entry::Occupied(e) => *e.get(),
            Entry::Vacant(e) => *e.insert(ensure_portfolio(&tx, &portfolio)?),
        };
        tx.execute(
            "INSERT INTO transactions(portfolio_id, date, ticker, side, quantity, price, fees, note)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                pid,
                date.to_string(),
                ticker,
                side.as_str(),
                quantity.to_string(),
                price.to_string(),
                fees.to_string(),
                if note.is_empty() { None } else { Some(note) }
            ],
        )?;

        let delta = match side {
            TxSide::Buy => -(quantity * price + fees),
            TxSide::Sell => quantity * price - fees,
        };
        adjust_cash(&tx, &portfolio, delta)?;
        count += 1;
    }

    tx.commit()?;
    println!("Imported {} transactions from {}", count, path);
    Ok(())
}

/// Columns: ticker,date,close. Rows go through the same upsert as a fetch,
/// so re-importing a corrected file overwrites the stale closes.
fn import_prices(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let path = sub.get_one::<String>("path").unwrap().trim();
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("Open CSV {}", path))?;

    let tx = conn.transaction()?;
    let mut count = 0usize;
    for result in rdr.records() {
        let rec = result?;
        let point = PricePoint {
            ticker: parse_ticker(rec.get(0).context("ticker missing")?)?,
            date: parse_date(rec.get(1).context("date missing")?.trim())?,
            close: parse_decimal(rec.get(2).context("close missing")?.trim())?,
        };
        upsert_price(&tx, &point, "import")?;
        count += 1;
    }
    tx.commit()?;
    println!("Imported {} price points from {}", count, path);
    Ok(())
}
