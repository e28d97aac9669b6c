// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::engine::{compute_positions, forward_fill, last_price_map, nav_series};
use crate::utils::{load_prices, load_transactions};
use anyhow::{Result, anyhow};
use rusqlite::Connection;
use serde_json::json;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("transactions", sub)) => export_transactions(conn, sub),
        Some(("positions", sub)) => export_positions(conn, sub),
        Some(("nav", sub)) => export_nav(conn, sub),
        Some(("dividends", sub)) => export_dividends(conn, sub),
        _ => Ok(()),
    }
}

fn format_of(sub: &clap::ArgMatches) -> Result<(String, String)> {
    let fmt = sub.get_one::<String>("format").unwrap().to_lowercase();
    let out = sub.get_one::<String>("out").unwrap().to_string();
    if fmt != "csv" && fmt != "json" {
        return Err(anyhow!("Unknown format '{}' (use csv|json)", fmt));
    }
    Ok((fmt, out))
}

/// Same column order the transactions importer reads, so an export can be
/// fed straight back in.
fn export_transactions(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (fmt, out) = format_of(sub)?;

    let mut stmt = conn.prepare(
        "SELECT p.name, t.date, t.ticker, t.side, t.quantity, t.price, t.fees, t.note
         FROM transactions t JOIN portfolios p ON t.portfolio_id=p.id
         ORDER BY t.date, t.id",
    )?;
    let rows = stmt.query_map([], |r| {
        Ok((
            r.get::<_, String>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, String>(3)?,
            r.get::<_, String>(4)?,
            r.get::<_, String>(5)?,
            r.get::<_, String>(6)?,
            r.get::<_, Option<String>>(7)?,
        ))
    })?;

    match fmt.as_str() {
        "csv" => {
            let mut wtr = csv::Writer::from_path(&out)?;
            wtr.write_record([
                "portfolio", "date", "ticker", "side", "quantity", "price", "fees", "note",
            ])?;
            for row in rows {
                let (p, d, t, s, q, px, f, note) = row?;
                wtr.write_record([p, d, t, s, q, px, f, note.unwrap_or_default()])?;
            }
            wtr.flush()?;
        }
        _ => {
            let mut items = Vec::new();
            for row in rows {
                let (p, d, t, s, q, px, f, note) = row?;
                items.push(json!({
                    "portfolio": p, "date": d, "ticker": t, "side": s,
                    "quantity": q, "price": px, "fees": f, "note": note
                }));
            }
            std::fs::write(&out, serde_json::to_string_pretty(&items)?)?;
        }
    }
    println!("Exported transactions to {}", out);
    Ok(())
}

fn export_positions(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (fmt, out) = format_of(sub)?;

    let transactions = load_transactions(conn)?;
    let prices = load_prices(conn)?;
    let last = last_price_map(&prices);
    let positions = compute_positions(&transactions, &last, None);

    match fmt.as_str() {
        "csv" => {
            let mut wtr = csv::Writer::from_path(&out)?;
            wtr.write_record([
                "ticker", "quantity", "last", "value", "weight", "held_since", "avg_cost",
                "pnl_abs", "pnl_pct",
            ])?;
            for p in &positions {
                wtr.write_record([
                    p.ticker.clone(),
                    p.quantity.to_string(),
                    p.last.to_string(),
                    p.value.to_string(),
                    p.weight.to_string(),
                    p.held_since.map(|d| d.to_string()).unwrap_or_default(),
                    p.avg_cost.to_string(),
                    p.pnl_abs.to_string(),
                    p.pnl_pct.to_string(),
                ])?;
            }
            wtr.flush()?;
        }
        _ => {
            std::fs::write(&out, serde_json::to_string_pretty(&positions)?)?;
        }
    }
    println!("Exported positions to {}", out);
    Ok(())
}

fn export_nav(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (fmt, out) = format_of(sub)?;

    let transactions = load_transactions(conn)?;
    let prices = load_prices(conn)?;
    let grid = forward_fill(&prices);
    let series = nav_series(&transactions, &grid, None);

    match fmt.as_str() {
        "csv" => {
            let mut wtr = csv::Writer::from_path(&out)?;
            wtr.write_record(["date", "value"])?;
            for p in &series {
                wtr.write_record([p.date.to_string(), p.value.to_string()])?;
            }
            wtr.flush()?;
        }
        _ => {
            std::fs::write(&out, serde_json::to_string_pretty(&series)?)?;
        }
    }
    println!("Exported nav to {}", out);
    Ok(())
}

fn export_dividends(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (fmt, out) = format_of(sub)?;

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

    match fmt.as_str() {
        "csv" => {
            let mut wtr = csv::Writer::from_path(&out)?;
            wtr.write_record(["id", "portfolio", "ticker", "date", "amount"])?;
            for row in rows {
                let (id, p, t, d, a) = row?;
                wtr.write_record([id, p, t, d, a])?;
            }
            wtr.flush()?;
        }
        _ => {
            let mut items = Vec::new();
            for row in rows {
                let (id, p, t, d, a) = row?;
                items.push(json!({
                    "id": id, "portfolio": p, "ticker": t, "date": d, "amount": a
                }));
            }
            std::fs::write(&out, serde_json::to_string_pretty(&items)?)?;
        }
    }
    println!("Exported dividends to {}", out);
    Ok(())
}
