// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::marketdata::MarketData;
use crate::models::PricePoint;
use crate::utils::{
    currency_symbol, first_trade_date, fmt_money, ledger_tickers, maybe_print_json, parse_date,
    parse_decimal, parse_ticker, pretty_table,
};
use anyhow::Result;
use chrono::Utc;
use rusqlite::{Connection, params};
use serde::Serialize;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches, market: &dyn MarketData) -> Result<()> {
    match m.subcommand() {
        Some(("fetch", _)) => fetch(conn, market)?,
        Some(("backfill", sub)) => backfill(conn, sub, market)?,
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        _ => {}
    }
    Ok(())
}

/// Store a close, replacing whatever was already there for (ticker, date).
/// This is the storage side of the last-write-wins merge rule.
pub fn upsert_price(conn: &Connection, point: &PricePoint, source: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO prices(ticker, date, close, source) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(ticker, date) DO UPDATE SET close=excluded.close, source=excluded.source",
        params![
            point.ticker,
            point.date.to_string(),
            point.close.to_string(),
            source
        ],
    )?;
    Ok(())
}

fn fetch(conn: &mut Connection, market: &dyn MarketData) -> Result<()> {
    let tickers = ledger_tickers(conn)?;
    if tickers.is_empty() {
        println!("No ledger tickers to fetch");
        return Ok(());
    }

    let today = Utc::now().date_naive();
    let mut fetched = Vec::new();
    for ticker in &tickers {
        match market.latest_quote(ticker) {
            Ok(quote) => {
                if let Some(price) = quote.price {
                    fetched.push(PricePoint {
                        ticker: ticker.clone(),
                        date: today,
                        close: price,
                    });
                }
            }
            Err(err) => eprintln!("Quote fetch failed for {}: {}", ticker, err),
        }
    }

    if fetched.is_empty() {
        println!("No quotes fetched");
        return Ok(());
    }
    let count = fetched.len();
    let tx = conn.transaction()?;
    for point in &fetched {
        upsert_price(&tx, point, "yahoo")?;
    }
    tx.commit()?;
    println!("Fetched {} quotes for {}", count, today);
    Ok(())
}

fn backfill(conn: &mut Connection, sub: &clap::ArgMatches, market: &dyn MarketData) -> Result<()> {
    let tickers = match sub.get_one::<String>("ticker") {
        Some(t) => vec![parse_ticker(t)?],
        None => ledger_tickers(conn)?,
    };
    if tickers.is_empty() {
        println!("No ledger tickers to backfill");
        return Ok(());
    }

    let today = Utc::now().date_naive();
    let mut total = 0usize;
    for ticker in &tickers {
        let Some(from) = first_trade_date(conn, ticker)? else {
            eprintln!("No trades for {}; skipping", ticker);
            continue;
        };
        let closes = match market.daily_closes(ticker, from, today) {
            Ok(closes) => closes,
            Err(err) => {
                eprintln!("History fetch failed for {}: {}", ticker, err);
                continue;
            }
        };
        let tx = conn.transaction()?;
        for point in &closes {
            upsert_price(&tx, point, "yahoo")?;
        }
        tx.commit()?;
        total += closes.len();
    }
    println!("Backfilled {} closes across {} tickers", total, tickers.len());
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let point = PricePoint {
        ticker: parse_ticker(sub.get_one::<String>("ticker").unwrap())?,
        date: parse_date(sub.get_one::<String>("date").unwrap())?,
        close: parse_decimal(sub.get_one::<String>("close").unwrap())?,
    };
    upsert_price(conn, &point, "manual")?;
    println!("Recorded {} {} close {}", point.ticker, point.date, point.close);
    Ok(())
}

#[derive(Serialize)]
pub struct PriceRow {
    pub ticker: String,
    pub date: String,
    pub close: String,
    pub source: String,
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");

    let mut sql =
        String::from("SELECT ticker, date, close, source FROM prices WHERE 1=1");
    let mut params_vec: Vec<String> = Vec::new();
    if let Some(ticker) = sub.get_one::<String>("ticker") {
        sql.push_str(" AND ticker=?");
        params_vec.push(ticker.trim().to_uppercase());
    }
    sql.push_str(" ORDER BY date DESC, ticker");
    if let Some(limit) = sub.get_one::<usize>("limit") {
        sql.push_str(" LIMIT ?");
        params_vec.push(limit.to_string());
    }

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = if params_vec.is_empty() {
        stmt.query([])?
    } else {
        let params: Vec<&dyn rusqlite::ToSql> = params_vec
            .iter()
            .map(|s| s as &dyn rusqlite::ToSql)
            .collect();
        stmt.query(rusqlite::params_from_iter(params))?
    };

    let mut data = Vec::new();
    while let Some(r) = rows.next()? {
        data.push(PriceRow {
            ticker: r.get(0)?,
            date: r.get(1)?,
            close: r.get(2)?,
            source: r.get(3)?,
        });
    }

    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                vec![
                    r.ticker.clone(),
                    r.date.clone(),
                    r.close.clone(),
                    r.source.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Ticker", "Date", "Close", "Source"], rows)
        );
    }
    Ok(())
}

pub fn handle_quote(conn: &Connection, sub: &clap::ArgMatches, market: &dyn MarketData) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let ticker = parse_ticker(sub.get_one::<String>("ticker").unwrap())?;

    let quote = market.latest_quote(&ticker)?;
    if let Some(price) = quote.price {
        let point = PricePoint {
            ticker: quote.symbol.clone(),
            date: Utc::now().date_naive(),
            close: price,
        };
        upsert_price(conn, &point, "yahoo")?;
    }

    if maybe_print_json(json_flag, jsonl_flag, &quote)? {
        return Ok(());
    }
    let symbol = currency_symbol(conn)?;
    let price = quote
        .price
        .map(|p| fmt_money(&p, quote.currency.as_deref().unwrap_or(&symbol)))
        .unwrap_or_else(|| "unavailable".to_string());
    println!("{} ({}): {}", quote.name, quote.symbol, price);
    Ok(())
}
