// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::engine::attribute_dividends;
use crate::marketdata::MarketData;
use crate::models::DividendHistory;
use crate::utils::{
    currency_symbol, first_trade_date, fmt_money, id_for_portfolio, ledger_tickers,
    load_dividends, load_transactions, maybe_print_json, parse_decimal, parse_ticker,
    portfolio_names, pretty_table,
};
use anyhow::{Context, Result, anyhow};
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use std::collections::BTreeMap;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches, market: &dyn MarketData) -> Result<()> {
    match m.subcommand() {
        Some(("sync", sub)) => sync(conn, sub, market)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("rm", sub)) => rm(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn sync(conn: &mut Connection, sub: &clap::ArgMatches, market: &dyn MarketData) -> Result<()> {
    let tickers = match sub.get_one::<String>("ticker") {
        Some(t) => vec![parse_ticker(t)?],
        None => ledger_tickers(conn)?,
    };
    if tickers.is_empty() {
        println!("No ledger tickers to sync");
        return Ok(());
    }

    let transactions = load_transactions(conn)?;
    let existing = load_dividends(conn)?;
    let portfolios = portfolio_names(conn)?;

    let mut histories: BTreeMap<String, DividendHistory> = BTreeMap::new();
    for ticker in &tickers {
        let Some(from) = first_trade_date(conn, ticker)? else {
            eprintln!("No trades for {}; skipping", ticker);
            continue;
        };
        match market.dividend_history(ticker, from) {
            Ok(history) => {
                histories.insert(ticker.clone(), history);
            }
            Err(err) => eprintln!("Dividend fetch failed for {}: {}", ticker, err),
        }
    }

    let out = attribute_dividends(&transactions, &histories, &existing, &portfolios);

    if !out.new_dividends.is_empty() {
        let tx = conn.transaction()?;
        for d in &out.new_dividends {
            let pid = id_for_portfolio(&tx, &d.portfolio)?;
            tx.execute(
                "INSERT INTO dividends(id, portfolio_id, ticker, date, amount)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    d.id,
                    pid,
                    d.ticker,
                    d.date.to_string(),
                    d.amount.to_string()
                ],
            )?;
        }
        for (name, delta) in &out.cash_deltas {
            crate::utils::adjust_cash(&tx, name, *delta)?;
        }
        tx.commit()?;
    }

    let symbol = currency_symbol(conn)?;
    if out.new_dividends.is_empty() {
        println!("No new dividends");
    } else {
        let rows: Vec<Vec<String>> = out
            .new_dividends
            .iter()
            .map(|d| {
                vec![
                    d.portfolio.clone(),
                    d.ticker.clone(),
                    d.date.to_string(),
                    fmt_money(&d.amount, &symbol),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Portfolio", "Ticker", "Date", "Amount"], rows)
        );
        for (name, delta) in &out.cash_deltas {
            println!("Credited {} to '{}'", fmt_money(delta, &symbol), name);
        }
    }

    for (ticker, forecast) in &out.forecasts {
        let estimate = forecast
            .estimate
            .map(|e| format!("{}/share", fmt_money(&e, &symbol)))
            .unwrap_or_else(|| "unknown".to_string());
        println!(
            "Next {} payment: ex-date {}, estimated {}",
            ticker, forecast.ex_date, estimate
        );
    }
    Ok(())
}

#[derive(Serialize)]
pub struct DividendRow {
    pub id: String,
    pub portfolio: String,
    pub ticker: String,
    pub date: String,
    pub amount: String,
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");

    let mut sql = String::from(
        "SELECT d.id, p.name, d.ticker, d.date, d.amount
         FROM dividends d JOIN portfolios p ON d.portfolio_id=p.id WHERE 1=1",
    );
    let mut params_vec: Vec<String> = Vec::new();
    if let Some(name) = sub.get_one::<String>("portfolio") {
        sql.push_str(" AND p.name=?");
        params_vec.push(name.trim().to_string());
    }
    sql.push_str(" ORDER BY d.date DESC, d.id");

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
        data.push(DividendRow {
            id: r.get(0)?,
            portfolio: r.get(1)?,
            ticker: r.get(2)?,
            date: r.get(3)?,
            amount: r.get(4)?,
        });
    }

    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let symbol = currency_symbol(conn)?;
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                let amount = parse_decimal(&r.amount)
                    .map(|d| fmt_money(&d, &symbol))
                    .unwrap_or_else(|_| r.amount.clone());
                vec![
                    r.id.clone(),
                    r.portfolio.clone(),
                    r.ticker.clone(),
                    r.date.clone(),
                    amount,
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Id", "Portfolio", "Ticker", "Date", "Amount"], rows)
        );
    }
    Ok(())
}

fn rm(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let id = sub.get_one::<String>("id").unwrap().trim();

    let row: Option<(String, String)> = conn
        .query_row(
            "SELECT p.name, d.amount FROM dividends d
             JOIN portfolios p ON d.portfolio_id=p.id WHERE d.id=?1",
            params![id],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .optional()?;
    let Some((portfolio, amount_s)) = row else {
        return Err(anyhow!("Dividend '{}' not found", id));
    };
    let amount = parse_decimal(&amount_s)
        .with_context(|| format!("Invalid stored amount '{}' for {}", amount_s, id))?;

    let tx = conn.transaction()?;
    tx.execute("DELETE FROM dividends WHERE id=?1", params![id])?;
    let balance = crate::utils::adjust_cash(&tx, &portfolio, -amount)?;
    tx.commit()?;

    let symbol = currency_symbol(conn)?;
    println!(
        "Removed {} and debited {} from '{}' (cash {})",
        id,
        fmt_money(&amount, &symbol),
        portfolio,
        fmt_money(&balance, &symbol)
    );
    Ok(())
}
