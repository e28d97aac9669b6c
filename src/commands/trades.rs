// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::TxSide;
use crate::utils::{
    adjust_cash, currency_symbol, ensure_portfolio, fmt_money, maybe_print_json, parse_date,
    parse_decimal, parse_ticker, portfolio_cash, pretty_table,
};
use anyhow::{Result, anyhow};
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use serde::Serialize;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("buy", sub)) => trade(conn, sub, TxSide::Buy)?,
        Some(("sell", sub)) => trade(conn, sub, TxSide::Sell)?,
        Some(("list", sub)) => list(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn trade(conn: &mut Connection, sub: &clap::ArgMatches, side: TxSide) -> Result<()> {
    let portfolio = sub.get_one::<String>("portfolio").unwrap().trim().to_string();
    let date = parse_date(sub.get_one::<String>("date").unwrap())?;
    let ticker = parse_ticker(sub.get_one::<String>("ticker").unwrap())?;
    let quantity = parse_decimal(sub.get_one::<String>("quantity").unwrap())?;
    let price = parse_decimal(sub.get_one::<String>("price").unwrap())?;
    let fees = parse_decimal(sub.get_one::<String>("fees").unwrap())?;
    let note = sub.get_one::<String>("note").map(|s| s.to_string());

    if quantity <= Decimal::ZERO {
        return Err(anyhow!("Quantity must be positive, got {}", quantity));
    }
    if price < Decimal::ZERO {
        return Err(anyhow!("Price must not be negative, got {}", price));
    }
    if fees < Decimal::ZERO {
        return Err(anyhow!("Fees must not be negative, got {}", fees));
    }

    // Advisory balance check at submission; sells never check holdings,
    // the position replay clamps an oversold ticker to flat.
    let symbol = currency_symbol(conn)?;
    let delta = match side {
        TxSide::Buy => {
            let gross = quantity * price + fees;
            let cash = portfolio_cash(conn, &portfolio)?;
            if cash < gross {
                return Err(anyhow!(
                    "Insufficient cash in '{}': have {}, need {}",
                    portfolio,
                    fmt_money(&cash, &symbol),
                    fmt_money(&gross, &symbol)
                ));
            }
            -gross
        }
        TxSide::Sell => quantity * price - fees,
    };

    let tx = conn.transaction()?;
    let pid = ensure_portfolio(&tx, &portfolio)?;
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
            note
        ],
    )?;
    let balance = adjust_cash(&tx, &portfolio, delta)?;
    tx.commit()?;

    let verb = match side {
        TxSide::Buy => "Bought",
        TxSide::Sell => "Sold",
    };
    println!(
        "{} {} {} @ {} in '{}' (cash {})",
        verb,
        quantity,
        ticker,
        fmt_money(&price, &symbol),
        portfolio,
        fmt_money(&balance, &symbol)
    );
    Ok(())
}

#[derive(Serialize)]
pub struct TradeRow {
    pub id: i64,
    pub portfolio: String,
    pub date: String,
    pub ticker: String,
    pub side: String,
    pub quantity: String,
    pub price: String,
    pub fees: String,
    pub note: String,
}

pub fn query_rows(conn: &Connection, sub: &clap::ArgMatches) -> Result<Vec<TradeRow>> {
    let mut sql = String::from(
        "SELECT t.id, p.name, t.date, t.ticker, t.side, t.quantity, t.price, t.fees, t.note
         FROM transactions t JOIN portfolios p ON t.portfolio_id=p.id WHERE 1=1",
    );
    let mut params_vec: Vec<String> = Vec::new();
    if let Some(names) = sub.get_many::<String>("portfolio") {
        let names: Vec<&String> = names.collect();
        if !names.is_empty() {
            let placeholders = vec!["?"; names.len()].join(",");
            sql.push_str(&format!(" AND p.name IN ({})", placeholders));
            params_vec.extend(names.iter().map(|s| s.to_string()));
        }
    }
    if let Some(ticker) = sub.get_one::<String>("ticker") {
        sql.push_str(" AND t.ticker=?");
        params_vec.push(ticker.trim().to_uppercase());
    }
    sql.push_str(" ORDER BY t.date DESC, t.id DESC");
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
        let note: Option<String> = r.get(8)?;
        data.push(TradeRow {
            id: r.get(0)?,
            portfolio: r.get(1)?,
            date: r.get(2)?,
            ticker: r.get(3)?,
            side: r.get(4)?,
            quantity: r.get(5)?,
            price: r.get(6)?,
            fees: r.get(7)?,
            note: note.unwrap_or_default(),
        });
    }
    Ok(data)
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let data = query_rows(conn, sub)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                vec![
                    r.id.to_string(),
                    r.portfolio.clone(),
                    r.date.clone(),
                    r.ticker.clone(),
                    r.side.clone(),
                    r.quantity.clone(),
                    r.price.clone(),
                    r.fees.clone(),
                    r.note.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Id", "Portfolio", "Date", "Ticker", "Side", "Qty", "Price", "Fees", "Note"],
                rows,
            )
        );
    }
    Ok(())
}
