// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::utils::{
    adjust_cash, currency_symbol, fmt_money, maybe_print_json, parse_decimal, pretty_table,
    set_currency_symbol,
};
use anyhow::{Context, Result, anyhow};
use rusqlite::{Connection, params};
use serde::Serialize;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        _ => {}
    }
    Ok(())
}

pub fn handle_config(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("currency", sub)) => {
            let symbol = sub.get_one::<String>("symbol").unwrap().trim().to_string();
            if symbol.is_empty() {
                return Err(anyhow!("Currency symbol must not be empty"));
            }
            set_currency_symbol(conn, &symbol)?;
            println!("Currency symbol set to {}", symbol);
        }
        _ => {}
    }
    Ok(())
}

pub fn handle_cash(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("deposit", sub)) => move_cash(conn, sub, true)?,
        Some(("withdraw", sub)) => move_cash(conn, sub, false)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let name = sub.get_one::<String>("name").unwrap().trim().to_string();
    if name.is_empty() {
        return Err(anyhow!("Portfolio name must not be empty"));
    }
    conn.execute("INSERT INTO portfolios(name) VALUES (?1)", params![name])
        .with_context(|| format!("Create portfolio '{}'", name))?;

    let symbol = currency_symbol(conn)?;
    if let Some(cash) = sub.get_one::<String>("cash") {
        let opening = parse_decimal(cash)?;
        let balance = adjust_cash(conn, &name, opening)?;
        println!(
            "Created portfolio '{}' with {}",
            name,
            fmt_money(&balance, &symbol)
        );
    } else {
        println!("Created portfolio '{}'", name);
    }
    Ok(())
}

#[derive(Serialize)]
pub struct PortfolioRow {
    pub name: String,
    pub cash: String,
    pub created: String,
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");

    let mut stmt =
        conn.prepare("SELECT name, cash, created_at FROM portfolios ORDER BY name")?;
    let rows = stmt.query_map([], |r| {
        Ok(PortfolioRow {
            name: r.get(0)?,
            cash: r.get(1)?,
            created: r.get(2)?,
        })
    })?;
    let mut data = Vec::new();
    for row in rows {
        data.push(row?);
    }

    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let symbol = currency_symbol(conn)?;
        let table_rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                let cash = r
                    .cash
                    .parse::<rust_decimal::Decimal>()
                    .map(|d| fmt_money(&d, &symbol))
                    .unwrap_or_else(|_| r.cash.clone());
                vec![r.name.clone(), cash, r.created.clone()]
            })
            .collect();
        println!("{}", pretty_table(&["Name", "Cash", "Created"], table_rows));
    }
    Ok(())
}

fn move_cash(conn: &Connection, sub: &clap::ArgMatches, deposit: bool) -> Result<()> {
    let name = sub.get_one::<String>("portfolio").unwrap().trim();
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
    if amount <= rust_decimal::Decimal::ZERO {
        return Err(anyhow!("Amount must be positive, got {}", amount));
    }

    let delta = if deposit { amount } else { -amount };
    let balance = adjust_cash(conn, name, delta)?;
    let symbol = currency_symbol(conn)?;
    if deposit {
        println!(
            "Deposited {} into '{}' (cash {})",
            fmt_money(&amount, &symbol),
            name,
            fmt_money(&balance, &symbol)
        );
    } else {
        println!(
            "Withdrew {} from '{}' (cash {})",
            fmt_money(&amount, &symbol),
            name,
            fmt_money(&balance, &symbol)
        );
    }
    Ok(())
}
