// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::engine::{compute_positions, last_price_map};
use crate::utils::{
    currency_symbol, fmt_money, load_prices, load_transactions, maybe_print_json,
    portfolio_filter, pretty_table,
};
use anyhow::Result;
use rusqlite::Connection;
use rust_decimal::Decimal;

pub fn handle(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let scope = portfolio_filter(sub);

    let transactions = load_transactions(conn)?;
    let prices = load_prices(conn)?;
    let last = last_price_map(&prices);
    let positions = compute_positions(&transactions, &last, scope.as_deref());

    if maybe_print_json(json_flag, jsonl_flag, &positions)? {
        return Ok(());
    }

    let symbol = currency_symbol(conn)?;
    let hundred = Decimal::from(100);
    let rows: Vec<Vec<String>> = positions
        .iter()
        .map(|p| {
            vec![
                p.ticker.clone(),
                p.quantity.normalize().to_string(),
                fmt_money(&p.last, &symbol),
                fmt_money(&p.value, &symbol),
                format!("{} %", (p.weight * hundred).round_dp(2)),
                p.held_since.map(|d| d.to_string()).unwrap_or_default(),
                fmt_money(&p.avg_cost, &symbol),
                fmt_money(&p.pnl_abs, &symbol),
                format!("{} %", (p.pnl_pct * hundred).round_dp(2)),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["Ticker", "Qty", "Last", "Value", "Weight", "Since", "Avg Cost", "P&L", "P&L %"],
            rows,
        )
    );

    let total: Decimal = positions.iter().map(|p| p.value).sum();
    println!("Total {}", fmt_money(&total, &symbol));
    Ok(())
}
