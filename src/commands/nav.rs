// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::engine::{Range, clip_range, forward_fill, nav_series, performance};
use crate::utils::{
    currency_symbol, fmt_money, load_prices, load_transactions, maybe_print_json,
    portfolio_filter, pretty_table,
};
use anyhow::{Result, anyhow};
use rusqlite::Connection;
use rust_decimal::Decimal;

pub fn handle(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let scope = portfolio_filter(sub);
    let range_raw = sub.get_one::<String>("range").unwrap();
    let range = Range::parse(range_raw)
        .ok_or_else(|| anyhow!("Invalid range '{}', expected 1w, 1m, 1y or all", range_raw))?;

    let transactions = load_transactions(conn)?;
    let prices = load_prices(conn)?;
    let grid = forward_fill(&prices);
    let series = nav_series(&transactions, &grid, scope.as_deref());
    let clipped = clip_range(&series, range);

    if maybe_print_json(json_flag, jsonl_flag, &clipped)? {
        return Ok(());
    }

    let symbol = currency_symbol(conn)?;
    let rows: Vec<Vec<String>> = clipped
        .iter()
        .map(|p| vec![p.date.to_string(), fmt_money(&p.value, &symbol)])
        .collect();
    println!("{}", pretty_table(&["Date", "Value"], rows));

    if let Some(perf) = performance(clipped) {
        println!(
            "Change over {}: {} ({} %)",
            range.as_str(),
            fmt_money(&perf.abs, &symbol),
            (perf.pct * Decimal::from(100)).round_dp(2)
        );
    }
    Ok(())
}
