// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::engine::dividend_id;
use crate::utils::{load_dividends, load_transactions, pretty_table};
use anyhow::Result;
use rusqlite::Connection;
use rust_decimal::Decimal;
use std::collections::HashMap;

pub fn handle(conn: &Connection) -> Result<()> {
    let mut rows = Vec::new();

    // 1) Portfolios whose cash went negative (withdrawals and dividend
    //    reversals are allowed to overdraw; buys are not)
    let mut stmt = conn.prepare("SELECT name, cash FROM portfolios ORDER BY name")?;
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        let name: String = r.get(0)?;
        let cash_s: String = r.get(1)?;
        match Decimal::from_str_exact(&cash_s) {
            Ok(cash) if cash < Decimal::ZERO => {
                rows.push(vec!["negative_cash".into(), format!("{} ({})", name, cash)]);
            }
            Ok(_) => {}
            Err(_) => {
                rows.push(vec!["unparseable_cash".into(), format!("{} '{}'", name, cash_s)]);
            }
        }
    }

    // 2) Net oversold (portfolio, ticker) pairs
    let transactions = load_transactions(conn)?;
    let mut nets: HashMap<(String, String), Decimal> = HashMap::new();
    for tx in &transactions {
        *nets
            .entry((tx.portfolio.clone(), tx.ticker.clone()))
            .or_default() += tx.side.signed(tx.quantity);
    }
    let mut oversold: Vec<_> = nets
        .into_iter()
        .filter(|(_, net)| *net < Decimal::ZERO)
        .collect();
    oversold.sort_by(|a, b| a.0.cmp(&b.0));
    for ((portfolio, ticker), net) in oversold {
        rows.push(vec![
            "oversold".into(),
            format!("{} {} (net {})", portfolio, ticker, net),
        ]);
    }

    // 3) Ledger tickers with no price coverage at all
    let mut stmt2 = conn.prepare(
        "SELECT DISTINCT ticker FROM transactions EXCEPT SELECT DISTINCT ticker FROM prices",
    )?;
    let mut cur2 = stmt2.query([])?;
    while let Some(r) = cur2.next()? {
        let t: String = r.get(0)?;
        rows.push(vec!["unpriced_ticker".into(), t]);
    }

    // 4) Dividend rows whose id does not match its own fields
    for d in load_dividends(conn)? {
        let expected = dividend_id(&d.portfolio, &d.ticker, d.date);
        if d.id != expected {
            rows.push(vec!["dividend_id_mismatch".into(), d.id]);
        }
    }

    if rows.is_empty() {
        println!("✅ doctor: no issues found");
    } else {
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}
