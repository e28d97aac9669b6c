// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{Position, Transaction, TxSide};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};

use super::scoped;

/// Replay the ledger into current holdings, priced at the latest known close.
///
/// Cost basis is weighted average: buys fold quantity and cost together,
/// sells reduce quantity at the standing average. A position sold to zero
/// (or below) resets entirely, so a later buy starts a fresh lot with a
/// fresh holding date. Tickers with no remaining quantity are omitted.
pub fn compute_positions(
    transactions: &[Transaction],
    last_prices: &HashMap<String, Decimal>,
    portfolios: Option<&[String]>,
) -> Vec<Position> {
    let mut by_ticker: BTreeMap<&str, Vec<&Transaction>> = BTreeMap::new();
    for tx in scoped(transactions, portfolios) {
        by_ticker.entry(tx.ticker.as_str()).or_default().push(tx);
    }

    let mut positions = Vec::new();
    for (ticker, mut txs) in by_ticker {
        txs.sort_by_key(|tx| tx.date);

        let mut quantity = Decimal::ZERO;
        let mut avg_cost = Decimal::ZERO;
        let mut held_since = None;
        for tx in txs {
            match tx.side {
                TxSide::Buy => {
                    let cost = quantity * avg_cost + tx.quantity * tx.price + tx.fees;
                    quantity += tx.quantity;
                    avg_cost = if quantity > Decimal::ZERO {
                        cost / quantity
                    } else {
                        Decimal::ZERO
                    };
                    if held_since.is_none() {
                        held_since = Some(tx.date);
                    }
                }
                TxSide::Sell => {
                    quantity -= tx.quantity;
                    if quantity <= Decimal::ZERO {
                        quantity = Decimal::ZERO;
                        avg_cost = Decimal::ZERO;
                        held_since = None;
                    }
                }
            }
        }
        if quantity.is_zero() {
            continue;
        }

        let last = last_prices.get(ticker).copied().unwrap_or(Decimal::ZERO);
        let value = quantity * last;
        positions.push(Position {
            ticker: ticker.to_string(),
            quantity,
            last,
            value,
            weight: Decimal::ZERO,
            held_since,
            avg_cost,
            pnl_abs: quantity * (last - avg_cost),
            pnl_pct: if avg_cost > Decimal::ZERO {
                (last - avg_cost) / avg_cost
            } else {
                Decimal::ZERO
            },
        });
    }

    positions.sort_by(|a, b| b.value.cmp(&a.value));
    let total: Decimal = positions.iter().map(|p| p.value).sum();
    if !total.is_zero() {
        for p in &mut positions {
            p.weight = p.value / total;
        }
    }
    positions
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(s: &str) -> Decimal {
        Decimal::from_str_exact(s).unwrap()
    }

    fn tx(portfolio: &str, date: &str, ticker: &str, side: TxSide, qty: &str, px: &str) -> Transaction {
        Transaction {
            id: 0,
            portfolio: portfolio.into(),
            date: date.parse().unwrap(),
            ticker: ticker.into(),
            side,
            quantity: d(qty),
            price: d(px),
            fees: Decimal::ZERO,
            note: None,
        }
    }

    fn last(entries: &[(&str, &str)]) -> HashMap<String, Decimal> {
        entries.iter().map(|(t, p)| (t.to_string(), d(p))).collect()
    }

    #[test]
    fn buys_average_cost() {
        let txs = vec![
            tx("main", "2024-01-01", "AAA", TxSide::Buy, "10", "100"),
            tx("main", "2024-02-01", "AAA", TxSide::Buy, "10", "120"),
        ];
        let positions = compute_positions(&txs, &last(&[("AAA", "110")]), None);
        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].quantity, d("20"));
        assert_eq!(positions[0].avg_cost, d("110"));
        assert_eq!(positions[0].pnl_abs, Decimal::ZERO);
    }

    #[test]
    fn fees_fold_into_cost_basis() {
        let mut buy = tx("main", "2024-01-01", "AAA", TxSide::Buy, "10", "100");
        buy.fees = d("10");
        let positions = compute_positions(&[buy], &last(&[("AAA", "100")]), None);
        assert_eq!(positions[0].avg_cost, d("101"));
    }

    #[test]
    fn partial_sell_keeps_average() {
        let txs = vec![
            tx("main", "2024-01-01", "AAA", TxSide::Buy, "10", "100"),
            tx("main", "2024-02-01", "AAA", TxSide::Buy, "10", "120"),
            tx("main", "2024-03-01", "AAA", TxSide::Sell, "15", "130"),
        ];
        let positions = compute_positions(&txs, &last(&[("AAA", "130")]), None);
        assert_eq!(positions[0].quantity, d("5"));
        assert_eq!(positions[0].avg_cost, d("110"));
    }

    #[test]
    fn sell_to_zero_resets_basis_and_holding_date() {
        let txs = vec![
            tx("main", "2024-01-01", "AAA", TxSide::Buy, "10", "100"),
            tx("main", "2024-02-01", "AAA", TxSide::Sell, "10", "120"),
            tx("main", "2024-03-01", "AAA", TxSide::Buy, "5", "200"),
        ];
        let positions = compute_positions(&txs, &last(&[("AAA", "200")]), None);
        assert_eq!(positions[0].quantity, d("5"));
        assert_eq!(positions[0].avg_cost, d("200"));
        assert_eq!(
            positions[0].held_since,
            Some("2024-03-01".parse::<NaiveDate>().unwrap())
        );
    }

    #[test]
    fn oversell_clamps_to_flat() {
        let txs = vec![
            tx("main", "2024-01-01", "AAA", TxSide::Buy, "10", "100"),
            tx("main", "2024-02-01", "AAA", TxSide::Sell, "15", "120"),
        ];
        let positions = compute_positions(&txs, &last(&[("AAA", "120")]), None);
        assert!(positions.is_empty());
    }

    #[test]
    fn unpriced_ticker_values_at_zero_but_still_listed() {
        let txs = vec![tx("main", "2024-01-01", "NEW", TxSide::Buy, "3", "50")];
        let positions = compute_positions(&txs, &HashMap::new(), None);
        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].last, Decimal::ZERO);
        assert_eq!(positions[0].value, Decimal::ZERO);
        assert_eq!(positions[0].pnl_abs, d("-150"));
        assert_eq!(positions[0].weight, Decimal::ZERO);
    }

    #[test]
    fn weights_sum_to_one_over_priced_book() {
        let txs = vec![
            tx("main", "2024-01-01", "AAA", TxSide::Buy, "10", "100"),
            tx("main", "2024-01-01", "BBB", TxSide::Buy, "10", "100"),
        ];
        let positions = compute_positions(&txs, &last(&[("AAA", "300"), ("BBB", "100")]), None);
        assert_eq!(positions[0].ticker, "AAA");
        assert_eq!(positions[0].weight, d("0.75"));
        assert_eq!(positions[1].weight, d("0.25"));
    }

    #[test]
    fn portfolio_scope_filters_ledger() {
        let txs = vec![
            tx("alpha", "2024-01-01", "AAA", TxSide::Buy, "10", "100"),
            tx("beta", "2024-01-01", "AAA", TxSide::Buy, "4", "100"),
        ];
        let scope = vec!["beta".to_string()];
        let positions = compute_positions(&txs, &last(&[("AAA", "100")]), Some(&scope));
        assert_eq!(positions[0].quantity, d("4"));
    }

    #[test]
    fn same_day_transactions_replay_in_ledger_order() {
        let txs = vec![
            tx("main", "2024-01-01", "AAA", TxSide::Buy, "10", "100"),
            tx("main", "2024-01-01", "AAA", TxSide::Sell, "10", "110"),
            tx("main", "2024-01-01", "AAA", TxSide::Buy, "2", "105"),
        ];
        let positions = compute_positions(&txs, &last(&[("AAA", "105")]), None);
        assert_eq!(positions[0].quantity, d("2"));
        assert_eq!(positions[0].avg_cost, d("105"));
    }
}
