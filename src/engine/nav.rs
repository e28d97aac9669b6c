// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{SeriesPoint, Transaction};
use chrono::Duration;
use rust_decimal::Decimal;
use std::collections::HashMap;

use super::prices::PriceGrid;
use super::scoped;

/// Reconstruct the daily portfolio value series by replaying the ledger
/// against the forward-filled grid.
///
/// The series starts at the first trade date in scope and has one point per
/// grid date from there on. Transactions and grid dates are both ascending,
/// so a single cursor applies each transaction exactly once. A ticker the
/// grid has not priced yet contributes nothing to that day's value.
pub fn nav_series(
    transactions: &[Transaction],
    grid: &PriceGrid,
    portfolios: Option<&[String]>,
) -> Vec<SeriesPoint> {
    let mut txs: Vec<&Transaction> = scoped(transactions, portfolios).collect();
    if txs.is_empty() || grid.is_empty() {
        return Vec::new();
    }
    txs.sort_by_key(|tx| tx.date);
    let first_trade = txs[0].date;

    let mut quantities: HashMap<String, Decimal> = grid
        .tickers
        .iter()
        .map(|t| (t.clone(), Decimal::ZERO))
        .collect();

    let mut series = Vec::new();
    let mut cursor = 0;
    for (date, row) in grid.dates.iter().zip(&grid.rows) {
        if *date < first_trade {
            continue;
        }
        while cursor < txs.len() && txs[cursor].date <= *date {
            let tx = txs[cursor];
            *quantities.entry(tx.ticker.clone()).or_insert(Decimal::ZERO) +=
                tx.side.signed(tx.quantity);
            cursor += 1;
        }
        let value = quantities
            .iter()
            .map(|(ticker, qty)| *qty * row.get(ticker).copied().unwrap_or(Decimal::ZERO))
            .sum();
        series.push(SeriesPoint { date: *date, value });
    }
    series
}

/// Window applied to a NAV series after reconstruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Range {
    Week,
    Month,
    Year,
    All,
}

impl Range {
    pub fn parse(s: &str) -> Option<Range> {
        match s.to_ascii_lowercase().as_str() {
            "1w" | "w" | "week" => Some(Range::Week),
            "1m" | "m" | "month" => Some(Range::Month),
            "1y" | "y" | "year" => Some(Range::Year),
            "all" => Some(Range::All),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Range::Week => "1w",
            Range::Month => "1m",
            Range::Year => "1y",
            Range::All => "all",
        }
    }

    fn days(self) -> Option<i64> {
        match self {
            Range::Week => Some(7),
            Range::Month => Some(31),
            Range::Year => Some(366),
            Range::All => None,
        }
    }
}

/// Keep the trailing window of the series, measured back from its last date.
/// Pure post-filter; the replay is never re-run.
pub fn clip_range(series: &[SeriesPoint], range: Range) -> &[SeriesPoint] {
    let (Some(days), Some(last)) = (range.days(), series.last()) else {
        return series;
    };
    let cutoff = last.date - Duration::days(days);
    let start = series.partition_point(|p| p.date < cutoff);
    &series[start..]
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Performance {
    pub abs: Decimal,
    pub pct: Decimal,
}

/// First-to-last change over the windowed series. Needs at least two points.
pub fn performance(series: &[SeriesPoint]) -> Option<Performance> {
    if series.len() < 2 {
        return None;
    }
    let first = series[0].value;
    let last = series[series.len() - 1].value;
    let abs = last - first;
    let pct = if first > Decimal::ZERO {
        abs / first
    } else {
        Decimal::ZERO
    };
    Some(Performance { abs, pct })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::prices::forward_fill;
    use crate::models::{PricePoint, TxSide};
    use chrono::NaiveDate;

    fn d(s: &str) -> Decimal {
        Decimal::from_str_exact(s).unwrap()
    }

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn tx(portfolio: &str, date: &str, ticker: &str, side: TxSide, qty: &str) -> Transaction {
        Transaction {
            id: 0,
            portfolio: portfolio.into(),
            date: day(date),
            ticker: ticker.into(),
            side,
            quantity: d(qty),
            price: Decimal::ZERO,
            fees: Decimal::ZERO,
            note: None,
        }
    }

    fn pt(ticker: &str, date: &str, close: &str) -> PricePoint {
        PricePoint {
            ticker: ticker.into(),
            date: day(date),
            close: d(close),
        }
    }

    #[test]
    fn empty_ledger_yields_empty_series() {
        let grid = forward_fill(&[pt("AAA", "2024-01-01", "10")]);
        assert!(nav_series(&[], &grid, None).is_empty());
    }

    #[test]
    fn no_prices_yields_empty_series() {
        let txs = vec![tx("main", "2024-01-01", "AAA", TxSide::Buy, "10")];
        assert!(nav_series(&txs, &PriceGrid::default(), None).is_empty());
    }

    #[test]
    fn series_starts_at_first_trade_and_covers_grid() {
        let grid = forward_fill(&[
            pt("AAA", "2024-01-01", "10"),
            pt("AAA", "2024-01-02", "11"),
            pt("AAA", "2024-01-03", "12"),
        ]);
        let txs = vec![tx("main", "2024-01-02", "AAA", TxSide::Buy, "2")];
        let series = nav_series(&txs, &grid, None);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].date, day("2024-01-02"));
        assert_eq!(series[0].value, d("22"));
        assert_eq!(series[1].value, d("24"));
    }

    #[test]
    fn replay_applies_each_transaction_once() {
        let grid = forward_fill(&[
            pt("AAA", "2024-01-01", "10"),
            pt("AAA", "2024-01-03", "10"),
            pt("AAA", "2024-01-05", "10"),
        ]);
        // buy on a date between grid points still lands on the next point
        let txs = vec![
            tx("main", "2024-01-01", "AAA", TxSide::Buy, "1"),
            tx("main", "2024-01-02", "AAA", TxSide::Buy, "1"),
            tx("main", "2024-01-04", "AAA", TxSide::Sell, "2"),
        ];
        let series = nav_series(&txs, &grid, None);
        let values: Vec<Decimal> = series.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![d("10"), d("20"), d("0")]);
    }

    #[test]
    fn unpriced_holding_contributes_zero_until_first_close() {
        let grid = forward_fill(&[
            pt("AAA", "2024-01-01", "10"),
            pt("BBB", "2024-01-03", "100"),
        ]);
        let txs = vec![
            tx("main", "2024-01-01", "AAA", TxSide::Buy, "1"),
            tx("main", "2024-01-01", "BBB", TxSide::Buy, "1"),
        ];
        let series = nav_series(&txs, &grid, None);
        assert_eq!(series[0].value, d("10"));
        assert_eq!(series[1].value, d("110"));
    }

    #[test]
    fn dates_strictly_increase() {
        let grid = forward_fill(&[
            pt("AAA", "2024-01-01", "10"),
            pt("AAA", "2024-01-02", "10"),
            pt("BBB", "2024-01-02", "5"),
        ]);
        let txs = vec![tx("main", "2024-01-01", "AAA", TxSide::Buy, "1")];
        let series = nav_series(&txs, &grid, None);
        for pair in series.windows(2) {
            assert!(pair[0].date < pair[1].date);
        }
    }

    #[test]
    fn range_clips_against_last_date() {
        let series: Vec<SeriesPoint> = (1..=20)
            .map(|i| SeriesPoint {
                date: day(&format!("2024-01-{i:02}")),
                value: Decimal::from(i),
            })
            .collect();
        let clipped = clip_range(&series, Range::Week);
        assert_eq!(clipped.first().map(|p| p.date), Some(day("2024-01-13")));
        assert_eq!(clipped.last().map(|p| p.date), Some(day("2024-01-20")));
        assert_eq!(clip_range(&series, Range::All).len(), 20);
    }

    #[test]
    fn performance_needs_two_points() {
        let one = vec![SeriesPoint {
            date: day("2024-01-01"),
            value: d("10"),
        }];
        assert!(performance(&one).is_none());
        let two = vec![
            SeriesPoint {
                date: day("2024-01-01"),
                value: d("10"),
            },
            SeriesPoint {
                date: day("2024-01-02"),
                value: d("12"),
            },
        ];
        let perf = performance(&two).unwrap();
        assert_eq!(perf.abs, d("2"));
        assert_eq!(perf.pct, d("0.2"));
    }

    #[test]
    fn performance_pct_zero_when_starting_from_zero() {
        let series = vec![
            SeriesPoint {
                date: day("2024-01-01"),
                value: Decimal::ZERO,
            },
            SeriesPoint {
                date: day("2024-01-02"),
                value: d("5"),
            },
        ];
        let perf = performance(&series).unwrap();
        assert_eq!(perf.abs, d("5"));
        assert_eq!(perf.pct, Decimal::ZERO);
    }

    #[test]
    fn range_parse_accepts_case_insensitive_labels() {
        assert_eq!(Range::parse("1W"), Some(Range::Week));
        assert_eq!(Range::parse("all"), Some(Range::All));
        assert_eq!(Range::parse("fortnight"), None);
    }
}
