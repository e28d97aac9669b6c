// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::PricePoint;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Latest known close per ticker. Input order breaks a (ticker, date) tie:
/// the stable sort keeps later input rows later, and the last insert wins.
pub fn last_price_map(prices: &[PricePoint]) -> HashMap<String, Decimal> {
    let mut sorted: Vec<&PricePoint> = prices.iter().collect();
    sorted.sort_by_key(|p| p.date);
    let mut last = HashMap::new();
    for p in sorted {
        last.insert(p.ticker.clone(), p.close);
    }
    last
}

/// Dense date-by-ticker view of a sparse price set. `rows[i]` is the snapshot
/// for `dates[i]`; a ticker with no observation on or before that date has no
/// entry in the row (absence, not zero).
#[derive(Debug, Clone, Default)]
pub struct PriceGrid {
    pub dates: Vec<NaiveDate>,
    pub tickers: Vec<String>,
    pub rows: Vec<HashMap<String, Decimal>>,
}

impl PriceGrid {
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// Forward-fill the sparse set onto its own date axis: each row carries the
/// most recent close per ticker.
pub fn forward_fill(prices: &[PricePoint]) -> PriceGrid {
    let dates: BTreeSet<NaiveDate> = prices.iter().map(|p| p.date).collect();
    let tickers: BTreeSet<&str> = prices.iter().map(|p| p.ticker.as_str()).collect();
    let mut by_date: BTreeMap<NaiveDate, Vec<&PricePoint>> = BTreeMap::new();
    for p in prices {
        by_date.entry(p.date).or_default().push(p);
    }

    let mut rows = Vec::with_capacity(dates.len());
    let mut carried: HashMap<String, Decimal> = HashMap::new();
    for date in &dates {
        if let Some(observed) = by_date.get(date) {
            for p in observed {
                carried.insert(p.ticker.clone(), p.close);
            }
        }
        rows.push(carried.clone());
    }

    PriceGrid {
        dates: dates.into_iter().collect(),
        tickers: tickers.into_iter().map(str::to_string).collect(),
        rows,
    }
}

/// Upsert-merge keyed by (ticker, date): whatever arrives in `incoming` wins
/// over `existing` for the same key, regardless of value. Result ascends by
/// date (ties by ticker), so merging is idempotent and order-of-arrival
/// independent for a given input pair.
pub fn merge_prices(existing: &[PricePoint], incoming: &[PricePoint]) -> Vec<PricePoint> {
    let mut merged: BTreeMap<(NaiveDate, String), PricePoint> = BTreeMap::new();
    for p in existing.iter().chain(incoming) {
        merged.insert((p.date, p.ticker.clone()), p.clone());
    }
    merged.into_values().collect()
}
