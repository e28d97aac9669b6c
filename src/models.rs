// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxSide {
    Buy,
    Sell,
}

impl TxSide {
    pub fn as_str(self) -> &'static str {
        match self {
            TxSide::Buy => "buy",
            TxSide::Sell => "sell",
        }
    }

    pub fn parse(s: &str) -> Option<TxSide> {
        match s {
            "buy" => Some(TxSide::Buy),
            "sell" => Some(TxSide::Sell),
            _ => None,
        }
    }

    /// Ledger sign convention: buys add to the holding, sells subtract.
    pub fn signed(self, quantity: Decimal) -> Decimal {
        match self {
            TxSide::Buy => quantity,
            TxSide::Sell => -quantity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    pub id: i64,
    pub name: String,
    pub cash: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub portfolio: String,
    pub date: NaiveDate,
    pub ticker: String,
    pub side: TxSide,
    pub quantity: Decimal,
    pub price: Decimal,
    pub fees: Decimal,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub ticker: String,
    pub date: NaiveDate,
    pub close: Decimal,
}

/// Derived holding; recomputed on demand, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub ticker: String,
    pub quantity: Decimal,
    pub last: Decimal,
    pub value: Decimal,
    pub weight: Decimal,
    pub held_since: Option<NaiveDate>,
    pub avg_cost: Decimal,
    pub pnl_abs: Decimal,
    pub pnl_pct: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: Decimal,
}

/// The id is the deterministic key `div|{portfolio}|{ticker}|{date}`, which is
/// what makes attribution idempotent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dividend {
    pub id: String,
    pub portfolio: String,
    pub ticker: String,
    pub date: NaiveDate,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DividendPayment {
    pub date: NaiveDate,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DividendHistory {
    pub payments: Vec<DividendPayment>,
    pub next_ex_date: Option<NaiveDate>,
    pub annual_rate: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DividendForecast {
    pub ex_date: NaiveDate,
    pub estimate: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub name: String,
    pub price: Option<Decimal>,
    pub currency: Option<String>,
}
