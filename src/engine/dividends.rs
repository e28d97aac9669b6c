// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{Dividend, DividendForecast, DividendHistory, DividendPayment, Transaction};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashSet};

/// Signed quantity a portfolio held of `ticker` on `as_of`, clamped to zero.
/// Oversold ledgers never owe negative dividends.
pub fn held_quantity(
    transactions: &[Transaction],
    portfolio: &str,
    ticker: &str,
    as_of: NaiveDate,
) -> Decimal {
    let total: Decimal = transactions
        .iter()
        .filter(|tx| tx.portfolio == portfolio && tx.ticker == ticker && tx.date <= as_of)
        .map(|tx| tx.side.signed(tx.quantity))
        .sum();
    total.max(Decimal::ZERO)
}

/// Deterministic record key; attribution re-runs skip ids that already exist.
pub fn dividend_id(portfolio: &str, ticker: &str, date: NaiveDate) -> String {
    format!("div|{portfolio}|{ticker}|{date}")
}

/// Result of one attribution pass over external payment history.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attribution {
    pub new_dividends: Vec<Dividend>,
    pub cash_deltas: BTreeMap<String, Decimal>,
    pub forecasts: BTreeMap<String, DividendForecast>,
}

/// Credit every (portfolio, payment) pair where shares were held on the
/// ex-date. Amounts round to 6 decimals. Records whose deterministic id is
/// already present are skipped, so re-running with the same inputs yields an
/// empty result rather than a double credit.
pub fn attribute_dividends(
    transactions: &[Transaction],
    histories: &BTreeMap<String, DividendHistory>,
    existing: &[Dividend],
    portfolios: &[String],
) -> Attribution {
    let mut seen: HashSet<String> = existing.iter().map(|d| d.id.clone()).collect();
    let mut out = Attribution::default();

    for (ticker, history) in histories {
        let mut payments = history.payments.clone();
        payments.sort_by_key(|p| p.date);

        for payment in &payments {
            for portfolio in portfolios {
                let held = held_quantity(transactions, portfolio, ticker, payment.date);
                if held <= Decimal::ZERO {
                    continue;
                }
                let id = dividend_id(portfolio, ticker, payment.date);
                if !seen.insert(id.clone()) {
                    continue;
                }
                let amount = (held * payment.amount).round_dp(6);
                out.new_dividends.push(Dividend {
                    id,
                    portfolio: portfolio.clone(),
                    ticker: ticker.clone(),
                    date: payment.date,
                    amount,
                });
                *out.cash_deltas.entry(portfolio.clone()).or_default() += amount;
            }
        }

        if let Some(ex_date) = history.next_ex_date {
            out.forecasts.insert(
                ticker.clone(),
                DividendForecast {
                    ex_date,
                    estimate: estimate_next_payment(&payments, history.annual_rate),
                },
            );
        }
    }
    out
}

/// Advisory per-share estimate for the next payment: average of the most
/// recent four payments, else a quarterly slice of the annual rate.
/// Payments are assumed ascending by date.
pub fn estimate_next_payment(
    payments: &[DividendPayment],
    annual_rate: Option<Decimal>,
) -> Option<Decimal> {
    if payments.is_empty() {
        return annual_rate.map(|rate| rate / Decimal::from(4));
    }
    let tail: Vec<Decimal> = payments
        .iter()
        .rev()
        .take(4)
        .map(|p| p.amount)
        .collect();
    let sum: Decimal = tail.iter().sum();
    Some(sum / Decimal::from(tail.len() as i64))
}
