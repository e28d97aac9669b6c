// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Market data boundary. The accounting core never fetches anything itself;
//! commands that need closes, quotes or dividend history go through the
//! [`MarketData`] trait, and tests swap in a canned implementation.

use crate::models::{DividendHistory, DividendPayment, PricePoint, Quote};
use chrono::{DateTime, NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MarketDataError {
    #[error("market data request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("no market data for '{0}'")]
    NoData(String),
}

pub trait MarketData {
    /// Daily closes for `ticker` over [from, to], unordered, possibly empty.
    fn daily_closes(
        &self,
        ticker: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PricePoint>, MarketDataError>;

    /// Most recent quote for a single symbol.
    fn latest_quote(&self, ticker: &str) -> Result<Quote, MarketDataError>;

    /// Past per-share payments since `from`, plus the next ex-date and
    /// annual rate when the venue publishes them.
    fn dividend_history(
        &self,
        ticker: &str,
        from: NaiveDate,
    ) -> Result<DividendHistory, MarketDataError>;
}

/// Yahoo Finance public endpoints: v7 quote, v8 chart, v10 quoteSummary.
pub struct YahooClient {
    client: reqwest::blocking::Client,
}

impl YahooClient {
    pub fn new(client: reqwest::blocking::Client) -> Self {
        YahooClient { client }
    }

    fn chart(
        &self,
        ticker: &str,
        from: NaiveDate,
        to: NaiveDate,
        events: bool,
    ) -> Result<YahooChartResult, MarketDataError> {
        let period1 = from.and_time(NaiveTime::MIN).and_utc().timestamp();
        // period2 is exclusive upstream; push it one day so `to` is covered
        let period2 = (to + chrono::Duration::days(1))
            .and_time(NaiveTime::MIN)
            .and_utc()
            .timestamp();
        let mut url = format!(
            "https://query1.finance.yahoo.com/v8/finance/chart/{ticker}?period1={period1}&period2={period2}&interval=1d"
        );
        if events {
            url.push_str("&events=div");
        }
        let resp = self.client.get(url).send()?.error_for_status()?;
        let body: YahooChartResponse = resp.json()?;
        body.chart
            .result
            .into_iter()
            .flatten()
            .next()
            .ok_or_else(|| MarketDataError::NoData(ticker.to_string()))
    }
}

impl MarketData for YahooClient {
    fn daily_closes(
        &self,
        ticker: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PricePoint>, MarketDataError> {
        let result = self.chart(ticker, from, to, false)?;
        let closes = result
            .indicators
            .quote
            .into_iter()
            .next()
            .map(|q| q.close)
            .unwrap_or_default();
        let mut out = Vec::new();
        for (ts, close) in result.timestamp.iter().zip(closes) {
            let (Some(date), Some(px)) = (date_of_timestamp(*ts), close) else {
                continue;
            };
            let Some(close) = Decimal::from_f64_retain(px) else {
                continue;
            };
            out.push(PricePoint {
                ticker: ticker.to_string(),
                date,
                close,
            });
        }
        Ok(out)
    }

    fn latest_quote(&self, ticker: &str) -> Result<Quote, MarketDataError> {
        let url = format!("https://query1.finance.yahoo.com/v7/finance/quote?symbols={ticker}");
        let resp = self.client.get(url).send()?.error_for_status()?;
        let body: YahooQuoteEnvelope = resp.json()?;
        let q = body
            .quoteResponse
            .result
            .into_iter()
            .next()
            .ok_or_else(|| MarketDataError::NoData(ticker.to_string()))?;
        let symbol = q.symbol.unwrap_or_else(|| ticker.to_string());
        let name = q.short_name.or(q.long_name).unwrap_or_else(|| symbol.clone());
        Ok(Quote {
            symbol,
            name,
            price: q.regular_market_price.and_then(Decimal::from_f64_retain),
            currency: q.currency,
        })
    }

    fn dividend_history(
        &self,
        ticker: &str,
        from: NaiveDate,
    ) -> Result<DividendHistory, MarketDataError> {
        let today = chrono::Utc::now().date_naive();
        let result = self.chart(ticker, from, today, true)?;
        let mut payments = Vec::new();
        for event in result.events.dividends.into_values() {
            let (Some(date), Some(amount)) = (
                date_of_timestamp(event.date),
                Decimal::from_f64_retain(event.amount),
            ) else {
                continue;
            };
            if amount.is_zero() {
                continue;
            }
            payments.push(DividendPayment { date, amount });
        }
        payments.sort_by_key(|p| p.date);

        let url = format!(
            "https://query1.finance.yahoo.com/v10/finance/quoteSummary/{ticker}?modules=calendarEvents,summaryDetail"
        );
        let resp = self.client.get(url).send()?.error_for_status()?;
        let body: YahooSummaryEnvelope = resp.json()?;
        let summary = body
            .quoteSummary
            .result
            .into_iter()
            .flatten()
            .next()
            .unwrap_or_default();
        let next_ex_date = summary
            .calendar_events
            .and_then(|c| c.ex_dividend_date)
            .and_then(|v| date_of_timestamp(v.raw? as i64));
        let annual_rate = summary
            .summary_detail
            .and_then(|s| s.dividend_rate)
            .and_then(|v| v.raw)
            .and_then(Decimal::from_f64_retain);

        Ok(DividendHistory {
            payments,
            next_ex_date,
            annual_rate,
        })
    }
}

fn date_of_timestamp(ts: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(ts, 0).map(|dt| dt.date_naive())
}

#[derive(Debug, Deserialize)]
struct YahooChartResponse {
    chart: YahooChart,
}
#[derive(Debug, Deserialize)]
struct YahooChart {
    result: Option<Vec<YahooChartResult>>,
}
#[derive(Debug, Deserialize)]
struct YahooChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    #[serde(default)]
    indicators: YahooIndicators,
    #[serde(default)]
    events: YahooEvents,
}
#[derive(Debug, Deserialize, Default)]
struct YahooIndicators {
    #[serde(default)]
    quote: Vec<YahooQuoteBlock>,
}
#[derive(Debug, Deserialize)]
struct YahooQuoteBlock {
    #[serde(default)]
    close: Vec<Option<f64>>,
}
#[derive(Debug, Deserialize, Default)]
struct YahooEvents {
    #[serde(default)]
    dividends: HashMap<String, YahooDividendEvent>,
}
#[derive(Debug, Deserialize)]
struct YahooDividendEvent {
    amount: f64,
    date: i64,
}

#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct YahooQuoteEnvelope {
    quoteResponse: YahooQuoteResponse,
}
#[derive(Debug, Deserialize)]
struct YahooQuoteResponse {
    result: Vec<YahooQuoteRow>,
}
#[derive(Debug, Deserialize)]
struct YahooQuoteRow {
    symbol: Option<String>,
    #[serde(rename = "regularMarketPrice")]
    regular_market_price: Option<f64>,
    currency: Option<String>,
    #[serde(rename = "shortName")]
    short_name: Option<String>,
    #[serde(rename = "longName")]
    long_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct YahooSummaryEnvelope {
    quoteSummary: YahooSummary,
}
#[derive(Debug, Deserialize)]
struct YahooSummary {
    result: Option<Vec<YahooSummaryResult>>,
}
#[derive(Debug, Deserialize, Default)]
struct YahooSummaryResult {
    #[serde(rename = "calendarEvents")]
    calendar_events: Option<YahooCalendarEvents>,
    #[serde(rename = "summaryDetail")]
    summary_detail: Option<YahooSummaryDetail>,
}
#[derive(Debug, Deserialize)]
struct YahooCalendarEvents {
    #[serde(rename = "exDividendDate")]
    ex_dividend_date: Option<YahooRawValue>,
}
#[derive(Debug, Deserialize)]
struct YahooSummaryDetail {
    #[serde(rename = "dividendRate")]
    dividend_rate: Option<YahooRawValue>,
}
#[derive(Debug, Deserialize)]
struct YahooRawValue {
    raw: Option<f64>,
}
