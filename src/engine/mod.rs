// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Pure accounting core: positions, NAV reconstruction, dividend attribution
//! and price bookkeeping. Everything here is a synchronous function of its
//! inputs; persistence and market data live at the boundary.

pub mod dividends;
pub mod nav;
pub mod positions;
pub mod prices;

pub use dividends::{attribute_dividends, dividend_id, held_quantity, Attribution};
pub use nav::{clip_range, nav_series, performance, Performance, Range};
pub use positions::compute_positions;
pub use prices::{forward_fill, last_price_map, merge_prices, PriceGrid};

use crate::models::Transaction;

/// Restrict the ledger to the named portfolios. `None` (or an empty list)
/// means all portfolios combined.
pub(crate) fn scoped<'a>(
    transactions: &'a [Transaction],
    portfolios: Option<&'a [String]>,
) -> impl Iterator<Item = &'a Transaction> {
    transactions.iter().filter(move |tx| match portfolios {
        Some(names) if !names.is_empty() => names.iter().any(|n| n == &tx.portfolio),
        _ => true,
    })
}
