// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use folionav::engine::{compute_positions, forward_fill, last_price_map, nav_series};
use folionav::{cli, commands::portfolios, commands::trades, db, utils};
use rusqlite::{Connection, params};
use rust_decimal::Decimal;

fn setup() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&mut conn).unwrap();
    conn
}

fn run(conn: &mut Connection, args: &[&str]) {
    let matches = cli::build_cli().get_matches_from(args);
    match matches.subcommand() {
        Some(("cash", sub)) => portfolios::handle_cash(conn, sub).unwrap(),
        Some(("tx", sub)) => trades::handle(conn, sub).unwrap(),
        _ => panic!("unhandled subcommand"),
    }
}

fn seed_price(conn: &Connection, ticker: &str, date: &str, close: &str) {
    conn.execute(
        "INSERT INTO prices(ticker,date,close) VALUES (?1,?2,?3)",
        params![ticker, date, close],
    )
    .unwrap();
}

fn d(s: &str) -> Decimal {
    Decimal::from_str_exact(s).unwrap()
}

#[test]
fn averaging_and_partial_sell_keep_basis() {
    let mut conn = setup();
    run(&mut conn, &["folionav", "cash", "deposit", "--portfolio", "main", "--amount", "2500"]);
    run(&mut conn, &["folionav", "tx", "buy", "--portfolio", "main", "--date", "2024-01-01", "--ticker", "AAA", "--quantity", "10", "--price", "100"]);
    run(&mut conn, &["folionav", "tx", "buy", "--portfolio", "main", "--date", "2024-02-01", "--ticker", "AAA", "--quantity", "10", "--price", "120"]);
    run(&mut conn, &["folionav", "tx", "sell", "--portfolio", "main", "--date", "2024-03-01", "--ticker", "AAA", "--quantity", "15", "--price", "130"]);
    seed_price(&conn, "AAA", "2024-03-01", "130");

    let txs = utils::load_transactions(&conn).unwrap();
    let prices = utils::load_prices(&conn).unwrap();
    let positions = compute_positions(&txs, &last_price_map(&prices), None);

    assert_eq!(positions.len(), 1);
    let p = &positions[0];
    assert_eq!(p.quantity, d("5"));
    assert_eq!(p.avg_cost, d("110"));
    assert_eq!(p.last, d("130"));
    assert_eq!(p.value, d("650"));
    assert_eq!(p.pnl_abs, d("100"));
    assert_eq!(p.held_since, Some("2024-01-01".parse().unwrap()));
}

#[test]
fn full_exit_drops_position_and_resets_basis() {
    let mut conn = setup();
    run(&mut conn, &["folionav", "cash", "deposit", "--portfolio", "main", "--amount", "2500"]);
    run(&mut conn, &["folionav", "tx", "buy", "--portfolio", "main", "--date", "2024-01-01", "--ticker", "AAA", "--quantity", "10", "--price", "100"]);
    run(&mut conn, &["folionav", "tx", "buy", "--portfolio", "main", "--date", "2024-02-01", "--ticker", "AAA", "--quantity", "10", "--price", "120"]);
    run(&mut conn, &["folionav", "tx", "sell", "--portfolio", "main", "--date", "2024-03-01", "--ticker", "AAA", "--quantity", "15", "--price", "130"]);
    run(&mut conn, &["folionav", "tx", "sell", "--portfolio", "main", "--date", "2024-04-01", "--ticker", "AAA", "--quantity", "5", "--price", "130"]);
    seed_price(&conn, "AAA", "2024-04-01", "130");

    let txs = utils::load_transactions(&conn).unwrap();
    let prices = utils::load_prices(&conn).unwrap();
    let positions = compute_positions(&txs, &last_price_map(&prices), None);
    assert!(positions.is_empty());

    // a later buy starts a fresh lot with a fresh holding date
    run(&mut conn, &["folionav", "tx", "buy", "--portfolio", "main", "--date", "2024-05-01", "--ticker", "AAA", "--quantity", "5", "--price", "200"]);
    let txs = utils::load_transactions(&conn).unwrap();
    let positions = compute_positions(&txs, &last_price_map(&prices), None);
    assert_eq!(positions.len(), 1);
    assert_eq!(positions[0].avg_cost, d("200"));
    assert_eq!(positions[0].held_since, Some("2024-05-01".parse().unwrap()));
}

#[test]
fn weights_sum_to_one_across_tickers() {
    let mut conn = setup();
    run(&mut conn, &["folionav", "cash", "deposit", "--portfolio", "main", "--amount", "5000"]);
    run(&mut conn, &["folionav", "tx", "buy", "--portfolio", "main", "--date", "2024-01-01", "--ticker", "AAA", "--quantity", "10", "--price", "100"]);
    run(&mut conn, &["folionav", "tx", "buy", "--portfolio", "main", "--date", "2024-01-01", "--ticker", "BBB", "--quantity", "20", "--price", "50"]);
    seed_price(&conn, "AAA", "2024-01-05", "120");
    seed_price(&conn, "BBB", "2024-01-05", "40");

    let txs = utils::load_transactions(&conn).unwrap();
    let prices = utils::load_prices(&conn).unwrap();
    let positions = compute_positions(&txs, &last_price_map(&prices), None);

    let total_weight: Decimal = positions.iter().map(|p| p.weight).sum();
    assert_eq!(total_weight, Decimal::ONE);
    // descending by market value
    assert_eq!(positions[0].ticker, "AAA");
}

#[test]
fn empty_ledger_yields_empty_outputs() {
    let conn = setup();
    seed_price(&conn, "AAA", "2024-01-05", "120");

    let txs = utils::load_transactions(&conn).unwrap();
    let prices = utils::load_prices(&conn).unwrap();
    assert!(compute_positions(&txs, &last_price_map(&prices), None).is_empty());
    assert!(nav_series(&txs, &forward_fill(&prices), None).is_empty());
}
