// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use folionav::{cli, commands::portfolios, db, utils};
use rusqlite::Connection;
use rust_decimal::Decimal;

fn setup() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&mut conn).unwrap();
    conn
}

fn run(conn: &Connection, args: &[&str]) -> anyhow::Result<()> {
    let matches = cli::build_cli().get_matches_from(args);
    match matches.subcommand() {
        Some(("portfolio", sub)) => portfolios::handle(conn, sub),
        Some(("cash", sub)) => portfolios::handle_cash(conn, sub),
        Some(("config", sub)) => portfolios::handle_config(conn, sub),
        _ => panic!("unhandled subcommand"),
    }
}

fn d(s: &str) -> Decimal {
    Decimal::from_str_exact(s).unwrap()
}

#[test]
fn add_with_opening_cash_sets_balance() {
    let conn = setup();
    run(&conn, &["folionav", "portfolio", "add", "main", "--cash", "250"]).unwrap();
    assert_eq!(utils::portfolio_cash(&conn, "main").unwrap(), d("250"));
}

#[test]
fn duplicate_portfolio_add_fails() {
    let conn = setup();
    run(&conn, &["folionav", "portfolio", "add", "main"]).unwrap();
    let err = run(&conn, &["folionav", "portfolio", "add", "main"]).unwrap_err();
    assert!(err.to_string().contains("Create portfolio 'main'"));
}

#[test]
fn blank_portfolio_name_rejected() {
    let conn = setup();
    assert!(run(&conn, &["folionav", "portfolio", "add", "   "]).is_err());
}

#[test]
fn withdraw_may_overdraw() {
    let conn = setup();
    run(&conn, &["folionav", "cash", "deposit", "--portfolio", "main", "--amount", "100"]).unwrap();
    run(&conn, &["folionav", "cash", "withdraw", "--portfolio", "main", "--amount", "150"]).unwrap();
    assert_eq!(utils::portfolio_cash(&conn, "main").unwrap(), d("-50"));
}

#[test]
fn deposit_creates_the_portfolio_row() {
    let conn = setup();
    run(&conn, &["folionav", "cash", "deposit", "--portfolio", "fresh", "--amount", "10"]).unwrap();
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM portfolios WHERE name='fresh'", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn non_positive_cash_amount_rejected() {
    let conn = setup();
    assert!(run(&conn, &["folionav", "cash", "deposit", "--portfolio", "main", "--amount", "0"]).is_err());
    assert!(run(&conn, &["folionav", "cash", "withdraw", "--portfolio", "main", "--amount", "-5"]).is_err());
}

#[test]
fn config_currency_symbol_roundtrip() {
    let conn = setup();
    assert_eq!(utils::currency_symbol(&conn).unwrap(), "€");
    run(&conn, &["folionav", "config", "currency", "$"]).unwrap();
    assert_eq!(utils::currency_symbol(&conn).unwrap(), "$");
}
