// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use folionav::{cli, commands::portfolios, commands::trades, db, utils};
use rusqlite::Connection;
use rust_decimal::Decimal;

fn setup() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&mut conn).unwrap();
    conn
}

fn run_cash(conn: &Connection, args: &[&str]) -> anyhow::Result<()> {
    let matches = cli::build_cli().get_matches_from(args);
    if let Some(("cash", sub)) = matches.subcommand() {
        portfolios::handle_cash(conn, sub)
    } else {
        panic!("no cash subcommand");
    }
}

fn run_tx(conn: &mut Connection, args: &[&str]) -> anyhow::Result<()> {
    let matches = cli::build_cli().get_matches_from(args);
    if let Some(("tx", sub)) = matches.subcommand() {
        trades::handle(conn, sub)
    } else {
        panic!("no tx subcommand");
    }
}

fn d(s: &str) -> Decimal {
    Decimal::from_str_exact(s).unwrap()
}

#[test]
fn buy_debits_cash_and_records_trade() {
    let mut conn = setup();
    run_cash(
        &conn,
        &["folionav", "cash", "deposit", "--portfolio", "main", "--amount", "1000"],
    )
    .unwrap();
    run_tx(
        &mut conn,
        &[
            "folionav", "tx", "buy", "--portfolio", "main", "--date", "2024-01-02",
            "--ticker", "AAA", "--quantity", "5", "--price", "100", "--fees", "10",
        ],
    )
    .unwrap();

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM transactions", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 1);
    assert_eq!(utils::portfolio_cash(&conn, "main").unwrap(), d("490"));
}

#[test]
fn buy_rejected_when_cash_short() {
    let mut conn = setup();
    run_cash(
        &conn,
        &["folionav", "cash", "deposit", "--portfolio", "main", "--amount", "100"],
    )
    .unwrap();
    let err = run_tx(
        &mut conn,
        &[
            "folionav", "tx", "buy", "--portfolio", "main", "--date", "2024-01-02",
            "--ticker", "AAA", "--quantity", "5", "--price", "100",
        ],
    );
    assert!(err.is_err());

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM transactions", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 0);
    assert_eq!(utils::portfolio_cash(&conn, "main").unwrap(), d("100"));
}

#[test]
fn sell_credits_cash_without_holdings_check() {
    let mut conn = setup();
    run_tx(
        &mut conn,
        &[
            "folionav", "tx", "sell", "--portfolio", "fresh", "--date", "2024-01-02",
            "--ticker", "AAA", "--quantity", "3", "--price", "50", "--fees", "1",
        ],
    )
    .unwrap();

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM transactions", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 1);
    assert_eq!(utils::portfolio_cash(&conn, "fresh").unwrap(), d("149"));
}

#[test]
fn tickers_are_normalized_to_uppercase() {
    let mut conn = setup();
    run_cash(
        &conn,
        &["folionav", "cash", "deposit", "--portfolio", "main", "--amount", "1000"],
    )
    .unwrap();
    run_tx(
        &mut conn,
        &[
            "folionav", "tx", "buy", "--portfolio", "main", "--date", "2024-01-02",
            "--ticker", "aapl", "--quantity", "1", "--price", "10",
        ],
    )
    .unwrap();

    let ticker: String = conn
        .query_row("SELECT ticker FROM transactions", [], |r| r.get(0))
        .unwrap();
    assert_eq!(ticker, "AAPL");
}

#[test]
fn list_limit_respected() {
    let mut conn = setup();
    run_cash(
        &conn,
        &["folionav", "cash", "deposit", "--portfolio", "main", "--amount", "10000"],
    )
    .unwrap();
    for day in 1..=3 {
        run_tx(
            &mut conn,
            &[
                "folionav", "tx", "buy", "--portfolio", "main",
                "--date", &format!("2024-01-0{}", day),
                "--ticker", "AAA", "--quantity", "1", "--price", "10",
            ],
        )
        .unwrap();
    }

    let cli = cli::build_cli();
    let matches = cli.get_matches_from(["folionav", "tx", "list", "--limit", "2"]);
    if let Some(("tx", tx_m)) = matches.subcommand() {
        if let Some(("list", list_m)) = tx_m.subcommand() {
            let rows = trades::query_rows(&conn, list_m).unwrap();
            assert_eq!(rows.len(), 2);
            assert_eq!(rows[0].date, "2024-01-03");
        } else {
            panic!("no list subcommand");
        }
    } else {
        panic!("no tx subcommand");
    }
}

#[test]
fn list_filters_by_portfolio() {
    let mut conn = setup();
    for name in ["alpha", "beta"] {
        run_cash(
            &conn,
            &["folionav", "cash", "deposit", "--portfolio", name, "--amount", "1000"],
        )
        .unwrap();
        run_tx(
            &mut conn,
            &[
                "folionav", "tx", "buy", "--portfolio", name, "--date", "2024-01-02",
                "--ticker", "AAA", "--quantity", "1", "--price", "10",
            ],
        )
        .unwrap();
    }

    let cli = cli::build_cli();
    let matches =
        cli.get_matches_from(["folionav", "tx", "list", "--portfolio", "beta"]);
    if let Some(("tx", tx_m)) = matches.subcommand() {
        if let Some(("list", list_m)) = tx_m.subcommand() {
            let rows = trades::query_rows(&conn, list_m).unwrap();
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0].portfolio, "beta");
        } else {
            panic!("no list subcommand");
        }
    } else {
        panic!("no tx subcommand");
    }
}
