// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;

use folionav::marketdata::YahooClient;
use folionav::{cli, commands, db, utils};

fn main() -> Result<()> {
    let cli = cli::build_cli();
    let matches = cli.get_matches();

    let mut conn = db::open_or_init()?;

    match matches.subcommand() {
        Some(("init", _)) => {
            println!("Database initialized at {}", db::db_path()?.display());
        }
        Some(("portfolio", sub)) => commands::portfolios::handle(&conn, sub)?,
        Some(("cash", sub)) => commands::portfolios::handle_cash(&conn, sub)?,
        Some(("tx", sub)) => commands::trades::handle(&mut conn, sub)?,
        Some(("positions", sub)) => commands::positions::handle(&conn, sub)?,
        Some(("nav", sub)) => commands::nav::handle(&conn, sub)?,
        Some(("dividend", sub)) => {
            let market = YahooClient::new(utils::http_client()?);
            commands::dividends::handle(&mut conn, sub, &market)?
        }
        Some(("price", sub)) => {
            let market = YahooClient::new(utils::http_client()?);
            commands::prices::handle(&mut conn, sub, &market)?
        }
        Some(("quote", sub)) => {
            let market = YahooClient::new(utils::http_client()?);
            commands::prices::handle_quote(&conn, sub, &market)?
        }
        Some(("import", sub)) => commands::importer::handle(&mut conn, sub)?,
        Some(("export", sub)) => commands::exporter::handle(&conn, sub)?,
        Some(("config", sub)) => commands::portfolios::handle_config(&conn, sub)?,
        Some(("doctor", _)) => commands::doctor::handle(&conn)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
