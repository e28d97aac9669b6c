// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};

fn output_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print as JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .help("Print as JSON Lines"),
    )
}

fn portfolio_filter() -> Arg {
    Arg::new("portfolio")
        .long("portfolio")
        .action(ArgAction::Append)
        .help("Restrict to a portfolio (repeatable; default all)")
}

fn trade_args(cmd: Command) -> Command {
    cmd.arg(Arg::new("portfolio").long("portfolio").required(true))
        .arg(
            Arg::new("date")
                .long("date")
                .required(true)
                .help("Trade date YYYY-MM-DD"),
        )
        .arg(Arg::new("ticker").long("ticker").required(true))
        .arg(Arg::new("quantity").long("quantity").required(true))
        .arg(Arg::new("price").long("price").required(true))
        .arg(Arg::new("fees").long("fees").default_value("0"))
        .arg(Arg::new("note").long("note"))
}

pub fn build_cli() -> Command {
    clap::command!()
        .subcommand(Command::new("init").about("Create the database and print its location"))
        .subcommand(
            Command::new("portfolio")
                .about("Manage portfolios")
                .subcommand(
                    Command::new("add")
                        .about("Create a portfolio")
                        .arg(Arg::new("name").required(true))
                        .arg(
                            Arg::new("cash")
                                .long("cash")
                                .help("Opening cash deposit"),
                        ),
                )
                .subcommand(output_flags(
                    Command::new("list").about("List portfolios and cash balances"),
                )),
        )
        .subcommand(
            Command::new("cash")
                .about("Move cash in or out of a portfolio")
                .subcommand(
                    Command::new("deposit")
                        .about("Credit cash")
                        .arg(Arg::new("portfolio").long("portfolio").required(true))
                        .arg(
                            Arg::new("amount")
                                .long("amount")
                                .required(true)
                                .allow_negative_numbers(true),
                        ),
                )
                .subcommand(
                    Command::new("withdraw")
                        .about("Debit cash")
                        .arg(Arg::new("portfolio").long("portfolio").required(true))
                        .arg(
                            Arg::new("amount")
                                .long("amount")
                                .required(true)
                                .allow_negative_numbers(true),
                        ),
                ),
        )
        .subcommand(
            Command::new("tx")
                .about("Record and inspect trades")
                .subcommand(trade_args(
                    Command::new("buy").about("Buy shares; debits cash after a balance check"),
                ))
                .subcommand(trade_args(
                    Command::new("sell").about("Sell shares; credits cash"),
                ))
                .subcommand(output_flags(
                    Command::new("list")
                        .about("List trades, most recent first")
                        .arg(portfolio_filter())
                        .arg(Arg::new("ticker").long("ticker"))
                        .arg(
                            Arg::new("limit")
                                .long("limit")
                                .value_parser(value_parser!(usize)),
                        ),
                )),
        )
        .subcommand(output_flags(
            Command::new("positions")
                .about("Current holdings priced at the latest close")
                .arg(portfolio_filter()),
        ))
        .subcommand(output_flags(
            Command::new("nav")
                .about("Daily portfolio value series")
                .arg(portfolio_filter())
                .arg(
                    Arg::new("range")
                        .long("range")
                        .default_value("all")
                        .help("Window: 1w, 1m, 1y or all"),
                ),
        ))
        .subcommand(
            Command::new("dividend")
                .about("Attribute and inspect dividends")
                .subcommand(
                    Command::new("sync")
                        .about("Fetch payment history and credit holdings")
                        .arg(
                            Arg::new("ticker")
                                .long("ticker")
                                .help("Sync a single ticker (default: every ledger ticker)"),
                        ),
                )
                .subcommand(output_flags(
                    Command::new("list")
                        .about("List credited dividends")
                        .arg(Arg::new("portfolio").long("portfolio")),
                ))
                .subcommand(
                    Command::new("rm")
                        .about("Delete a dividend and reverse its cash credit")
                        .arg(Arg::new("id").long("id").required(true)),
                ),
        )
        .subcommand(
            Command::new("price")
                .about("Maintain the local price set")
                .subcommand(
                    Command::new("fetch").about("Pull latest quotes for every ledger ticker"),
                )
                .subcommand(
                    Command::new("backfill")
                        .about("Pull daily close history from the first trade date")
                        .arg(Arg::new("ticker").long("ticker")),
                )
                .subcommand(
                    Command::new("add")
                        .about("Record a close by hand")
                        .arg(Arg::new("ticker").long("ticker").required(true))
                        .arg(Arg::new("date").long("date").required(true))
                        .arg(Arg::new("close").long("close").required(true)),
                )
                .subcommand(output_flags(
                    Command::new("list")
                        .about("List stored closes, most recent first")
                        .arg(Arg::new("ticker").long("ticker"))
                        .arg(
                            Arg::new("limit")
                                .long("limit")
                                .value_parser(value_parser!(usize)),
                        ),
                )),
        )
        .subcommand(output_flags(
            Command::new("quote")
                .about("Fetch one live quote and store it as today's close")
                .arg(Arg::new("ticker").required(true)),
        ))
        .subcommand(
            Command::new("import")
                .about("Bulk-load CSV data")
                .subcommand(
                    Command::new("transactions")
                        .about("CSV: portfolio,date,ticker,side,quantity,price,fees,note")
                        .arg(Arg::new("path").long("path").required(true)),
                )
                .subcommand(
                    Command::new("prices")
                        .about("CSV: ticker,date,close")
                        .arg(Arg::new("path").long("path").required(true)),
                ),
        )
        .subcommand(
            Command::new("export")
                .about("Write ledger data to CSV or JSON")
                .subcommand(export_args(Command::new("transactions")))
                .subcommand(export_args(Command::new("positions")))
                .subcommand(export_args(Command::new("nav")))
                .subcommand(export_args(Command::new("dividends"))),
        )
        .subcommand(
            Command::new("config")
                .about("Display settings")
                .subcommand(
                    Command::new("currency")
                        .about("Set the display currency symbol")
                        .arg(Arg::new("symbol").required(true)),
                ),
        )
        .subcommand(Command::new("doctor").about("Check the ledger for inconsistencies"))
}

fn export_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("format")
            .long("format")
            .default_value("csv")
            .help("csv or json"),
    )
    .arg(Arg::new("out").long("out").required(true))
}
