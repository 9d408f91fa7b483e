// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};

fn json_flag() -> Arg {
    Arg::new("json")
        .long("json")
        .action(ArgAction::SetTrue)
        .help("Print the JSON payload instead of a table")
}

fn type_arg() -> Arg {
    Arg::new("type")
        .long("type")
        .short('t')
        .value_parser(["EXPENSE", "INCOME"])
        .ignore_case(true)
        .help("Transaction type")
}

fn tx_fields(cmd: Command, required: bool) -> Command {
    cmd.arg(
        Arg::new("amount")
            .long("amount")
            .required(required)
            .allow_hyphen_values(true),
    )
    .arg(if required {
        type_arg().default_value("EXPENSE")
    } else {
        type_arg()
    })
    .arg(
        Arg::new("category")
            .long("category")
            .short('c')
            .required(required)
            .help("Category name"),
    )
    .arg(Arg::new("date").long("date").help("YYYY-MM-DD, defaults to today"))
    .arg(Arg::new("note").long("note"))
}

pub fn build_cli() -> Command {
    Command::new("spendlog")
        .about("Personal expense and income tracker")
        .version(clap::crate_version!())
        .arg(
            Arg::new("db")
                .long("db")
                .global(true)
                .help("Path to the SQLite database (overrides SPENDLOG_DB)"),
        )
        .subcommand(Command::new("init").about("Create the database"))
        .subcommand(
            Command::new("category")
                .about("Manage categories")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(type_arg().default_value("EXPENSE")),
                )
                .subcommand(Command::new("list").arg(type_arg()).arg(json_flag()))
                .subcommand(
                    Command::new("rename")
                        .arg(
                            Arg::new("id")
                                .long("id")
                                .required(true)
                                .value_parser(value_parser!(i64)),
                        )
                        .arg(Arg::new("name").long("name").required(true)),
                )
                .subcommand(
                    Command::new("rm").arg(
                        Arg::new("id")
                            .long("id")
                            .required(true)
                            .value_parser(value_parser!(i64)),
                    ),
                ),
        )
        .subcommand(
            Command::new("tx")
                .about("Record and browse transactions")
                .subcommand(tx_fields(Command::new("add"), true))
                .subcommand(
                    Command::new("list")
                        .arg(
                            Arg::new("page")
                                .long("page")
                                .value_parser(value_parser!(u32)),
                        )
                        .arg(
                            Arg::new("limit")
                                .long("limit")
                                .value_parser(value_parser!(u32)),
                        )
                        .arg(type_arg())
                        .arg(
                            Arg::new("today")
                                .long("today")
                                .action(ArgAction::SetTrue)
                                .help("Only transactions dated today"),
                        )
                        .arg(json_flag()),
                )
                .subcommand(
                    Command::new("show")
                        .arg(
                            Arg::new("id")
                                .long("id")
                                .required(true)
                                .value_parser(value_parser!(i64)),
                        )
                        .arg(json_flag()),
                )
                .subcommand(tx_fields(
                    Command::new("edit").arg(
                        Arg::new("id")
                            .long("id")
                            .required(true)
                            .value_parser(value_parser!(i64)),
                    ),
                    false,
                ))
                .subcommand(
                    Command::new("rm").arg(
                        Arg::new("id")
                            .long("id")
                            .required(true)
                            .value_parser(value_parser!(i64)),
                    ),
                ),
        )
        .subcommand(
            Command::new("stats")
                .about("Monthly or yearly statistics")
                .arg(Arg::new("year").long("year").required(true))
                .arg(Arg::new("month").long("month"))
                .arg(
                    Arg::new("mode")
                        .long("mode")
                        .value_parser(["monthly", "yearly"])
                        .default_value("monthly"),
                )
                .arg(
                    Arg::new("view")
                        .long("view")
                        .value_parser(["summary", "breakdown", "daily_avg"]),
                )
                .arg(type_arg())
                .arg(json_flag()),
        )
        .subcommand(
            Command::new("config")
                .about("Show or change settings")
                .subcommand(Command::new("show"))
                .subcommand(
                    Command::new("set-currency")
                        .arg(Arg::new("currency").long("currency").required(true)),
                ),
        )
        .subcommand(
            Command::new("serve").about("Run the HTTP API").arg(
                Arg::new("addr")
                    .long("addr")
                    .default_value("127.0.0.1:3000")
                    .value_parser(value_parser!(std::net::SocketAddr)),
            ),
        )
}
