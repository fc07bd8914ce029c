// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print as pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print as JSON lines"),
    )
}

fn report_arg() -> Arg {
    Arg::new("report")
        .long("report")
        .required(true)
        .help("Report name")
}

pub fn build_cli() -> Command {
    Command::new("anadist")
        .about("Analytic distribution reports: spread cost-center balances by allocation rules")
        .version(clap::crate_version!())
        .subcommand(Command::new("init").about("Initialize the database"))
        .subcommand(
            Command::new("company")
                .about("Manage companies")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(Arg::new("currency").long("currency").required(true)),
                )
                .subcommand(json_flags(Command::new("list"))),
        )
        .subcommand(
            Command::new("currency")
                .about("Manage currency precision")
                .subcommand(
                    Command::new("set")
                        .arg(Arg::new("code").long("code").required(true))
                        .arg(
                            Arg::new("digits")
                                .long("digits")
                                .required(true)
                                .value_parser(value_parser!(u32).range(0..=8)),
                        ),
                )
                .subcommand(json_flags(Command::new("list"))),
        )
        .subcommand(
            Command::new("analytic")
                .about("Manage analytic accounts (cost centers)")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(Arg::new("currency").long("currency").required(true))
                        .arg(
                            Arg::new("view")
                                .long("view")
                                .action(ArgAction::SetTrue)
                                .help("Grouping account that never carries lines"),
                        )
                        .arg(
                            Arg::new("inactive")
                                .long("inactive")
                                .action(ArgAction::SetTrue),
                        ),
                )
                .subcommand(json_flags(Command::new("list")))
                .subcommand(Command::new("rm").arg(Arg::new("name").long("name").required(true))),
        )
        .subcommand(
            Command::new("ledger")
                .about("Manage general ledger accounts")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("company").long("company").required(true))
                        .arg(Arg::new("code").long("code").required(true))
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(
                            Arg::new("kind")
                                .long("kind")
                                .required(true)
                                .value_parser(["expense", "revenue", "other"]),
                        ),
                )
                .subcommand(json_flags(
                    Command::new("list").arg(Arg::new("company").long("company")),
                ))
                .subcommand(
                    Command::new("rm")
                        .arg(Arg::new("company").long("company").required(true))
                        .arg(Arg::new("code").long("code").required(true)),
                ),
        )
        .subcommand(
            Command::new("line")
                .about("Record analytic lines")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("date").long("date").required(true))
                        .arg(Arg::new("analytic").long("analytic").required(true))
                        .arg(Arg::new("company").long("company").required(true))
                        .arg(Arg::new("ledger").long("ledger").required(true).help("Ledger account code"))
                        .arg(Arg::new("debit").long("debit").default_value("0"))
                        .arg(Arg::new("credit").long("credit").default_value("0")),
                )
                .subcommand(json_flags(
                    Command::new("list").arg(
                        Arg::new("limit")
                            .long("limit")
                            .value_parser(value_parser!(usize))
                            .default_value("50"),
                    ),
                )),
        )
        .subcommand(
            Command::new("import")
                .about("Import data from CSV")
                .subcommand(
                    Command::new("lines")
                        .about("CSV columns: date,analytic,company,ledger,debit,credit")
                        .arg(Arg::new("path").long("path").required(true)),
                ),
        )
        .subcommand(
            Command::new("report")
                .about("Manage distribution reports")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(Arg::new("company").long("company").required(true))
                        .arg(Arg::new("start").long("start").required(true))
                        .arg(Arg::new("end").long("end").required(true)),
                )
                .subcommand(json_flags(Command::new("list")))
                .subcommand(Command::new("rm").arg(Arg::new("name").long("name").required(true)))
                .subcommand(json_flags(
                    Command::new("show")
                        .about("Compute the distribution grid")
                        .arg(Arg::new("name").long("name").required(true)),
                )),
        )
        .subcommand(
            Command::new("rule")
                .about("Manage allocation rules of a report")
                .subcommand(
                    Command::new("add")
                        .arg(report_arg())
                        .arg(Arg::new("source").long("source").required(true))
                        .arg(Arg::new("target").long("target").required(true))
                        .arg(Arg::new("amount").long("amount").required(true).help("Weight of this rule"))
                        .arg(
                            Arg::new("sequence")
                                .long("sequence")
                                .value_parser(value_parser!(i64)),
                        ),
                )
                .subcommand(json_flags(Command::new("list").arg(report_arg())))
                .subcommand(Command::new("rm").arg(Arg::new("id").long("id").required(true)))
                .subcommand(
                    Command::new("check").arg(report_arg()).arg(
                        Arg::new("graph")
                            .long("graph")
                            .action(ArgAction::SetTrue)
                            .help("Order-independent cycle detection instead of the stored-order scan"),
                    ),
                )
                .subcommand(json_flags(Command::new("ratios").arg(report_arg()))),
        )
        .subcommand(json_flags(
            Command::new("spread")
                .about("Preview how an amount spreads from one analytic account")
                .arg(report_arg())
                .arg(Arg::new("account").long("account").required(true))
                .arg(
                    Arg::new("amount")
                        .long("amount")
                        .required(true)
                        .allow_hyphen_values(true),
                ),
        ))
        .subcommand(
            Command::new("export")
                .about("Export a distribution report")
                .subcommand(
                    Command::new("distribution")
                        .arg(report_arg())
                        .arg(
                            Arg::new("format")
                                .long("format")
                                .default_value("csv")
                                .help("csv|json"),
                        )
                        .arg(Arg::new("out").long("out").required(true)),
                ),
        )
        .subcommand(
            Command::new("fx")
                .about("Foreign exchange rates")
                .subcommand(Command::new("set-base").arg(Arg::new("currency").long("currency").required(true)))
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("date").long("date").required(true))
                        .arg(Arg::new("base").long("base").required(true))
                        .arg(Arg::new("quote").long("quote").required(true))
                        .arg(Arg::new("rate").long("rate").required(true)),
                )
                .subcommand(
                    Command::new("fetch").arg(
                        Arg::new("days")
                            .long("days")
                            .value_parser(value_parser!(usize))
                            .default_value("120"),
                    ),
                )
                .subcommand(json_flags(
                    Command::new("list")
                        .arg(
                            Arg::new("currency")
                                .long("currency")
                                .help("Only rates with this base or quote currency"),
                        )
                        .arg(
                            Arg::new("limit")
                                .long("limit")
                                .value_parser(value_parser!(usize))
                                .default_value("50"),
                        ),
                ))
                .subcommand(
                    Command::new("convert")
                        .arg(Arg::new("date").long("date").required(true))
                        .arg(
                            Arg::new("amount")
                                .long("amount")
                                .required(true)
                                .allow_hyphen_values(true),
                        )
                        .arg(Arg::new("from").long("from").required(true))
                        .arg(Arg::new("to").long("to").required(true)),
                ),
        )
        .subcommand(
            Command::new("settings")
                .about("Runtime settings")
                .subcommand(
                    Command::new("set")
                        .arg(
                            Arg::new("key")
                                .long("key")
                                .required(true)
                                .value_parser(["base_currency", "spread_max_depth"]),
                        )
                        .arg(Arg::new("value").long("value").required(true)),
                )
                .subcommand(Command::new("list")),
        )
        .subcommand(Command::new("doctor").about("Check data consistency"))
}
