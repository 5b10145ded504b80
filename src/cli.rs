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
            .help("Print pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print one JSON object per line"),
    )
}

fn month_arg() -> Arg {
    Arg::new("month")
        .long("month")
        .required(true)
        .help("Year-month as YYYYMM")
}

fn id_arg() -> Arg {
    Arg::new("id")
        .long("id")
        .required(true)
        .value_parser(value_parser!(i64))
}

fn today_arg() -> Arg {
    Arg::new("today")
        .long("today")
        .help("Override today's date (YYYY-MM-DD)")
}

pub fn build_cli() -> Command {
    Command::new("nestegg")
        .about("Household budgeting: annual goals, monthly rollover and budget alerts")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("household")
                .long("household")
                .global(true)
                .help("Household name (defaults to the active household)"),
        )
        .subcommand(Command::new("init").about("Create the database"))
        .subcommand(
            Command::new("household")
                .about("Manage households")
                .subcommand(
                    Command::new("add").arg(Arg::new("name").long("name").required(true)),
                )
                .subcommand(Command::new("list"))
                .subcommand(
                    Command::new("use")
                        .about("Make a household the default")
                        .arg(Arg::new("name").long("name").required(true)),
                ),
        )
        .subcommand(
            Command::new("type")
                .about("Income/expense types")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(
                            Arg::new("income")
                                .long("income")
                                .action(ArgAction::SetTrue)
                                .help("Transactions of this type are income"),
                        ),
                )
                .subcommand(Command::new("list")),
        )
        .subcommand(
            Command::new("category")
                .about("Spending and income categories")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(Arg::new("type").long("type").required(true)),
                )
                .subcommand(Command::new("list"))
                .subcommand(Command::new("rm").arg(Arg::new("name").long("name").required(true))),
        )
        .subcommand(
            Command::new("tx")
                .about("Record and list transactions")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("date").long("date").required(true))
                        .arg(Arg::new("category").long("category").required(true))
                        .arg(
                            Arg::new("amount")
                                .long("amount")
                                .required(true)
                                .allow_hyphen_values(true)
                                .help("Signed amount: income positive, expense negative"),
                        )
                        .arg(Arg::new("description").long("description"))
                        .arg(
                            Arg::new("installments")
                                .long("installments")
                                .value_parser(value_parser!(u32))
                                .help("Split into N monthly installments"),
                        ),
                )
                .subcommand(
                    Command::new("rm")
                        .about("Delete a transaction")
                        .arg(id_arg())
                        .arg(
                            Arg::new("group")
                                .long("group")
                                .action(ArgAction::SetTrue)
                                .help("Delete every installment of its group"),
                        ),
                )
                .subcommand(
                    Command::new("edit")
                        .about("Change a transaction's amount, category or description")
                        .arg(id_arg())
                        .arg(Arg::new("category").long("category"))
                        .arg(
                            Arg::new("amount")
                                .long("amount")
                                .allow_hyphen_values(true)
                                .help("New amount; with --group, the new total"),
                        )
                        .arg(Arg::new("description").long("description"))
                        .arg(
                            Arg::new("installments")
                                .long("installments")
                                .value_parser(value_parser!(u32))
                                .requires("group")
                                .help("New installment count for the group"),
                        )
                        .arg(
                            Arg::new("group")
                                .long("group")
                                .action(ArgAction::SetTrue)
                                .help("Regenerate the whole installment group"),
                        ),
                )
                .subcommand(json_flags(
                    Command::new("list")
                        .arg(Arg::new("month").long("month"))
                        .arg(Arg::new("category").long("category"))
                        .arg(
                            Arg::new("limit")
                                .long("limit")
                                .value_parser(value_parser!(usize)),
                        ),
                )),
        )
        .subcommand(
            Command::new("annual")
                .about("Annual estimates per category")
                .subcommand(
                    Command::new("set")
                        .arg(
                            Arg::new("year")
                                .long("year")
                                .required(true)
                                .value_parser(value_parser!(i32)),
                        )
                        .arg(Arg::new("category").long("category").required(true))
                        .arg(Arg::new("amount").long("amount").required(true)),
                )
                .subcommand(json_flags(
                    Command::new("list").arg(
                        Arg::new("year")
                            .long("year")
                            .required(true)
                            .value_parser(value_parser!(i32)),
                    ),
                )),
        )
        .subcommand(
            Command::new("goal").about("Monthly goal overrides").subcommand(
                Command::new("set")
                    .arg(month_arg())
                    .arg(Arg::new("category").long("category").required(true))
                    .arg(Arg::new("amount").long("amount").required(true)),
            ),
        )
        .subcommand(json_flags(
            Command::new("perf")
                .about("Budget performance for a month")
                .arg(month_arg()),
        ))
        .subcommand(json_flags(
            Command::new("balance")
                .about("Funds on hand plus booked and planned flows for a month")
                .arg(month_arg())
                .arg(
                    Arg::new("available")
                        .long("available")
                        .allow_hyphen_values(true)
                        .help("Funds available at the start of the month (default 0)"),
                ),
        ))
        .subcommand(
            Command::new("close")
                .about("Close a month and carry balances into the next one")
                .arg(month_arg()),
        )
        .subcommand(
            Command::new("status")
                .about("Show whether last month still needs closing")
                .arg(today_arg()),
        )
        .subcommand(json_flags(
            Command::new("alerts")
                .about("Budget alerts for a month")
                .arg(month_arg())
                .arg(
                    Arg::new("notify")
                        .long("notify")
                        .action(ArgAction::SetTrue)
                        .help("Send the alerts as a notification"),
                ),
        ))
        .subcommand(
            Command::new("planned")
                .about("Planned payments")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("date").long("date").required(true))
                        .arg(Arg::new("description").long("description").required(true))
                        .arg(
                            Arg::new("amount")
                                .long("amount")
                                .required(true)
                                .allow_hyphen_values(true),
                        )
                        .arg(Arg::new("category").long("category")),
                )
                .subcommand(json_flags(
                    Command::new("list")
                        .arg(Arg::new("from").long("from"))
                        .arg(Arg::new("to").long("to")),
                ))
                .subcommand(
                    Command::new("pay")
                        .about("Book a planned payment as paid on its due date")
                        .arg(id_arg()),
                )
                .subcommand(Command::new("rm").about("Delete a planned payment").arg(id_arg()))
                .subcommand(
                    Command::new("due").arg(today_arg()).arg(
                        Arg::new("notify")
                            .long("notify")
                            .action(ArgAction::SetTrue),
                    ),
                ),
        )
        .subcommand(
            Command::new("export").about("Export data").subcommand(
                Command::new("performance")
                    .arg(month_arg())
                    .arg(
                        Arg::new("format")
                            .long("format")
                            .default_value("csv")
                            .help("csv or json"),
                    )
                    .arg(Arg::new("out").long("out").required(true)),
            ),
        )
        .subcommand(
            Command::new("config")
                .about("Read and change settings")
                .subcommand(Command::new("get").arg(Arg::new("key").long("key").required(true)))
                .subcommand(
                    Command::new("set")
                        .arg(Arg::new("key").long("key").required(true))
                        .arg(Arg::new("value").long("value").required(true)),
                )
                .subcommand(Command::new("list")),
        )
        .subcommand(Command::new("doctor").about("Report orphaned data"))
}

#[cfg(test)]
mod tests {
    #[test]
    fn cli_is_well_formed() {
        super::build_cli().debug_assert();
    }
}
