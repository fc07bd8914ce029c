// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::db::{load_report, load_rule_set};
use crate::utils::{analytic_name, id_for_analytic, maybe_print_json, parse_decimal, pretty_table};
use anyhow::Result;
use rusqlite::Connection;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct SpreadRow {
    pub account: String,
    pub amount: String,
}

pub fn handle(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let rows = query_rows(conn, sub)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &rows)? {
        return Ok(());
    }
    let data = rows.into_iter().map(|r| vec![r.account, r.amount]).collect();
    println!("{}", pretty_table(&["Account", "Amount"], data));
    Ok(())
}

/// Leaf accounts and amounts `--amount` ends up on when spread from
/// `--account` with the rules of `--report`.
pub fn query_rows(conn: &Connection, sub: &clap::ArgMatches) -> Result<Vec<SpreadRow>> {
    let report = load_report(conn, sub.get_one::<String>("report").unwrap().trim())?;
    let account = id_for_analytic(conn, sub.get_one::<String>("account").unwrap().trim())?;
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
    let set = load_rule_set(conn, &report)?;
    let allocation = set
        .spread(account, amount)
        .map_err(|e| super::rules::explain(conn, e))?;
    let mut out = Vec::with_capacity(allocation.len());
    for (id, v) in allocation {
        out.push(SpreadRow {
            account: analytic_name(conn, id)?,
            amount: format!("{:.2}", v),
        });
    }
    Ok(out)
}
