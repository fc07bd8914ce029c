// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::AnalyticAccount;
use crate::utils::{maybe_print_json, parse_currency, pretty_table};
use anyhow::{Result, bail};
use rusqlite::{Connection, params};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap().trim();
            let ccy = parse_currency(sub.get_one::<String>("currency").unwrap())?;
            let kind = if sub.get_flag("view") { "view" } else { "normal" };
            let active = !sub.get_flag("inactive");
            conn.execute(
                "INSERT INTO analytic_accounts(name, kind, currency, active) VALUES (?1, ?2, ?3, ?4)",
                params![name, kind, ccy, active],
            )?;
            println!("Added analytic account '{}' ({}, {})", name, kind, ccy);
        }
        Some(("list", sub)) => {
            let items = list(conn)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &items)? {
                let data = items
                    .into_iter()
                    .map(|a| {
                        vec![
                            a.name,
                            a.kind,
                            a.currency,
                            if a.active { "yes" } else { "no" }.to_string(),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["Name", "Kind", "Currency", "Active"], data)
                );
            }
        }
        Some(("rm", sub)) => {
            let name = sub.get_one::<String>("name").unwrap().trim();
            let n = conn.execute("DELETE FROM analytic_accounts WHERE name=?1", params![name])?;
            if n == 0 {
                bail!("Analytic account '{}' not found", name);
            }
            println!("Removed analytic account '{}'", name);
        }
        _ => {}
    }
    Ok(())
}

pub fn list(conn: &Connection) -> Result<Vec<AnalyticAccount>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, kind, currency, active FROM analytic_accounts ORDER BY name",
    )?;
    let rows = stmt.query_map([], |r| {
        Ok(AnalyticAccount {
            id: r.get(0)?,
            name: r.get(1)?,
            kind: r.get(2)?,
            currency: r.get(3)?,
            active: r.get(4)?,
        })
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}
