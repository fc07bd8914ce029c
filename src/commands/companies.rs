// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::Company;
use crate::utils::{maybe_print_json, parse_currency, pretty_table};
use anyhow::Result;
use rusqlite::{Connection, params};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap().trim();
            let ccy = parse_currency(sub.get_one::<String>("currency").unwrap())?;
            conn.execute(
                "INSERT INTO companies(name, currency) VALUES (?1, ?2)",
                params![name, ccy],
            )?;
            println!("Added company '{}' ({})", name, ccy);
        }
        Some(("list", sub)) => {
            let items = list(conn)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &items)? {
                let data = items
                    .into_iter()
                    .map(|c| vec![c.name, c.currency])
                    .collect();
                println!("{}", pretty_table(&["Company", "Currency"], data));
            }
        }
        _ => {}
    }
    Ok(())
}

pub fn list(conn: &Connection) -> Result<Vec<Company>> {
    let mut stmt = conn.prepare("SELECT id, name, currency FROM companies ORDER BY name")?;
    let rows = stmt.query_map([], |r| {
        Ok(Company {
            id: r.get(0)?,
            name: r.get(1)?,
            currency: r.get(2)?,
        })
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}
