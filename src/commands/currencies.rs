// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::Currency;
use crate::utils::{maybe_print_json, parse_currency, pretty_table};
use anyhow::Result;
use rusqlite::{Connection, params};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set", sub)) => {
            let code = parse_currency(sub.get_one::<String>("code").unwrap())?;
            let digits = *sub.get_one::<u32>("digits").unwrap();
            conn.execute(
                "INSERT INTO currencies(code, digits) VALUES (?1, ?2)
                 ON CONFLICT(code) DO UPDATE SET digits=excluded.digits",
                params![code, digits],
            )?;
            println!("{} rounds to {} digits", code, digits);
        }
        Some(("list", sub)) => {
            let mut stmt = conn.prepare("SELECT code, digits FROM currencies ORDER BY code")?;
            let rows = stmt.query_map([], |r| {
                Ok(Currency {
                    code: r.get(0)?,
                    digits: r.get(1)?,
                })
            })?;
            let mut items = Vec::new();
            for row in rows {
                items.push(row?);
            }
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &items)? {
                let data = items
                    .into_iter()
                    .map(|c| vec![c.code, c.digits.to_string()])
                    .collect();
                println!("{}", pretty_table(&["Currency", "Digits"], data));
            }
        }
        _ => {}
    }
    Ok(())
}
