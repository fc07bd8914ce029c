// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::utils::{
    get_base_currency, get_spread_max_depth, parse_currency, pretty_table, set_setting,
};
use anyhow::{Context, Result, bail};
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set", sub)) => {
            let key = sub.get_one::<String>("key").unwrap();
            let raw = sub.get_one::<String>("value").unwrap().trim();
            let value = match key.as_str() {
                "base_currency" => parse_currency(raw)?,
                "spread_max_depth" => {
                    let depth = raw
                        .parse::<usize>()
                        .with_context(|| format!("Invalid depth '{}'", raw))?;
                    if depth == 0 {
                        bail!("spread_max_depth must be at least 1");
                    }
                    depth.to_string()
                }
                other => bail!("Unknown setting '{}'", other),
            };
            set_setting(conn, key, &value)?;
            println!("{} = {}", key, value);
        }
        Some(("list", _)) => {
            let data = vec![
                vec!["base_currency".to_string(), get_base_currency(conn)?],
                vec![
                    "spread_max_depth".to_string(),
                    get_spread_max_depth(conn)?.to_string(),
                ],
            ];
            println!("{}", pretty_table(&["Key", "Value"], data));
        }
        _ => {}
    }
    Ok(())
}
