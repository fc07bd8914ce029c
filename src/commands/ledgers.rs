// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::LedgerAccount;
use crate::utils::{id_for_company, maybe_print_json, pretty_table};
use anyhow::{Result, bail};
use rusqlite::{Connection, params};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let company = sub.get_one::<String>("company").unwrap().trim();
            let code = sub.get_one::<String>("code").unwrap().trim();
            let name = sub.get_one::<String>("name").unwrap().trim();
            let kind = sub.get_one::<String>("kind").unwrap();
            let company_id = id_for_company(conn, company)?;
            conn.execute(
                "INSERT INTO ledger_accounts(company_id, code, name, kind) VALUES (?1, ?2, ?3, ?4)",
                params![company_id, code, name, kind],
            )?;
            println!("Added ledger account {} - {} ({})", code, name, kind);
        }
        Some(("list", sub)) => {
            let company_id = match sub.get_one::<String>("company") {
                Some(c) => Some(id_for_company(conn, c.trim())?),
                None => None,
            };
            let items = list(conn, company_id)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &items)? {
                let data = items
                    .into_iter()
                    .map(|l| vec![l.code, l.name, l.kind])
                    .collect();
                println!("{}", pretty_table(&["Code", "Name", "Kind"], data));
            }
        }
        Some(("rm", sub)) => {
            let company_id = id_for_company(conn, sub.get_one::<String>("company").unwrap().trim())?;
            let code = sub.get_one::<String>("code").unwrap().trim();
            let n = conn.execute(
                "DELETE FROM ledger_accounts WHERE company_id=?1 AND code=?2",
                params![company_id, code],
            )?;
            if n == 0 {
                bail!("Ledger account '{}' not found", code);
            }
            println!("Removed ledger account {}", code);
        }
        _ => {}
    }
    Ok(())
}

pub fn list(conn: &Connection, company_id: Option<i64>) -> Result<Vec<LedgerAccount>> {
    let mut stmt = conn.prepare(
        "SELECT id, company_id, code, name, kind FROM ledger_accounts
         WHERE ?1 IS NULL OR company_id=?1
         ORDER BY code, name",
    )?;
    let rows = stmt.query_map(params![company_id], |r| {
        Ok(LedgerAccount {
            id: r.get(0)?,
            company_id: r.get(1)?,
            code: r.get(2)?,
            name: r.get(3)?,
            kind: r.get(4)?,
        })
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}
