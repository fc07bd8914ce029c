// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::db::{load_report, load_rule_set};
use crate::utils::{has_fx_path, parse_date, pretty_table};
use anyhow::Result;
use rusqlite::Connection;

/// Issues found in the database, as (kind, detail) pairs.
pub fn collect_issues(conn: &Connection) -> Result<Vec<(String, String)>> {
    let mut rows = Vec::new();

    // 1) Currencies rounded with the default precision
    let mut stmt = conn.prepare(
        "SELECT DISTINCT currency FROM analytic_accounts
         WHERE currency NOT IN (SELECT code FROM currencies) ORDER BY currency",
    )?;
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        let c: String = r.get(0)?;
        rows.push(("currency_without_digits".to_string(), c));
    }

    // 2) FX coverage gaps: lines whose company currency can't reach the analytic currency
    let mut stmt2 = conn.prepare(
        "SELECT DISTINCT l.date, c.currency, aa.currency
         FROM analytic_lines l
         JOIN analytic_accounts aa ON aa.id=l.analytic_account_id
         JOIN ledger_accounts la ON la.id=l.ledger_account_id
         JOIN companies c ON c.id=la.company_id
         WHERE c.currency != aa.currency
         ORDER BY l.date",
    )?;
    let mut cur2 = stmt2.query([])?;
    while let Some(r) = cur2.next()? {
        let d: String = r.get(0)?;
        let from: String = r.get(1)?;
        let to: String = r.get(2)?;
        let date = parse_date(&d)?;
        if !has_fx_path(conn, date, &from, &to)? {
            rows.push(("missing_fx".to_string(), format!("{} {}->{}", d, from, to)));
        }
    }

    // 3) Reports whose rules no longer validate
    let mut stmt3 = conn.prepare("SELECT name FROM reports ORDER BY name")?;
    let names = stmt3.query_map([], |r| r.get::<_, String>(0))?;
    for name in names {
        let report = load_report(conn, &name?)?;
        if let Err(e) = load_rule_set(conn, &report)?.validate() {
            rows.push((
                "invalid_rules".to_string(),
                format!("{:#}", super::rules::explain(conn, e)),
            ));
        }
    }
    Ok(rows)
}

pub fn handle(conn: &Connection) -> Result<()> {
    let rows: Vec<Vec<String>> = collect_issues(conn)?
        .into_iter()
        .map(|(k, d)| vec![k, d])
        .collect();
    if rows.is_empty() {
        println!("✅ doctor: no issues found");
    } else {
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}
