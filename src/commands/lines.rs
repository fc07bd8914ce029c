// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::utils::{
    id_for_analytic, id_for_company, id_for_ledger, maybe_print_json, parse_date, parse_decimal,
    pretty_table,
};
use anyhow::Result;
use rusqlite::{Connection, params};
use serde::Serialize;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let date = parse_date(sub.get_one::<String>("date").unwrap())?;
    let analytic = sub.get_one::<String>("analytic").unwrap().trim();
    let company = sub.get_one::<String>("company").unwrap().trim();
    let ledger = sub.get_one::<String>("ledger").unwrap().trim();
    let debit = parse_decimal(sub.get_one::<String>("debit").unwrap())?;
    let credit = parse_decimal(sub.get_one::<String>("credit").unwrap())?;

    let analytic_id = id_for_analytic(conn, analytic)?;
    let company_id = id_for_company(conn, company)?;
    let ledger_id = id_for_ledger(conn, company_id, ledger)?;
    conn.execute(
        "INSERT INTO analytic_lines(date, analytic_account_id, ledger_account_id, debit, credit)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            date.to_string(),
            analytic_id,
            ledger_id,
            debit.to_string(),
            credit.to_string()
        ],
    )?;
    println!(
        "Added line {} {} {} (debit {}, credit {})",
        date, analytic, ledger, debit, credit
    );
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct LineRow {
    pub id: i64,
    pub date: String,
    pub analytic: String,
    pub ledger: String,
    pub debit: String,
    pub credit: String,
}

pub fn query_rows(conn: &Connection, sub: &clap::ArgMatches) -> Result<Vec<LineRow>> {
    let limit = *sub.get_one::<usize>("limit").unwrap_or(&50);
    let mut stmt = conn.prepare(
        "SELECT l.id, l.date, aa.name, la.code, l.debit, l.credit
         FROM analytic_lines l
         JOIN analytic_accounts aa ON aa.id=l.analytic_account_id
         JOIN ledger_accounts la ON la.id=l.ledger_account_id
         ORDER BY l.date DESC, l.id DESC
         LIMIT ?1",
    )?;
    let rows = stmt.query_map(params![limit as i64], |r| {
        Ok(LineRow {
            id: r.get(0)?,
            date: r.get(1)?,
            analytic: r.get(2)?,
            ledger: r.get(3)?,
            debit: r.get(4)?,
            credit: r.get(5)?,
        })
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let rows = query_rows(conn, sub)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &rows)? {
        return Ok(());
    }
    let data = rows
        .into_iter()
        .map(|r| {
            vec![
                r.id.to_string(),
                r.date,
                r.analytic,
                r.ledger,
                r.debit,
                r.credit,
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["ID", "Date", "Analytic", "Ledger", "Debit", "Credit"], data)
    );
    Ok(())
}
