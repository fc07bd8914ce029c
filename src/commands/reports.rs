// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::db::load_report;
use crate::distribution;
use crate::utils::{id_for_company, maybe_print_json, parse_date, pretty_table};
use anyhow::{Result, bail};
use rusqlite::{Connection, params};
use serde::Serialize;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("rm", sub)) => {
            let name = sub.get_one::<String>("name").unwrap().trim();
            let n = conn.execute("DELETE FROM reports WHERE name=?1", params![name])?;
            if n == 0 {
                bail!("Report '{}' not found", name);
            }
            println!("Removed report '{}' and its rules", name);
        }
        Some(("show", sub)) => show(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let name = sub.get_one::<String>("name").unwrap().trim();
    let company = sub.get_one::<String>("company").unwrap().trim();
    let start = parse_date(sub.get_one::<String>("start").unwrap())?;
    let end = parse_date(sub.get_one::<String>("end").unwrap())?;
    if end < start {
        bail!("Report end date {} is before start date {}", end, start);
    }
    let company_id = id_for_company(conn, company)?;
    conn.execute(
        "INSERT INTO reports(name, company_id, start_date, end_date) VALUES (?1, ?2, ?3, ?4)",
        params![name, company_id, start.to_string(), end.to_string()],
    )?;
    println!("Added report '{}' for {} ({} .. {})", name, company, start, end);
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct ReportRow {
    pub name: String,
    pub company: String,
    pub start_date: String,
    pub end_date: String,
    pub rules: i64,
}

pub fn query_rows(conn: &Connection) -> Result<Vec<ReportRow>> {
    let mut stmt = conn.prepare(
        "SELECT r.name, c.name, r.start_date, r.end_date,
                (SELECT COUNT(*) FROM report_rules rr WHERE rr.report_id=r.id)
         FROM reports r JOIN companies c ON c.id=r.company_id
         ORDER BY r.name",
    )?;
    let rows = stmt.query_map([], |r| {
        Ok(ReportRow {
            name: r.get(0)?,
            company: r.get(1)?,
            start_date: r.get(2)?,
            end_date: r.get(3)?,
            rules: r.get(4)?,
        })
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let rows = query_rows(conn)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &rows)? {
        return Ok(());
    }
    let data = rows
        .into_iter()
        .map(|r| vec![r.name, r.company, r.start_date, r.end_date, r.rules.to_string()])
        .collect();
    println!(
        "{}",
        pretty_table(&["Report", "Company", "Start", "End", "Rules"], data)
    );
    Ok(())
}

fn show(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let report = load_report(conn, sub.get_one::<String>("name").unwrap().trim())?;
    let grid = distribution::generate(conn, &report).map_err(|e| {
        match e.downcast::<crate::allocation::AllocationError>() {
            Ok(alloc) => super::rules::explain(conn, alloc),
            Err(other) => other,
        }
    })?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &grid)? {
        return Ok(());
    }
    println!("{} ({} .. {})", grid.report, grid.start_date, grid.end_date);
    let headers = grid.headers();
    let header_refs: Vec<&str> = headers.iter().map(|h| h.as_str()).collect();
    println!("{}", pretty_table(&header_refs, grid.body()));
    Ok(())
}
