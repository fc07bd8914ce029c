// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::utils::{id_for_analytic, id_for_company, id_for_ledger, parse_date, parse_decimal};
use anyhow::{Context, Result};
use csv::ReaderBuilder;
use rusqlite::{Connection, params};
use std::collections::{HashMap, hash_map::Entry};

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("lines", sub)) => import_lines(conn, sub),
        _ => Ok(()),
    }
}

/// CSV columns: date,analytic,company,ledger,debit,credit. Empty debit or
/// credit cells count as zero. The whole file is imported or nothing is.
fn import_lines(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let path = sub.get_one::<String>("path").unwrap().trim();
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Open CSV {}", path))?;

    let tx = conn.transaction()?;
    let mut analytic_cache: HashMap<String, i64> = HashMap::new();
    let mut ledger_cache: HashMap<(String, String), i64> = HashMap::new();
    let mut count = 0usize;

    for (idx, result) in rdr.records().enumerate() {
        let line_no = idx + 2;
        let rec = result?;
        let date_raw = rec.get(0).context("date missing")?;
        let analytic = rec.get(1).context("analytic missing")?.to_string();
        let company = rec.get(2).context("company missing")?.to_string();
        let ledger = rec.get(3).context("ledger missing")?.to_string();
        let debit_raw = rec.get(4).filter(|s| !s.is_empty()).unwrap_or("0");
        let credit_raw = rec.get(5).filter(|s| !s.is_empty()).unwrap_or("0");

        let date = parse_date(date_raw).with_context(|| format!("Line {}", line_no))?;
        let debit = parse_decimal(debit_raw)
            .with_context(|| format!("Invalid debit '{}' on line {}", debit_raw, line_no))?;
        let credit = parse_decimal(credit_raw)
            .with_context(|| format!("Invalid credit '{}' on line {}", credit_raw, line_no))?;

        let analytic_id = match analytic_cache.entry(analytic) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => {
                let id = id_for_analytic(&tx, entry.key())?;
                *entry.insert(id)
            }
        };
        let ledger_id = match ledger_cache.entry((company, ledger)) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => {
                let (company, code) = entry.key();
                let company_id = id_for_company(&tx, company)?;
                let id = id_for_ledger(&tx, company_id, code)?;
                *entry.insert(id)
            }
        };

        tx.execute(
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
        count += 1;
    }
    tx.commit()?;
    log::info!("imported {} analytic lines from {}", count, path);
    println!("Imported {} analytic lines from {}", count, path);
    Ok(())
}
