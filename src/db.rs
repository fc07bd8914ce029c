// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::allocation::{self, RuleSet};
use crate::models::{Report, Rule};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::{Connection, params};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

static APP: Lazy<(&str, &str, &str)> =
    Lazy::new(|| ("com.alphavelocity", "Anadist", "anadist"));

/// Environment variable overriding the database location.
pub const DB_ENV: &str = "ANADIST_DB";

pub fn db_path() -> Result<PathBuf> {
    if let Some(p) = std::env::var_os(DB_ENV).filter(|p| !p.is_empty()) {
        return Ok(PathBuf::from(p));
    }
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("anadist.sqlite"))
}

pub fn open_or_init() -> Result<Connection> {
    let path = db_path()?;
    let conn =
        Connection::open(&path).with_context(|| format!("Open DB at {}", path.display()))?;
    init_schema(&conn)?;
    log::debug!("database ready at {}", path.display());
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS settings(
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS currencies(
        code TEXT PRIMARY KEY,
        digits INTEGER NOT NULL DEFAULT 2
    );

    CREATE TABLE IF NOT EXISTS companies(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        currency TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS analytic_accounts(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        kind TEXT NOT NULL DEFAULT 'normal' CHECK(kind IN ('normal','view')),
        currency TEXT NOT NULL,
        active INTEGER NOT NULL DEFAULT 1
    );

    CREATE TABLE IF NOT EXISTS ledger_accounts(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        company_id INTEGER NOT NULL,
        code TEXT NOT NULL,
        name TEXT NOT NULL,
        kind TEXT NOT NULL CHECK(kind IN ('expense','revenue','other')),
        UNIQUE(company_id, code),
        FOREIGN KEY(company_id) REFERENCES companies(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS analytic_lines(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        date TEXT NOT NULL,
        analytic_account_id INTEGER NOT NULL,
        ledger_account_id INTEGER NOT NULL,
        debit TEXT NOT NULL DEFAULT '0',
        credit TEXT NOT NULL DEFAULT '0',
        FOREIGN KEY(analytic_account_id) REFERENCES analytic_accounts(id) ON DELETE CASCADE,
        FOREIGN KEY(ledger_account_id) REFERENCES ledger_accounts(id) ON DELETE CASCADE
    );
    CREATE INDEX IF NOT EXISTS idx_analytic_lines_date ON analytic_lines(date);

    CREATE TABLE IF NOT EXISTS reports(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        company_id INTEGER NOT NULL,
        start_date TEXT NOT NULL,
        end_date TEXT NOT NULL,
        FOREIGN KEY(company_id) REFERENCES companies(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS report_rules(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        report_id INTEGER NOT NULL,
        sequence INTEGER NOT NULL DEFAULT 0,
        source_id INTEGER NOT NULL,
        target_id INTEGER NOT NULL,
        amount TEXT NOT NULL,
        FOREIGN KEY(report_id) REFERENCES reports(id) ON DELETE CASCADE,
        FOREIGN KEY(source_id) REFERENCES analytic_accounts(id) ON DELETE CASCADE,
        FOREIGN KEY(target_id) REFERENCES analytic_accounts(id) ON DELETE CASCADE
    );
    CREATE INDEX IF NOT EXISTS idx_report_rules_report ON report_rules(report_id);

    -- FX rates: store base->quote rate (1 base = rate quote) per day
    CREATE TABLE IF NOT EXISTS fx_rates(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        date TEXT NOT NULL,
        base TEXT NOT NULL,
        quote TEXT NOT NULL,
        rate TEXT NOT NULL,
        UNIQUE(date, base, quote)
    );
    "#,
    )?;
    Ok(())
}

pub fn load_report(conn: &Connection, name: &str) -> Result<Report> {
    let (id, company_id, start, end): (i64, i64, String, String) = conn
        .query_row(
            "SELECT id, company_id, start_date, end_date FROM reports WHERE name=?1",
            params![name],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
        )
        .with_context(|| format!("Report '{}' not found", name))?;
    Ok(Report {
        id,
        name: name.to_string(),
        company_id,
        start_date: crate::utils::parse_date(&start)?,
        end_date: crate::utils::parse_date(&end)?,
    })
}

fn rule_from_row(r: &rusqlite::Row<'_>) -> rusqlite::Result<(i64, i64, i64, i64, i64, String)> {
    Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?, r.get(5)?))
}

fn collect_rules(
    rows: impl Iterator<Item = rusqlite::Result<(i64, i64, i64, i64, i64, String)>>,
) -> Result<Vec<Rule>> {
    let mut out = Vec::new();
    for row in rows {
        let (id, report_id, sequence, source_id, target_id, amount) = row?;
        let amount = crate::utils::parse_decimal(&amount)
            .with_context(|| format!("Invalid amount on rule {}", id))?;
        out.push(Rule {
            id,
            report_id,
            sequence,
            source_id,
            target_id,
            amount,
        });
    }
    Ok(out)
}

/// Rules of one report in stored order.
pub fn load_rules(conn: &Connection, report_id: i64) -> Result<Vec<Rule>> {
    let mut stmt = conn.prepare(
        "SELECT id, report_id, sequence, source_id, target_id, amount
         FROM report_rules WHERE report_id=?1 ORDER BY sequence, id",
    )?;
    let rows = stmt.query_map(params![report_id], rule_from_row)?;
    collect_rules(rows)
}

pub fn load_rule_set(conn: &Connection, report: &Report) -> Result<RuleSet> {
    let rules = load_rules(conn, report.id)?;
    let depth = crate::utils::get_spread_max_depth(conn)?;
    Ok(RuleSet::new(report.name.clone(), rules).with_max_depth(depth))
}

/// Ratio of each rule in `rule_ids`; denominators span every rule of the
/// reports those rules belong to.
pub fn rule_ratios(conn: &Connection, rule_ids: &[i64]) -> Result<HashMap<i64, f64>> {
    let mut batch = Vec::new();
    let mut scope = Vec::new();
    let mut seen_reports = Vec::new();
    {
        let mut stmt = conn.prepare(
            "SELECT id, report_id, sequence, source_id, target_id, amount
             FROM report_rules WHERE id=?1",
        )?;
        for id in rule_ids {
            let rows = stmt.query_map(params![id], rule_from_row)?;
            batch.extend(collect_rules(rows)?);
        }
    }
    for rule in &batch {
        if !seen_reports.contains(&rule.report_id) {
            seen_reports.push(rule.report_id);
            scope.extend(load_rules(conn, rule.report_id)?);
        }
    }
    Ok(allocation::ratios(&batch, &scope))
}
