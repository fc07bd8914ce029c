// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::allocation::{self, AllocationError};
use crate::db::{load_report, load_rule_set, load_rules, rule_ratios};
use crate::models::Report;
use crate::utils::{analytic_name, id_for_analytic, maybe_print_json, parse_decimal, pretty_table};
use anyhow::{Context, Result, anyhow};
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("rm", sub)) => remove(conn, sub)?,
        Some(("check", sub)) => {
            let report = load_report(conn, sub.get_one::<String>("report").unwrap().trim())?;
            let set = load_rule_set(conn, &report)?;
            let res = if sub.get_flag("graph") {
                set.validate_acyclic()
            } else {
                set.validate()
            };
            res.map_err(|e| explain(conn, e))?;
            println!(
                "Rules of report '{}' are valid ({} rules)",
                report.name,
                set.rules().len()
            );
        }
        Some(("ratios", sub)) => ratios(conn, sub)?,
        _ => {}
    }
    Ok(())
}

/// Turn an allocation error into a message naming the analytic accounts.
pub fn explain(conn: &Connection, err: AllocationError) -> anyhow::Error {
    let name = |id: i64| analytic_name(conn, id).unwrap_or_else(|_| format!("#{}", id));
    let msg = match &err {
        AllocationError::TargetAfterSource {
            source_account,
            target_account,
            report,
        } => format!(
            "Analytic account '{}' is used as a target (rule from '{}') after being used as a source in report '{}'",
            name(*target_account),
            name(*source_account),
            report
        ),
        AllocationError::Cycle { account, report } => format!(
            "Rules of report '{}' form a cycle through analytic account '{}'",
            report,
            name(*account)
        ),
        AllocationError::DepthExceeded {
            account,
            report,
            limit,
        } => format!(
            "Spreading analytic account '{}' in report '{}' went deeper than {} levels",
            name(*account),
            report,
            limit
        ),
    };
    anyhow::Error::new(err).context(msg)
}

/// Validation that runs whenever the rules of a report change.
pub fn check_report_rules(conn: &Connection, report: &Report) -> Result<()> {
    let set = load_rule_set(conn, report)?;
    set.validate().map_err(|e| explain(conn, e))
}

fn next_sequence(conn: &Connection, report_id: i64) -> Result<i64> {
    let max: Option<i64> = conn.query_row(
        "SELECT MAX(sequence) FROM report_rules WHERE report_id=?1",
        params![report_id],
        |r| r.get(0),
    )?;
    Ok(max.map(|m| m + 10).unwrap_or(10))
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let report = load_report(conn, sub.get_one::<String>("report").unwrap().trim())?;
    let source = sub.get_one::<String>("source").unwrap().trim();
    let target = sub.get_one::<String>("target").unwrap().trim();
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
    let source_id = id_for_analytic(conn, source)?;
    let target_id = id_for_analytic(conn, target)?;
    let sequence = match sub.get_one::<i64>("sequence") {
        Some(s) => *s,
        None => next_sequence(conn, report.id)?,
    };

    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "INSERT INTO report_rules(report_id, sequence, source_id, target_id, amount)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![report.id, sequence, source_id, target_id, amount.to_string()],
    )?;
    let id = tx.last_insert_rowid();
    check_report_rules(&tx, &report)?;
    tx.commit()?;
    println!(
        "Added rule {}: {} -> {} (weight {}) to report '{}'",
        id, source, target, amount, report.name
    );
    Ok(())
}

fn remove(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let raw = sub.get_one::<String>("id").unwrap();
    let id = raw
        .trim()
        .parse::<i64>()
        .with_context(|| format!("Invalid rule id '{}'", raw))?;
    let report_name: Option<String> = conn
        .query_row(
            "SELECT r.name FROM report_rules rr JOIN reports r ON r.id=rr.report_id WHERE rr.id=?1",
            params![id],
            |r| r.get(0),
        )
        .optional()?;
    let report_name = report_name.ok_or_else(|| anyhow!("Rule {} not found", id))?;
    let report = load_report(conn, &report_name)?;

    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM report_rules WHERE id=?1", params![id])?;
    check_report_rules(&tx, &report)?;
    tx.commit()?;
    println!("Removed rule {}", id);
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct RuleRow {
    pub id: i64,
    pub sequence: i64,
    pub source: String,
    pub target: String,
    pub amount: String,
    pub ratio: f64,
}

pub fn query_rows(conn: &Connection, report: &Report) -> Result<Vec<RuleRow>> {
    let rules = load_rules(conn, report.id)?;
    let ratios = allocation::ratios(&rules, &rules);
    let mut out = Vec::with_capacity(rules.len());
    for rule in &rules {
        out.push(RuleRow {
            id: rule.id,
            sequence: rule.sequence,
            source: analytic_name(conn, rule.source_id)?,
            target: analytic_name(conn, rule.target_id)?,
            amount: rule.amount.to_string(),
            ratio: ratios.get(&rule.id).copied().unwrap_or(0.0),
        });
    }
    Ok(out)
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let report = load_report(conn, sub.get_one::<String>("report").unwrap().trim())?;
    let rows = query_rows(conn, &report)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &rows)? {
        return Ok(());
    }
    let data = rows
        .into_iter()
        .map(|r| {
            vec![
                r.id.to_string(),
                r.sequence.to_string(),
                r.source,
                r.target,
                r.amount,
                format!("{:.4}", r.ratio),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["ID", "Seq", "Source", "Target", "Amount", "Ratio"],
            data
        )
    );
    Ok(())
}

fn ratios(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let report = load_report(conn, sub.get_one::<String>("report").unwrap().trim())?;
    let ids: Vec<i64> = load_rules(conn, report.id)?.iter().map(|r| r.id).collect();
    let ratios = rule_ratios(conn, &ids)?;
    let mut items: Vec<(i64, f64)> = ids
        .iter()
        .map(|id| (*id, ratios.get(id).copied().unwrap_or(0.0)))
        .collect();
    items.sort_by_key(|(id, _)| *id);
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &items)? {
        let data = items
            .into_iter()
            .map(|(id, r)| vec![id.to_string(), format!("{:.4}", r)])
            .collect();
        println!("{}", pretty_table(&["Rule", "Ratio"], data));
    }
    Ok(())
}
