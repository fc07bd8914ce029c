// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Report generation: balances per analytic/ledger account, spread along the
//! report rules, summed into a grid of ledger rows by analytic columns.

use crate::allocation::RuleSet;
use crate::models::{LedgerAccount, Report};
use crate::utils::{currency_digits, fmt_amount, fx_convert, parse_decimal};
use anyhow::{Context, Result};
use log::{debug, info};
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Credit minus debit of one analytic account on one ledger account, in the
/// analytic account's currency and rounded to its minor unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Balance {
    pub analytic_id: i64,
    pub ledger_id: i64,
    pub amount: Decimal,
}

/// (leaf analytic account id, ledger account id) -> amount.
pub type Aggregate = BTreeMap<(i64, i64), Decimal>;

pub fn fetch_balances(conn: &Connection, report: &Report) -> Result<Vec<Balance>> {
    let mut stmt = conn.prepare(
        "SELECT l.analytic_account_id, l.ledger_account_id, c.currency, aa.currency, l.debit, l.credit
         FROM analytic_lines l
         JOIN analytic_accounts aa ON aa.id=l.analytic_account_id
         JOIN ledger_accounts la ON la.id=l.ledger_account_id
         JOIN companies c ON c.id=la.company_id
         WHERE aa.active=1 AND aa.kind='normal'
           AND la.company_id=?1 AND l.date>=?2 AND l.date<=?3
         ORDER BY l.id",
    )?;
    let rows = stmt.query_map(
        params![
            report.company_id,
            report.start_date.to_string(),
            report.end_date.to_string()
        ],
        |r| {
            Ok((
                r.get::<_, i64>(0)?,
                r.get::<_, i64>(1)?,
                r.get::<_, String>(2)?,
                r.get::<_, String>(3)?,
                r.get::<_, String>(4)?,
                r.get::<_, String>(5)?,
            ))
        },
    )?;

    let mut sums: BTreeMap<(i64, i64, String), (String, Decimal)> = BTreeMap::new();
    for row in rows {
        let (analytic_id, ledger_id, line_ccy, analytic_ccy, debit, credit) = row?;
        let debit = parse_decimal(&debit)
            .with_context(|| format!("Invalid debit on analytic account {}", analytic_id))?;
        let credit = parse_decimal(&credit)
            .with_context(|| format!("Invalid credit on analytic account {}", analytic_id))?;
        let entry = sums
            .entry((analytic_id, ledger_id, line_ccy))
            .or_insert((analytic_ccy, Decimal::ZERO));
        entry.1 += credit - debit;
    }

    let mut digits: HashMap<String, u32> = HashMap::new();
    let mut out = Vec::with_capacity(sums.len());
    for ((analytic_id, ledger_id, line_ccy), (analytic_ccy, balance)) in sums {
        let converted = fx_convert(conn, report.end_date, balance, &line_ccy, &analytic_ccy)?;
        let dp = match digits.get(&analytic_ccy) {
            Some(d) => *d,
            None => {
                let d = currency_digits(conn, &analytic_ccy)?;
                digits.insert(analytic_ccy.clone(), d);
                d
            }
        };
        out.push(Balance {
            analytic_id,
            ledger_id,
            amount: converted.round_dp(dp),
        });
    }
    Ok(out)
}

/// Spread every balance and sum the leaf amounts per (leaf, ledger account).
pub fn aggregate(rules: &RuleSet, balances: &[Balance]) -> Result<Aggregate> {
    let mut result = Aggregate::new();
    for b in balances {
        let spread = rules.spread(b.analytic_id, b.amount)?;
        debug!(
            "analytic {} ledger {}: {} over {} accounts",
            b.analytic_id,
            b.ledger_id,
            b.amount,
            spread.len()
        );
        for (leaf, v) in spread {
            *result.entry((leaf, b.ledger_id)).or_insert(Decimal::ZERO) += v;
        }
    }
    Ok(result)
}

#[derive(Debug, Clone, Serialize)]
pub struct GridColumn {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GridRow {
    pub ledger_id: i64,
    pub account: String,
    pub values: Vec<Decimal>,
    pub total: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct DistributionGrid {
    pub report: String,
    pub start_date: chrono::NaiveDate,
    pub end_date: chrono::NaiveDate,
    pub columns: Vec<GridColumn>,
    pub rows: Vec<GridRow>,
    pub totals: Vec<Decimal>,
    pub grand_total: Decimal,
}

impl DistributionGrid {
    /// Ledger accounts with no non-zero cell are left out; column totals
    /// only count the rows that are kept.
    pub fn build(
        report: &Report,
        mut columns: Vec<GridColumn>,
        ledgers: &[LedgerAccount],
        amounts: &Aggregate,
    ) -> Self {
        columns.sort_by(|a, b| a.name.cmp(&b.name));
        let mut totals = vec![Decimal::ZERO; columns.len()];
        let mut rows = Vec::new();
        for ledger in ledgers {
            let values: Vec<Decimal> = columns
                .iter()
                .map(|c| {
                    amounts
                        .get(&(c.id, ledger.id))
                        .copied()
                        .unwrap_or(Decimal::ZERO)
                })
                .collect();
            if values.iter().all(|v| v.is_zero()) {
                continue;
            }
            for (t, v) in totals.iter_mut().zip(&values) {
                *t += *v;
            }
            rows.push(GridRow {
                ledger_id: ledger.id,
                account: ledger.rec_name(),
                total: values.iter().copied().sum(),
                values,
            });
        }
        let grand_total = totals.iter().copied().sum();
        Self {
            report: report.name.clone(),
            start_date: report.start_date,
            end_date: report.end_date,
            columns,
            rows,
            totals,
            grand_total,
        }
    }

    pub fn headers(&self) -> Vec<String> {
        let mut h = vec![String::new()];
        h.extend(self.columns.iter().map(|c| c.name.clone()));
        h.push("Total".to_string());
        h
    }

    /// Body rows followed by the totals row, amounts with two decimals.
    pub fn body(&self) -> Vec<Vec<String>> {
        let mut out = Vec::with_capacity(self.rows.len() + 1);
        for row in &self.rows {
            let mut r = vec![row.account.clone()];
            r.extend(row.values.iter().map(fmt_amount));
            r.push(fmt_amount(&row.total));
            out.push(r);
        }
        let mut totals = vec![String::new()];
        totals.extend(self.totals.iter().map(fmt_amount));
        totals.push(fmt_amount(&self.grand_total));
        out.push(totals);
        out
    }

    /// Spreadsheet layout: title row, blank row, header row, body.
    pub fn records(&self) -> Vec<Vec<String>> {
        let mut out = vec![
            vec![
                self.report.clone(),
                self.start_date.to_string(),
                self.end_date.to_string(),
            ],
            Vec::new(),
            self.headers(),
        ];
        out.extend(self.body());
        out
    }
}

fn grid_columns(conn: &Connection) -> Result<Vec<GridColumn>> {
    let mut stmt = conn.prepare(
        "SELECT id, name FROM analytic_accounts WHERE kind='normal' AND active=1 ORDER BY name",
    )?;
    let rows = stmt.query_map([], |r| {
        Ok(GridColumn {
            id: r.get(0)?,
            name: r.get(1)?,
        })
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

fn grid_ledgers(conn: &Connection, company_id: i64) -> Result<Vec<LedgerAccount>> {
    let mut stmt = conn.prepare(
        "SELECT id, company_id, code, name, kind FROM ledger_accounts
         WHERE company_id=?1 AND kind IN ('expense','revenue')
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

/// Build the distribution grid of `report` from one consistent read of the
/// database.
pub fn generate(conn: &Connection, report: &Report) -> Result<DistributionGrid> {
    let tx = conn.unchecked_transaction()?;
    let rules = crate::db::load_rule_set(&tx, report)?;
    let balances = fetch_balances(&tx, report)?;
    let amounts = aggregate(&rules, &balances)?;
    let grid = DistributionGrid::build(
        report,
        grid_columns(&tx)?,
        &grid_ledgers(&tx, report.company_id)?,
        &amounts,
    );
    tx.finish()?;
    info!(
        "report '{}': {} balances, {} rows",
        report.name,
        balances.len(),
        grid.rows.len()
    );
    Ok(grid)
}
