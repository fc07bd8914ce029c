// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::error::AllocationError;
use crate::models::Rule;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::collections::{HashMap, HashSet};

/// Recursion limit for [`RuleSet::spread`] unless the caller sets another one.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// The allocation rules of one report, in stored order.
///
/// Order matters twice: validation scans the rules front to back, and the
/// spread engine hands the rounding remainder to the target of the last
/// matching rule.
#[derive(Debug, Clone)]
pub struct RuleSet {
    report: String,
    rules: Vec<Rule>,
    totals: HashMap<i64, Decimal>,
    sources: HashSet<i64>,
    max_depth: usize,
}

impl RuleSet {
    /// Rules are put in stored order: by `sequence`, then by `id`.
    pub fn new(report: impl Into<String>, mut rules: Vec<Rule>) -> Self {
        rules.sort_by_key(|r| (r.sequence, r.id));
        let mut totals: HashMap<i64, Decimal> = HashMap::new();
        let mut sources = HashSet::new();
        for rule in &rules {
            sources.insert(rule.source_id);
            if rule.amount.is_zero() {
                continue;
            }
            *totals.entry(rule.source_id).or_insert(Decimal::ZERO) += rule.amount;
        }
        Self {
            report: report.into(),
            rules,
            totals,
            sources,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, limit: usize) -> Self {
        self.max_depth = limit;
        self
    }

    pub fn report(&self) -> &str {
        &self.report
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// True when some rule distributes `account` away.
    pub fn is_source(&self, account: i64) -> bool {
        self.sources.contains(&account)
    }

    pub fn ratio(&self, rule: &Rule) -> Decimal {
        let total = self
            .totals
            .get(&rule.source_id)
            .copied()
            .unwrap_or(Decimal::ZERO);
        share(rule.amount, total)
    }

    /// Order-sensitive check: walking the rules in stored order, a rule may
    /// not target an account that was already seen as a source (its own
    /// source included).
    pub fn validate(&self) -> Result<(), AllocationError> {
        let mut seen_sources = HashSet::new();
        for rule in &self.rules {
            seen_sources.insert(rule.source_id);
            if seen_sources.contains(&rule.target_id) {
                return Err(AllocationError::TargetAfterSource {
                    source_account: rule.source_id,
                    target_account: rule.target_id,
                    report: self.report.clone(),
                });
            }
        }
        Ok(())
    }

    /// Order-independent cycle detection over the source -> target graph.
    ///
    /// Rejects exactly the rule sets that would make [`RuleSet::spread`]
    /// recurse forever. [`RuleSet::validate`] rejects those too, but also
    /// acyclic sets stored downstream-first, e.g. `B->C` before `A->B`.
    pub fn validate_acyclic(&self) -> Result<(), AllocationError> {
        let mut graph: HashMap<i64, Vec<i64>> = HashMap::new();
        let mut roots = Vec::new();
        for rule in &self.rules {
            let targets = graph.entry(rule.source_id).or_insert_with(|| {
                roots.push(rule.source_id);
                Vec::new()
            });
            if !targets.contains(&rule.target_id) {
                targets.push(rule.target_id);
            }
        }
        let mut marks = HashMap::new();
        for root in roots {
            self.visit(root, &graph, &mut marks)?;
        }
        Ok(())
    }

    fn visit(
        &self,
        node: i64,
        graph: &HashMap<i64, Vec<i64>>,
        marks: &mut HashMap<i64, Mark>,
    ) -> Result<(), AllocationError> {
        match marks.get(&node) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::Visiting) => {
                return Err(AllocationError::Cycle {
                    account: node,
                    report: self.report.clone(),
                });
            }
            None => {}
        }
        marks.insert(node, Mark::Visiting);
        if let Some(targets) = graph.get(&node) {
            for next in targets {
                self.visit(*next, graph, marks)?;
            }
        }
        marks.insert(node, Mark::Done);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

fn share(amount: Decimal, total: Decimal) -> Decimal {
    amount.checked_div(total).unwrap_or(Decimal::ZERO)
}

/// Ratio of every rule in `batch`, keyed by rule id.
///
/// The denominator is the summed weight of all rules in `scope` sharing the
/// rule's report and source, so `scope` should hold every rule of the
/// reports `batch` touches. A source whose weights sum to zero gives 0.0.
pub fn ratios(batch: &[Rule], scope: &[Rule]) -> HashMap<i64, f64> {
    let reports: HashSet<i64> = batch.iter().map(|r| r.report_id).collect();
    let mut totals: HashMap<(i64, i64), Decimal> = HashMap::new();
    for rule in scope {
        if !reports.contains(&rule.report_id) || rule.amount.is_zero() {
            continue;
        }
        *totals
            .entry((rule.report_id, rule.source_id))
            .or_insert(Decimal::ZERO) += rule.amount;
    }

    batch
        .iter()
        .map(|rule| {
            let total = totals
                .get(&(rule.report_id, rule.source_id))
                .copied()
                .unwrap_or(Decimal::ZERO);
            let ratio = share(rule.amount, total).to_f64().unwrap_or(0.0);
            (rule.id, ratio)
        })
        .collect()
}
