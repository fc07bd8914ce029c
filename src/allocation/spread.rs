// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::error::AllocationError;
use super::rules::RuleSet;
use log::debug;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Decimal places every spread portion is rounded to (banker's rounding).
pub const SPREAD_DIGITS: u32 = 2;

/// Leaf analytic account id -> allocated amount.
pub type Allocation = BTreeMap<i64, Decimal>;

impl RuleSet {
    /// Distribute `amount` from `root` to leaf accounts following the rules.
    ///
    /// The returned amounts always sum to `amount` exactly. Rounding slack is
    /// given to the target of the last rule (in stored order) leaving the
    /// account being spread. An account no rule distributes away keeps the
    /// whole amount.
    ///
    /// The rule set is expected to be validated; a cyclic one fails with
    /// [`AllocationError::DepthExceeded`] once the recursion passes
    /// [`RuleSet::max_depth`].
    pub fn spread(&self, root: i64, amount: Decimal) -> Result<Allocation, AllocationError> {
        self.spread_at(root, amount, 0)
    }

    fn spread_at(
        &self,
        root: i64,
        amount: Decimal,
        depth: usize,
    ) -> Result<Allocation, AllocationError> {
        if depth > self.max_depth() {
            return Err(AllocationError::DepthExceeded {
                account: root,
                report: self.report().to_string(),
                limit: self.max_depth(),
            });
        }

        let negative = amount < Decimal::ZERO;
        let magnitude = amount.abs();

        let mut res = Allocation::new();
        let mut total = Decimal::ZERO;
        let mut remainder_to = None;
        for rule in self.rules().iter().filter(|r| r.source_id == root) {
            let portion = (magnitude * self.ratio(rule)).round_dp(SPREAD_DIGITS);
            total += portion;
            *res.entry(rule.target_id).or_insert(Decimal::ZERO) += portion;
            remainder_to = Some(rule.target_id);
        }

        match remainder_to {
            None => {
                res.insert(root, magnitude);
            }
            Some(last) if total != magnitude => {
                debug!(
                    "spread of {} from {}: remainder {} to {}",
                    magnitude,
                    root,
                    magnitude - total,
                    last
                );
                *res.entry(last).or_insert(Decimal::ZERO) += magnitude - total;
            }
            Some(_) => {}
        }

        if negative {
            for v in res.values_mut().filter(|v| !v.is_zero()) {
                *v = -*v;
            }
        }

        let children: Vec<i64> = res
            .keys()
            .copied()
            .filter(|id| self.is_source(*id))
            .collect();
        for child in children {
            let portion = res.remove(&child).unwrap_or(Decimal::ZERO);
            for (leaf, v) in self.spread_at(child, portion, depth + 1)? {
                *res.entry(leaf).or_insert(Decimal::ZERO) += v;
            }
        }
        Ok(res)
    }
}
