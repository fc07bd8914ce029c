// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Property-based tests for the spread engine: conservation, sign symmetry
//! and leaf-only results over random acyclic rule sets.

use anadist::allocation::RuleSet;
use anadist::models::Rule;
use proptest::prelude::*;
use rust_decimal::Decimal;

const ACCOUNTS: i64 = 8;

// =============================================================================
// Generators
// =============================================================================

/// Rules only point from a lower to a higher account id, so the set is
/// acyclic whatever order it is stored in.
fn arb_rules() -> impl Strategy<Value = Vec<Rule>> {
    prop::collection::vec((1..ACCOUNTS, 1..ACCOUNTS, 0i64..10, 0i64..50), 0..16).prop_map(
        |raw| {
            raw.into_iter()
                .enumerate()
                .filter(|(_, (a, b, _, _))| a != b)
                .map(|(i, (a, b, weight, seq))| Rule {
                    id: i as i64 + 1,
                    report_id: 1,
                    sequence: seq,
                    source_id: a.min(b),
                    target_id: a.max(b),
                    amount: Decimal::from(weight),
                })
                .collect()
        },
    )
}

/// Amounts with two decimals, both signs.
fn arb_amount() -> impl Strategy<Value = Decimal> {
    (-1_000_000_000i64..1_000_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn spread_conserves_the_amount(
        rules in arb_rules(),
        root in 1..ACCOUNTS,
        amount in arb_amount(),
    ) {
        let set = RuleSet::new("prop", rules);
        prop_assert!(set.validate_acyclic().is_ok());
        let res = set.spread(root, amount).unwrap();
        let total: Decimal = res.values().copied().sum();
        prop_assert_eq!(total, amount);
    }

    #[test]
    fn spread_is_sign_symmetric(
        rules in arb_rules(),
        root in 1..ACCOUNTS,
        amount in arb_amount(),
    ) {
        let set = RuleSet::new("prop", rules);
        let pos = set.spread(root, amount).unwrap();
        let neg = set.spread(root, -amount).unwrap();
        prop_assert_eq!(pos.len(), neg.len());
        for (k, v) in &pos {
            prop_assert_eq!(neg.get(k).copied(), Some(-*v));
        }
    }

    #[test]
    fn spread_only_returns_leaves(
        rules in arb_rules(),
        root in 1..ACCOUNTS,
        amount in arb_amount(),
    ) {
        let set = RuleSet::new("prop", rules);
        let res = set.spread(root, amount).unwrap();
        prop_assert!(!res.is_empty());
        for id in res.keys() {
            prop_assert!(!set.is_source(*id));
        }
    }
}
