// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use thiserror::Error;

/// Errors raised by rule validation and by the spread engine.
///
/// Every variant describes a cyclic allocation: either caught up front by
/// validation, or caught by the depth guard while spreading a rule set that
/// was never validated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocationError {
    #[error(
        "Analytic account {target_account} is a target after being used as a source (rule from {source_account}) in report '{report}'"
    )]
    TargetAfterSource {
        source_account: i64,
        target_account: i64,
        report: String,
    },

    #[error("Allocation rules of report '{report}' form a cycle through analytic account {account}")]
    Cycle { account: i64, report: String },

    #[error(
        "Spreading analytic account {account} in report '{report}' exceeded {limit} levels; the rules are likely cyclic"
    )]
    DepthExceeded {
        account: i64,
        report: String,
        limit: usize,
    },
}

impl AllocationError {
    /// The analytic account the error points at.
    pub fn account(&self) -> i64 {
        match self {
            Self::TargetAfterSource { target_account, .. } => *target_account,
            Self::Cycle { account, .. } | Self::DepthExceeded { account, .. } => *account,
        }
    }

    pub fn report(&self) -> &str {
        match self {
            Self::TargetAfterSource { report, .. }
            | Self::Cycle { report, .. }
            | Self::DepthExceeded { report, .. } => report,
        }
    }
}
