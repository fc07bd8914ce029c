// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Proportional allocation of analytic balances along report rules.

pub mod error;
pub mod rules;
pub mod spread;

pub use error::AllocationError;
pub use rules::{DEFAULT_MAX_DEPTH, RuleSet, ratios};
pub use spread::{Allocation, SPREAD_DIGITS};
