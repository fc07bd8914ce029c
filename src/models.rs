// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    pub id: i64,
    pub name: String,
    pub currency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Currency {
    pub code: String,
    pub digits: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticAccount {
    pub id: i64,
    pub name: String,
    pub kind: String, // normal | view
    pub currency: String,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerAccount {
    pub id: i64,
    pub company_id: i64,
    pub code: String,
    pub name: String,
    pub kind: String, // expense | revenue | other
}

impl LedgerAccount {
    pub fn rec_name(&self) -> String {
        if self.code.is_empty() {
            self.name.clone()
        } else {
            format!("{} - {}", self.code, self.name)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub id: i64,
    pub name: String,
    pub company_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// One allocation rule of a report. `amount` is a weight, not money; the
/// share it gives to `target_id` is derived from the other rules leaving
/// the same source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub id: i64,
    pub report_id: i64,
    pub sequence: i64,
    pub source_id: i64,
    pub target_id: i64,
    pub amount: Decimal,
}
