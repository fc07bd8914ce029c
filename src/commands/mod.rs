// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod companies;
pub mod currencies;
pub mod analytics;
pub mod ledgers;
pub mod lines;
pub mod importer;
pub mod reports;
pub mod rules;
pub mod spread;
pub mod exporter;
pub mod fx;
pub mod settings;
pub mod doctor;
