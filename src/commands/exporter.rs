// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::db::load_report;
use crate::distribution::{self, DistributionGrid};
use anyhow::{Context, Result, bail};
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("distribution", sub)) => export_distribution(conn, sub),
        _ => Ok(()),
    }
}

fn export_distribution(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let fmt = sub.get_one::<String>("format").unwrap().trim().to_lowercase();
    let out = sub.get_one::<String>("out").unwrap().trim();
    if !matches!(fmt.as_str(), "csv" | "json") {
        bail!("Unknown format: {} (use csv|json)", fmt);
    }

    let report = load_report(conn, sub.get_one::<String>("report").unwrap().trim())?;
    let grid = distribution::generate(conn, &report)?;
    match fmt.as_str() {
        "csv" => write_csv(&grid, out)?,
        _ => std::fs::write(out, serde_json::to_string_pretty(&grid)?)
            .with_context(|| format!("Write {}", out))?,
    }
    println!("Exported report '{}' to {}", report.name, out);
    Ok(())
}

pub fn write_csv(grid: &DistributionGrid, out: &str) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .flexible(true)
        .from_path(out)
        .with_context(|| format!("Create {}", out))?;
    for record in grid.records() {
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}
