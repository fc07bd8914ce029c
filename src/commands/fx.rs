// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::utils::{
    currency_digits, fx_convert, get_base_currency, http_client, maybe_print_json,
    parse_currency, parse_date, parse_decimal, pretty_table, set_base_currency,
};
use anyhow::{Context, Result, bail};
use chrono::{NaiveDate, Utc};
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const FRANKFURTER: &str = "https://api.frankfurter.dev";

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set-base", sub)) => {
            let ccy = parse_currency(sub.get_one::<String>("currency").unwrap())?;
            set_base_currency(conn, &ccy)?;
            println!("FX hub currency set to {}", ccy);
        }
        Some(("add", sub)) => add(conn, sub)?,
        Some(("fetch", sub)) => fetch(conn, *sub.get_one::<usize>("days").unwrap_or(&120))?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("convert", sub)) => convert(conn, sub)?,
        _ => {}
    }
    Ok(())
}

/// Insert or replace the rate `1 base = rate quote` for one day.
pub fn upsert_rate(
    conn: &Connection,
    date: NaiveDate,
    base: &str,
    quote: &str,
    rate: Decimal,
) -> Result<()> {
    if rate <= Decimal::ZERO {
        bail!("FX rate must be positive, got {}", rate);
    }
    conn.execute(
        "INSERT INTO fx_rates(date, base, quote, rate) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(date, base, quote) DO UPDATE SET rate=excluded.rate",
        params![date.to_string(), base, quote, rate.to_string()],
    )?;
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let date = parse_date(sub.get_one::<String>("date").unwrap())?;
    let base = parse_currency(sub.get_one::<String>("base").unwrap())?;
    let quote = parse_currency(sub.get_one::<String>("quote").unwrap())?;
    let rate = parse_decimal(sub.get_one::<String>("rate").unwrap())?;
    upsert_rate(conn, date, &base, &quote, rate)?;
    println!("1 {} = {} {} on {}", base, rate, quote, date);
    Ok(())
}

/// Currencies other than the hub that analytic lines may be converted
/// between: company currencies and analytic account currencies.
fn currencies_in_use(conn: &Connection, hub: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT currency FROM companies
         UNION
         SELECT currency FROM analytic_accounts
         ORDER BY 1",
    )?;
    let rows = stmt.query_map([], |r| r.get::<_, String>(0))?;
    let mut out = Vec::new();
    for row in rows {
        let c = row?;
        if !c.is_empty() && c != hub {
            out.push(c);
        }
    }
    Ok(out)
}

/// Time series payload of the Frankfurter (ECB) API.
#[derive(Debug, Deserialize)]
pub struct Series {
    pub base: String,
    pub rates: HashMap<String, HashMap<String, f64>>,
}

/// Store every rate of `series` that is not known yet; returns how many were
/// added. Existing rates for the same day and pair are left alone.
pub fn store_series(conn: &Connection, series: &Series) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let mut inserted = 0usize;
    for (day, quotes) in &series.rates {
        let date = parse_date(day)?;
        for (quote, rate) in quotes {
            let rate = Decimal::try_from(*rate)
                .with_context(|| format!("Invalid rate {} for {}/{}", rate, series.base, quote))?;
            inserted += tx.execute(
                "INSERT OR IGNORE INTO fx_rates(date, base, quote, rate) VALUES (?1, ?2, ?3, ?4)",
                params![date.to_string(), series.base, quote, rate.to_string()],
            )?;
        }
    }
    tx.commit()?;
    Ok(inserted)
}

fn fetch(conn: &Connection, days: usize) -> Result<()> {
    let hub = get_base_currency(conn)?;
    let quotes = currencies_in_use(conn, &hub)?;
    if quotes.is_empty() {
        println!("Every company and analytic account uses {}; nothing to fetch.", hub);
        return Ok(());
    }
    let end = Utc::now().date_naive();
    let start = end - chrono::Duration::days(days as i64);
    let url = format!(
        "{}/{}..{}?from={}&to={}",
        FRANKFURTER,
        start,
        end,
        hub,
        quotes.join(",")
    );
    log::info!("fetching FX rates {} -> {} since {}", hub, quotes.join(","), start);
    let series: Series = http_client()?
        .get(&url)
        .send()
        .with_context(|| format!("GET {}", url))?
        .error_for_status()?
        .json()?;
    let inserted = store_series(conn, &series)?;
    println!("Stored {} new {} rates from Frankfurter (ECB).", inserted, hub);
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct RateRow {
    pub date: String,
    pub base: String,
    pub quote: String,
    pub rate: String,
}

pub fn query_rows(conn: &Connection, sub: &clap::ArgMatches) -> Result<Vec<RateRow>> {
    let currency = match sub.get_one::<String>("currency") {
        Some(c) => Some(parse_currency(c)?),
        None => None,
    };
    let limit = *sub.get_one::<usize>("limit").unwrap_or(&50);
    let mut stmt = conn.prepare(
        "SELECT date, base, quote, rate FROM fx_rates
         WHERE ?1 IS NULL OR base=?1 OR quote=?1
         ORDER BY date DESC, base, quote
         LIMIT ?2",
    )?;
    let rows = stmt.query_map(params![currency, limit as i64], |r| {
        Ok(RateRow {
            date: r.get(0)?,
            base: r.get(1)?,
            quote: r.get(2)?,
            rate: r.get(3)?,
        })
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let rows = query_rows(conn, sub)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &rows)? {
        return Ok(());
    }
    let data = rows
        .into_iter()
        .map(|r| vec![r.date, r.base, r.quote, r.rate])
        .collect();
    println!("{}", pretty_table(&["Date", "Base", "Quote", "Rate"], data));
    Ok(())
}

/// Converted amount rounded to the target currency's minor unit, the same
/// way report balances are.
pub fn convert_rounded(
    conn: &Connection,
    date: NaiveDate,
    amount: Decimal,
    from: &str,
    to: &str,
) -> Result<Decimal> {
    let converted = fx_convert(conn, date, amount, from, to)?;
    Ok(converted.round_dp(currency_digits(conn, to)?))
}

fn convert(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let date = parse_date(sub.get_one::<String>("date").unwrap())?;
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
    let from = parse_currency(sub.get_one::<String>("from").unwrap())?;
    let to = parse_currency(sub.get_one::<String>("to").unwrap())?;
    let res = convert_rounded(conn, date, amount, &from, &to)?;
    println!("{} {} = {} {} on {}", amount, from, res, to, date);
    Ok(())
}
