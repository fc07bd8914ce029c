// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::allocation::DEFAULT_MAX_DEPTH;
use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use comfy_table::{Cell, Table, presets::UTF8_FULL};
use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;

const UA: &str = concat!(
    "anadist/",
    env!("CARGO_PKG_VERSION"),
    " (+https://github.com/alphavelocity/anadist)"
);

/// Minor-unit precision used when a currency has no `currencies` row.
pub const DEFAULT_DIGITS: u32 = 2;

static CURRENCY_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z]{3}$").unwrap());

pub fn http_client() -> Result<reqwest::blocking::Client> {
    let c = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(15))
        .user_agent(UA)
        .build()?;
    Ok(c)
}

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.trim()
        .parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s))
}

pub fn parse_currency(s: &str) -> Result<String> {
    let code = s.trim().to_uppercase();
    if !CURRENCY_CODE.is_match(&code) {
        return Err(anyhow!("Invalid currency code '{}', expected e.g. USD", s));
    }
    Ok(code)
}

pub fn fmt_amount(d: &Decimal) -> String {
    format!("{:.2}", d)
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn id_for_company(conn: &Connection, name: &str) -> Result<i64> {
    let mut stmt = conn.prepare("SELECT id FROM companies WHERE name=?1")?;
    let id: i64 = stmt
        .query_row(params![name], |r| r.get(0))
        .with_context(|| format!("Company '{}' not found", name))?;
    Ok(id)
}

pub fn id_for_analytic(conn: &Connection, name: &str) -> Result<i64> {
    let mut stmt = conn.prepare("SELECT id FROM analytic_accounts WHERE name=?1")?;
    let id: i64 = stmt
        .query_row(params![name], |r| r.get(0))
        .with_context(|| format!("Analytic account '{}' not found", name))?;
    Ok(id)
}

pub fn id_for_ledger(conn: &Connection, company_id: i64, code: &str) -> Result<i64> {
    let mut stmt = conn.prepare("SELECT id FROM ledger_accounts WHERE company_id=?1 AND code=?2")?;
    let id: i64 = stmt
        .query_row(params![company_id, code], |r| r.get(0))
        .with_context(|| format!("Ledger account '{}' not found", code))?;
    Ok(id)
}

pub fn analytic_name(conn: &Connection, id: i64) -> Result<String> {
    let name: Option<String> = conn
        .query_row(
            "SELECT name FROM analytic_accounts WHERE id=?1",
            params![id],
            |r| r.get(0),
        )
        .optional()?;
    Ok(name.unwrap_or_else(|| format!("#{}", id)))
}

pub fn currency_digits(conn: &Connection, code: &str) -> Result<u32> {
    let d: Option<u32> = conn
        .query_row(
            "SELECT digits FROM currencies WHERE code=?1",
            params![code],
            |r| r.get(0),
        )
        .optional()?;
    Ok(d.unwrap_or(DEFAULT_DIGITS))
}

// Settings
fn get_setting(conn: &Connection, key: &str) -> Result<Option<String>> {
    let v: Option<String> = conn
        .query_row(
            "SELECT value FROM settings WHERE key=?1",
            params![key],
            |r| r.get(0),
        )
        .optional()?;
    Ok(v)
}

pub fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value) VALUES(?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![key, value],
    )?;
    Ok(())
}

pub fn get_base_currency(conn: &Connection) -> Result<String> {
    Ok(get_setting(conn, "base_currency")?.unwrap_or_else(|| "USD".to_string()))
}

pub fn set_base_currency(conn: &Connection, ccy: &str) -> Result<()> {
    set_setting(conn, "base_currency", ccy)
}

pub fn get_spread_max_depth(conn: &Connection) -> Result<usize> {
    match get_setting(conn, "spread_max_depth")? {
        Some(v) => v
            .trim()
            .parse::<usize>()
            .with_context(|| format!("Invalid spread_max_depth setting '{}'", v)),
        None => Ok(DEFAULT_MAX_DEPTH),
    }
}

/// Convert an amount from 'from_ccy' to 'to_ccy' using the closest on-or-before rate.
/// We store base->quote rates. If pair not found directly, we attempt via the base currency hub.
pub fn fx_convert(
    conn: &Connection,
    date: NaiveDate,
    amount: Decimal,
    from_ccy: &str,
    to_ccy: &str,
) -> Result<Decimal> {
    if from_ccy == to_ccy {
        return Ok(amount);
    }
    let hub = get_base_currency(conn)?;

    if to_ccy == hub {
        if let Some(r) = find_rate(conn, date, &hub, from_ccy)? {
            if r.is_zero() {
                return Ok(amount);
            }
            return Ok(amount / r);
        }
    } else if from_ccy == hub {
        if let Some(r) = find_rate(conn, date, &hub, to_ccy)? {
            return Ok(amount * r);
        }
    } else {
        let base_amt = fx_convert(conn, date, amount, from_ccy, &hub)?;
        return fx_convert(conn, date, base_amt, &hub, to_ccy);
    }

    // Try reciprocal last
    if let Some(r) = find_rate(conn, date, to_ccy, from_ccy)? {
        if r.is_zero() {
            return Ok(amount);
        }
        return Ok(amount / r);
    }

    warn!(
        "no FX rate {}->{} on or before {}; amount left unconverted",
        from_ccy, to_ccy, date
    );
    Ok(amount)
}

/// True when `fx_convert` would find a rate for the pair instead of falling
/// back to the unconverted amount.
pub fn has_fx_path(conn: &Connection, date: NaiveDate, from_ccy: &str, to_ccy: &str) -> Result<bool> {
    if from_ccy == to_ccy {
        return Ok(true);
    }
    let hub = get_base_currency(conn)?;
    if to_ccy == hub {
        Ok(find_rate(conn, date, &hub, from_ccy)?.is_some())
    } else if from_ccy == hub {
        Ok(find_rate(conn, date, &hub, to_ccy)?.is_some()
            || find_rate(conn, date, to_ccy, from_ccy)?.is_some())
    } else {
        Ok(has_fx_path(conn, date, from_ccy, &hub)? && has_fx_path(conn, date, &hub, to_ccy)?)
    }
}

fn find_rate(conn: &Connection, date: NaiveDate, base: &str, quote: &str) -> Result<Option<Decimal>> {
    let mut stmt = conn.prepare(
        "SELECT rate FROM fx_rates WHERE base=?1 AND quote=?2 AND date<=?3 ORDER BY date DESC LIMIT 1",
    )?;
    let r: Option<String> = stmt
        .query_row(params![base, quote, date.to_string()], |r| r.get(0))
        .optional()?;
    if let Some(s) = r {
        let d = s
            .parse::<Decimal>()
            .with_context(|| format!("Invalid rate '{}' for {}/{}", s, base, quote))?;
        Ok(Some(d))
    } else {
        Ok(None)
    }
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // If v is an array, stream each element; else stream single line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}
