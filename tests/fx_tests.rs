// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anadist::{cli, commands::fx, db, utils};
use chrono::NaiveDate;
use rusqlite::{Connection, params};
use rust_decimal::Decimal;

fn setup() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    conn.execute(
        "INSERT INTO settings(key,value) VALUES('base_currency','USD')",
        [],
    )
    .unwrap();
    conn
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 8, d).unwrap()
}

fn add_rate(conn: &Connection, date: &str, base: &str, quote: &str, rate: &str) {
    conn.execute(
        "INSERT INTO fx_rates(date,base,quote,rate) VALUES (?1,?2,?3,?4)",
        params![date, base, quote, rate],
    )
    .unwrap();
}

#[test]
fn fx_triangulation_and_reciprocal() {
    let conn = setup();
    add_rate(&conn, "2025-08-01", "USD", "INR", "83");
    add_rate(&conn, "2025-08-01", "USD", "EUR", "0.90");

    // 90 EUR -> USD = 100 -> INR = 8300
    let res = utils::fx_convert(&conn, day(15), Decimal::new(9000, 2), "EUR", "INR").unwrap();
    assert_eq!(format!("{:.2}", res.round_dp(2)), "8300.00");

    // Reciprocal: INR -> USD using only USD->INR
    let res2 = utils::fx_convert(&conn, day(15), Decimal::new(16600, 2), "INR", "USD").unwrap();
    assert_eq!(format!("{:.2}", res2.round_dp(2)), "2.00");
}

#[test]
fn fx_uses_latest_rate_on_or_before_date() {
    let conn = setup();
    add_rate(&conn, "2025-08-01", "USD", "EUR", "0.80");
    add_rate(&conn, "2025-08-10", "USD", "EUR", "0.90");
    add_rate(&conn, "2025-08-20", "USD", "EUR", "1.00");

    let amt = Decimal::new(10000, 2);
    let res = utils::fx_convert(&conn, day(15), amt, "USD", "EUR").unwrap();
    assert_eq!(res.round_dp(2), Decimal::new(9000, 2));
}

#[test]
fn fx_missing_rate_leaves_amount_unconverted() {
    let conn = setup();
    let amt = Decimal::new(1234, 2);
    let res = utils::fx_convert(&conn, day(15), amt, "USD", "GBP").unwrap();
    assert_eq!(res, amt);
    assert!(!utils::has_fx_path(&conn, day(15), "USD", "GBP").unwrap());
}

#[test]
fn fx_path_follows_conversion_rules() {
    let conn = setup();
    add_rate(&conn, "2025-08-01", "USD", "EUR", "0.90");
    add_rate(&conn, "2025-08-01", "GBP", "USD", "1.25");

    assert!(utils::has_fx_path(&conn, day(15), "EUR", "EUR").unwrap());
    assert!(utils::has_fx_path(&conn, day(15), "USD", "EUR").unwrap());
    assert!(utils::has_fx_path(&conn, day(15), "EUR", "USD").unwrap());
    // Reciprocal from the hub side
    assert!(utils::has_fx_path(&conn, day(15), "USD", "GBP").unwrap());
    // Rates dated after the lookup day don't count
    assert!(!utils::has_fx_path(&conn, NaiveDate::from_ymd_opt(2025, 7, 31).unwrap(), "USD", "EUR").unwrap());
}

#[test]
fn fx_add_rejects_non_positive_rate() {
    let conn = setup();
    let matches = cli::build_cli().get_matches_from([
        "anadist", "fx", "add", "--date", "2025-08-01", "--base", "USD", "--quote", "EUR", "--rate", "0",
    ]);
    if let Some(("fx", fx_m)) = matches.subcommand() {
        let err = fx::handle(&conn, fx_m).unwrap_err();
        assert!(err.to_string().contains("FX rate must be positive"));
    } else {
        panic!("fx command not parsed");
    }
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM fx_rates", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn fx_add_overwrites_same_day_rate() {
    let conn = setup();
    for rate in ["0.90", "0.95"] {
        let matches = cli::build_cli().get_matches_from([
            "anadist", "fx", "add", "--date", "2025-08-01", "--base", "usd", "--quote", "EUR", "--rate", rate,
        ]);
        if let Some(("fx", fx_m)) = matches.subcommand() {
            fx::handle(&conn, fx_m).unwrap();
        } else {
            panic!("fx command not parsed");
        }
    }
    let (count, rate): (i64, String) = conn
        .query_row("SELECT COUNT(*), MAX(rate) FROM fx_rates WHERE base='USD'", [], |r| {
            Ok((r.get(0)?, r.get(1)?))
        })
        .unwrap();
    assert_eq!(count, 1);
    assert_eq!(rate, "0.95");
}

#[test]
fn fetched_series_keeps_existing_rates() {
    let conn = setup();
    add_rate(&conn, "2025-08-01", "USD", "EUR", "0.91");
    let series: fx::Series = serde_json::from_str(
        r#"{"amount":1.0,"base":"USD","start_date":"2025-08-01","end_date":"2025-08-04",
            "rates":{"2025-08-01":{"EUR":0.95,"JPY":147.1},"2025-08-04":{"EUR":0.92}}}"#,
    )
    .unwrap();

    assert_eq!(fx::store_series(&conn, &series).unwrap(), 2);
    let kept: String = conn
        .query_row(
            "SELECT rate FROM fx_rates WHERE date='2025-08-01' AND quote='EUR'",
            [],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(kept, "0.91");
    assert_eq!(fx::store_series(&conn, &series).unwrap(), 0);
}

#[test]
fn fx_list_filters_by_currency() {
    let conn = setup();
    add_rate(&conn, "2025-08-01", "USD", "EUR", "0.90");
    add_rate(&conn, "2025-08-02", "USD", "EUR", "0.91");
    add_rate(&conn, "2025-08-01", "USD", "JPY", "147");

    let matches = cli::build_cli().get_matches_from(["anadist", "fx", "list", "--currency", "eur"]);
    if let Some(("fx", fx_m)) = matches.subcommand() {
        if let Some(("list", list_m)) = fx_m.subcommand() {
            let rows = fx::query_rows(&conn, list_m).unwrap();
            assert_eq!(rows.len(), 2);
            assert_eq!(rows[0].date, "2025-08-02");
            assert!(rows.iter().all(|r| r.quote == "EUR"));
        } else {
            panic!("fx list not parsed");
        }
    } else {
        panic!("fx command not parsed");
    }
}

#[test]
fn fx_convert_rounds_to_target_digits() {
    let conn = setup();
    add_rate(&conn, "2025-08-01", "USD", "JPY", "147.123");
    conn.execute("INSERT INTO currencies(code,digits) VALUES ('JPY',0)", [])
        .unwrap();

    let res = fx::convert_rounded(&conn, day(15), Decimal::new(1050, 2), "USD", "JPY").unwrap();
    // 10.50 * 147.123 = 1544.7915
    assert_eq!(res, Decimal::new(1545, 0));
    let back = fx::convert_rounded(&conn, day(15), Decimal::new(1545, 0), "JPY", "USD").unwrap();
    assert_eq!(back, Decimal::new(1050, 2));
}
