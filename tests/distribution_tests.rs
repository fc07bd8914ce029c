// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anadist::{cli, commands, db, distribution};
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Acme (USD) with ledger accounts 6000 Rent, 6100 Travel, 4000 Sales and
/// 1000 Bank; analytic accounts Admin, IT, Sales; Admin spreads 1:3 to IT
/// and Sales in report Q1.
fn setup() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    conn.execute_batch(
        r#"
        INSERT INTO companies(id,name,currency) VALUES (1,'Acme','USD');
        INSERT INTO ledger_accounts(id,company_id,code,name,kind) VALUES
            (1,1,'6000','Rent','expense'),
            (2,1,'6100','Travel','expense'),
            (3,1,'4000','Sales','revenue'),
            (4,1,'1000','Bank','other');
        INSERT INTO analytic_accounts(id,name,currency) VALUES
            (1,'Admin','USD'), (2,'IT','USD'), (3,'Sales','USD');
        INSERT INTO reports(id,name,company_id,start_date,end_date)
            VALUES (1,'Q1',1,'2025-01-01','2025-03-31');
        INSERT INTO report_rules(report_id,sequence,source_id,target_id,amount) VALUES
            (1,10,1,2,'1'),
            (1,20,1,3,'3');
    "#,
    )
    .unwrap();
    conn
}

fn line(conn: &Connection, date: &str, analytic: i64, ledger: i64, debit: &str, credit: &str) {
    conn.execute(
        "INSERT INTO analytic_lines(date,analytic_account_id,ledger_account_id,debit,credit) VALUES (?1,?2,?3,?4,?5)",
        params![date, analytic, ledger, debit, credit],
    )
    .unwrap();
}

fn report(conn: &Connection) -> anadist::models::Report {
    db::load_report(conn, "Q1").unwrap()
}

#[test]
fn balances_are_credit_minus_debit_within_window() {
    let conn = setup();
    line(&conn, "2025-01-15", 2, 1, "100", "0");
    line(&conn, "2025-02-15", 2, 1, "50", "20");
    line(&conn, "2024-12-31", 2, 1, "999", "0");
    line(&conn, "2025-04-01", 2, 1, "999", "0");
    line(&conn, "2025-03-31", 3, 3, "0", "500");

    let mut balances = distribution::fetch_balances(&conn, &report(&conn)).unwrap();
    balances.sort_by_key(|b| (b.analytic_id, b.ledger_id));
    assert_eq!(balances.len(), 2);
    assert_eq!(balances[0].analytic_id, 2);
    assert_eq!(balances[0].amount, dec!(-130));
    assert_eq!(balances[1].amount, dec!(500));
}

#[test]
fn balances_skip_view_and_inactive_accounts() {
    let conn = setup();
    conn.execute_batch(
        "INSERT INTO analytic_accounts(id,name,kind,currency) VALUES (4,'Group','view','USD');
         INSERT INTO analytic_accounts(id,name,currency,active) VALUES (5,'Old','USD',0);",
    )
    .unwrap();
    line(&conn, "2025-01-15", 4, 1, "10", "0");
    line(&conn, "2025-01-15", 5, 1, "10", "0");

    let balances = distribution::fetch_balances(&conn, &report(&conn)).unwrap();
    assert!(balances.is_empty());
}

#[test]
fn balances_convert_and_round_to_analytic_currency() {
    let conn = setup();
    conn.execute_batch(
        "INSERT INTO analytic_accounts(id,name,currency) VALUES (6,'Tokyo','JPY');
         INSERT INTO currencies(code,digits) VALUES ('JPY',0);
         INSERT INTO fx_rates(date,base,quote,rate) VALUES ('2025-03-01','USD','JPY','150.25');
         INSERT INTO fx_rates(date,base,quote,rate) VALUES ('2025-04-15','USD','JPY','999');",
    )
    .unwrap();
    line(&conn, "2025-01-15", 6, 1, "10.01", "0");

    let balances = distribution::fetch_balances(&conn, &report(&conn)).unwrap();
    assert_eq!(balances.len(), 1);
    // -10.01 USD * 150.25 = -1504.0025 JPY, rate as of the report end date
    assert_eq!(balances[0].amount, dec!(-1504));
}

#[test]
fn grid_spreads_balances_and_totals_rows() {
    let conn = setup();
    line(&conn, "2025-01-10", 1, 1, "100", "0");
    line(&conn, "2025-01-11", 2, 1, "10", "0");
    line(&conn, "2025-02-01", 3, 3, "0", "40");
    line(&conn, "2025-02-02", 1, 4, "70", "0");

    let grid = distribution::generate(&conn, &report(&conn)).unwrap();
    let names: Vec<&str> = grid.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Admin", "IT", "Sales"]);
    assert_eq!(grid.headers(), vec!["", "Admin", "IT", "Sales", "Total"]);

    // Bank is not an expense or revenue account; Travel has no amounts.
    assert_eq!(grid.rows.len(), 2);
    assert_eq!(grid.rows[0].account, "4000 - Sales");
    assert_eq!(grid.rows[0].values, vec![Decimal::ZERO, Decimal::ZERO, dec!(40)]);
    assert_eq!(grid.rows[1].account, "6000 - Rent");
    assert_eq!(grid.rows[1].values, vec![Decimal::ZERO, dec!(-35), dec!(-75)]);
    assert_eq!(grid.rows[1].total, dec!(-110));

    assert_eq!(grid.totals, vec![Decimal::ZERO, dec!(-35), dec!(-35)]);
    assert_eq!(grid.grand_total, dec!(-70));

    let body = grid.body();
    assert_eq!(body.len(), 3);
    assert_eq!(body[2], vec!["", "0.00", "-35.00", "-35.00", "-70.00"]);
}

#[test]
fn grid_records_start_with_title_and_blank_row() {
    let conn = setup();
    line(&conn, "2025-01-10", 2, 2, "12.5", "0");

    let grid = distribution::generate(&conn, &report(&conn)).unwrap();
    let records = grid.records();
    assert_eq!(records[0], vec!["Q1", "2025-01-01", "2025-03-31"]);
    assert!(records[1].is_empty());
    assert_eq!(records[2][0], "");
    assert_eq!(records[3], vec!["6100 - Travel", "0.00", "-12.50", "0.00", "-12.50"]);
    assert_eq!(records.len(), 5);
}

#[test]
fn grid_preserves_total_after_spreading() {
    let conn = setup();
    line(&conn, "2025-01-10", 1, 1, "100", "0");
    line(&conn, "2025-01-12", 1, 2, "0.01", "0");

    let grid = distribution::generate(&conn, &report(&conn)).unwrap();
    assert_eq!(grid.grand_total, dec!(-100.01));
    // The lone cent cannot be split 1:3; the last rule's target gets it.
    let travel = grid.rows.iter().find(|r| r.account == "6100 - Travel").unwrap();
    assert_eq!(travel.values, vec![Decimal::ZERO, Decimal::ZERO, dec!(-0.01)]);
}

#[test]
fn generate_fails_on_cyclic_rules() {
    let conn = setup();
    conn.execute(
        "INSERT INTO report_rules(report_id,sequence,source_id,target_id,amount) VALUES (1,30,3,1,'1')",
        [],
    )
    .unwrap();
    line(&conn, "2025-01-10", 1, 1, "100", "0");

    let err = distribution::generate(&conn, &report(&conn)).unwrap_err();
    assert!(
        err.downcast_ref::<anadist::allocation::AllocationError>()
            .is_some()
    );

    let matches = cli::build_cli().get_matches_from(["anadist", "report", "show", "--name", "Q1"]);
    if let Some(("report", report_m)) = matches.subcommand() {
        let err = commands::reports::handle(&conn, report_m).unwrap_err();
        assert!(err.to_string().contains("Spreading analytic account"));
    } else {
        panic!("report command not parsed");
    }
}

#[test]
fn report_add_rejects_inverted_window() {
    let conn = setup();
    let matches = cli::build_cli().get_matches_from([
        "anadist", "report", "add", "--name", "Bad", "--company", "Acme", "--start", "2025-03-01", "--end",
        "2025-01-01",
    ]);
    if let Some(("report", report_m)) = matches.subcommand() {
        let err = commands::reports::handle(&conn, report_m).unwrap_err();
        assert!(err.to_string().contains("is before start date"));
    } else {
        panic!("report command not parsed");
    }
}

#[test]
fn spread_preview_names_leaf_accounts() {
    let conn = setup();
    let matches = cli::build_cli().get_matches_from([
        "anadist", "spread", "--report", "Q1", "--account", "Admin", "--amount", "-10",
    ]);
    if let Some(("spread", spread_m)) = matches.subcommand() {
        let rows = commands::spread::query_rows(&conn, spread_m).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].account, "IT");
        assert_eq!(rows[0].amount, "-2.50");
        assert_eq!(rows[1].account, "Sales");
        assert_eq!(rows[1].amount, "-7.50");
    } else {
        panic!("spread command not parsed");
    }
}

#[test]
fn doctor_flags_invalid_rules_and_fx_gaps() {
    let conn = setup();
    conn.execute_batch(
        "INSERT INTO report_rules(report_id,sequence,source_id,target_id,amount) VALUES (1,30,3,1,'1');
         INSERT INTO analytic_accounts(id,name,currency) VALUES (6,'Berlin','EUR');",
    )
    .unwrap();
    line(&conn, "2025-01-10", 6, 1, "5", "0");

    let issues = commands::doctor::collect_issues(&conn).unwrap();
    let kinds: Vec<&str> = issues.iter().map(|(k, _)| k.as_str()).collect();
    assert!(kinds.contains(&"currency_without_digits"));
    assert!(kinds.contains(&"missing_fx"));
    let invalid = issues
        .iter()
        .find(|(k, _)| k == "invalid_rules")
        .unwrap();
    assert!(invalid.1.contains("'Admin' is used as a target"));
}
