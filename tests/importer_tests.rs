// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anadist::{cli, commands::importer, db};
use rusqlite::Connection;
use std::io::Write;
use tempfile::NamedTempFile;

const HEADER: &str = "date,analytic,company,ledger,debit,credit";

fn base_conn() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    conn.execute_batch(
        r#"
        INSERT INTO companies(id,name,currency) VALUES (1,'Acme','USD');
        INSERT INTO ledger_accounts(id,company_id,code,name,kind) VALUES (1,1,'6000','Rent','expense');
        INSERT INTO analytic_accounts(id,name,currency) VALUES (1,'Admin','USD'), (2,'IT','USD');
        "#,
    )
    .unwrap();
    conn
}

fn csv_file(body: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{}\n{}", HEADER, body).unwrap();
    file.flush().unwrap();
    file
}

fn import(conn: &mut Connection, path: &str) -> anyhow::Result<()> {
    let cli = cli::build_cli();
    let matches = cli.get_matches_from(["anadist", "import", "lines", "--path", path]);
    if let Some(("import", import_m)) = matches.subcommand() {
        importer::handle(conn, import_m)
    } else {
        panic!("no import subcommand");
    }
}

fn line_count(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM analytic_lines", [], |r| r.get(0))
        .unwrap()
}

#[test]
fn importer_trims_cli_path_argument() {
    let mut conn = base_conn();
    let file = csv_file("2025-02-03,Admin,Acme,6000,5.00,");
    let padded = format!("  {}  ", file.path().to_str().unwrap());

    import(&mut conn, &padded).unwrap();
    assert_eq!(line_count(&conn), 1);
}

#[test]
fn importer_trims_fields_and_defaults_empty_amounts() {
    let mut conn = base_conn();
    let file = csv_file("2025-02-03 ,  IT , Acme , 6000 ,, 12.30 ");

    import(&mut conn, file.path().to_str().unwrap()).unwrap();

    let (analytic, debit, credit): (i64, String, String) = conn
        .query_row(
            "SELECT analytic_account_id, debit, credit FROM analytic_lines",
            [],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )
        .unwrap();
    assert_eq!(analytic, 2);
    assert_eq!(debit, "0");
    assert_eq!(credit, "12.30");
}

#[test]
fn importer_rejects_invalid_date() {
    let mut conn = base_conn();
    let file = csv_file("2025-02-03,Admin,Acme,6000,1,\n2025-13-03,Admin,Acme,6000,1,");

    let err = import(&mut conn, file.path().to_str().unwrap()).unwrap_err();
    assert_eq!(err.to_string(), "Line 3");
    assert!(format!("{:#}", err).contains("Invalid date '2025-13-03'"));
    assert_eq!(line_count(&conn), 0);
}

#[test]
fn importer_rejects_invalid_amount() {
    let mut conn = base_conn();
    let file = csv_file("2025-02-03,Admin,Acme,6000,abc,");

    let err = import(&mut conn, file.path().to_str().unwrap()).unwrap_err();
    assert!(err.to_string().contains("Invalid debit 'abc' on line 2"));
    assert_eq!(line_count(&conn), 0);
}

#[test]
fn importer_rolls_back_on_unknown_ledger() {
    let mut conn = base_conn();
    let file = csv_file("2025-02-03,Admin,Acme,6000,1,\n2025-02-04,IT,Acme,9999,2,");

    let err = import(&mut conn, file.path().to_str().unwrap()).unwrap_err();
    assert!(err.to_string().contains("Ledger account '9999' not found"));
    assert_eq!(line_count(&conn), 0);
}

#[test]
fn importer_rejects_unknown_analytic_account() {
    let mut conn = base_conn();
    let file = csv_file("2025-02-03,Marketing,Acme,6000,1,");

    let err = import(&mut conn, file.path().to_str().unwrap()).unwrap_err();
    assert!(err.to_string().contains("Analytic account 'Marketing' not found"));
    assert_eq!(line_count(&conn), 0);
}
