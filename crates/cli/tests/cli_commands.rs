use std::fs;
use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use discrepancy_core::db::{ProjectConfig, ProjectLayout, RecordStore};
use discrepancy_core::{FieldValue, KnownField};
use predicates::prelude::*;
use serde_json::Value;
use tempfile::tempdir;

const COMPANIES_CSV: &str = "\
Company Name,Industry,Location,Revenue
RetailCo,Retail,Chicago,900000
Acme Corp,Manufacturing,Detroit,\"$2,500,000\"
";

fn init_project(root: &Path) {
    cargo_bin_cmd!("discrepancy-checker")
        .arg("init-project")
        .arg("--root")
        .arg(root)
        .arg("--name")
        .arg("TestProject")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized discrepancy checker project"));
}

fn import_companies(root: &Path) {
    let csv_path = root.join("companies.csv");
    fs::write(&csv_path, COMPANIES_CSV).unwrap();
    cargo_bin_cmd!("discrepancy-checker")
        .arg("import-csv")
        .arg("--root")
        .arg(root)
        .arg("--path")
        .arg(&csv_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 2 companies"));
}

fn write_extracted(root: &Path, body: &str) -> std::path::PathBuf {
    let path = root.join("extracted.json");
    fs::write(&path, body).unwrap();
    path
}

fn stdout_json(output: std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

#[test]
fn init_project_writes_config_and_store() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    init_project(root);

    let layout = ProjectLayout::new(root);
    assert!(layout.project_config_path.is_file());
    assert!(layout.db_path.is_file());

    let config: ProjectConfig =
        serde_json::from_str(&fs::read_to_string(&layout.project_config_path).unwrap()).unwrap();
    assert_eq!(config.name, "TestProject");

    cargo_bin_cmd!("discrepancy-checker")
        .arg("project-info")
        .arg("--root")
        .arg(root)
        .assert()
        .success()
        .stdout(predicate::str::contains("Name: TestProject"))
        .stdout(predicate::str::contains("(not configured)"));
}

#[test]
fn import_list_and_show_companies() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    init_project(root);
    import_companies(root);

    cargo_bin_cmd!("discrepancy-checker")
        .arg("list-companies")
        .arg("--root")
        .arg(root)
        .assert()
        .success()
        .stdout(predicate::str::contains("- RetailCo"))
        .stdout(predicate::str::contains("- Acme Corp"));

    let output = cargo_bin_cmd!("discrepancy-checker")
        .arg("show-company")
        .arg("--root")
        .arg(root)
        .arg("--name")
        .arg("acme corp")
        .arg("--json")
        .output()
        .unwrap();
    assert!(output.status.success());
    let company = stdout_json(output);
    assert_eq!(company["Company Name"], "Acme Corp");
    assert_eq!(company["Revenue"], 2_500_000);
}

#[test]
fn add_company_normalizes_field_assignments() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    init_project(root);

    cargo_bin_cmd!("discrepancy-checker")
        .arg("add-company")
        .arg("--root")
        .arg(root)
        .arg("--name")
        .arg("ShopCo")
        .arg("--field")
        .arg("employees=1,200")
        .arg("--field")
        .arg("Founded=March 5, 2001")
        .assert()
        .success()
        .stdout(predicate::str::contains("Added company 'ShopCo' (3 field(s))"));

    let store = RecordStore::open(&ProjectLayout::new(root).db_path).unwrap();
    let record = store.find("shopco").unwrap();
    assert_eq!(record.get(KnownField::NumberOfEmployees), Some(&FieldValue::from(1_200_i64)));
    assert_eq!(record.get(KnownField::Founded).unwrap().to_string(), "2001-03-05");
}

#[test]
fn compare_then_resolve_reconciles_revenue() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    init_project(root);
    import_companies(root);
    let extracted =
        write_extracted(root, r#"{"Company Name": "RetailCo", "Revenue": "1,000,000"}"#);

    let output = cargo_bin_cmd!("discrepancy-checker")
        .arg("compare")
        .arg("--root")
        .arg(root)
        .arg("--extracted")
        .arg(&extracted)
        .arg("--json")
        .output()
        .unwrap();
    assert!(output.status.success());
    let summary = stdout_json(output);
    assert_eq!(summary["company_name"], "RetailCo");
    let revenue = summary["entries"]
        .as_array()
        .unwrap()
        .iter()
        .find(|entry| entry["field"] == "Revenue")
        .unwrap()
        .clone();
    assert_eq!(revenue["database"], 900000);
    assert_eq!(revenue["pdf"], 1000000);
    assert_eq!(revenue["match"], false);

    cargo_bin_cmd!("discrepancy-checker")
        .arg("resolve")
        .arg("--root")
        .arg(root)
        .arg("--company")
        .arg("RetailCo")
        .arg("--field")
        .arg("Revenue")
        .arg("--value")
        .arg("1000000")
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated 'Revenue' for RetailCo"));

    cargo_bin_cmd!("discrepancy-checker")
        .arg("compare")
        .arg("--root")
        .arg(root)
        .arg("--company")
        .arg("retailco")
        .arg("--extracted")
        .arg(&extracted)
        .assert()
        .success()
        .stdout(predicate::str::contains("0 mismatch"));

    let output = cargo_bin_cmd!("discrepancy-checker")
        .arg("history")
        .arg("--root")
        .arg(root)
        .arg("--company")
        .arg("RetailCo")
        .arg("--json")
        .output()
        .unwrap();
    let history = stdout_json(output);
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(history[0]["old_value"], "900000");
    assert_eq!(history[0]["new_value"], "1000000");
}

#[test]
fn resolve_with_database_source_writes_nothing() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    init_project(root);
    import_companies(root);

    cargo_bin_cmd!("discrepancy-checker")
        .arg("resolve")
        .arg("--root")
        .arg(root)
        .arg("--company")
        .arg("RetailCo")
        .arg("--field")
        .arg("Revenue")
        .arg("--value")
        .arg("1000000")
        .arg("--source")
        .arg("database")
        .assert()
        .success()
        .stdout(predicate::str::contains("Kept database value"));

    cargo_bin_cmd!("discrepancy-checker")
        .arg("history")
        .arg("--root")
        .arg(root)
        .arg("--company")
        .arg("RetailCo")
        .assert()
        .success()
        .stdout(predicate::str::contains("No resolutions recorded"));
}

#[cfg(unix)]
#[test]
fn compare_pdf_runs_configured_extractor() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    init_project(root);
    import_companies(root);

    let layout = ProjectLayout::new(root);
    let mut config: ProjectConfig =
        serde_json::from_str(&fs::read_to_string(&layout.project_config_path).unwrap()).unwrap();
    config.extractor = Some(discrepancy_core::db::ExtractorConfig {
        program: "sh".into(),
        args: vec![
            "-c".into(),
            r#"cat > /dev/null; printf '{"Company Name": "Acme Corp", "Revenue": 2500000}'"#
                .into(),
        ],
        api_key_env: None,
    });
    fs::write(&layout.project_config_path, serde_json::to_string_pretty(&config).unwrap())
        .unwrap();
    let pdf = root.join("report.pdf");
    fs::write(&pdf, b"%PDF-1.4 fake").unwrap();

    cargo_bin_cmd!("discrepancy-checker")
        .arg("compare")
        .arg("--root")
        .arg(root)
        .arg("--pdf")
        .arg(&pdf)
        .assert()
        .success()
        .stdout(predicate::str::contains("Company: Acme Corp"))
        .stdout(predicate::str::contains("2 match, 0 mismatch"));
}
