use std::fs;
use std::path::Path;

use discrepancy_checker::commands::parse_assignment;
use discrepancy_checker::{canonicalize_or_current, infer_project_name};
use tempfile::tempdir;

#[test]
fn canonicalize_or_current_resolves_existing_path() {
    let tmp = tempdir().expect("tempdir");
    let subdir = tmp.path().join("nested");
    fs::create_dir_all(&subdir).expect("create nested");

    let result = canonicalize_or_current(&subdir.to_string_lossy()).expect("canonicalize nested");
    assert_eq!(result, subdir.canonicalize().expect("canonicalize subdir"));
}

#[test]
fn canonicalize_or_current_joins_missing_relative_path_with_cwd() {
    let result = canonicalize_or_current("does-not-exist-yet").expect("canonicalize");
    assert!(result.is_absolute());
    assert!(result.ends_with("does-not-exist-yet"));
}

#[test]
fn infer_project_name_uses_last_path_component() {
    assert_eq!(infer_project_name(Path::new("/tmp/discrepancy-checker")), "discrepancy-checker");
    assert_eq!(infer_project_name(Path::new("/tmp/project-root")), "project-root");
}

#[test]
fn infer_project_name_falls_back_when_missing() {
    assert_eq!(infer_project_name(Path::new("/")), "unnamed-project");
}

#[test]
fn parse_assignment_splits_on_first_equals() {
    assert_eq!(
        parse_assignment(" Revenue = 1,000,000 ").unwrap(),
        ("Revenue".to_string(), "1,000,000".to_string())
    );
    assert_eq!(parse_assignment("Note=a=b").unwrap(), ("Note".to_string(), "a=b".to_string()));
    assert!(parse_assignment("Revenue").is_err());
    assert!(parse_assignment("=5").is_err());
}
