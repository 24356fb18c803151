use discrepancy_core::db::{ProjectConfig, ProjectLayout, DEFAULT_BIND};

#[test]
fn db_path_relative_string_prefers_relative() {
    let root = tempfile::tempdir().unwrap();
    let layout = ProjectLayout::new(root.path());
    let rel = layout.db_path_relative_string();
    assert!(rel.starts_with(".discrepancy"));
    assert!(rel.ends_with("records.db"));
}

#[test]
fn layout_paths_live_under_meta_dir() {
    let root = tempfile::tempdir().unwrap();
    let layout = ProjectLayout::new(root.path());
    assert!(layout.project_config_path.starts_with(&layout.meta_dir));
    assert!(layout.db_path.starts_with(&layout.meta_dir));
}

#[test]
fn config_defaults_fill_missing_sections() {
    let config: ProjectConfig = serde_json::from_str(
        r#"{"name": "Minimal", "description": null, "config_version": "0.1.0", "db": {"path": "x.db"}}"#,
    )
    .unwrap();
    assert!(config.extractor.is_none());
    assert!(config.compare.numeric_tolerance.is_zero());
    assert_eq!(config.server.bind, DEFAULT_BIND);
}

#[test]
fn config_round_trips_extractor_section() {
    let raw = r#"{
        "name": "Full",
        "description": "with extractor",
        "config_version": "0.1.0",
        "db": {"path": ".discrepancy/records.db"},
        "compare": {"numeric_tolerance": "0.01"},
        "extractor": {"program": "pdf2fields", "args": ["--json"], "api_key_env": "PDF_KEY"},
        "server": {"bind": "0.0.0.0:9000"}
    }"#;
    let config: ProjectConfig = serde_json::from_str(raw).unwrap();
    let extractor = config.extractor.as_ref().unwrap();
    assert_eq!(extractor.program, "pdf2fields");
    assert_eq!(extractor.args, vec!["--json"]);
    assert_eq!(extractor.api_key_env.as_deref(), Some("PDF_KEY"));
    assert_eq!(config.compare.numeric_tolerance.to_string(), "0.01");
    assert_eq!(config.server.bind, "0.0.0.0:9000");
}
