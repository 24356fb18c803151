use discrepancy_core::db::{ProjectConfig, ProjectContext, ProjectLayout};
use discrepancy_core::{CompanyRecord, KnownField};

fn write_config(layout: &ProjectLayout, config: &ProjectConfig) {
    std::fs::create_dir_all(&layout.meta_dir).unwrap();
    std::fs::write(&layout.project_config_path, serde_json::to_string_pretty(config).unwrap())
        .unwrap();
}

#[test]
fn project_context_loads_config_and_db() {
    let temp = tempfile::tempdir().unwrap();
    let layout = ProjectLayout::new(temp.path());
    let config = ProjectConfig::new("CtxProject", layout.db_path_relative_string());
    write_config(&layout, &config);

    let ctx = ProjectContext::from_root(temp.path()).expect("context");
    assert_eq!(ctx.config.name, "CtxProject");
    assert!(ctx.db_path.is_file());

    // DB should be initialized and usable.
    assert!(ctx.store.list().expect("list companies").is_empty());
    assert_eq!(ctx.extractor().name(), "unconfigured");
}

#[test]
fn records_persist_across_reopen() {
    let temp = tempfile::tempdir().unwrap();
    let layout = ProjectLayout::new(temp.path());
    write_config(&layout, &ProjectConfig::new("Persist", layout.db_path_relative_string()));

    {
        let mut ctx = ProjectContext::from_root(temp.path()).unwrap();
        ctx.store
            .insert(&CompanyRecord::new("RetailCo").with_value(KnownField::Revenue, 900_000_i64))
            .unwrap();
    }

    let ctx = ProjectContext::from_root(temp.path()).unwrap();
    let record = ctx.store.find("retailco").unwrap();
    assert_eq!(record.company_name(), "RetailCo");
    assert_eq!(record.get(KnownField::Revenue).unwrap().to_string(), "900000");
}

#[test]
fn absolute_db_path_is_respected() {
    let temp = tempfile::tempdir().unwrap();
    let elsewhere = tempfile::tempdir().unwrap();
    let db_path = elsewhere.path().join("shared.db");
    let layout = ProjectLayout::new(temp.path());
    write_config(&layout, &ProjectConfig::new("Abs", db_path.to_string_lossy().to_string()));

    let ctx = ProjectContext::from_root(temp.path()).unwrap();
    assert_eq!(ctx.db_path, db_path);
    assert!(db_path.is_file());
}

#[test]
fn missing_config_is_an_error() {
    let temp = tempfile::tempdir().unwrap();
    let err = ProjectContext::from_root(temp.path()).unwrap_err();
    assert!(err.to_string().contains("Failed to read project config"));
}

#[test]
fn negative_tolerance_is_rejected() {
    let temp = tempfile::tempdir().unwrap();
    let layout = ProjectLayout::new(temp.path());
    let mut config = ProjectConfig::new("Neg", layout.db_path_relative_string());
    config.compare.numeric_tolerance = rust_decimal::Decimal::new(-1, 2);
    write_config(&layout, &config);

    let err = ProjectContext::from_root(temp.path()).unwrap_err();
    assert!(err.to_string().contains("numeric_tolerance"));
}
