use discrepancy_core::db::RecordStore;
use discrepancy_core::{
    normalize, CompanyRecord, FieldName, FieldValue, KnownField, RawFields, Source,
};
use serde_json::json;

fn retailco() -> CompanyRecord {
    CompanyRecord::new("RetailCo")
        .with_value(KnownField::Industry, "Retail")
        .with_value(KnownField::Revenue, 900_000_i64)
}

#[test]
fn lookup_ignores_case_and_spacing() {
    let mut store = RecordStore::open_in_memory().unwrap();
    store.insert(&CompanyRecord::new("Big   Box Stores")).unwrap();
    assert!(store.exists("big box stores").unwrap());
    assert_eq!(store.find("  BIG BOX   STORES ").unwrap().company_name(), "Big   Box Stores");
    assert!(!store.exists("Big Box").unwrap());
}

#[test]
fn update_appends_to_resolution_history() {
    let mut store = RecordStore::open_in_memory().unwrap();
    store.insert(&retailco()).unwrap();

    let revenue = FieldName::Known(KnownField::Revenue);
    store.update("RetailCo", &revenue, Some(FieldValue::from(1_000_000_i64))).unwrap();
    store.update("retailco", &FieldName::Known(KnownField::Industry), None).unwrap();

    let history = store.resolution_history("RETAILCO").unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].company_key, "retailco");
    assert_eq!(history[0].field, "Revenue");
    assert_eq!(history[0].old_value.as_deref(), Some("900000"));
    assert_eq!(history[0].new_value.as_deref(), Some("1000000"));
    assert_eq!(history[1].field, "Industry");
    assert_eq!(history[1].new_value, None);
}

#[test]
fn list_preserves_insertion_order() {
    let mut store = RecordStore::open_in_memory().unwrap();
    let inserted = store
        .insert_all(&[CompanyRecord::new("Zeta"), CompanyRecord::new("Alpha"), retailco()])
        .unwrap();
    assert_eq!(inserted, 3);
    let names: Vec<_> =
        store.list().unwrap().iter().map(|record| record.company_name().to_string()).collect();
    assert_eq!(names, vec!["Zeta", "Alpha", "RetailCo"]);
}

#[test]
fn latest_extraction_replaces_previous() {
    let mut store = RecordStore::open_in_memory().unwrap();
    store.insert(&retailco()).unwrap();
    assert!(store.latest_extraction("RetailCo").unwrap().is_none());

    let first: RawFields = serde_json::from_value(json!({"Revenue": "1,000,000"})).unwrap();
    let second: RawFields =
        serde_json::from_value(json!({"Revenue": "1,100,000", "Auditor": "KPMG"})).unwrap();
    let extracted = normalize(&first, Source::Pdf).unwrap();
    store.save_extraction("RetailCo", Some("abc"), &extracted).unwrap();
    store.save_extraction("retailco", None, &normalize(&second, Source::Pdf).unwrap()).unwrap();

    let latest = store.latest_extraction("RETAILCO").unwrap().unwrap();
    assert_eq!(latest.document_sha256, None);
    assert_eq!(latest.fields.source(), Source::Pdf);
    assert_eq!(latest.fields, normalize(&second, Source::Pdf).unwrap());
}

#[test]
fn file_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("records.db");
    {
        let mut store = RecordStore::open(&path).unwrap();
        store.insert(&retailco()).unwrap();
        store
            .update("RetailCo", &FieldName::Known(KnownField::Location), Some("Chicago".into()))
            .unwrap();
    }

    let store = RecordStore::open(&path).unwrap();
    let record = store.find("RetailCo").unwrap();
    assert_eq!(record.get(KnownField::Location), Some(&FieldValue::from("Chicago")));
    assert_eq!(store.resolution_history("RetailCo").unwrap().len(), 1);
}
