use biblioteca::settings::{ExportLabels, ImportSettings};
use biblioteca::spreadsheet::{export_catalog, import_spreadsheet};
use biblioteca::{BookRecord, Store};
use tempfile::TempDir;

fn fresh_store(dir: &TempDir, name: &str) -> Store {
    let store = Store::new(dir.path().join(name));
    store.initialize().unwrap();
    store
}

fn shelf() -> Vec<BookRecord> {
    vec![
        BookRecord {
            title: Some("Dune".into()),
            author: Some("Herbert".into()),
            genre: Some("Sci-Fi".into()),
            year: Some(1965),
            publisher: Some("Chilton".into()),
            location: Some("A1".into()),
            language: Some("English".into()),
            ..BookRecord::default()
        },
        BookRecord {
            title: Some("Il nome della rosa".into()),
            author: Some("Eco".into()),
            year: Some(1980),
            language: Some("Italiano".into()),
            ..BookRecord::default()
        },
        BookRecord {
            title: Some("Zibaldone".into()),
            location: Some("B2".into()),
            ..BookRecord::default()
        },
    ]
}

#[test]
fn export_then_import_reproduces_the_catalog_without_loans() {
    let dir = TempDir::new().unwrap();
    let source = fresh_store(&dir, "source.db");
    let mut ids = Vec::new();
    for record in shelf() {
        ids.push(source.add(&record).unwrap());
    }
    source.toggle_loan(ids[0], false, Some("Alice")).unwrap();

    let sheet = dir.path().join("catalog.xlsx");
    assert_eq!(
        export_catalog(&source, &sheet, &ExportLabels::default()).unwrap(),
        3
    );

    let target = fresh_store(&dir, "target.db");
    let report = import_spreadsheet(&target, &sheet, &ImportSettings::default()).unwrap();
    assert_eq!(report.inserted, 3);
    assert!(report.unmatched.is_empty());

    let imported: Vec<BookRecord> = target
        .list(50, 0)
        .unwrap()
        .iter()
        .map(|book| book.record())
        .collect();
    assert_eq!(imported, shelf());
    assert!(imported.iter().all(|record| !record.is_loaned));
    assert!(imported.iter().all(|record| record.loaned_to.is_none()));
}

#[test]
fn import_runs_against_an_uninitialised_database() {
    let dir = TempDir::new().unwrap();
    let source = fresh_store(&dir, "source.db");
    source.add(&shelf()[0]).unwrap();
    let sheet = dir.path().join("catalog.xlsx");
    export_catalog(&source, &sheet, &ExportLabels::default()).unwrap();

    let target = Store::new(dir.path().join("nested").join("fresh.db"));
    let report = import_spreadsheet(&target, &sheet, &ImportSettings::default()).unwrap();
    assert_eq!(report.inserted, 1);
    assert_eq!(target.search("dune", 10, 0).unwrap().len(), 1);
}
