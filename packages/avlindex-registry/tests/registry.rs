use avlindex_core::{AuditAction, MemoryAudit};
use avlindex_registry::{csv, open, open_with, Citizen, RegistryConfig};
use chrono::NaiveDate;

fn config_in(dir: &tempfile::TempDir) -> RegistryConfig {
    RegistryConfig {
        audit_log: dir.path().join("system_audit.log"),
        snapshot_path: dir.path().join("data.bin"),
        snapshot_key: Some("ab".repeat(32)),
        ..RegistryConfig::default()
    }
}

fn seed() -> Vec<Citizen> {
    let born = NaiveDate::from_ymd_opt(1990, 1, 1).unwrap();
    vec![
        Citizen::new("085001000000", "Nguyen Van An", "M", born),
        Citizen::new("072234234002", "Tran Thi Bich", "F", born),
        Citizen::new("061002234243", "Le Van Cuong", "M", born),
        Citizen::new("bogus", "Hacker", "M", born),
    ]
}

#[test]
fn open_restores_what_was_saved() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(&dir);

    let first = open(&config).unwrap();
    let report = first.bulk_load(seed());
    assert_eq!((report.inserted, report.rejected), (3, 1));
    first.save(&config.snapshot_path, &config.snapshot_key().unwrap()).unwrap();

    let second = open_with(&config, MemoryAudit::new()).unwrap();
    let ids: Vec<_> = second.sorted_snapshot().into_iter().map(|c| c.id).collect();
    assert_eq!(ids, ["061002234243", "072234234002", "085001000000"]);
    assert!(config.audit_log.exists());
}

#[test]
fn key_lookups_and_range_over_citizens() {
    let dir = tempfile::tempdir().unwrap();
    let audit = MemoryAudit::new();
    let registry = open_with(&config_in(&dir), audit.clone()).unwrap();
    registry.bulk_load(seed());

    let found = registry.find(&Citizen::key("072234234002")).unwrap();
    assert_eq!(found.name, "Tran Thi Bich");
    assert!(registry.find(&Citizen::key("999999999999")).is_none());
    assert_eq!(audit.actions(), [AuditAction::Search, AuditAction::Search]);

    let range = registry.range_query(&Citizen::key("07"), &Citizen::key("09"));
    let ids: Vec<_> = range.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, ["072234234002", "085001000000"]);
}

#[test]
fn csv_export_then_import_into_a_fresh_registry() {
    let dir = tempfile::tempdir().unwrap();
    let registry = open_with(&config_in(&dir), MemoryAudit::new()).unwrap();
    registry.bulk_load(seed());
    let csv_path = dir.path().join("citizens.csv");
    csv::export(&csv_path, &registry.sorted_snapshot()).unwrap();

    let other_dir = tempfile::tempdir().unwrap();
    let fresh = open_with(&config_in(&other_dir), MemoryAudit::new()).unwrap();
    let imported = csv::import(&csv_path).unwrap();
    let report = fresh.bulk_load(imported.citizens);
    assert_eq!(report.inserted, 3);
    assert_eq!(fresh.sorted_snapshot(), registry.sorted_snapshot());
}
