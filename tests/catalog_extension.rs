//! Catalog extension tests: deduplication of demanded names, parent
//! inference for hierarchical kinds, and batch-fatal failures.

mod common;

use common::fixtures::{call_time, employee_in, employee_row, options, sim_row};
use common::{FailingGateway, test_db, test_log};
use roster_import::model::{
    Employee, EmployeeRow, MasterReferenceEntry, ReferenceKind, ReferenceStatus, SimCard,
    SimCardRow,
};
use roster_import::storage::{Gateway, SqliteStorage};
use roster_import::{ImportOptions, ImportPhase, Importer, RosterError};

fn run(storage: &mut SqliteStorage, rows: &[EmployeeRow]) -> roster_import::ImportResult {
    Importer::new(storage, options())
        .run_at(rows, call_time())
        .expect("import runs")
}

fn entries_of(storage: &SqliteStorage, kind: ReferenceKind) -> Vec<MasterReferenceEntry> {
    storage
        .load_all::<MasterReferenceEntry>()
        .unwrap()
        .into_iter()
        .filter(|entry| entry.kind == kind)
        .collect()
}

fn named(entries: &[MasterReferenceEntry], name: &str) -> MasterReferenceEntry {
    entries
        .iter()
        .find(|entry| entry.name.eq_ignore_ascii_case(name))
        .cloned()
        .unwrap_or_else(|| panic!("no entry named {name}"))
}

/// Case and padding variants of one name.
fn variant(base: &str, n: usize) -> String {
    let cased: String = base
        .chars()
        .enumerate()
        .map(|(idx, ch)| {
            if (n >> (idx % 6)) & 1 == 1 {
                ch.to_ascii_uppercase()
            } else {
                ch.to_ascii_lowercase()
            }
        })
        .collect();
    format!("{}{cased}{}", " ".repeat(n % 3), " ".repeat(n % 2))
}

#[test]
fn fifty_spellings_create_one_entry() {
    let _log = test_log("fifty_spellings_create_one_entry");
    let mut storage = test_db();
    let rows: Vec<EmployeeRow> = (0..50)
        .map(|n| EmployeeRow {
            department: Some(variant("Human Resources", n)),
            ..employee_row(&format!("E{n:02}"), "Test", "Person")
        })
        .collect();

    let result = run(&mut storage, &rows);

    assert!(result.success, "errors: {:?}", result.errors);
    assert_eq!(result.created_count, 50);
    let departments = entries_of(&storage, ReferenceKind::Department);
    assert_eq!(departments.len(), 1);
    assert_eq!(departments[0].normalized_name, "human resources");
    assert_eq!(departments[0].status, ReferenceStatus::Active);

    let ids: std::collections::HashSet<_> = storage
        .load_all::<Employee>()
        .unwrap()
        .into_iter()
        .map(|employee| employee.department_id)
        .collect();
    assert_eq!(ids.len(), 1);
}

#[test]
fn existing_entries_are_reused_across_calls() {
    let _log = test_log("existing_entries_are_reused_across_calls");
    let mut storage = test_db();

    run(&mut storage, &[employee_in("E1", "Finance", "Payroll")]);
    run(&mut storage, &[employee_in("E2", "FINANCE", "payroll")]);

    assert_eq!(entries_of(&storage, ReferenceKind::Department).len(), 1);
    assert_eq!(entries_of(&storage, ReferenceKind::SubDepartment).len(), 1);
}

#[test]
fn majority_parent_wins() {
    let _log = test_log("majority_parent_wins");
    let mut storage = test_db();
    let rows = vec![
        employee_in("E1", "HR", "Payroll"),
        employee_in("E2", "Finance", "Payroll"),
        employee_in("E3", "finance", "payroll"),
    ];

    run(&mut storage, &rows);

    let departments = entries_of(&storage, ReferenceKind::Department);
    let payroll = named(&entries_of(&storage, ReferenceKind::SubDepartment), "Payroll");
    assert_eq!(
        payroll.parent_id.as_deref(),
        Some(named(&departments, "Finance").id.as_str())
    );
}

#[test]
fn parent_tie_goes_to_first_seen() {
    let _log = test_log("parent_tie_goes_to_first_seen");
    let mut storage = test_db();
    let rows = vec![
        employee_in("E1", "Operations", "Logistics"),
        employee_in("E2", "Finance", "Logistics"),
    ];

    run(&mut storage, &rows);

    let departments = entries_of(&storage, ReferenceKind::Department);
    let logistics = named(&entries_of(&storage, ReferenceKind::SubDepartment), "Logistics");
    assert_eq!(
        logistics.parent_id.as_deref(),
        Some(named(&departments, "Operations").id.as_str())
    );
}

#[test]
fn default_parent_is_created_once() {
    let _log = test_log("default_parent_is_created_once");
    let mut storage = test_db();
    let orphan = |code: &str, sub: &str| EmployeeRow {
        sub_department: Some(sub.to_string()),
        ..employee_row(code, "Test", "Person")
    };

    run(&mut storage, &[orphan("E1", "Payroll"), orphan("E2", "Audit")]);
    run(&mut storage, &[orphan("E3", "Treasury")]);

    let departments = entries_of(&storage, ReferenceKind::Department);
    assert_eq!(departments.len(), 1);
    assert_eq!(departments[0].name, "General");
    for sub in entries_of(&storage, ReferenceKind::SubDepartment) {
        assert_eq!(sub.parent_id.as_deref(), Some(departments[0].id.as_str()));
    }
}

#[test]
fn configured_default_parent_is_used() {
    let _log = test_log("configured_default_parent_is_used");
    let mut storage = test_db();
    let options = ImportOptions {
        default_parent: "Head Office".to_string(),
        ..options()
    };
    let row = EmployeeRow {
        sub_department: Some("Payroll".to_string()),
        ..employee_row("E1", "Test", "Person")
    };

    Importer::new(&mut storage, options)
        .run_at(&[row], call_time())
        .unwrap();

    let departments = entries_of(&storage, ReferenceKind::Department);
    assert_eq!(departments.len(), 1);
    assert_eq!(departments[0].name, "Head Office");
}

#[test]
fn names_from_failed_rows_still_extend_catalog() {
    let _log = test_log("names_from_failed_rows_still_extend_catalog");
    let mut storage = test_db();
    let row = EmployeeRow {
        last_name: None,
        company: Some("Globex".to_string()),
        ..employee_row("E1", "Test", "")
    };

    let result = run(&mut storage, &[row]);

    assert!(!result.success);
    assert_eq!(result.created_count, 0);
    assert_eq!(entries_of(&storage, ReferenceKind::Company).len(), 1);
}

#[test]
fn extension_failure_aborts_batch() {
    let _log = test_log("extension_failure_aborts_batch");
    let mut gateway = FailingGateway::new(test_db(), 1);

    let err = Importer::new(&mut gateway, options())
        .run_at(&[employee_in("E1", "Finance", "Payroll")], call_time())
        .unwrap_err();

    assert_eq!(err.phase(), Some(ImportPhase::CatalogExtension));
    assert_eq!(gateway.saves(), 1);
    assert_eq!(gateway.inner.count::<MasterReferenceEntry>().unwrap(), 0);
    assert_eq!(gateway.inner.count::<Employee>().unwrap(), 0);
}

#[test]
fn exhausted_code_space_is_fatal() {
    let _log = test_log("exhausted_code_space_is_fatal");
    let mut storage = test_db();

    // Occupy every code the call second can produce.
    let stamp = call_time().format("%y%m%d%H%M%S").to_string();
    let taken: Vec<MasterReferenceEntry> = (0..1000)
        .map(|n| MasterReferenceEntry {
            id: format!("ref-seed{n}"),
            kind: ReferenceKind::Project,
            code: Some(format!("PRJ-{stamp}{n:03}")),
            name: format!("Seed {n}"),
            normalized_name: format!("seed {n}"),
            parent_id: None,
            description: None,
            status: ReferenceStatus::Active,
            created_at: call_time(),
            created_by: "seed".to_string(),
        })
        .collect();
    storage.add_range(&taken);
    storage.save_changes().unwrap();

    let options = ImportOptions {
        max_code_attempts: 1,
        ..options()
    };
    let rows = vec![SimCardRow {
        project: Some("Apollo".to_string()),
        ..sim_row("A1", "S1")
    }];
    let err = Importer::new(&mut storage, options)
        .run_at(&rows, call_time())
        .unwrap_err();

    assert_eq!(err.phase(), Some(ImportPhase::CatalogExtension));
    assert!(err.is_systemic());
    assert!(matches!(
        err.root(),
        RosterError::CodeSpaceExhausted { attempts: 1, .. }
    ));
    assert_eq!(storage.count::<MasterReferenceEntry>().unwrap(), 1000);
    assert_eq!(storage.count::<SimCard>().unwrap(), 0);
}
