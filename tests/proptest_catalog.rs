//! Property-based tests for catalog resolution and code generation.
//!
//! Uses proptest to verify that:
//! - Name normalization ignores case and surrounding whitespace
//! - One import never creates two entries for the same normalized name
//! - Generated codes stay unique while attempts remain

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use std::collections::HashSet;
use tracing::info;

use roster_import::import::{CodeGenerator, normalize_name};
use roster_import::model::{EmployeeRow, MasterReferenceEntry, ReferenceKind};
use roster_import::storage::{Gateway, SqliteStorage};
use roster_import::{ImportOptions, Importer};

fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("info")
        .with_test_writer()
        .try_init();
}

const NAMES: [&str; 4] = ["Finance", "Human Resources", "IT", "Field Ops"];

/// A name with random casing and padding.
fn spelled(base: &str, mask: u32, pad: usize) -> String {
    let cased: String = base
        .chars()
        .enumerate()
        .map(|(idx, ch)| {
            if (mask >> (idx % 32)) & 1 == 1 {
                ch.to_ascii_uppercase()
            } else {
                ch.to_ascii_lowercase()
            }
        })
        .collect();
    format!("{}{cased}{}", " ".repeat(pad), "\t".repeat(pad % 2))
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        ..Default::default()
    })]

    /// Property: normalization ignores ASCII case and surrounding whitespace
    #[test]
    fn normalization_ignores_case_and_padding(
        name in "[A-Za-z][A-Za-z ]{0,30}",
        mask in any::<u32>(),
        pad in 0usize..4,
    ) {
        let variant = spelled(&name, mask, pad);
        prop_assert_eq!(normalize_name(&variant), normalize_name(&name));
        prop_assert_eq!(normalize_name(&normalize_name(&name)), normalize_name(&name));
    }

    /// Property: distinct codes for up to `max_attempts` same-second mints
    #[test]
    fn codes_unique_within_attempt_budget(
        randoms in proptest::collection::vec(0u16..1000, 1..=100),
    ) {
        let now = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let mut codes = CodeGenerator::new(100, Vec::<String>::new());
        let mut seen = HashSet::new();

        for random in randoms {
            let code = codes
                .generate_with(ReferenceKind::CostCenter, "CC", now, random)
                .expect("within budget");
            prop_assert!(code.starts_with("CC-260102030405"));
            prop_assert!(seen.insert(code));
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 24,
        ..Default::default()
    })]

    /// Property: one entry per normalized department name, whatever the spelling
    #[test]
    fn import_creates_one_entry_per_normalized_name(
        picks in proptest::collection::vec((0usize..4, any::<u32>(), 0usize..3), 1..40),
    ) {
        init_test_logging();

        let rows: Vec<EmployeeRow> = picks
            .iter()
            .enumerate()
            .map(|(idx, (pick, mask, pad))| EmployeeRow {
                employee_code: Some(format!("E{idx}")),
                first_name: Some("Test".to_string()),
                last_name: Some("Person".to_string()),
                department: Some(spelled(NAMES[*pick], *mask, *pad)),
                ..EmployeeRow::default()
            })
            .collect();
        let expected: HashSet<String> = picks
            .iter()
            .map(|(pick, _, _)| normalize_name(NAMES[*pick]))
            .collect();

        let mut storage = SqliteStorage::open_memory().unwrap();
        let result = Importer::new(&mut storage, ImportOptions::default())
            .run(&rows)
            .unwrap();
        info!(rows = rows.len(), distinct = expected.len(), "proptest_catalog: imported");

        prop_assert!(result.success);
        prop_assert_eq!(result.created_count, rows.len());
        let stored: HashSet<String> = storage
            .load_all::<MasterReferenceEntry>()
            .unwrap()
            .into_iter()
            .map(|entry| entry.normalized_name)
            .collect();
        prop_assert_eq!(stored, expected);
    }
}
