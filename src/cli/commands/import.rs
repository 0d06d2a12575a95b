//! Import command implementation.
//!
//! Reads a batch of rows from a file (or stdin) as either a JSON array or
//! JSON Lines, runs it through the import pipeline and prints the result.

use crate::cli::ImportTarget;
use crate::config;
use crate::error::{Result, ResultExt, RosterError};
use crate::import::{ImportResult, import_employees, import_sim_cards};
use crate::model::{EmployeeRow, SimCardRow};
use serde::de::DeserializeOwned;
use std::fs;
use std::io::{self, Read};
use std::path::Path;

/// Execute the import command.
///
/// Rejected rows do not fail the command: they are listed in the output and
/// `success` is false.
///
/// # Errors
///
/// Returns an error if the workspace cannot be opened, the input cannot be
/// decoded, or the import aborts on a storage failure.
pub fn execute(
    target: ImportTarget,
    file: &Path,
    dry_run: bool,
    json: bool,
    cli: &config::CliOverrides,
) -> Result<()> {
    let roster_dir = config::discover_roster_dir(None)?;
    let (mut storage, db_path) =
        config::open_storage(&roster_dir, cli.db.as_ref(), cli.lock_timeout)?;
    let layer = config::load_config(&roster_dir, Some(&storage), cli)?;
    let mut options = config::import_options_from_layer(&layer)?;
    options.dry_run = dry_run;

    let contents = read_input(file)?;
    tracing::info!(
        kind = ?target,
        db = %db_path.display(),
        dry_run,
        actor = %options.actor,
        "Starting import"
    );

    let result = match target {
        ImportTarget::Employees => {
            let rows: Vec<EmployeeRow> = decode_rows(&contents)?;
            import_employees(&mut storage, &rows, options)?
        }
        ImportTarget::SimCards => {
            let rows: Vec<SimCardRow> = decode_rows(&contents)?;
            import_sim_cards(&mut storage, &rows, options)?
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", format_summary(target, &result, dry_run));
    }
    Ok(())
}

fn read_input(file: &Path) -> Result<String> {
    if file == Path::new("-") {
        let mut contents = String::new();
        io::stdin().read_to_string(&mut contents)?;
        Ok(contents)
    } else {
        fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))
    }
}

/// Decode rows from a JSON array or JSON Lines.
///
/// Blank input yields an empty batch. `RowDecode` carries the 1-based record
/// position, counted the same way import results number rows: array elements,
/// or non-blank JSON Lines records. For JSON Lines the reason also names the
/// physical line.
///
/// # Errors
///
/// Returns `RowDecode` for the first record that is not a valid row object.
pub fn decode_rows<T: DeserializeOwned>(contents: &str) -> Result<Vec<T>> {
    let trimmed = contents.trim_start_matches('\u{feff}').trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    if trimmed.starts_with('[') {
        let values: Vec<serde_json::Value> =
            serde_json::from_str(trimmed).map_err(|err| RosterError::RowDecode {
                record: 0,
                reason: err.to_string(),
            })?;
        return values
            .into_iter()
            .enumerate()
            .map(|(idx, value)| {
                serde_json::from_value(value).map_err(|err| RosterError::RowDecode {
                    record: idx + 1,
                    reason: err.to_string(),
                })
            })
            .collect();
    }

    contents
        .trim_start_matches('\u{feff}')
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .enumerate()
        .map(|(record, (line_idx, line))| {
            serde_json::from_str(line).map_err(|err| RosterError::RowDecode {
                record: record + 1,
                reason: format!("line {}: {err}", line_idx + 1),
            })
        })
        .collect()
}

fn format_summary(target: ImportTarget, result: &ImportResult, dry_run: bool) -> String {
    use std::fmt::Write as _;

    let noun = match target {
        ImportTarget::Employees => "employees",
        ImportTarget::SimCards => "SIM cards",
    };
    let mut out = String::new();
    let prefix = if dry_run { "Dry run: would import" } else { "Imported" };
    let _ = writeln!(
        out,
        "{prefix} {noun}: {} created, {} updated, {} rejected",
        result.created_count,
        result.updated_count,
        result.errors.len()
    );
    for error in &result.errors {
        let _ = writeln!(out, "  {error}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::RowError;

    #[test]
    fn decode_json_array() {
        let rows: Vec<EmployeeRow> = decode_rows(
            r#"[{"employeeCode":"E1","firstName":"Ana","lastName":"Lee"},{"employee_code":"E2"}]"#,
        )
        .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].employee_code.as_deref(), Some("E1"));
        assert_eq!(rows[1].employee_code.as_deref(), Some("E2"));
    }

    #[test]
    fn decode_json_lines_skips_blank_lines() {
        let input = "{\"accountNumber\":\"A1\",\"serviceNumber\":\"S1\"}\n\n{\"accountNumber\":\"A2\"}\n";
        let rows: Vec<SimCardRow> = decode_rows(input).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].account_number.as_deref(), Some("A2"));
    }

    #[test]
    fn decode_blank_input_is_empty_batch() {
        let rows: Vec<EmployeeRow> = decode_rows("  \n").unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn decode_reports_record_position() {
        let err = decode_rows::<EmployeeRow>("{\"employeeCode\":\"E1\"}\nnot json\n").unwrap_err();
        assert!(matches!(err, RosterError::RowDecode { record: 2, .. }));

        let err = decode_rows::<EmployeeRow>(r#"[{"employeeCode":"E1"}, 7]"#).unwrap_err();
        assert!(matches!(err, RosterError::RowDecode { record: 2, .. }));
    }

    #[test]
    fn decode_json_lines_numbers_records_like_import_rows() {
        let input = "\n{\"employeeCode\":\"E1\"}\n\n\nnot json\n";
        let err = decode_rows::<EmployeeRow>(input).unwrap_err();
        match err {
            RosterError::RowDecode { record, reason } => {
                assert_eq!(record, 2);
                assert!(reason.starts_with("line 5: "), "reason: {reason}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn summary_lists_row_errors() {
        let result = ImportResult {
            success: false,
            created_count: 2,
            updated_count: 0,
            errors: vec![RowError {
                row: 2,
                message: "Last Name is required".to_string(),
            }],
        };
        let text = format_summary(ImportTarget::Employees, &result, false);
        assert!(text.starts_with("Imported employees: 2 created, 0 updated, 1 rejected"));
        assert!(text.contains("  row 2: Last Name is required"));

        let text = format_summary(ImportTarget::SimCards, &result, true);
        assert!(text.starts_with("Dry run: would import SIM cards"));
    }
}
