//! Catalog command implementation.

use crate::config;
use crate::error::Result;
use crate::model::{MasterReferenceEntry, ReferenceKind};
use crate::storage::Gateway;
use std::collections::HashMap;
use std::fmt::Write as _;

/// Execute the catalog command.
///
/// # Errors
///
/// Returns an error if the kind is unknown or the database cannot be read.
pub fn execute(kind: Option<&str>, json: bool, cli: &config::CliOverrides) -> Result<()> {
    let kind = kind.map(str::parse::<ReferenceKind>).transpose()?;
    let roster_dir = config::discover_roster_dir(None)?;
    let (storage, _) = config::open_storage(&roster_dir, cli.db.as_ref(), cli.lock_timeout)?;

    let entries = storage.load_all::<MasterReferenceEntry>()?;
    let entries = select_entries(entries, kind);

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else if entries.is_empty() {
        println!("No catalog entries.");
    } else {
        print!("{}", format_entries(&entries));
    }
    Ok(())
}

fn select_entries(
    entries: Vec<MasterReferenceEntry>,
    kind: Option<ReferenceKind>,
) -> Vec<MasterReferenceEntry> {
    let mut entries: Vec<_> = entries
        .into_iter()
        .filter(|entry| kind.is_none_or(|kind| entry.kind == kind))
        .collect();
    entries.sort_by(|a, b| {
        a.kind
            .cmp(&b.kind)
            .then_with(|| a.normalized_name.cmp(&b.normalized_name))
    });
    entries
}

fn format_entries(entries: &[MasterReferenceEntry]) -> String {
    let names: HashMap<&str, &str> = entries
        .iter()
        .map(|entry| (entry.id.as_str(), entry.name.as_str()))
        .collect();

    let mut out = String::new();
    let mut current = None;
    for entry in entries {
        if current != Some(entry.kind) {
            let _ = writeln!(out, "{}:", entry.kind.label());
            current = Some(entry.kind);
        }
        let _ = write!(out, "  {}", entry.name);
        if let Some(code) = &entry.code {
            let _ = write!(out, " [{code}]");
        }
        if let Some(parent_id) = &entry.parent_id {
            let parent = names.get(parent_id.as_str()).copied().unwrap_or(parent_id.as_str());
            let _ = write!(out, " (under {parent})");
        }
        out.push('\n');
    }
    out
}
