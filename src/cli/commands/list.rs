//! List command implementation.

use crate::cli::ListTarget;
use crate::config;
use crate::error::Result;
use crate::model::{Employee, SimAssignment, SimCard};
use crate::storage::{Gateway, SqliteStorage};
use std::collections::HashMap;
use std::fmt::Write as _;

/// Execute the list command.
///
/// # Errors
///
/// Returns an error if the database cannot be opened or read.
pub fn execute(target: ListTarget, json: bool, cli: &config::CliOverrides) -> Result<()> {
    let roster_dir = config::discover_roster_dir(None)?;
    let (storage, _) = config::open_storage(&roster_dir, cli.db.as_ref(), cli.lock_timeout)?;

    let (text, value) = match target {
        ListTarget::Employees => {
            let mut employees = storage.load_all::<Employee>()?;
            employees.sort_by(|a, b| a.employee_code.cmp(&b.employee_code));
            (format_employees(&employees), serde_json::to_value(&employees)?)
        }
        ListTarget::SimCards => {
            let mut cards = storage.load_all::<SimCard>()?;
            cards.sort_by_key(SimCard::natural_key);
            (format_sim_cards(&cards), serde_json::to_value(&cards)?)
        }
        ListTarget::Assignments => {
            let assignments = load_assignment_views(&storage)?;
            (format_assignments(&assignments), serde_json::to_value(&assignments)?)
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else if text.is_empty() {
        println!("No records.");
    } else {
        print!("{text}");
    }
    Ok(())
}

/// An assignment joined with the natural keys of both sides.
#[derive(Debug, Clone, serde::Serialize)]
struct AssignmentView {
    #[serde(flatten)]
    assignment: SimAssignment,
    sim: String,
    employee_code: String,
}

fn load_assignment_views(storage: &SqliteStorage) -> Result<Vec<AssignmentView>> {
    let sims: HashMap<String, String> = storage
        .load_all::<SimCard>()?
        .into_iter()
        .map(|card| (card.id.clone(), card.natural_key().to_string()))
        .collect();
    let employees: HashMap<String, String> = storage
        .load_all::<Employee>()?
        .into_iter()
        .map(|employee| (employee.id, employee.employee_code))
        .collect();

    let mut views: Vec<AssignmentView> = storage
        .load_all::<SimAssignment>()?
        .into_iter()
        .map(|assignment| AssignmentView {
            sim: sims
                .get(&assignment.sim_card_id)
                .cloned()
                .unwrap_or_else(|| assignment.sim_card_id.clone()),
            employee_code: employees
                .get(&assignment.employee_id)
                .cloned()
                .unwrap_or_else(|| assignment.employee_id.clone()),
            assignment,
        })
        .collect();
    views.sort_by(|a, b| {
        a.sim
            .cmp(&b.sim)
            .then_with(|| a.assignment.assigned_at.cmp(&b.assignment.assigned_at))
    });
    Ok(views)
}

fn format_employees(employees: &[Employee]) -> String {
    let mut out = String::new();
    for employee in employees {
        let _ = writeln!(
            out,
            "{}  {}  [{}]",
            employee.employee_code,
            employee.full_name(),
            employee.status
        );
    }
    out
}

fn format_sim_cards(cards: &[SimCard]) -> String {
    let mut out = String::new();
    for card in cards {
        let _ = write!(out, "{}  [{}]", card.natural_key(), card.status);
        if let Some(provider) = &card.provider {
            let _ = write!(out, "  {provider}");
        }
        if card.is_assigned {
            out.push_str("  assigned");
        }
        out.push('\n');
    }
    out
}

fn format_assignments(views: &[AssignmentView]) -> String {
    let mut out = String::new();
    for view in views {
        let _ = writeln!(
            out,
            "{} -> {}  [{}]  {}",
            view.sim,
            view.employee_code,
            view.assignment.status,
            view.assignment.assigned_at.format("%Y-%m-%d %H:%M:%S")
        );
    }
    out
}
