//! End-to-end tests for the `roster` binary.

mod common;

use common::cli::{RosterWorkspace, init_workspace, run_roster};
use serde_json::Value;

const EMPLOYEES: &str = r#"[
  {"employeeCode": "E1", "firstName": "Ana", "lastName": "Lee", "department": "Finance", "subDepartment": "Payroll"},
  {"employeeCode": "E2", "firstName": "Ben"},
  {"employeeCode": "E3", "firstName": "Cy", "lastName": "Ng", "department": "finance"}
]"#;

const SIM_CARDS: &str = r#"{"accountNumber": "A1", "serviceNumber": "S1", "employeeCode": "E1", "project": "Apollo"}
{"accountNumber": "A1", "serviceNumber": "S2"}
"#;

fn json_stdout(stdout: &str) -> Value {
    serde_json::from_str(stdout).unwrap_or_else(|err| panic!("bad json ({err}): {stdout}"))
}

#[test]
fn e2e_init_twice_fails_without_force() {
    let workspace = init_workspace();
    assert!(workspace.root.join(".roster/roster.db").exists());

    let again = run_roster(&workspace, ["init"]);
    assert_eq!(again.status.code(), Some(2));
    assert!(again.stderr.contains("ALREADY_INITIALIZED"), "{}", again.stderr);

    let forced = run_roster(&workspace, ["init", "--force"]);
    assert!(forced.status.success(), "{}", forced.stderr);
}

#[test]
fn e2e_import_without_workspace_is_not_initialized() {
    let workspace = RosterWorkspace::new();
    let input = workspace.write("rows.json", EMPLOYEES);

    let run = run_roster(&workspace, ["import", "employees", input.to_str().unwrap()]);
    assert_eq!(run.status.code(), Some(2));
    assert!(run.stderr.contains("NOT_INITIALIZED"), "{}", run.stderr);
}

#[test]
fn e2e_import_employees_reports_row_errors() {
    let workspace = init_workspace();
    let input = workspace.write("employees.json", EMPLOYEES);

    let run = run_roster(
        &workspace,
        ["import", "employees", input.to_str().unwrap(), "--json"],
    );
    assert!(run.status.success(), "{}", run.stderr);

    let result = json_stdout(&run.stdout);
    assert_eq!(result["success"], false);
    assert_eq!(result["createdCount"], 2);
    assert_eq!(result["updatedCount"], 0);
    assert_eq!(result["errors"][0]["row"], 2);
    assert_eq!(result["errors"][0]["message"], "Last Name is required");

    let catalog = run_roster(&workspace, ["catalog", "--kind", "department", "--json"]);
    let departments = json_stdout(&catalog.stdout);
    assert_eq!(departments.as_array().map(Vec::len), Some(1));
    assert_eq!(departments[0]["name"], "Finance");

    let again = run_roster(&workspace, ["import", "employees", input.to_str().unwrap()]);
    assert!(
        again
            .stdout
            .contains("Imported employees: 0 created, 2 updated, 1 rejected"),
        "{}",
        again.stdout
    );
    assert!(again.stdout.contains("row 2: Last Name is required"));
}

#[test]
fn e2e_import_sim_cards_and_list_assignments() {
    let workspace = init_workspace();
    let employees = workspace.write("employees.json", EMPLOYEES);
    let sims = workspace.write("sims.jsonl", SIM_CARDS);

    run_roster(&workspace, ["import", "employees", employees.to_str().unwrap()]);
    let run = run_roster(
        &workspace,
        ["import", "sim-cards", sims.to_str().unwrap(), "--json"],
    );
    assert!(run.status.success(), "{}", run.stderr);
    let result = json_stdout(&run.stdout);
    assert_eq!(result["success"], true);
    assert_eq!(result["createdCount"], 2);

    let list = run_roster(&workspace, ["list", "assignments"]);
    assert!(list.stdout.contains("A1/S1 -> E1  [active]"), "{}", list.stdout);

    let catalog = run_roster(&workspace, ["catalog", "--kind", "project"]);
    assert!(catalog.stdout.contains("Apollo [PRJ-"), "{}", catalog.stdout);
}

#[test]
fn e2e_dry_run_writes_nothing() {
    let workspace = init_workspace();
    let input = workspace.write("employees.json", EMPLOYEES);

    let run = run_roster(
        &workspace,
        ["import", "employees", input.to_str().unwrap(), "--dry-run"],
    );
    assert!(run.status.success(), "{}", run.stderr);
    assert!(run.stdout.contains("Dry run: would import employees: 2 created"));

    let list = run_roster(&workspace, ["list", "employees"]);
    assert!(list.stdout.contains("No records."), "{}", list.stdout);
    let catalog = run_roster(&workspace, ["catalog"]);
    assert!(catalog.stdout.contains("No catalog entries."), "{}", catalog.stdout);
}

#[test]
fn e2e_malformed_input_is_decode_error() {
    let workspace = init_workspace();
    let input = workspace.write("bad.jsonl", "{\"employeeCode\": \"E1\"}\n{oops\n");

    let run = run_roster(&workspace, ["import", "employees", input.to_str().unwrap()]);
    assert_eq!(run.status.code(), Some(3));
    assert!(run.stderr.contains("ROW_DECODE_ERROR"), "{}", run.stderr);

    let list = run_roster(&workspace, ["list", "employees", "--json"]);
    assert_eq!(json_stdout(&list.stdout), Value::Array(Vec::new()));
}

#[test]
fn e2e_unknown_catalog_kind_is_rejected() {
    let workspace = init_workspace();
    let run = run_roster(&workspace, ["catalog", "--kind", "planet"]);
    assert_eq!(run.status.code(), Some(4));
    assert!(run.stderr.contains("INVALID_KIND"), "{}", run.stderr);
}

#[test]
fn e2e_project_config_sets_default_parent() {
    let workspace = init_workspace();
    std::fs::write(
        workspace.root.join(".roster/config.yaml"),
        "default-parent: Head Office\nactor: hr-bot\n",
    )
    .unwrap();
    let input = workspace.write(
        "orphans.json",
        r#"[{"employeeCode":"E1","firstName":"A","lastName":"B","subDepartment":"Payroll"}]"#,
    );

    let run = run_roster(&workspace, ["import", "employees", input.to_str().unwrap()]);
    assert!(run.status.success(), "{}", run.stderr);

    let catalog = run_roster(&workspace, ["catalog", "--kind", "department", "--json"]);
    let departments = json_stdout(&catalog.stdout);
    assert_eq!(departments[0]["name"], "Head Office");
    assert_eq!(departments[0]["created_by"], "hr-bot");
}

#[test]
fn e2e_stdin_input_with_predicates() {
    use assert_cmd::Command;
    use predicates::prelude::*;

    let workspace = init_workspace();
    Command::new(assert_cmd::cargo::cargo_bin!("roster"))
        .current_dir(&workspace.root)
        .env("HOME", &workspace.root)
        .env_remove("ROSTER_DIR")
        .args(["import", "sim-cards", "-"])
        .write_stdin("{\"accountNumber\":\"A9\",\"serviceNumber\":\"S9\"}\n")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Imported SIM cards: 1 created, 0 updated, 0 rejected",
        ));

    Command::new(assert_cmd::cargo::cargo_bin!("roster"))
        .current_dir(&workspace.root)
        .env("HOME", &workspace.root)
        .env_remove("ROSTER_DIR")
        .args(["list", "sim-cards"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("A9/S9  [available]"));
}

#[test]
fn e2e_log_file_receives_import_logs() {
    let workspace = init_workspace();
    let input = workspace.write("employees.json", EMPLOYEES);
    let log_path = workspace.root.join("roster.log");

    let run = run_roster(
        &workspace,
        [
            "import",
            "employees",
            input.to_str().unwrap(),
            "--log-file",
            log_path.to_str().unwrap(),
        ],
    );
    assert!(run.status.success(), "{}", run.stderr);

    let logged = std::fs::read_to_string(&log_path).expect("log file written");
    assert!(logged.contains("Starting import"), "{logged}");
    assert!(!run.stderr.contains("Starting import"), "{}", run.stderr);
}
