#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use roster_import::ImportOptions;
use roster_import::model::{EmployeeRow, SimCardRow};

/// Fixed call timestamp so generated codes are predictable in shape.
pub fn call_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 4, 8, 15, 30).unwrap()
}

pub fn options() -> ImportOptions {
    ImportOptions {
        actor: "tester".to_string(),
        ..ImportOptions::default()
    }
}

pub fn employee_row(code: &str, first: &str, last: &str) -> EmployeeRow {
    EmployeeRow {
        employee_code: Some(code.to_string()),
        first_name: Some(first.to_string()),
        last_name: Some(last.to_string()),
        ..EmployeeRow::default()
    }
}

pub fn employee_in(code: &str, department: &str, sub_department: &str) -> EmployeeRow {
    EmployeeRow {
        department: Some(department.to_string()),
        sub_department: Some(sub_department.to_string()),
        ..employee_row(code, "Test", code)
    }
}

pub fn sim_row(account: &str, service: &str) -> SimCardRow {
    SimCardRow {
        account_number: Some(account.to_string()),
        service_number: Some(service.to_string()),
        ..SimCardRow::default()
    }
}

pub fn sim_for(account: &str, service: &str, employee_code: &str) -> SimCardRow {
    SimCardRow {
        employee_code: Some(employee_code.to_string()),
        ..sim_row(account, service)
    }
}
