//! Decoded input rows.
//!
//! Every field is optional text; blank and missing are treated alike by the
//! importer. Keys are camelCase, with snake_case aliases.

use serde::{Deserialize, Serialize};

/// One employee row as supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmployeeRow {
    #[serde(alias = "employee_code", alias = "code")]
    pub employee_code: Option<String>,
    #[serde(alias = "first_name")]
    pub first_name: Option<String>,
    #[serde(alias = "last_name")]
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(alias = "hire_date")]
    pub hire_date: Option<String>,
    pub status: Option<String>,
    pub department: Option<String>,
    #[serde(alias = "sub_department")]
    pub sub_department: Option<String>,
    pub company: Option<String>,
    pub project: Option<String>,
    pub nationality: Option<String>,
    pub category: Option<String>,
    pub position: Option<String>,
    #[serde(alias = "cost_center")]
    pub cost_center: Option<String>,
}

/// One SIM card row as supplied by the caller.
///
/// `project_id` names an existing project entry directly and takes
/// precedence over the free-text `project`. `employee_code` names the
/// employee the card should be assigned to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SimCardRow {
    #[serde(alias = "account_number")]
    pub account_number: Option<String>,
    #[serde(alias = "service_number")]
    pub service_number: Option<String>,
    #[serde(alias = "sim_type")]
    pub sim_type: Option<String>,
    pub provider: Option<String>,
    pub plan: Option<String>,
    #[serde(alias = "serial_number", alias = "iccid")]
    pub serial_number: Option<String>,
    #[serde(alias = "start_date")]
    pub start_date: Option<String>,
    pub status: Option<String>,
    pub project: Option<String>,
    #[serde(alias = "project_id")]
    pub project_id: Option<String>,
    #[serde(alias = "employee_code")]
    pub employee_code: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_employee_row_accepts_both_key_styles() {
        let camel: EmployeeRow =
            serde_json::from_str(r#"{"employeeCode":"E1","lastName":"Ng"}"#).unwrap();
        let snake: EmployeeRow =
            serde_json::from_str(r#"{"employee_code":"E1","last_name":"Ng"}"#).unwrap();
        assert_eq!(camel, snake);
        assert_eq!(camel.first_name, None);
    }

    #[test]
    fn test_sim_row_defaults_missing_fields() {
        let row: SimCardRow = serde_json::from_str(r#"{"accountNumber":"A1"}"#).unwrap();
        assert_eq!(row.account_number.as_deref(), Some("A1"));
        assert!(row.service_number.is_none());
        assert!(row.employee_code.is_none());
    }
}
