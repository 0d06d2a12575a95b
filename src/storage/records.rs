//! `Record` mappings for the model types.

use super::Record;
use crate::model::{
    Employee, Kind, MasterReferenceEntry, RefId, SimAssignment, SimCard,
};
use crate::util::{parse_row_date, parse_timestamp};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::Row;
use rusqlite::types::{Type, Value};
use std::str::FromStr;

fn text(value: &str) -> Value {
    Value::Text(value.to_string())
}

fn opt_text(value: Option<&str>) -> Value {
    value.map_or(Value::Null, text)
}

fn timestamp(value: DateTime<Utc>) -> Value {
    Value::Text(value.to_rfc3339())
}

fn opt_timestamp(value: Option<DateTime<Utc>>) -> Value {
    value.map_or(Value::Null, timestamp)
}

fn opt_date(value: Option<NaiveDate>) -> Value {
    value.map_or(Value::Null, |date| {
        Value::Text(date.format("%Y-%m-%d").to_string())
    })
}

fn opt_ref<K: Kind>(value: Option<&RefId<K>>) -> Value {
    opt_text(value.map(RefId::as_str))
}

fn conversion_error(idx: usize, reason: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, reason.into())
}

fn parsed<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw: String = row.get(idx)?;
    raw.parse::<T>()
        .map_err(|err| conversion_error(idx, err.to_string()))
}

fn ts(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    parse_timestamp(&raw).ok_or_else(|| conversion_error(idx, format!("bad timestamp '{raw}'")))
}

fn opt_ts(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|raw| {
        parse_timestamp(&raw).ok_or_else(|| conversion_error(idx, format!("bad timestamp '{raw}'")))
    })
    .transpose()
}

fn opt_day(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<NaiveDate>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|raw| {
        parse_row_date(&raw).ok_or_else(|| conversion_error(idx, format!("bad date '{raw}'")))
    })
    .transpose()
}

fn ref_id<K: Kind>(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<RefId<K>>> {
    Ok(row.get::<_, Option<String>>(idx)?.map(RefId::new))
}

impl Record for MasterReferenceEntry {
    const TABLE: &'static str = "reference_entries";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "kind",
        "code",
        "name",
        "normalized_name",
        "parent_id",
        "description",
        "status",
        "created_at",
        "created_by",
    ];

    fn id(&self) -> &str {
        &self.id
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            text(&self.id),
            text(self.kind.as_str()),
            opt_text(self.code.as_deref()),
            text(&self.name),
            text(&self.normalized_name),
            opt_text(self.parent_id.as_deref()),
            opt_text(self.description.as_deref()),
            text(self.status.as_str()),
            timestamp(self.created_at),
            text(&self.created_by),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            kind: parsed(row, 1)?,
            code: row.get(2)?,
            name: row.get(3)?,
            normalized_name: row.get(4)?,
            parent_id: row.get(5)?,
            description: row.get(6)?,
            status: parsed(row, 7)?,
            created_at: ts(row, 8)?,
            created_by: row.get(9)?,
        })
    }
}

impl Record for Employee {
    const TABLE: &'static str = "employees";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "employee_code",
        "first_name",
        "last_name",
        "email",
        "phone",
        "hire_date",
        "status",
        "department_id",
        "sub_department_id",
        "company_id",
        "project_id",
        "nationality_id",
        "category_id",
        "position_id",
        "cost_center_id",
        "created_at",
        "created_by",
        "updated_at",
        "updated_by",
    ];

    fn id(&self) -> &str {
        &self.id
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            text(&self.id),
            text(&self.employee_code),
            text(&self.first_name),
            text(&self.last_name),
            opt_text(self.email.as_deref()),
            opt_text(self.phone.as_deref()),
            opt_date(self.hire_date),
            text(self.status.as_str()),
            opt_ref(self.department_id.as_ref()),
            opt_ref(self.sub_department_id.as_ref()),
            opt_ref(self.company_id.as_ref()),
            opt_ref(self.project_id.as_ref()),
            opt_ref(self.nationality_id.as_ref()),
            opt_ref(self.category_id.as_ref()),
            opt_ref(self.position_id.as_ref()),
            opt_ref(self.cost_center_id.as_ref()),
            timestamp(self.created_at),
            text(&self.created_by),
            opt_timestamp(self.updated_at),
            opt_text(self.updated_by.as_deref()),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            employee_code: row.get(1)?,
            first_name: row.get(2)?,
            last_name: row.get(3)?,
            email: row.get(4)?,
            phone: row.get(5)?,
            hire_date: opt_day(row, 6)?,
            status: parsed(row, 7)?,
            department_id: ref_id(row, 8)?,
            sub_department_id: ref_id(row, 9)?,
            company_id: ref_id(row, 10)?,
            project_id: ref_id(row, 11)?,
            nationality_id: ref_id(row, 12)?,
            category_id: ref_id(row, 13)?,
            position_id: ref_id(row, 14)?,
            cost_center_id: ref_id(row, 15)?,
            created_at: ts(row, 16)?,
            created_by: row.get(17)?,
            updated_at: opt_ts(row, 18)?,
            updated_by: row.get(19)?,
        })
    }
}

impl Record for SimCard {
    const TABLE: &'static str = "sim_cards";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "account_number",
        "service_number",
        "sim_type",
        "provider",
        "plan",
        "serial_number",
        "start_date",
        "project_id",
        "is_assigned",
        "status",
        "created_at",
        "created_by",
        "updated_at",
        "updated_by",
    ];

    fn id(&self) -> &str {
        &self.id
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            text(&self.id),
            text(&self.account_number),
            text(&self.service_number),
            opt_text(self.sim_type.as_deref()),
            opt_text(self.provider.as_deref()),
            opt_text(self.plan.as_deref()),
            opt_text(self.serial_number.as_deref()),
            opt_date(self.start_date),
            opt_ref(self.project_id.as_ref()),
            Value::Integer(i64::from(self.is_assigned)),
            text(self.status.as_str()),
            timestamp(self.created_at),
            text(&self.created_by),
            opt_timestamp(self.updated_at),
            opt_text(self.updated_by.as_deref()),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            account_number: row.get(1)?,
            service_number: row.get(2)?,
            sim_type: row.get(3)?,
            provider: row.get(4)?,
            plan: row.get(5)?,
            serial_number: row.get(6)?,
            start_date: opt_day(row, 7)?,
            project_id: ref_id(row, 8)?,
            is_assigned: row.get::<_, i64>(9)? != 0,
            status: parsed(row, 10)?,
            created_at: ts(row, 11)?,
            created_by: row.get(12)?,
            updated_at: opt_ts(row, 13)?,
            updated_by: row.get(14)?,
        })
    }
}

impl Record for SimAssignment {
    const TABLE: &'static str = "sim_assignments";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "sim_card_id",
        "employee_id",
        "project_id",
        "status",
        "assigned_at",
        "returned_at",
        "created_by",
    ];

    fn id(&self) -> &str {
        &self.id
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            text(&self.id),
            text(&self.sim_card_id),
            text(&self.employee_id),
            opt_ref(self.project_id.as_ref()),
            text(self.status.as_str()),
            timestamp(self.assigned_at),
            opt_timestamp(self.returned_at),
            text(&self.created_by),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            sim_card_id: row.get(1)?,
            employee_id: row.get(2)?,
            project_id: ref_id(row, 3)?,
            status: parsed(row, 4)?,
            assigned_at: ts(row, 5)?,
            returned_at: opt_ts(row, 6)?,
            created_by: row.get(7)?,
        })
    }
}

/// Row types with no association table stage `Infallible`, which has no values.
impl Record for std::convert::Infallible {
    const TABLE: &'static str = "";
    const COLUMNS: &'static [&'static str] = &[];

    fn id(&self) -> &str {
        match *self {}
    }

    fn to_values(&self) -> Vec<Value> {
        match *self {}
    }

    fn from_row(_row: &Row<'_>) -> rusqlite::Result<Self> {
        Err(rusqlite::Error::QueryReturnedNoRows)
    }
}
