//! Core data types for `roster_import`.
//!
//! This module defines the fundamental types used throughout the application:
//! - `ReferenceKind` - Categories of master reference data
//! - `RefId` - A reference entry id typed by its kind
//! - `MasterReferenceEntry` - One catalog entry
//! - `Employee`, `SimCard` - Main entities merged by the importer
//! - `SimAssignment` - Association between a SIM card and an employee

mod rows;

pub use rows::{EmployeeRow, SimCardRow};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::str::FromStr;

use crate::error::RosterError;

/// Category of master reference data.
///
/// Variants are ordered so that every parent kind precedes its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    Department,
    SubDepartment,
    Company,
    Project,
    Nationality,
    Category,
    Position,
    CostCenter,
}

impl ReferenceKind {
    /// All kinds, parents first.
    pub const ALL: [Self; 8] = [
        Self::Department,
        Self::SubDepartment,
        Self::Company,
        Self::Project,
        Self::Nationality,
        Self::Category,
        Self::Position,
        Self::CostCenter,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Department => "department",
            Self::SubDepartment => "sub_department",
            Self::Company => "company",
            Self::Project => "project",
            Self::Nationality => "nationality",
            Self::Category => "category",
            Self::Position => "position",
            Self::CostCenter => "cost_center",
        }
    }

    /// Display label used in row error messages.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Department => "Department",
            Self::SubDepartment => "Sub Department",
            Self::Company => "Company",
            Self::Project => "Project",
            Self::Nationality => "Nationality",
            Self::Category => "Category",
            Self::Position => "Position",
            Self::CostCenter => "Cost Center",
        }
    }

    /// The kind that entries of this kind hang under, if hierarchical.
    #[must_use]
    pub const fn parent(&self) -> Option<Self> {
        match self {
            Self::SubDepartment => Some(Self::Department),
            _ => None,
        }
    }

    /// Default code prefix for kinds whose entries require a unique code.
    #[must_use]
    pub const fn code_prefix(&self) -> Option<&'static str> {
        match self {
            Self::Project => Some("PRJ"),
            Self::CostCenter => Some("CC"),
            _ => None,
        }
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReferenceKind {
    type Err = RosterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "department" => Ok(Self::Department),
            "sub_department" | "subdepartment" => Ok(Self::SubDepartment),
            "company" => Ok(Self::Company),
            "project" => Ok(Self::Project),
            "nationality" => Ok(Self::Nationality),
            "category" => Ok(Self::Category),
            "position" => Ok(Self::Position),
            "cost_center" | "costcenter" => Ok(Self::CostCenter),
            _ => Err(RosterError::InvalidKind {
                kind: s.to_string(),
            }),
        }
    }
}

/// Compile-time marker for a reference kind.
pub trait Kind: 'static {
    const KIND: ReferenceKind;
}

/// Uninhabited marker types, one per `ReferenceKind`.
pub mod kind {
    use super::{Kind, ReferenceKind};

    macro_rules! kind_markers {
        ($($name:ident),* $(,)?) => {
            $(
                #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
                pub enum $name {}

                impl Kind for $name {
                    const KIND: ReferenceKind = ReferenceKind::$name;
                }
            )*
        };
    }

    kind_markers!(
        Department,
        SubDepartment,
        Company,
        Project,
        Nationality,
        Category,
        Position,
        CostCenter,
    );
}

/// Id of a reference entry, typed by the kind it belongs to.
///
/// Serializes as a bare string.
pub struct RefId<K> {
    id: String,
    _kind: PhantomData<fn() -> K>,
}

impl<K: Kind> RefId<K> {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            _kind: PhantomData,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub const fn kind(&self) -> ReferenceKind {
        K::KIND
    }
}

impl<K> Clone for RefId<K> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            _kind: PhantomData,
        }
    }
}

impl<K> PartialEq for RefId<K> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<K> Eq for RefId<K> {}

impl<K> Hash for RefId<K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<K: Kind> fmt::Debug for RefId<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RefId<{}>({})", K::KIND, self.id)
    }
}

impl<K> fmt::Display for RefId<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

impl<K> Serialize for RefId<K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.id)
    }
}

impl<'de, K: Kind> Deserialize<'de> for RefId<K> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}

macro_rules! status_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = RosterError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let normalized = s.trim().to_lowercase().replace([' ', '-'], "_");
                match normalized.as_str() {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(RosterError::InvalidStatus {
                        status: s.to_string(),
                    }),
                }
            }
        }
    };
}

status_enum! {
    /// Lifecycle of a reference entry.
    ReferenceStatus {
        #[default]
        Active => "active",
        Inactive => "inactive",
    }
}

status_enum! {
    /// Employment status.
    EmployeeStatus {
        #[default]
        Active => "active",
        OnLeave => "on_leave",
        Inactive => "inactive",
        Terminated => "terminated",
    }
}

status_enum! {
    /// SIM card lifecycle.
    SimStatus {
        #[default]
        Available => "available",
        Assigned => "assigned",
        Suspended => "suspended",
        Deactivated => "deactivated",
    }
}

status_enum! {
    /// Assignment lifecycle. At most one active assignment per card/employee pair.
    AssignmentStatus {
        #[default]
        Active => "active",
        Returned => "returned",
    }
}

/// An entry of the reference catalog.
///
/// `normalized_name` is unique within `kind`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterReferenceEntry {
    pub id: String,
    pub kind: ReferenceKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub name: String,
    pub normalized_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: ReferenceStatus,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
}

/// An employee, keyed by `employee_code`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: String,
    pub employee_code: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hire_date: Option<NaiveDate>,
    pub status: EmployeeStatus,
    pub department_id: Option<RefId<kind::Department>>,
    pub sub_department_id: Option<RefId<kind::SubDepartment>>,
    pub company_id: Option<RefId<kind::Company>>,
    pub project_id: Option<RefId<kind::Project>>,
    pub nationality_id: Option<RefId<kind::Nationality>>,
    pub category_id: Option<RefId<kind::Category>>,
    pub position_id: Option<RefId<kind::Position>>,
    pub cost_center_id: Option<RefId<kind::CostCenter>>,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
}

impl Employee {
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A SIM card, keyed by `(account_number, service_number)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimCard {
    pub id: String,
    pub account_number: String,
    pub service_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sim_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    pub project_id: Option<RefId<kind::Project>>,
    pub is_assigned: bool,
    pub status: SimStatus,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
}

impl SimCard {
    /// Composite natural key.
    #[must_use]
    pub fn natural_key(&self) -> SimKey {
        SimKey::new(&self.account_number, &self.service_number)
    }
}

/// Natural key of a SIM card: the `(account_number, service_number)` pair.
///
/// Compared part by part, so `("A/1", "2")` and `("A", "1/2")` are distinct.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SimKey {
    pub account_number: String,
    pub service_number: String,
}

impl SimKey {
    /// Build a key from its two parts, trimmed.
    #[must_use]
    pub fn new(account_number: &str, service_number: &str) -> Self {
        Self {
            account_number: account_number.trim().to_string(),
            service_number: service_number.trim().to_string(),
        }
    }
}

impl fmt::Display for SimKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.account_number, self.service_number)
    }
}

/// Assignment of a SIM card to an employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimAssignment {
    pub id: String,
    pub sim_card_id: String,
    pub employee_id: String,
    pub project_id: Option<RefId<kind::Project>>,
    pub status: AssignmentStatus,
    pub assigned_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub returned_at: Option<DateTime<Utc>>,
    pub created_by: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_order_puts_parents_first() {
        for (idx, kind) in ReferenceKind::ALL.iter().enumerate() {
            if let Some(parent) = kind.parent() {
                let parent_idx = ReferenceKind::ALL
                    .iter()
                    .position(|k| *k == parent)
                    .unwrap();
                assert!(parent_idx < idx, "{kind} must follow {parent}");
            }
        }
    }

    #[test]
    fn test_kind_from_str_variants() {
        assert_eq!(
            "Sub Department".parse::<ReferenceKind>().unwrap(),
            ReferenceKind::SubDepartment
        );
        assert_eq!(
            "cost-center".parse::<ReferenceKind>().unwrap(),
            ReferenceKind::CostCenter
        );
        assert!("planet".parse::<ReferenceKind>().is_err());
    }

    #[test]
    fn test_ref_id_serializes_as_string() {
        let id: RefId<kind::Project> = RefId::new("ref-abc");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"ref-abc\"");
        assert_eq!(id.kind(), ReferenceKind::Project);
        let back: RefId<kind::Project> = serde_json::from_str("\"ref-abc\"").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_status_from_str() {
        assert_eq!(
            "On Leave".parse::<EmployeeStatus>().unwrap(),
            EmployeeStatus::OnLeave
        );
        assert_eq!("ASSIGNED".parse::<SimStatus>().unwrap(), SimStatus::Assigned);
        let err = "gone".parse::<EmployeeStatus>().unwrap_err();
        assert!(matches!(err, RosterError::InvalidStatus { .. }));
    }

    #[test]
    fn test_sim_key_trims_parts() {
        let key = SimKey::new(" 100 ", "0551234567 ");
        assert_eq!(key.account_number, "100");
        assert_eq!(key.to_string(), "100/0551234567");
    }

    #[test]
    fn test_sim_key_compares_parts_not_text() {
        let left = SimKey::new("A/1", "2");
        let right = SimKey::new("A", "1/2");
        assert_eq!(left.to_string(), right.to_string());
        assert_ne!(left, right);
    }
}
