//! SIM card rows, including assignment to an employee.

use crate::error::Result;
use crate::import::catalog::non_blank;
use crate::import::context::BatchContext;
use crate::import::extend::CatalogDemand;
use crate::import::rows::{ImportRow, RowRejection, cleaned, parse_optional, require};
use crate::model::{
    AssignmentStatus, Employee, EmployeeStatus, ReferenceKind, RefId, SimAssignment, SimCard,
    SimCardRow, SimKey, SimStatus, kind,
};
use crate::storage::Gateway;
use crate::util::parse_row_date;
use std::collections::{HashMap, HashSet};

/// Snapshots consulted when staging SIM card assignments.
#[derive(Debug, Default)]
pub struct SimLookups {
    /// Employees by employee code.
    employees: HashMap<String, Employee>,
    /// `(sim_card_id, employee_id)` pairs with an active assignment.
    active_pairs: HashSet<(String, String)>,
}

impl SimCardRow {
    fn resolve_project(
        &self,
        ctx: &BatchContext,
    ) -> std::result::Result<Option<RefId<kind::Project>>, RowRejection> {
        if let Some(id) = non_blank(self.project_id.as_deref()) {
            return ctx
                .catalog
                .typed_id::<kind::Project>(id)
                .map(Some)
                .ok_or_else(|| RowRejection::ReferenceNotFound {
                    kind: ReferenceKind::Project.label(),
                    name: id.to_string(),
                });
        }
        ctx.catalog.resolve_optional(self.project.as_deref())
    }

    fn write_fields(
        &self,
        ctx: &BatchContext,
        sim: &mut SimCard,
    ) -> std::result::Result<(), RowRejection> {
        let project_id = self.resolve_project(ctx)?;
        let status: Option<SimStatus> = parse_optional("Status", self.status.as_deref())?;
        let start_date = match non_blank(self.start_date.as_deref()) {
            Some(raw) => Some(parse_row_date(raw).ok_or_else(|| RowRejection::InvalidValue {
                field: "Start Date",
                value: raw.to_string(),
            })?),
            None => None,
        };

        sim.sim_type = cleaned(self.sim_type.as_deref());
        sim.provider = cleaned(self.provider.as_deref());
        sim.plan = cleaned(self.plan.as_deref());
        sim.serial_number = cleaned(self.serial_number.as_deref());
        sim.start_date = start_date;
        sim.project_id = project_id;
        if let Some(status) = status {
            sim.status = status;
        }
        Ok(())
    }
}

impl ImportRow for SimCardRow {
    type Entity = SimCard;
    type Key = SimKey;
    type Association = SimAssignment;
    type Lookups = SimLookups;

    const KEY_LABEL: &'static str = "account/service number";

    fn natural_key(&self) -> Option<SimKey> {
        let account = non_blank(self.account_number.as_deref())?;
        let service = non_blank(self.service_number.as_deref())?;
        Some(SimKey::new(account, service))
    }

    fn entity_key(entity: &SimCard) -> SimKey {
        entity.natural_key()
    }

    fn declare_references(&self, demand: &mut CatalogDemand) {
        // An explicit project id is validated, never auto-created.
        if non_blank(self.project_id.as_deref()).is_none() {
            demand.name(ReferenceKind::Project, self.project.as_deref());
        }
    }

    fn check_required(&self) -> std::result::Result<(), RowRejection> {
        require(&[
            ("Account Number", self.account_number.as_deref()),
            ("Service Number", self.service_number.as_deref()),
        ])
    }

    fn load_lookups<G: Gateway>(gateway: &G, ctx: &mut BatchContext) -> Result<SimLookups> {
        let employees = gateway.load_all::<Employee>()?;
        let assignments = gateway.load_all::<SimAssignment>()?;
        ctx.reserve_ids(assignments.iter().map(|assignment| assignment.id.as_str()));

        let active_pairs = assignments
            .into_iter()
            .filter(|assignment| assignment.status == AssignmentStatus::Active)
            .map(|assignment| (assignment.sim_card_id, assignment.employee_id))
            .collect();
        let employees = employees
            .into_iter()
            .map(|employee| (employee.employee_code.clone(), employee))
            .collect();

        Ok(SimLookups {
            employees,
            active_pairs,
        })
    }

    fn create(&self, ctx: &mut BatchContext) -> std::result::Result<SimCard, RowRejection> {
        let mut sim = SimCard {
            id: String::new(),
            account_number: cleaned(self.account_number.as_deref()).unwrap_or_default(),
            service_number: cleaned(self.service_number.as_deref()).unwrap_or_default(),
            sim_type: None,
            provider: None,
            plan: None,
            serial_number: None,
            start_date: None,
            project_id: None,
            is_assigned: false,
            status: SimStatus::default(),
            created_at: ctx.now,
            created_by: ctx.actor().to_string(),
            updated_at: None,
            updated_by: None,
        };
        self.write_fields(ctx, &mut sim)?;
        sim.id = ctx.mint_id("sim", &sim.natural_key().to_string());
        Ok(sim)
    }

    fn overwrite(
        &self,
        ctx: &BatchContext,
        sim: &mut SimCard,
    ) -> std::result::Result<(), RowRejection> {
        self.write_fields(ctx, sim)?;
        sim.updated_at = Some(ctx.now);
        sim.updated_by = Some(ctx.actor().to_string());
        Ok(())
    }

    fn associate(
        &self,
        ctx: &mut BatchContext,
        sim: &mut SimCard,
        lookups: &mut SimLookups,
    ) -> std::result::Result<Option<SimAssignment>, RowRejection> {
        let Some(code) = non_blank(self.employee_code.as_deref()) else {
            return Ok(None);
        };
        // The card itself is still staged; only the link is dropped.
        let Some(employee_id) = lookups
            .employees
            .get(code)
            .filter(|employee| employee.status == EmployeeStatus::Active)
            .map(|employee| employee.id.clone())
        else {
            tracing::warn!(
                employee = code,
                sim = %sim.natural_key(),
                "Assignee not found or inactive; assignment skipped"
            );
            return Ok(None);
        };

        sim.is_assigned = true;
        sim.status = SimStatus::Assigned;

        if !lookups
            .active_pairs
            .insert((sim.id.clone(), employee_id.clone()))
        {
            tracing::debug!(sim = %sim.id, employee = %employee_id, "Assignment already active");
            return Ok(None);
        }

        Ok(Some(SimAssignment {
            id: ctx.mint_id("asg", &format!("{}:{code}", sim.natural_key())),
            sim_card_id: sim.id.clone(),
            employee_id,
            project_id: sim.project_id.clone(),
            status: AssignmentStatus::Active,
            assigned_at: ctx.now,
            returned_at: None,
            created_by: ctx.actor().to_string(),
        }))
    }
}
