//! Employee rows.

use crate::error::Result;
use crate::import::context::BatchContext;
use crate::import::extend::CatalogDemand;
use crate::import::rows::{ImportRow, RowRejection, cleaned, parse_optional, require};
use crate::model::{Employee, EmployeeRow, EmployeeStatus, ReferenceKind, RefId, kind};
use crate::storage::Gateway;
use crate::util::parse_row_date;
use chrono::NaiveDate;

/// Row fields resolved against the catalog, ready to write onto an entity.
struct ResolvedEmployee {
    hire_date: Option<NaiveDate>,
    status: Option<EmployeeStatus>,
    department_id: Option<RefId<kind::Department>>,
    sub_department_id: Option<RefId<kind::SubDepartment>>,
    company_id: Option<RefId<kind::Company>>,
    project_id: Option<RefId<kind::Project>>,
    nationality_id: Option<RefId<kind::Nationality>>,
    category_id: Option<RefId<kind::Category>>,
    position_id: Option<RefId<kind::Position>>,
    cost_center_id: Option<RefId<kind::CostCenter>>,
}

impl EmployeeRow {
    fn resolve(&self, ctx: &BatchContext) -> std::result::Result<ResolvedEmployee, RowRejection> {
        let catalog = &ctx.catalog;
        let hire_date = match crate::import::catalog::non_blank(self.hire_date.as_deref()) {
            Some(raw) => Some(parse_row_date(raw).ok_or_else(|| RowRejection::InvalidValue {
                field: "Hire Date",
                value: raw.to_string(),
            })?),
            None => None,
        };

        Ok(ResolvedEmployee {
            hire_date,
            status: parse_optional("Status", self.status.as_deref())?,
            department_id: catalog.resolve_optional(self.department.as_deref())?,
            sub_department_id: catalog.resolve_optional(self.sub_department.as_deref())?,
            company_id: catalog.resolve_optional(self.company.as_deref())?,
            project_id: catalog.resolve_optional(self.project.as_deref())?,
            nationality_id: catalog.resolve_optional(self.nationality.as_deref())?,
            category_id: catalog.resolve_optional(self.category.as_deref())?,
            position_id: catalog.resolve_optional(self.position.as_deref())?,
            cost_center_id: catalog.resolve_optional(self.cost_center.as_deref())?,
        })
    }

    fn write_fields(&self, resolved: ResolvedEmployee, employee: &mut Employee) {
        employee.first_name = cleaned(self.first_name.as_deref()).unwrap_or_default();
        employee.last_name = cleaned(self.last_name.as_deref()).unwrap_or_default();
        employee.email = cleaned(self.email.as_deref());
        employee.phone = cleaned(self.phone.as_deref());
        employee.hire_date = resolved.hire_date;
        if let Some(status) = resolved.status {
            employee.status = status;
        }
        employee.department_id = resolved.department_id;
        employee.sub_department_id = resolved.sub_department_id;
        employee.company_id = resolved.company_id;
        employee.project_id = resolved.project_id;
        employee.nationality_id = resolved.nationality_id;
        employee.category_id = resolved.category_id;
        employee.position_id = resolved.position_id;
        employee.cost_center_id = resolved.cost_center_id;
    }
}

impl ImportRow for EmployeeRow {
    type Entity = Employee;
    type Key = String;
    type Association = std::convert::Infallible;
    type Lookups = ();

    const KEY_LABEL: &'static str = "employee code";

    fn natural_key(&self) -> Option<String> {
        cleaned(self.employee_code.as_deref())
    }

    fn entity_key(entity: &Employee) -> String {
        entity.employee_code.clone()
    }

    fn declare_references(&self, demand: &mut CatalogDemand) {
        demand.name(ReferenceKind::Department, self.department.as_deref());
        demand.child(
            ReferenceKind::SubDepartment,
            self.sub_department.as_deref(),
            self.department.as_deref(),
        );
        demand.name(ReferenceKind::Company, self.company.as_deref());
        demand.name(ReferenceKind::Project, self.project.as_deref());
        demand.name(ReferenceKind::Nationality, self.nationality.as_deref());
        demand.name(ReferenceKind::Category, self.category.as_deref());
        demand.name(ReferenceKind::Position, self.position.as_deref());
        demand.name(ReferenceKind::CostCenter, self.cost_center.as_deref());
    }

    fn check_required(&self) -> std::result::Result<(), RowRejection> {
        require(&[
            ("Employee Code", self.employee_code.as_deref()),
            ("First Name", self.first_name.as_deref()),
            ("Last Name", self.last_name.as_deref()),
        ])
    }

    fn load_lookups<G: Gateway>(_gateway: &G, _ctx: &mut BatchContext) -> Result<()> {
        Ok(())
    }

    fn create(&self, ctx: &mut BatchContext) -> std::result::Result<Employee, RowRejection> {
        let resolved = self.resolve(ctx)?;
        let employee_code = self.natural_key().unwrap_or_default();
        let mut employee = Employee {
            id: ctx.mint_id("emp", &employee_code),
            employee_code,
            first_name: String::new(),
            last_name: String::new(),
            email: None,
            phone: None,
            hire_date: None,
            status: EmployeeStatus::default(),
            department_id: None,
            sub_department_id: None,
            company_id: None,
            project_id: None,
            nationality_id: None,
            category_id: None,
            position_id: None,
            cost_center_id: None,
            created_at: ctx.now,
            created_by: ctx.actor().to_string(),
            updated_at: None,
            updated_by: None,
        };
        self.write_fields(resolved, &mut employee);
        Ok(employee)
    }

    fn overwrite(
        &self,
        ctx: &BatchContext,
        employee: &mut Employee,
    ) -> std::result::Result<(), RowRejection> {
        let resolved = self.resolve(ctx)?;
        self.write_fields(resolved, employee);
        employee.updated_at = Some(ctx.now);
        employee.updated_by = Some(ctx.actor().to_string());
        Ok(())
    }
}
