// src/services/employee_service.rs

use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::AppError,
        fiscal,
        pagination::{ListQuery, Page},
    },
    db::{Query, Repository},
    models::employee::{Employee, EmployeePayload, EmployeeResponse},
    services::auth::hash_password,
};

#[derive(Clone)]
pub struct EmployeeService {
    employees: Repository<Employee>,
}

impl EmployeeService {
    pub fn new(employees: Repository<Employee>) -> Self {
        Self { employees }
    }

    pub async fn list(&self, query: &ListQuery) -> Result<Page<EmployeeResponse>, AppError> {
        let mut employees = self.employees.list().await?;
        employees.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(query.apply(employees).map(EmployeeResponse::from))
    }

    pub async fn get(&self, id: Uuid) -> Result<Employee, AppError> {
        self.employees.require(id).await
    }

    async fn ensure_unique_email(&self, email: &str, except: Option<Uuid>) -> Result<(), AppError> {
        match self.employees.find_one(Query::new().eq("email", email)).await? {
            Some(e) if Some(e.id) != except => Err(AppError::EmailAlreadyExists),
            _ => Ok(()),
        }
    }

    pub async fn create(&self, payload: EmployeePayload) -> Result<EmployeeResponse, AppError> {
        payload.validate()?;
        let password = payload.password.as_deref().ok_or_else(|| {
            let mut errors = validator::ValidationErrors::new();
            let mut err = validator::ValidationError::new("required");
            err.message = Some("required".into());
            errors.add("password", err);
            AppError::ValidationError(errors)
        })?;

        let email = payload.email.trim().to_lowercase();
        self.ensure_unique_email(&email, None).await?;

        let now = Utc::now();
        let employee = Employee {
            id: Uuid::new_v4(),
            name: payload.name.trim().to_string(),
            email,
            password_hash: hash_password(password).await?,
            role: payload.role,
            designation: payload.designation,
            salary: payload.salary,
            cpf: payload.cpf.as_deref().map(fiscal::format_tax_id),
            phone: payload.phone,
            birth_date: payload.birth_date,
            hire_date: payload.hire_date,
            address: payload.address,
            active: payload.active,
            created_at: now,
            updated_at: now,
        };
        self.employees.create(&employee).await?;
        tracing::info!("👤 Funcionário {} cadastrado ({:?})", employee.email, employee.role);
        Ok(employee.into())
    }

    /// Sobrescreve o cadastro; a senha só muda se vier no payload.
    pub async fn update(&self, id: Uuid, payload: EmployeePayload) -> Result<EmployeeResponse, AppError> {
        payload.validate()?;
        let mut employee = self.employees.require(id).await?;

        let email = payload.email.trim().to_lowercase();
        self.ensure_unique_email(&email, Some(id)).await?;

        if let Some(password) = payload.password.as_deref() {
            employee.password_hash = hash_password(password).await?;
        }
        employee.name = payload.name.trim().to_string();
        employee.email = email;
        employee.role = payload.role;
        employee.designation = payload.designation;
        employee.salary = payload.salary;
        employee.cpf = payload.cpf.as_deref().map(fiscal::format_tax_id);
        employee.phone = payload.phone;
        employee.birth_date = payload.birth_date;
        employee.hire_date = payload.hire_date;
        employee.address = payload.address;
        employee.active = payload.active;
        employee.updated_at = Utc::now();

        self.employees.save(&employee).await?;
        Ok(employee.into())
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.employees.delete(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::employee::Role,
        services::auth::verify_password,
        test_support::{employee_payload, memory_state},
    };

    #[tokio::test]
    async fn password_is_hashed_and_never_returned() {
        let state = memory_state();
        let service = &state.employee_service;

        let created = service
            .create(employee_payload("bia@empresa.com", Role::Salesperson))
            .await
            .unwrap();
        let json = serde_json::to_value(&created).unwrap();
        assert!(json.get("passwordHash").is_none());

        let stored = service.get(created.id).await.unwrap();
        assert_ne!(stored.password_hash, "senha123");
        assert!(verify_password("senha123", &stored.password_hash).await.unwrap());
    }

    #[tokio::test]
    async fn email_is_unique_and_password_required_on_create() {
        let state = memory_state();
        let service = &state.employee_service;
        service.create(employee_payload("bia@empresa.com", Role::Hr)).await.unwrap();

        assert!(matches!(
            service.create(employee_payload("BIA@empresa.com", Role::Hr)).await,
            Err(AppError::EmailAlreadyExists)
        ));

        let mut no_password = employee_payload("caio@empresa.com", Role::Hr);
        no_password.password = None;
        assert!(matches!(service.create(no_password).await, Err(AppError::ValidationError(_))));
    }

    #[tokio::test]
    async fn update_without_password_keeps_hash() {
        let state = memory_state();
        let service = &state.employee_service;
        let created = service.create(employee_payload("bia@empresa.com", Role::Buyer)).await.unwrap();
        let before = service.get(created.id).await.unwrap().password_hash;

        let mut payload = employee_payload("bia@empresa.com", Role::Stockist);
        payload.password = None;
        let updated = service.update(created.id, payload).await.unwrap();

        assert_eq!(updated.role, Role::Stockist);
        assert_eq!(service.get(created.id).await.unwrap().password_hash, before);
    }
}
