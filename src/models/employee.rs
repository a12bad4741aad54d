// src/models/employee.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        pagination::Searchable,
        validation::{validate_not_blank, validate_not_negative, validate_tax_id},
    },
    db::{Collection, Entity},
    models::{Actor, Address},
};

// ---
// Permissões (slugs) e cargos
// ---
pub const ALL_PERMISSIONS: [&str; 16] = [
    "inventory:read",
    "inventory:write",
    "purchases:read",
    "purchases:write",
    "purchases:approve",
    "sales:read",
    "sales:write",
    "crm:read",
    "crm:write",
    "hr:read",
    "hr:write",
    "invoices:read",
    "invoices:write",
    "goals:read",
    "goals:write",
    "dashboard:read",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Manager,
    Salesperson,
    Stockist,
    Buyer,
    Hr,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::Admin,
        Role::Manager,
        Role::Salesperson,
        Role::Stockist,
        Role::Buyer,
        Role::Hr,
    ];

    pub fn permissions(&self) -> Vec<&'static str> {
        let granted: &[&str] = match self {
            Role::Admin => &ALL_PERMISSIONS,
            Role::Manager => {
                return ALL_PERMISSIONS
                    .iter()
                    .copied()
                    .filter(|p| *p != "hr:write")
                    .collect();
            }
            Role::Salesperson => &[
                "inventory:read",
                "sales:read",
                "sales:write",
                "crm:read",
                "crm:write",
                "goals:read",
                "dashboard:read",
            ],
            Role::Stockist => &[
                "inventory:read",
                "inventory:write",
                "invoices:read",
                "invoices:write",
                "sales:read",
                "purchases:read",
                "dashboard:read",
            ],
            Role::Buyer => &[
                "inventory:read",
                "purchases:read",
                "purchases:write",
                "invoices:read",
                "dashboard:read",
            ],
            Role::Hr => &["hr:read", "hr:write", "goals:read", "goals:write"],
        };
        granted.to_vec()
    }

    pub fn has_permission(&self, slug: &str) -> bool {
        self.permissions().contains(&slug)
    }
}

// --- Funcionário (também é o usuário do sistema) ---
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    // Persistido no documento; nunca sai na API (ver EmployeeResponse)
    pub password_hash: String,
    pub role: Role,
    pub designation: Option<String>,
    pub salary: Decimal,
    pub cpf: Option<String>,
    pub phone: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub hire_date: Option<NaiveDate>,
    pub address: Address,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Employee {
    pub fn actor(&self) -> Actor {
        Actor { id: self.id, name: self.name.clone() }
    }
}

impl Entity for Employee {
    const COLLECTION: Collection = Collection::Employees;
    const LABEL: &'static str = "Funcionário";

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Searchable for Employee {
    fn search_fields(&self) -> Vec<Option<&str>> {
        vec![
            Some(&self.name),
            Some(&self.email),
            self.designation.as_deref(),
            self.cpf.as_deref(),
        ]
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub designation: Option<String>,
    pub salary: Decimal,
    pub cpf: Option<String>,
    pub phone: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub hire_date: Option<NaiveDate>,
    pub address: Address,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Employee> for EmployeeResponse {
    fn from(e: Employee) -> Self {
        Self {
            id: e.id,
            name: e.name,
            email: e.email,
            role: e.role,
            designation: e.designation,
            salary: e.salary,
            cpf: e.cpf,
            phone: e.phone,
            birth_date: e.birth_date,
            hire_date: e.hire_date,
            address: e.address,
            active: e.active,
            created_at: e.created_at,
            updated_at: e.updated_at,
        }
    }
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmployeePayload {
    #[validate(custom(function = "validate_not_blank"))]
    pub name: String,

    #[validate(email(message = "invalid_email"))]
    pub email: String,

    /// Obrigatória no cadastro; na edição, só se for trocar
    #[validate(length(min = 6, message = "password_too_short"))]
    pub password: Option<String>,

    pub role: Role,
    #[schema(example = "Analista de Compras")]
    pub designation: Option<String>,

    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    pub salary: Decimal,

    #[validate(custom(function = "validate_tax_id"))]
    pub cpf: Option<String>,

    pub phone: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub hire_date: Option<NaiveDate>,

    #[validate(nested)]
    #[serde(default)]
    pub address: Address,

    #[serde(default = "default_active")]
    pub active: bool,
}

// ---
// Autenticação
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterAdminPayload {
    #[validate(custom(function = "validate_not_blank"))]
    pub name: String,
    #[validate(email(message = "invalid_email"))]
    pub email: String,
    #[validate(length(min = 6, message = "password_too_short"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginPayload {
    #[validate(email(message = "invalid_email"))]
    pub email: String,
    #[validate(length(min = 6, message = "password_too_short"))]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub employee: EmployeeResponse,
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: Role,
    pub exp: usize,
    pub iat: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RolePermissions {
    pub role: Role,
    pub permissions: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PermissionCatalog {
    pub permissions: Vec<String>,
    pub roles: Vec<RolePermissions>,
}

impl PermissionCatalog {
    pub fn build() -> Self {
        Self {
            permissions: ALL_PERMISSIONS.iter().map(|p| p.to_string()).collect(),
            roles: Role::ALL
                .iter()
                .map(|role| RolePermissions {
                    role: *role,
                    permissions: role.permissions().into_iter().map(String::from).collect(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_has_everything_manager_lacks_hr_write() {
        assert!(ALL_PERMISSIONS.iter().all(|p| Role::Admin.has_permission(p)));
        assert!(!Role::Manager.has_permission("hr:write"));
        assert!(Role::Manager.has_permission("purchases:approve"));
    }

    #[test]
    fn operational_roles_are_scoped() {
        assert!(Role::Salesperson.has_permission("sales:write"));
        assert!(!Role::Salesperson.has_permission("inventory:write"));
        assert!(Role::Stockist.has_permission("invoices:write"));
        assert!(!Role::Buyer.has_permission("purchases:approve"));
        assert!(!Role::Hr.has_permission("sales:read"));
    }

    #[test]
    fn catalog_lists_every_role() {
        let catalog = PermissionCatalog::build();
        assert_eq!(catalog.permissions.len(), ALL_PERMISSIONS.len());
        assert_eq!(catalog.roles.len(), Role::ALL.len());
        assert_eq!(catalog.roles[0].permissions.len(), ALL_PERMISSIONS.len());
    }

    #[test]
    fn every_granted_permission_is_known() {
        for role in Role::ALL {
            for p in role.permissions() {
                assert!(ALL_PERMISSIONS.contains(&p), "{:?} -> {}", role, p);
            }
        }
    }
}
