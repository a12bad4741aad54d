// src/services/supplier_service.rs

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
    models::supplier::{Supplier, SupplierFilter, SupplierPayload},
};

#[derive(Clone)]
pub struct SupplierService {
    suppliers: Repository<Supplier>,
}

impl SupplierService {
    pub fn new(suppliers: Repository<Supplier>) -> Self {
        Self { suppliers }
    }

    pub async fn list(
        &self,
        query: &ListQuery,
        filter: &SupplierFilter,
    ) -> Result<Page<Supplier>, AppError> {
        let db_query = match filter.active {
            Some(active) => Query::new().eq("active", active),
            None => Query::new(),
        };
        let mut suppliers = self.suppliers.find(&db_query).await?;
        suppliers.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(query.apply(suppliers))
    }

    pub async fn get(&self, id: Uuid) -> Result<Supplier, AppError> {
        self.suppliers.require(id).await
    }

    async fn ensure_unique_code(&self, code: &str, except: Option<Uuid>) -> Result<(), AppError> {
        match self.suppliers.find_one(Query::new().eq("code", code)).await? {
            Some(s) if Some(s.id) != except => Err(AppError::CodeAlreadyExists(code.to_string())),
            _ => Ok(()),
        }
    }

    pub async fn create(&self, payload: SupplierPayload) -> Result<Supplier, AppError> {
        payload.validate()?;
        let code = payload.code.trim().to_string();
        self.ensure_unique_code(&code, None).await?;

        let now = Utc::now();
        let supplier = Supplier {
            id: Uuid::new_v4(),
            code,
            name: payload.name.trim().to_string(),
            trading_name: payload.trading_name,
            // Guardado já mascarado
            tax_id: fiscal::format_tax_id(&payload.tax_id),
            state_registration: payload.state_registration,
            contact_name: payload.contact_name,
            email: payload.email,
            phone: payload.phone,
            address: payload.address,
            active: payload.active,
            created_at: now,
            updated_at: now,
        };
        self.suppliers.create(&supplier).await?;
        Ok(supplier)
    }

    pub async fn update(&self, id: Uuid, payload: SupplierPayload) -> Result<Supplier, AppError> {
        payload.validate()?;
        let mut supplier = self.suppliers.require(id).await?;
        let code = payload.code.trim().to_string();
        self.ensure_unique_code(&code, Some(id)).await?;

        supplier.code = code;
        supplier.name = payload.name.trim().to_string();
        supplier.trading_name = payload.trading_name;
        supplier.tax_id = fiscal::format_tax_id(&payload.tax_id);
        supplier.state_registration = payload.state_registration;
        supplier.contact_name = payload.contact_name;
        supplier.email = payload.email;
        supplier.phone = payload.phone;
        supplier.address = payload.address;
        supplier.active = payload.active;
        supplier.updated_at = Utc::now();

        self.suppliers.save(&supplier).await?;
        Ok(supplier)
    }

    pub async fn set_active(&self, id: Uuid, active: bool) -> Result<Supplier, AppError> {
        let mut supplier = self.suppliers.require(id).await?;
        supplier.active = active;
        supplier.updated_at = Utc::now();
        self.suppliers.save(&supplier).await?;
        Ok(supplier)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.suppliers.delete(id).await
    }
}
