// src/services/customer_service.rs

use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::AppError,
        fiscal,
        pagination::{ListQuery, Page},
    },
    db::Repository,
    models::customer::{Customer, CustomerPayload},
};

#[derive(Clone)]
pub struct CustomerService {
    customers: Repository<Customer>,
}

impl CustomerService {
    pub fn new(customers: Repository<Customer>) -> Self {
        Self { customers }
    }

    pub async fn list(&self, query: &ListQuery) -> Result<Page<Customer>, AppError> {
        let mut customers = self.customers.list().await?;
        customers.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(query.apply(customers))
    }

    pub async fn get(&self, id: Uuid) -> Result<Customer, AppError> {
        self.customers.require(id).await
    }

    pub async fn create(&self, payload: CustomerPayload) -> Result<Customer, AppError> {
        payload.validate()?;

        let now = Utc::now();
        let customer = Customer {
            id: Uuid::new_v4(),
            name: payload.name.trim().to_string(),
            document: payload.document.as_deref().map(fiscal::format_tax_id),
            email: payload.email,
            phone: payload.phone,
            address: payload.address,
            notes: payload.notes,
            created_at: now,
            updated_at: now,
        };
        self.customers.create(&customer).await?;
        Ok(customer)
    }

    pub async fn update(&self, id: Uuid, payload: CustomerPayload) -> Result<Customer, AppError> {
        payload.validate()?;
        let mut customer = self.customers.require(id).await?;

        customer.name = payload.name.trim().to_string();
        customer.document = payload.document.as_deref().map(fiscal::format_tax_id);
        customer.email = payload.email;
        customer.phone = payload.phone;
        customer.address = payload.address;
        customer.notes = payload.notes;
        customer.updated_at = Utc::now();

        self.customers.save(&customer).await?;
        Ok(customer)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.customers.delete(id).await
    }
}
