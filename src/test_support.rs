// src/test_support.rs
// Fixtures compartilhadas pelos testes dos serviços e das rotas.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::{AppConfig, AppState, CompanyProfile, StoreBackend},
    db::{Collection, Document, DocumentStore, MemoryDocumentStore, Query},
    models::{
        crm::LeadPayload,
        customer::CustomerPayload,
        employee::{EmployeePayload, RegisterAdminPayload, Role},
        product::ProductPayload,
        supplier::SupplierPayload,
        Actor, Address,
    },
};

pub fn company() -> CompanyProfile {
    CompanyProfile {
        name: "Comercial Teste Ltda".into(),
        tax_id: "11.222.333/0001-81".into(),
        address: Some("Rua das Flores, 123 - Centro - São Paulo/SP".into()),
        state_code: 35,
        pix_key: None,
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        bind_addr: "127.0.0.1:0".into(),
        cors_allowed_origins: Vec::new(),
        store_backend: StoreBackend::Memory,
        database_url: None,
        db_max_connections: 1,
        jwt_secret: "segredo-de-teste".into(),
        jwt_ttl_hours: 1,
        low_stock_threshold: Decimal::from(10),
        admin_api_url: "http://localhost:5000/api".into(),
        fonts_dir: "./fonts".into(),
        company: company(),
    }
}

pub fn memory_state() -> AppState {
    AppState::with_store(test_config(), Arc::new(MemoryDocumentStore::new())).unwrap()
}

pub fn actor() -> Actor {
    Actor { id: Uuid::nil(), name: "Operador".into() }
}

pub fn product_payload(code: &str, name: &str, quantity: i64) -> ProductPayload {
    ProductPayload {
        code: code.into(),
        name: name.into(),
        description: None,
        price: Decimal::from(10),
        cost_price: None,
        quantity: Decimal::from(quantity),
        unit: None,
        ncm: None,
        supplier_id: None,
        minimum_stock: Decimal::ZERO,
    }
}

pub fn supplier_payload(code: &str) -> SupplierPayload {
    SupplierPayload {
        code: code.into(),
        name: format!("Fornecedor {}", code),
        trading_name: None,
        tax_id: "11222333000181".into(),
        state_registration: None,
        contact_name: None,
        email: Some("compras@fornecedor.com".into()),
        phone: None,
        address: Address::default(),
        active: true,
    }
}

pub fn customer_payload(name: &str, document: Option<&str>) -> CustomerPayload {
    CustomerPayload {
        name: name.into(),
        document: document.map(str::to_string),
        email: None,
        phone: None,
        address: Address::default(),
        notes: None,
    }
}

pub fn employee_payload(email: &str, role: Role) -> EmployeePayload {
    EmployeePayload {
        name: "Beatriz Souza".into(),
        email: email.into(),
        password: Some("senha123".into()),
        role,
        designation: None,
        salary: Decimal::from(3500),
        cpf: None,
        phone: None,
        birth_date: None,
        hire_date: None,
        address: Address::default(),
        active: true,
    }
}

pub fn lead_payload(name: &str) -> LeadPayload {
    LeadPayload {
        name: name.into(),
        company: None,
        email: None,
        phone: None,
        source: Some("Site".into()),
        status: None,
        estimated_value: Some(Decimal::from(1500)),
        campaign_id: None,
        owner_id: None,
        notes: None,
    }
}

/// Cadastra o admin inicial e devolve o token dele.
pub async fn admin_token(state: &AppState) -> String {
    state
        .auth_service
        .register_admin(RegisterAdminPayload {
            name: "Admin".into(),
            email: "admin@empresa.com".into(),
            password: "senha123".into(),
        })
        .await
        .unwrap()
        .token
}

/// Token de um funcionário com o cargo dado (o admin já deve existir).
pub async fn token_for(state: &AppState, email: &str, role: Role) -> String {
    let employee = state.employee_service.create(employee_payload(email, role)).await.unwrap();
    let employee = state.employee_service.get(employee.id).await.unwrap();
    state.auth_service.create_token(&employee).unwrap()
}

// ---
// Store que conta as escritas
// ---
#[derive(Default)]
pub struct CountingStore {
    pub inner: MemoryDocumentStore,
    pub writes: AtomicUsize,
}

#[async_trait]
impl DocumentStore for CountingStore {
    async fn find(&self, collection: Collection, query: &Query) -> Result<Vec<Document>, AppError> {
        self.inner.find(collection, query).await
    }

    async fn get(&self, collection: Collection, id: Uuid) -> Result<Option<Document>, AppError> {
        self.inner.get(collection, id).await
    }

    async fn insert(&self, collection: Collection, id: Uuid, data: Value) -> Result<(), AppError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.insert(collection, id, data).await
    }

    async fn set(&self, collection: Collection, id: Uuid, data: Value) -> Result<bool, AppError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.set(collection, id, data).await
    }

    async fn delete(&self, collection: Collection, id: Uuid) -> Result<bool, AppError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.delete(collection, id).await
    }
}

pub fn counting_state() -> (AppState, Arc<CountingStore>) {
    let store = Arc::new(CountingStore::default());
    let state = AppState::with_store(test_config(), store.clone()).unwrap();
    (state, store)
}
