// src/config.rs

use std::{env, str::FromStr, sync::Arc, time::Duration};

use anyhow::Context;
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;

use crate::{
    clients::AdminProductsClient,
    common::i18n::I18nStore,
    db::{MemoryDocumentStore, PgDocumentStore, Repository, SharedStore},
    models::invoice::FiscalParty,
    services::{
        auth::AuthService, crm_service::CrmService, customer_service::CustomerService,
        dashboard_service::DashboardService, document_service::DocumentService,
        employee_service::EmployeeService, goal_service::GoalService,
        inventory_service::InventoryService, invoice_service::InvoiceService,
        order_service::OrderService, purchase_service::PurchaseService,
        supplier_service::SupplierService,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "pg" => Ok(StoreBackend::Postgres),
            "memory" | "mem" => Ok(StoreBackend::Memory),
            other => anyhow::bail!("STORE_BACKEND inválido: '{}' (use postgres ou memory)", other),
        }
    }
}

/// Dados da empresa usados como emitente nas notas de saída.
#[derive(Debug, Clone)]
pub struct CompanyProfile {
    pub name: String,
    pub tax_id: String,
    pub address: Option<String>,
    /// cUF do IBGE (35 = SP)
    pub state_code: u8,
    pub pix_key: Option<String>,
}

impl CompanyProfile {
    pub fn as_party(&self) -> FiscalParty {
        FiscalParty {
            name: self.name.clone(),
            tax_id: Some(self.tax_id.clone()),
            address: self.address.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    /// Vazio = CORS permissivo (desenvolvimento)
    pub cors_allowed_origins: Vec<String>,
    pub store_backend: StoreBackend,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub low_stock_threshold: Decimal,
    pub admin_api_url: String,
    pub fonts_dir: String,
    pub company: CompanyProfile,
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{} inválido ('{}'): {}", name, raw, e)),
        Err(_) => Ok(default),
    }
}

impl AppConfig {
    /// Lê a configuração do ambiente (o `.env` é carregado antes, no main).
    pub fn from_env() -> anyhow::Result<Self> {
        let store_backend: StoreBackend = var_or("STORE_BACKEND", "postgres").parse()?;
        let database_url = env::var("DATABASE_URL").ok();
        if store_backend == StoreBackend::Postgres && database_url.is_none() {
            anyhow::bail!("DATABASE_URL deve ser definida quando STORE_BACKEND=postgres");
        }

        Ok(Self {
            bind_addr: var_or("BIND_ADDR", "0.0.0.0:3000"),
            cors_allowed_origins: var_or("CORS_ALLOWED_ORIGINS", "")
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(String::from)
                .collect(),
            store_backend,
            database_url,
            db_max_connections: parse_var("DB_MAX_CONNECTIONS", 5)?,
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?,
            jwt_ttl_hours: parse_var("JWT_TTL_HOURS", 168)?,
            low_stock_threshold: parse_var("LOW_STOCK_THRESHOLD", Decimal::from(10))?,
            admin_api_url: var_or("ADMIN_API_URL", "http://localhost:5000/api"),
            fonts_dir: var_or("FONTS_DIR", "./fonts"),
            company: CompanyProfile {
                name: var_or("COMPANY_NAME", "Minha Empresa Ltda"),
                tax_id: var_or("COMPANY_TAX_ID", "11.222.333/0001-81"),
                address: env::var("COMPANY_ADDRESS").ok(),
                state_code: parse_var("COMPANY_STATE_CODE", 35)?,
                pix_key: env::var("PIX_KEY").ok().filter(|k| !k.trim().is_empty()),
            },
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub i18n_store: Arc<I18nStore>,

    pub auth_service: AuthService,
    pub employee_service: EmployeeService,
    pub inventory_service: InventoryService,
    pub supplier_service: SupplierService,
    pub customer_service: CustomerService,
    pub crm_service: CrmService,
    pub invoice_service: InvoiceService,
    pub order_service: OrderService,
    pub purchase_service: PurchaseService,
    pub goal_service: GoalService,
    pub dashboard_service: DashboardService,
    pub document_service: DocumentService,
    pub admin_products: AdminProductsClient,
}

impl AppState {
    /// Conecta no backend configurado (rodando as migrações no Postgres) e monta o estado.
    pub async fn new(config: AppConfig) -> anyhow::Result<Self> {
        let store: SharedStore = match config.store_backend {
            StoreBackend::Postgres => {
                let database_url = config
                    .database_url
                    .as_deref()
                    .context("DATABASE_URL deve ser definida")?;

                let pool = PgPoolOptions::new()
                    .max_connections(config.db_max_connections)
                    .acquire_timeout(Duration::from_secs(3))
                    .connect(database_url)
                    .await?;
                tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

                sqlx::migrate!().run(&pool).await?;
                tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

                Arc::new(PgDocumentStore::new(pool))
            }
            StoreBackend::Memory => {
                tracing::warn!("⚠️ Usando o store em memória: nada será persistido");
                Arc::new(MemoryDocumentStore::new())
            }
        };

        Self::with_store(config, store)
    }

    /// Monta o gráfico de dependências sobre um store já pronto.
    pub fn with_store(config: AppConfig, store: SharedStore) -> anyhow::Result<Self> {
        let i18n_store = Arc::new(I18nStore::load()?);

        let inventory_service = InventoryService::new(
            Repository::new(store.clone()),
            Repository::new(store.clone()),
            Repository::new(store.clone()),
            config.low_stock_threshold,
        );
        let invoice_service = InvoiceService::new(
            Repository::new(store.clone()),
            Repository::new(store.clone()),
            inventory_service.clone(),
            config.company.clone(),
        );
        let order_service = OrderService::new(
            Repository::new(store.clone()),
            Repository::new(store.clone()),
            inventory_service.clone(),
            invoice_service.clone(),
        );
        let purchase_service = PurchaseService::new(
            Repository::new(store.clone()),
            Repository::new(store.clone()),
            inventory_service.clone(),
            invoice_service.clone(),
        );
        let crm_service = CrmService::new(
            Repository::new(store.clone()),
            Repository::new(store.clone()),
            Repository::new(store.clone()),
        );
        let dashboard_service = DashboardService::new(
            inventory_service.clone(),
            order_service.clone(),
            purchase_service.clone(),
            crm_service.clone(),
        );

        Ok(Self {
            auth_service: AuthService::new(
                Repository::new(store.clone()),
                config.jwt_secret.clone(),
                chrono::Duration::hours(config.jwt_ttl_hours),
            ),
            employee_service: EmployeeService::new(Repository::new(store.clone())),
            supplier_service: SupplierService::new(Repository::new(store.clone())),
            customer_service: CustomerService::new(Repository::new(store.clone())),
            goal_service: GoalService::new(Repository::new(store.clone())),
            document_service: DocumentService::new(config.fonts_dir.clone(), config.company.clone()),
            admin_products: AdminProductsClient::new(&config.admin_api_url)?,
            inventory_service,
            invoice_service,
            order_service,
            purchase_service,
            crm_service,
            dashboard_service,
            i18n_store,
            config: Arc::new(config),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_names() {
        assert_eq!("Postgres".parse::<StoreBackend>().unwrap(), StoreBackend::Postgres);
        assert_eq!("memory".parse::<StoreBackend>().unwrap(), StoreBackend::Memory);
        assert!("mongo".parse::<StoreBackend>().is_err());
    }
}
