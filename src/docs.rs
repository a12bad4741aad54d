// src/docs.rs

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::OpenApi;

use crate::clients;
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::get_me,
        handlers::auth::list_permissions,

        // --- Inventory ---
        handlers::inventory::list_products,
        handlers::inventory::create_product,
        handlers::inventory::get_product,
        handlers::inventory::update_product,
        handlers::inventory::delete_product,
        handlers::inventory::adjust_stock,
        handlers::inventory::low_stock,
        handlers::inventory::kardex,

        // --- Suppliers ---
        handlers::suppliers::list_suppliers,
        handlers::suppliers::create_supplier,
        handlers::suppliers::get_supplier,
        handlers::suppliers::update_supplier,
        handlers::suppliers::set_supplier_active,
        handlers::suppliers::delete_supplier,

        // --- Customers ---
        handlers::customers::list_customers,
        handlers::customers::create_customer,
        handlers::customers::get_customer,
        handlers::customers::update_customer,
        handlers::customers::delete_customer,

        // --- Employees ---
        handlers::employees::list_employees,
        handlers::employees::create_employee,
        handlers::employees::get_employee,
        handlers::employees::update_employee,
        handlers::employees::delete_employee,

        // --- CRM ---
        handlers::crm::list_leads,
        handlers::crm::create_lead,
        handlers::crm::get_lead,
        handlers::crm::update_lead,
        handlers::crm::set_lead_status,
        handlers::crm::lead_conversion,
        handlers::crm::delete_lead,
        handlers::crm::list_opportunities,
        handlers::crm::create_opportunity,
        handlers::crm::get_opportunity,
        handlers::crm::update_opportunity,
        handlers::crm::set_opportunity_stage,
        handlers::crm::delete_opportunity,
        handlers::crm::list_campaigns,
        handlers::crm::create_campaign,
        handlers::crm::get_campaign,
        handlers::crm::update_campaign,
        handlers::crm::delete_campaign,

        // --- Orders ---
        handlers::orders::list_orders,
        handlers::orders::create_order,
        handlers::orders::get_order,
        handlers::orders::update_order_status,
        handlers::orders::issue_order_invoice,
        handlers::orders::delete_order,

        // --- Purchases ---
        handlers::purchases::list_purchases,
        handlers::purchases::create_purchase,
        handlers::purchases::get_purchase,
        handlers::purchases::update_purchase_status,
        handlers::purchases::add_quotation,
        handlers::purchases::select_quotation,
        handlers::purchases::delete_purchase,

        // --- Invoices ---
        handlers::invoices::list_invoices,
        handlers::invoices::create_entry_invoice,
        handlers::invoices::get_invoice,

        // --- Goals ---
        handlers::goals::list_goals,
        handlers::goals::create_goal,
        handlers::goals::get_goal,
        handlers::goals::update_goal,
        handlers::goals::update_goal_progress,
        handlers::goals::delete_goal,

        // --- Dashboard ---
        handlers::dashboard::get_summary,

        // --- Documents ---
        handlers::documents::order_danfe,
        handlers::documents::invoice_danfe,

        // --- Admin Products ---
        handlers::admin_products::list_admin_products,
        handlers::admin_products::get_admin_product,
        handlers::admin_products::update_admin_product,
        handlers::admin_products::delete_admin_product,
    ),
    components(
        schemas(
            // --- Comuns ---
            models::Address,
            models::Actor,

            // --- Auth / RH ---
            models::employee::Role,
            models::employee::EmployeeResponse,
            models::employee::AuthResponse,
            models::employee::PermissionCatalog,

            // --- Estoque ---
            models::product::Product,
            models::product::LowStockEntry,
            models::kardex::MovementKind,
            models::kardex::KardexEntry,

            // --- Vendas / Compras / Fiscal ---
            models::order::OrderStatus,
            models::order::Order,
            models::purchase::PurchaseStatus,
            models::purchase::PurchaseOrder,
            models::invoice::InvoiceKind,
            models::invoice::Invoice,

            // --- CRM / Metas ---
            models::crm::LeadStatus,
            models::crm::OpportunityStage,
            models::crm::CampaignStatus,
            models::goal::GoalStatus,
            models::goal::GoalPriority,

            // --- Dashboard ---
            models::dashboard::DashboardSummary,

            // --- API administrativa ---
            clients::AdminProduct,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação, perfil e permissões"),
        (name = "Inventory", description = "Estoque, ajustes e Kardex"),
        (name = "Suppliers", description = "Cadastro de Fornecedores"),
        (name = "Customers", description = "Cadastro de Clientes"),
        (name = "Employees", description = "Funcionários (RH)"),
        (name = "CRM", description = "Leads, Oportunidades e Campanhas"),
        (name = "Orders", description = "Pedidos de venda e fluxo de separação"),
        (name = "Purchases", description = "Requisições e pedidos de compra"),
        (name = "Invoices", description = "Notas fiscais de entrada e saída"),
        (name = "Goals", description = "Metas de vendas"),
        (name = "Dashboard", description = "Indicadores Gerenciais"),
        (name = "Documents", description = "DANFE em PDF"),
        (name = "Admin Products", description = "Proxy da API administrativa de produtos")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}
