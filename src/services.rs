pub mod auth;
pub mod crm_service;
pub mod customer_service;
pub mod dashboard_service;
pub mod document_service;
pub mod employee_service;
pub mod goal_service;
pub mod inventory_service;
pub mod invoice_service;
pub mod order_service;
pub mod purchase_service;
pub mod supplier_service;
