pub mod admin_products;
pub mod auth;
pub mod crm;
pub mod customers;
pub mod dashboard;
pub mod documents;
pub mod employees;
pub mod goals;
pub mod inventory;
pub mod invoices;
pub mod orders;
pub mod purchases;
pub mod suppliers;
