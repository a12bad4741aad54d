pub mod admin_products;
pub use admin_products::{AdminProduct, AdminProductsClient};
