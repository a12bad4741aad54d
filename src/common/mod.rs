pub mod error;
pub mod fiscal;
pub mod i18n;
pub mod pagination;
pub mod validation;
