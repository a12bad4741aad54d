// src/middleware/rbac.rs

use std::marker::PhantomData;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
};

/// 1. O Trait que define o que é uma Permissão
pub trait PermissionDef: Send + Sync + 'static {
    fn slug() -> &'static str;
}

/// 2. O Extractor (Guardião). A permissão vem do cargo do funcionário.
pub struct RequirePermission<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequirePermission<T>
where
    T: PermissionDef,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthenticatedUser::from_request_parts(parts, state).await?;

        let required_perm = T::slug();
        if user.0.role.has_permission(required_perm) {
            return Ok(RequirePermission(PhantomData));
        }

        tracing::warn!(
            "🚫 {} ({:?}) sem a permissão '{}'",
            user.0.email,
            user.0.role,
            required_perm
        );
        let app_state = AppState::from_ref(state);
        let Ok(locale) = Locale::from_request_parts(parts, state).await;
        Err(AppError::Forbidden(required_perm.to_string()).to_api_error(&locale, &app_state.i18n_store))
    }
}

// ---
// DEFINIÇÃO DAS PERMISSÕES (TIPOS)
// ---
macro_rules! permission {
    ($name:ident, $slug:literal) => {
        pub struct $name;
        impl PermissionDef for $name {
            fn slug() -> &'static str {
                $slug
            }
        }
    };
}

permission!(PermInventoryRead, "inventory:read");
permission!(PermInventoryWrite, "inventory:write");
permission!(PermPurchasesRead, "purchases:read");
permission!(PermPurchasesWrite, "purchases:write");
permission!(PermSalesRead, "sales:read");
permission!(PermSalesWrite, "sales:write");
permission!(PermCrmRead, "crm:read");
permission!(PermCrmWrite, "crm:write");
permission!(PermHrRead, "hr:read");
permission!(PermHrWrite, "hr:write");
permission!(PermInvoicesRead, "invoices:read");
permission!(PermInvoicesWrite, "invoices:write");
permission!(PermGoalsRead, "goals:read");
permission!(PermGoalsWrite, "goals:write");
permission!(PermDashboardRead, "dashboard:read");

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::employee::ALL_PERMISSIONS;

    #[test]
    fn guard_slugs_are_known_permissions() {
        for slug in [
            PermInventoryRead::slug(),
            PermInventoryWrite::slug(),
            PermPurchasesRead::slug(),
            PermPurchasesWrite::slug(),
            PermSalesRead::slug(),
            PermSalesWrite::slug(),
            PermCrmRead::slug(),
            PermCrmWrite::slug(),
            PermHrRead::slug(),
            PermHrWrite::slug(),
            PermInvoicesRead::slug(),
            PermInvoicesWrite::slug(),
            PermGoalsRead::slug(),
            PermGoalsWrite::slug(),
            PermDashboardRead::slug(),
        ] {
            assert!(ALL_PERMISSIONS.contains(&slug), "{}", slug);
        }
    }
}
