// src/routes.rs

use axum::{
    http::HeaderValue,
    middleware as axum_middleware,
    routing::{get, patch, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{config::AppState, docs::ApiDoc, handlers, middleware::auth::auth_guard};

fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/products",
            get(handlers::inventory::list_products).post(handlers::inventory::create_product),
        )
        .route(
            "/products/{id}",
            get(handlers::inventory::get_product)
                .put(handlers::inventory::update_product)
                .delete(handlers::inventory::delete_product),
        )
        .route("/products/{id}/adjust", post(handlers::inventory::adjust_stock))
        .route("/low-stock", get(handlers::inventory::low_stock))
        .route("/kardex", get(handlers::inventory::kardex))
}

fn supplier_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::suppliers::list_suppliers).post(handlers::suppliers::create_supplier),
        )
        .route(
            "/{id}",
            get(handlers::suppliers::get_supplier)
                .put(handlers::suppliers::update_supplier)
                .delete(handlers::suppliers::delete_supplier),
        )
        .route("/{id}/active", patch(handlers::suppliers::set_supplier_active))
}

fn customer_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::customers::list_customers).post(handlers::customers::create_customer),
        )
        .route(
            "/{id}",
            get(handlers::customers::get_customer)
                .put(handlers::customers::update_customer)
                .delete(handlers::customers::delete_customer),
        )
}

fn employee_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::employees::list_employees).post(handlers::employees::create_employee),
        )
        .route(
            "/{id}",
            get(handlers::employees::get_employee)
                .put(handlers::employees::update_employee)
                .delete(handlers::employees::delete_employee),
        )
}

fn crm_routes() -> Router<AppState> {
    Router::new()
        // Leads
        .route("/leads", get(handlers::crm::list_leads).post(handlers::crm::create_lead))
        .route(
            "/leads/{id}",
            get(handlers::crm::get_lead)
                .put(handlers::crm::update_lead)
                .delete(handlers::crm::delete_lead),
        )
        .route("/leads/{id}/status", post(handlers::crm::set_lead_status))
        .route("/leads/{id}/conversion", get(handlers::crm::lead_conversion))
        // Oportunidades
        .route(
            "/opportunities",
            get(handlers::crm::list_opportunities).post(handlers::crm::create_opportunity),
        )
        .route(
            "/opportunities/{id}",
            get(handlers::crm::get_opportunity)
                .put(handlers::crm::update_opportunity)
                .delete(handlers::crm::delete_opportunity),
        )
        .route("/opportunities/{id}/stage", post(handlers::crm::set_opportunity_stage))
        // Campanhas
        .route(
            "/campaigns",
            get(handlers::crm::list_campaigns).post(handlers::crm::create_campaign),
        )
        .route(
            "/campaigns/{id}",
            get(handlers::crm::get_campaign)
                .put(handlers::crm::update_campaign)
                .delete(handlers::crm::delete_campaign),
        )
}

fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::orders::list_orders).post(handlers::orders::create_order))
        .route(
            "/{id}",
            get(handlers::orders::get_order).delete(handlers::orders::delete_order),
        )
        .route("/{id}/status", post(handlers::orders::update_order_status))
        .route("/{id}/invoice", post(handlers::orders::issue_order_invoice))
        .route("/{id}/danfe", get(handlers::documents::order_danfe))
}

fn purchase_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::purchases::list_purchases).post(handlers::purchases::create_purchase),
        )
        .route(
            "/{id}",
            get(handlers::purchases::get_purchase).delete(handlers::purchases::delete_purchase),
        )
        .route("/{id}/status", post(handlers::purchases::update_purchase_status))
        .route("/{id}/quotations", post(handlers::purchases::add_quotation))
        .route(
            "/{id}/quotations/{index}/select",
            post(handlers::purchases::select_quotation),
        )
}

fn invoice_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::invoices::list_invoices))
        .route("/entry", post(handlers::invoices::create_entry_invoice))
        .route("/{id}", get(handlers::invoices::get_invoice))
        .route("/{id}/danfe", get(handlers::documents::invoice_danfe))
}

fn goal_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::goals::list_goals).post(handlers::goals::create_goal))
        .route(
            "/{id}",
            get(handlers::goals::get_goal)
                .put(handlers::goals::update_goal)
                .delete(handlers::goals::delete_goal),
        )
        .route("/{id}/progress", post(handlers::goals::update_goal_progress))
}

fn admin_product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::admin_products::list_admin_products))
        .route(
            "/{id}",
            get(handlers::admin_products::get_admin_product)
                .put(handlers::admin_products::update_admin_product)
                .delete(handlers::admin_products::delete_admin_product),
        )
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    if origins.is_empty() {
        tracing::info!("CORS permissivo (CORS_ALLOWED_ORIGINS vazio)");
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

pub fn build_router(app_state: AppState) -> Router {
    // Rotas públicas de autenticação
    let public_routes = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login));

    // Todo o resto exige o Bearer token
    let protected_routes = Router::new()
        .route("/api/auth/me", get(handlers::auth::get_me))
        .route("/api/permissions", get(handlers::auth::list_permissions))
        .route("/api/dashboard/summary", get(handlers::dashboard::get_summary))
        .nest("/api/inventory", inventory_routes())
        .nest("/api/suppliers", supplier_routes())
        .nest("/api/customers", customer_routes())
        .nest("/api/employees", employee_routes())
        .nest("/api/crm", crm_routes())
        .nest("/api/orders", order_routes())
        .nest("/api/purchases", purchase_routes())
        .nest("/api/invoices", invoice_routes())
        .nest("/api/goals", goal_routes())
        .nest("/api/admin-products", admin_product_routes())
        .route_layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    let cors = cors_layer(&app_state.config.cors_allowed_origins);

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::{
        models::employee::Role,
        test_support::{admin_token, memory_state, token_for},
    };

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn create_product(app: &Router, token: &str, code: &str, quantity: i64) -> Value {
        let (status, body) = send(
            app,
            Method::POST,
            "/api/inventory/products",
            Some(token),
            Some(json!({"code": code, "name": "Parafuso", "price": 2.5, "quantity": quantity})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body
    }

    #[tokio::test]
    async fn health_is_public() {
        let app = build_router(memory_state());
        let response = app
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn protected_routes_need_a_token() {
        let app = build_router(memory_state());
        let (status, body) = send(&app, Method::GET, "/api/inventory/products", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["error"].is_string());

        let (status, _) =
            send(&app, Method::GET, "/api/auth/me", Some("token-invalido"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn register_is_closed_after_bootstrap() {
        let state = memory_state();
        let app = build_router(state.clone());
        let token = admin_token(&state).await;

        let (status, me) = send(&app, Method::GET, "/api/auth/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["role"], "ADMIN");
        assert!(me.get("passwordHash").is_none());

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({"name": "Outro", "email": "outro@empresa.com", "password": "senha123"})),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, login) = send(
            &app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({"email": "ADMIN@empresa.com", "password": "senha123"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(login["token"].is_string());
    }

    #[tokio::test]
    async fn low_stock_lists_products_at_threshold() {
        let state = memory_state();
        let app = build_router(state.clone());
        let token = admin_token(&state).await;

        create_product(&app, &token, "A", 10).await;
        create_product(&app, &token, "B", 11).await;

        let (status, body) =
            send(&app, Method::GET, "/api/inventory/low-stock", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        let codes: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|entry| entry["code"].as_str().unwrap())
            .collect();
        assert_eq!(codes, vec!["A"]);

        let (_, body) =
            send(&app, Method::GET, "/api/inventory/low-stock?threshold=5", Some(&token), None)
                .await;
        assert!(body.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_product_name_is_a_translated_validation_error() {
        let state = memory_state();
        let app = build_router(state.clone());
        let token = admin_token(&state).await;

        let request = Request::post("/api/inventory/products")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT_LANGUAGE, "pt-BR,pt;q=0.9")
            .body(Body::from(json!({"code": "A", "name": "  ", "price": 1}).to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Um ou mais campos são inválidos.");
        assert!(body["details"]["name"].is_array());
    }

    #[tokio::test]
    async fn salesperson_cannot_touch_stock() {
        let state = memory_state();
        let app = build_router(state.clone());
        admin_token(&state).await;
        let token = token_for(&state, "vendas@empresa.com", Role::Salesperson).await;

        let (status, _) =
            send(&app, Method::GET, "/api/inventory/products", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/inventory/products",
            Some(&token),
            Some(json!({"code": "A", "name": "Parafuso", "price": 1})),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(body["error"].as_str().unwrap().contains("inventory:write"));
    }

    #[tokio::test]
    async fn order_flow_totals_and_walks_the_status_chain() {
        let state = memory_state();
        let app = build_router(state.clone());
        let token = admin_token(&state).await;
        let product = create_product(&app, &token, "A", 50).await;

        let (status, order) = send(
            &app,
            Method::POST,
            "/api/orders",
            Some(&token),
            Some(json!({
                "customerName": "Balcão",
                "items": [
                    {"productId": product["id"], "quantity": 2, "unitPrice": 2.5},
                    {"productId": product["id"], "quantity": 1, "unitPrice": 10}
                ]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{}", order);
        assert_eq!(order["totalAmount"].as_f64(), Some(15.0));
        assert_eq!(order["status"], "pending");

        let status_uri = format!("/api/orders/{}/status", order["id"].as_str().unwrap());

        // Nome em português também é aceito
        let (status, moved) = send(
            &app,
            Method::POST,
            &status_uri,
            Some(&token),
            Some(json!({"status": "separando"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(moved["status"], "separating");

        let (status, _) = send(
            &app,
            Method::POST,
            &status_uri,
            Some(&token),
            Some(json!({"status": "enviado"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn lead_conversion_draft_over_http() {
        let state = memory_state();
        let app = build_router(state.clone());
        let token = admin_token(&state).await;

        let (status, lead) = send(
            &app,
            Method::POST,
            "/api/crm/leads",
            Some(&token),
            Some(json!({"name": "Joana", "estimatedValue": 800})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{}", lead);

        let uri = format!("/api/crm/leads/{}/conversion", lead["id"].as_str().unwrap());
        let (status, draft) = send(&app, Method::GET, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(draft["title"], "Oportunidade - Joana");
        assert_eq!(draft["leadId"], lead["id"]);
    }

    #[tokio::test]
    async fn openapi_document_is_served() {
        let app = build_router(memory_state());
        let (status, doc) = send(&app, Method::GET, "/api-docs/openapi.json", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(doc["paths"]["/api/orders/{id}/status"].is_object());
    }
}
