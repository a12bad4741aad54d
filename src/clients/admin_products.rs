// src/clients/admin_products.rs
//
// Cliente da API administrativa de produtos (serviço REST separado).

use std::time::Duration;

use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

use crate::common::error::AppError;

/// Produto como a API administrativa o devolve. Campos desconhecidos são preservados.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AdminProduct {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub quantity: Option<Decimal>,
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub extra: Map<String, Value>,
}

#[derive(Clone)]
pub struct AdminProductsClient {
    client: reqwest::Client,
    base_url: String,
}

impl AdminProductsClient {
    pub fn new(base_url: &str) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent("backoffice-admin-products/0.1")
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self { client, base_url: base_url.trim_end_matches('/').to_string() })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn check(response: reqwest::Response) -> Result<reqwest::Response, AppError> {
        match response.status() {
            status if status.is_success() => Ok(response),
            StatusCode::NOT_FOUND => Err(AppError::ResourceNotFound("Produto".to_string())),
            status => {
                tracing::warn!("API administrativa respondeu {}", status);
                Err(AppError::UpstreamStatus(status.as_u16()))
            }
        }
    }

    pub async fn list_all(&self) -> Result<Vec<AdminProduct>, AppError> {
        let response = self.client.get(self.endpoint("products")).send().await?;
        Ok(Self::check(response)?.json().await?)
    }

    pub async fn fetch(&self, id: &str) -> Result<AdminProduct, AppError> {
        let response = self
            .client
            .get(self.endpoint(&format!("products/{}", id)))
            .send()
            .await?;
        Ok(Self::check(response)?.json().await?)
    }

    /// PUT do produto inteiro. Se a API não devolver corpo, ecoa o que foi enviado.
    pub async fn update(&self, id: &str, product: &AdminProduct) -> Result<AdminProduct, AppError> {
        let response = self
            .client
            .put(self.endpoint(&format!("products/{}", id)))
            .json(product)
            .send()
            .await?;
        let body = Self::check(response)?.bytes().await?;
        if body.is_empty() {
            let mut echoed = product.clone();
            echoed.id = Some(id.to_string());
            return Ok(echoed);
        }
        Ok(serde_json::from_slice(&body)?)
    }

    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        let response = self
            .client
            .delete(self.endpoint(&format!("products/{}", id)))
            .send()
            .await?;
        Self::check(response)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::{
        matchers::{method, path},
        Mock, MockServer, ResponseTemplate,
    };

    use super::*;

    async fn client(server: &MockServer) -> AdminProductsClient {
        AdminProductsClient::new(&format!("{}/api/", server.uri())).unwrap()
    }

    #[tokio::test]
    async fn lists_and_keeps_unknown_fields() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/products"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": "7", "name": "Parafuso", "price": 2.5, "category": "Fixação" }
            ])))
            .mount(&server)
            .await;

        let products = client(&server).await.list_all().await.unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].id.as_deref(), Some("7"));
        assert_eq!(products[0].extra["category"], "Fixação");
    }

    #[tokio::test]
    async fn not_found_and_upstream_failures_are_mapped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/products/404"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/api/products/1"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let api = client(&server).await;
        assert!(matches!(api.fetch("404").await, Err(AppError::ResourceNotFound(_))));
        assert!(matches!(api.delete("1").await, Err(AppError::UpstreamStatus(500))));
    }

    #[tokio::test]
    async fn update_echoes_payload_on_empty_body() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/products/3"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let product = AdminProduct {
            id: None,
            name: "Porca".into(),
            price: Some(Decimal::ONE),
            quantity: None,
            extra: Map::new(),
        };
        let updated = client(&server).await.update("3", &product).await.unwrap();
        assert_eq!(updated.id.as_deref(), Some("3"));
        assert_eq!(updated.name, "Porca");
    }
}
