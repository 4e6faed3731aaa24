//! Product lookups against the store's admin GraphQL API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use packdeal_core::catalog::{CatalogError, CatalogLookup};
use packdeal_core::config::CatalogConfig;
use packdeal_core::domain::product::{ExternalProduct, ProductId};

const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";

const PRODUCTS_QUERY: &str = r#"query GetProducts($ids: [ID!]!) {
  nodes(ids: $ids) {
    ... on Product {
      id
      title
      images(first: 1) {
        nodes {
          altText
          url
        }
      }
      priceRange {
        minVariantPrice {
          amount
        }
      }
    }
  }
}"#;

#[derive(Clone)]
pub struct AdminGraphqlCatalog {
    client: Client,
    endpoint: String,
    access_token: SecretString,
}

impl AdminGraphqlCatalog {
    pub fn from_config(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|error| CatalogError::Transport(error.to_string()))?;

        Ok(Self::with_endpoint(client, config.graphql_endpoint(), config.access_token.clone()))
    }

    pub fn with_endpoint(
        client: Client,
        endpoint: impl Into<String>,
        access_token: SecretString,
    ) -> Self {
        Self { client, endpoint: endpoint.into(), access_token }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl CatalogLookup for AdminGraphqlCatalog {
    async fn fetch_products(
        &self,
        ids: &[ProductId],
    ) -> Result<Vec<ExternalProduct>, CatalogError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let response = self
            .client
            .post(&self.endpoint)
            .header(ACCESS_TOKEN_HEADER, self.access_token.expose_secret())
            .json(&json!({ "query": PRODUCTS_QUERY, "variables": { "ids": ids } }))
            .send()
            .await
            .map_err(|error| CatalogError::Transport(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status(status.as_u16()));
        }

        let payload: GraphqlResponse =
            response.json().await.map_err(|error| CatalogError::Decode(error.to_string()))?;
        let products = payload.into_products()?;

        debug!(
            event_name = "catalog.products.fetched",
            requested = ids.len(),
            resolved = products.len(),
            "catalog lookup completed"
        );
        Ok(products)
    }
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse {
    data: Option<NodesData>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct NodesData {
    #[serde(default)]
    nodes: Vec<Option<ProductNode>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductNode {
    id: Option<String>,
    title: Option<String>,
    images: Option<ImageConnection>,
    price_range: Option<PriceRange>,
}

#[derive(Debug, Deserialize)]
struct ImageConnection {
    #[serde(default)]
    nodes: Vec<ImageNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageNode {
    url: Option<String>,
    alt_text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceRange {
    min_variant_price: Option<Money>,
}

#[derive(Debug, Deserialize)]
struct Money {
    amount: Option<String>,
}

impl GraphqlResponse {
    fn into_products(self) -> Result<Vec<ExternalProduct>, CatalogError> {
        let messages: Vec<String> = self.errors.into_iter().map(|error| error.message).collect();

        let Some(data) = self.data else {
            return Err(if messages.is_empty() {
                CatalogError::Decode("response carried neither data nor errors".to_string())
            } else {
                CatalogError::GraphQl(messages)
            });
        };

        if !messages.is_empty() {
            warn!(
                event_name = "catalog.products.partial",
                errors = %messages.join("; "),
                "catalog returned data alongside errors"
            );
        }

        // deleted products and non-product ids come back as null or empty nodes
        Ok(data.nodes.into_iter().flatten().filter_map(ProductNode::into_product).collect())
    }
}

impl ProductNode {
    fn into_product(self) -> Option<ExternalProduct> {
        let id = self.id?;
        let image = self.images.and_then(|images| images.nodes.into_iter().next());
        let (image_url, image_alt_text) = match image {
            Some(image) => (image.url, image.alt_text),
            None => (None, None),
        };

        Some(ExternalProduct {
            id: ProductId(id),
            title: self.title.unwrap_or_default(),
            image_url,
            image_alt_text,
            min_variant_price_amount: self
                .price_range
                .and_then(|range| range.min_variant_price)
                .and_then(|money| money.amount)
                .unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use axum::{http::HeaderMap, http::StatusCode, routing::post, Json, Router};
    use reqwest::Client;
    use serde_json::{json, Value};

    use packdeal_core::catalog::{CatalogError, CatalogLookup};
    use packdeal_core::config::CatalogConfig;
    use packdeal_core::domain::product::ProductId;

    use super::{AdminGraphqlCatalog, GraphqlResponse};

    async fn graphql_stub(headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
        if headers.get("x-shopify-access-token").and_then(|value| value.to_str().ok())
            != Some("shpat_test")
        {
            return (StatusCode::UNAUTHORIZED, Json(json!({ "errors": "unauthorized" })));
        }

        let ids = body["variables"]["ids"].as_array().cloned().unwrap_or_default();
        let nodes: Vec<Value> = ids
            .iter()
            .map(|id| match id.as_str() {
                Some("gid://shopify/Product/1") => json!({
                    "id": "gid://shopify/Product/1",
                    "title": "T-Shirt",
                    "images": { "nodes": [{ "altText": "Front", "url": "https://cdn.example.com/1.jpg" }] },
                    "priceRange": { "minVariantPrice": { "amount": "20.0" } }
                }),
                Some("gid://shopify/Product/2") => json!({
                    "id": "gid://shopify/Product/2",
                    "title": "Shorts",
                    "images": { "nodes": [] },
                    "priceRange": { "minVariantPrice": { "amount": "30.0" } }
                }),
                _ => Value::Null,
            })
            .collect();

        (StatusCode::OK, Json(json!({ "data": { "nodes": nodes } })))
    }

    async fn spawn_stub() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind stub");
        let address = listener.local_addr().expect("stub address");
        let app = Router::new().route("/admin/api/2025-01/graphql.json", post(graphql_stub));
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        format!("http://{address}/admin/api/2025-01/graphql.json")
    }

    fn catalog(endpoint: String, token: &str) -> AdminGraphqlCatalog {
        AdminGraphqlCatalog::with_endpoint(Client::new(), endpoint, token.to_string().into())
    }

    #[tokio::test]
    async fn fetches_products_and_skips_missing_nodes() {
        let endpoint = spawn_stub().await;
        let catalog = catalog(endpoint, "shpat_test");

        let products = catalog
            .fetch_products(&[
                ProductId("gid://shopify/Product/1".to_string()),
                ProductId("gid://shopify/Product/999".to_string()),
                ProductId("gid://shopify/Product/2".to_string()),
            ])
            .await
            .expect("lookup should succeed");

        assert_eq!(products.len(), 2);
        assert_eq!(products[0].title, "T-Shirt");
        assert_eq!(products[0].image_url.as_deref(), Some("https://cdn.example.com/1.jpg"));
        assert_eq!(products[0].image_alt_text.as_deref(), Some("Front"));
        assert_eq!(products[1].min_variant_price_amount, "30.0");
        assert!(products[1].image_url.is_none());
    }

    #[tokio::test]
    async fn rejected_credentials_surface_as_status_error() {
        let endpoint = spawn_stub().await;
        let catalog = catalog(endpoint, "shpat_wrong");

        let result =
            catalog.fetch_products(&[ProductId("gid://shopify/Product/1".to_string())]).await;
        assert_eq!(result, Err(CatalogError::Status(401)));
    }

    #[tokio::test]
    async fn empty_selection_does_not_touch_the_network() {
        let catalog = catalog("http://127.0.0.1:9/unreachable".to_string(), "shpat_test");
        let products = catalog.fetch_products(&[]).await.expect("no request is made");
        assert!(products.is_empty());
    }

    #[test]
    fn endpoint_is_built_from_shop_domain_and_api_version() {
        let config = CatalogConfig {
            shop_domain: "demo.myshopify.com".to_string(),
            access_token: "shpat_test".to_string().into(),
            api_version: "2024-10".to_string(),
            timeout_secs: 5,
        };
        let catalog = AdminGraphqlCatalog::from_config(&config).expect("client builds");
        assert_eq!(catalog.endpoint(), "https://demo.myshopify.com/admin/api/2024-10/graphql.json");
    }

    #[test]
    fn errors_without_data_become_graphql_errors() {
        let response: GraphqlResponse = serde_json::from_value(json!({
            "errors": [{ "message": "Throttled" }]
        }))
        .expect("decode");

        assert_eq!(
            response.into_products(),
            Err(CatalogError::GraphQl(vec!["Throttled".to_string()]))
        );
    }

    #[test]
    fn data_with_errors_is_still_used() {
        let response: GraphqlResponse = serde_json::from_value(json!({
            "data": { "nodes": [
                { "id": "gid://shopify/Product/5", "title": "Cap" },
                {}
            ] },
            "errors": [{ "message": "Access denied for priceRange" }]
        }))
        .expect("decode");

        let products = response.into_products().expect("data should win");
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].min_variant_price_amount, "");
    }
}
