//! Pack API: listing, submission, detail with live pricing, edit and delete.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Form, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use packdeal_core::catalog::CatalogLookup;
use packdeal_core::domain::pack::{Pack, PackId};
use packdeal_core::domain::product::{ExternalProduct, ProductId};
use packdeal_core::editor::{validate_create, validate_update, ValidationFailure};
use packdeal_core::errors::{ApplicationError, DomainError, InterfaceError};
use packdeal_core::numeric::parse_float;
use packdeal_core::pricing::{compute_pricing, PackPricing, PricingDisplay};
use packdeal_db::PackRepository;

pub const UPDATE_SUCCESS_MESSAGE: &str = "Pack successfully updated.";

#[derive(Clone)]
pub struct PackService {
    repository: Arc<dyn PackRepository>,
    catalog: Arc<dyn CatalogLookup>,
}

/// A stored pack enriched with live catalog data.
#[derive(Clone, Debug, PartialEq)]
pub struct PackDetail {
    pub pack: Pack,
    pub products: Vec<ExternalProduct>,
    pub pricing: PackPricing,
}

impl PackService {
    pub fn new(repository: Arc<dyn PackRepository>, catalog: Arc<dyn CatalogLookup>) -> Self {
        Self { repository, catalog }
    }

    pub async fn list(&self) -> Result<Vec<Pack>, ApplicationError> {
        Ok(self.repository.list_packs().await?)
    }

    pub async fn create(
        &self,
        name: Option<&str>,
        discount_raw: Option<&str>,
        product_ids_raw: Option<&str>,
    ) -> Result<Pack, ApplicationError> {
        let validated = validate_create(name, discount_raw, product_ids_raw)?;
        Ok(self.repository.create_pack_with_products(validated.into()).await?)
    }

    pub async fn detail(&self, id: &PackId) -> Result<PackDetail, ApplicationError> {
        let pack = self.require(id).await?;
        let products = self.products_for(&pack).await?;
        let pricing = compute_pricing(&products, pack.discount);
        Ok(PackDetail { pack, products, pricing })
    }

    pub async fn update(
        &self,
        id: &PackId,
        name: Option<&str>,
        discount_raw: Option<&str>,
    ) -> Result<Pack, ApplicationError> {
        let validated = validate_update(name, discount_raw)?;
        self.repository
            .update_pack(id, &validated.name, validated.discount)
            .await?
            .ok_or_else(|| DomainError::PackNotFound(id.clone()).into())
    }

    pub async fn delete(&self, id: &PackId) -> Result<(), ApplicationError> {
        if self.repository.delete_pack(id).await? {
            Ok(())
        } else {
            Err(DomainError::PackNotFound(id.clone()).into())
        }
    }

    /// Prices a pack at an unsaved discount. An absent value falls back to the
    /// stored discount; anything unparsable yields `NaN` totals.
    pub async fn preview_pricing(
        &self,
        id: &PackId,
        discount_raw: Option<&str>,
    ) -> Result<PackPricing, ApplicationError> {
        let pack = self.require(id).await?;
        let products = self.products_for(&pack).await?;
        let discount = discount_raw.map(parse_float).unwrap_or(pack.discount);
        Ok(compute_pricing(&products, discount))
    }

    async fn require(&self, id: &PackId) -> Result<Pack, ApplicationError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::PackNotFound(id.clone()).into())
    }

    /// Catalog products in the pack's association order.
    async fn products_for(&self, pack: &Pack) -> Result<Vec<ExternalProduct>, ApplicationError> {
        let product_ids = pack.product_ids();
        if product_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut products = self.catalog.fetch_products(&product_ids).await?;
        products.sort_by_key(|product| position_of(&product_ids, &product.id));
        Ok(products)
    }
}

fn position_of(product_ids: &[ProductId], id: &ProductId) -> usize {
    product_ids.iter().position(|candidate| candidate == id).unwrap_or(product_ids.len())
}

#[derive(Debug, Default, Deserialize)]
pub struct PackForm {
    pub name: Option<String>,
    pub discount: Option<String>,
    #[serde(rename = "productIds")]
    pub product_ids: Option<String>,
    pub intent: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PricingQuery {
    pub discount: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackView {
    pub id: PackId,
    pub name: String,
    pub discount: f64,
    pub product_ids: Vec<ProductId>,
    pub product_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Pack> for PackView {
    fn from(pack: &Pack) -> Self {
        Self {
            id: pack.id.clone(),
            name: pack.name.clone(),
            discount: pack.discount,
            product_ids: pack.product_ids(),
            product_count: pack.product_count(),
            created_at: pack.created_at,
            updated_at: pack.updated_at,
        }
    }
}

/// Totals as numbers plus two-decimal strings. `NaN` numbers serialize as
/// `null`, so the strings are what carries `NaN` to the client.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingView {
    pub subtotal: f64,
    pub discount_percent: f64,
    pub discount_amount: f64,
    pub total: f64,
    pub display: PricingDisplay,
}

impl From<PackPricing> for PricingView {
    fn from(pricing: PackPricing) -> Self {
        Self {
            subtotal: pricing.subtotal,
            discount_percent: pricing.discount_percent,
            discount_amount: pricing.discount_amount,
            total: pricing.total,
            display: pricing.display(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PackDetailView {
    pub pack: PackView,
    pub products: Vec<ExternalProduct>,
    pub pricing: PricingView,
}

/// An application failure bound to the request that produced it.
#[derive(Debug)]
pub struct ApiError {
    error: ApplicationError,
    correlation_id: String,
}

impl ApiError {
    fn new(error: ApplicationError, correlation_id: &str) -> Self {
        Self { error, correlation_id: correlation_id.to_string() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApplicationError::Domain(DomainError::Validation(ref validation)) = self.error {
            info!(
                event_name = "packs.validation.rejected",
                correlation_id = %self.correlation_id,
                error = %validation,
                "pack submission rejected"
            );
            return (StatusCode::BAD_REQUEST, Json(ValidationFailure::from(validation)))
                .into_response();
        }

        let interface = self.error.into_interface(self.correlation_id);
        let status = match interface {
            InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            InterfaceError::NotFound { .. } => StatusCode::NOT_FOUND,
            InterfaceError::BadGateway { .. } => StatusCode::BAD_GATEWAY,
            InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };

        warn!(
            event_name = "packs.request.failed",
            correlation_id = %interface.correlation_id(),
            status = status.as_u16(),
            error = %interface,
            "pack request failed"
        );

        let body = json!({
            "error": interface.user_message(),
            "correlationId": interface.correlation_id(),
        });
        (status, Json(body)).into_response()
    }
}

pub fn router(service: PackService) -> Router {
    Router::new()
        .route("/api/v1/packs", get(list_packs).post(create_pack))
        .route("/api/v1/packs/{id}", get(pack_detail).post(submit_pack).delete(delete_pack))
        .route("/api/v1/packs/{id}/pricing", get(preview_pricing))
        .with_state(service)
}

fn correlation_id() -> String {
    Uuid::new_v4().to_string()
}

async fn list_packs(State(service): State<PackService>) -> Result<Json<Vec<PackView>>, ApiError> {
    let correlation_id = correlation_id();
    let packs = service.list().await.map_err(|error| ApiError::new(error, &correlation_id))?;
    Ok(Json(packs.iter().map(PackView::from).collect()))
}

async fn create_pack(
    State(service): State<PackService>,
    Form(form): Form<PackForm>,
) -> Result<(StatusCode, Json<PackView>), ApiError> {
    let correlation_id = correlation_id();
    let pack = service
        .create(form.name.as_deref(), form.discount.as_deref(), form.product_ids.as_deref())
        .await
        .map_err(|error| ApiError::new(error, &correlation_id))?;

    info!(
        event_name = "packs.created",
        correlation_id = %correlation_id,
        pack_id = %pack.id,
        product_count = pack.product_count(),
        "pack created"
    );
    Ok((StatusCode::CREATED, Json(PackView::from(&pack))))
}

async fn pack_detail(
    State(service): State<PackService>,
    Path(id): Path<String>,
) -> Result<Json<PackDetailView>, ApiError> {
    let correlation_id = correlation_id();
    let detail = service
        .detail(&PackId(id))
        .await
        .map_err(|error| ApiError::new(error, &correlation_id))?;

    Ok(Json(PackDetailView {
        pack: PackView::from(&detail.pack),
        products: detail.products,
        pricing: detail.pricing.into(),
    }))
}

async fn submit_pack(
    State(service): State<PackService>,
    Path(id): Path<String>,
    Form(form): Form<PackForm>,
) -> Result<Response, ApiError> {
    let correlation_id = correlation_id();
    let id = PackId(id);

    if form.intent.as_deref() == Some("delete") {
        return remove_pack(&service, &id, &correlation_id).await.map(IntoResponse::into_response);
    }

    let pack = service
        .update(&id, form.name.as_deref(), form.discount.as_deref())
        .await
        .map_err(|error| ApiError::new(error, &correlation_id))?;

    info!(
        event_name = "packs.updated",
        correlation_id = %correlation_id,
        pack_id = %pack.id,
        "pack updated"
    );
    Ok(Json(json!({ "success": UPDATE_SUCCESS_MESSAGE, "pack": PackView::from(&pack) }))
        .into_response())
}

async fn delete_pack(
    State(service): State<PackService>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let correlation_id = correlation_id();
    remove_pack(&service, &PackId(id), &correlation_id).await
}

async fn remove_pack(
    service: &PackService,
    id: &PackId,
    correlation_id: &str,
) -> Result<Json<serde_json::Value>, ApiError> {
    service.delete(id).await.map_err(|error| ApiError::new(error, correlation_id))?;

    info!(
        event_name = "packs.deleted",
        correlation_id = %correlation_id,
        pack_id = %id,
        "pack deleted"
    );
    Ok(Json(json!({ "deleted": id })))
}

async fn preview_pricing(
    State(service): State<PackService>,
    Path(id): Path<String>,
    Query(query): Query<PricingQuery>,
) -> Result<Json<PricingView>, ApiError> {
    let correlation_id = correlation_id();
    let pricing = service
        .preview_pricing(&PackId(id), query.discount.as_deref())
        .await
        .map_err(|error| ApiError::new(error, &correlation_id))?;
    Ok(Json(pricing.into()))
}
