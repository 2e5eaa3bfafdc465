use crate::{
    entities::{InventoryLogModel, ProductModel},
    errors::{ErrorResponse, ServiceError},
    handlers::common::{created_response, csv_attachment_response, success_response, SuccessFlag},
    services::{ImportSummary, ProductInput},
    AppState,
};
use axum::{
    extract::{rejection::JsonRejection, Json, Multipart, Path, Query, State},
    response::Response,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tracing::{info, warn};
use utoipa::IntoParams;

const EXPORT_FILENAME: &str = "products_export.csv";
const UPLOAD_FIELD: &str = "file";

/// Creates the router for product endpoints
pub fn products_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/search", get(search_products))
        .route("/export", get(export_products))
        .route("/import", post(import_products))
        .route(
            "/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/:id/history", get(product_history))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct SearchParams {
    /// Substring to look for in product names, case-insensitive
    pub name: Option<String>,
}

/// List all products, newest first
#[utoipa::path(
    get,
    path = "/api/v1/products",
    responses(
        (status = 200, description = "All products", body = [ProductModel])
    ),
    tag = "Products"
)]
pub async fn list_products(State(state): State<AppState>) -> Result<Response, ServiceError> {
    let products = state.services.products.list().await?;
    Ok(success_response(products))
}

/// Search products by name
#[utoipa::path(
    get,
    path = "/api/v1/products/search",
    params(SearchParams),
    responses(
        (status = 200, description = "Matching products; empty for a blank query", body = [ProductModel])
    ),
    tag = "Products"
)]
pub async fn search_products(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Response, ServiceError> {
    let term = params.name.unwrap_or_default();
    let products = state.services.products.search(&term).await?;
    Ok(success_response(products))
}

/// Download the catalog as CSV
#[utoipa::path(
    get,
    path = "/api/v1/products/export",
    responses(
        (status = 200, description = "CSV attachment", content_type = "text/csv", body = String)
    ),
    tag = "Products"
)]
pub async fn export_products(State(state): State<AppState>) -> Result<Response, ServiceError> {
    let csv = state.services.import_export.export_csv().await?;
    Ok(csv_attachment_response(csv, EXPORT_FILENAME))
}

/// Upload a CSV file and reconcile it against the catalog
#[utoipa::path(
    post,
    path = "/api/v1/products/import",
    request_body(content_type = "multipart/form-data", description = "Form with a `file` part holding CSV text"),
    responses(
        (status = 200, description = "Import applied", body = ImportSummary),
        (status = 400, description = "No file, or the file is not valid CSV", body = ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn import_products(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, ServiceError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServiceError::BadRequest(e.body_text()))?
    {
        if field.name() == Some(UPLOAD_FIELD) {
            let filename = field.file_name().map(str::to_string);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ServiceError::BadRequest(e.body_text()))?;
            info!(filename = ?filename, bytes = bytes.len(), "import file received");
            upload = Some(bytes);
            break;
        }
    }

    let Some(data) = upload else {
        warn!("import request without a file part");
        return Err(ServiceError::BadRequest("No file uploaded".to_string()));
    };

    let summary = state.services.import_export.import_csv(&data).await?;
    Ok(success_response(summary))
}

/// Create a product
#[utoipa::path(
    post,
    path = "/api/v1/products",
    request_body = ProductInput,
    responses(
        (status = 201, description = "Product created", body = ProductModel),
        (status = 400, description = "Malformed body, invalid name or stock", body = ErrorResponse),
        (status = 409, description = "Name already taken", body = ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    payload: Result<Json<ProductInput>, JsonRejection>,
) -> Result<Response, ServiceError> {
    let Json(payload) = payload?;
    let created = state.services.products.create(payload).await?;
    Ok(created_response(created))
}

/// Fetch one product
#[utoipa::path(
    get,
    path = "/api/v1/products/{id}",
    params(("id" = i32, Path, description = "Product id")),
    responses(
        (status = 200, description = "The product", body = ProductModel),
        (status = 404, description = "Product not found", body = ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, ServiceError> {
    let product = state.services.products.get(id).await?;
    Ok(success_response(product))
}

/// Replace a product's fields
#[utoipa::path(
    put,
    path = "/api/v1/products/{id}",
    params(("id" = i32, Path, description = "Product id")),
    request_body = ProductInput,
    responses(
        (status = 200, description = "Updated product", body = ProductModel),
        (status = 400, description = "Malformed body, invalid name or stock", body = ErrorResponse),
        (status = 404, description = "Product not found", body = ErrorResponse),
        (status = 409, description = "Name already taken", body = ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    payload: Result<Json<ProductInput>, JsonRejection>,
) -> Result<Response, ServiceError> {
    let Json(payload) = payload?;
    let updated = state.services.products.update(id, payload).await?;
    Ok(success_response(updated))
}

/// Delete a product and its stock history
#[utoipa::path(
    delete,
    path = "/api/v1/products/{id}",
    params(("id" = i32, Path, description = "Product id")),
    responses(
        (status = 200, description = "Always reports success", body = SuccessFlag)
    ),
    tag = "Products"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, ServiceError> {
    state.services.products.delete(id).await?;
    Ok(success_response(SuccessFlag::ok()))
}

/// Stock history of a product, newest first
#[utoipa::path(
    get,
    path = "/api/v1/products/{id}/history",
    params(("id" = i32, Path, description = "Product id")),
    responses(
        (status = 200, description = "Stock transitions", body = [InventoryLogModel])
    ),
    tag = "Products"
)]
pub async fn product_history(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, ServiceError> {
    let entries = state.services.inventory_log.history(id).await?;
    Ok(success_response(entries))
}
