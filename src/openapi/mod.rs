use crate::AppState;
use axum::{response::Json, routing::get, Router};
use utoipa::OpenApi;

pub const OPENAPI_JSON_PATH: &str = "/api-docs/openapi.json";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Inventory API",
        version = "0.1.0",
        description = r#"
# Inventory API

Product catalog with stock history and CSV bulk transfer.

## Products

- Product names are unique ignoring case.
- Stock is a whole number, never negative.
- Every single-record change of stock is recorded in the product's history.

## CSV import

`POST /api/v1/products/import` takes a multipart form with a `file` part. Rows are
matched to existing products by name (ignoring case): new names are added,
rows that differ are updated, identical rows and rows without a name are
skipped. The whole file is applied in one transaction.

## Error Handling

Failures share one body shape:

```json
{
  "error": "Conflict",
  "message": "Product name must be unique",
  "timestamp": "2024-01-01T00:00:00Z"
}
```
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:4000", description = "Local development")
    ),
    tags(
        (name = "Products", description = "Product catalog, stock history and CSV transfer")
    ),
    paths(
        crate::handlers::products::list_products,
        crate::handlers::products::search_products,
        crate::handlers::products::export_products,
        crate::handlers::products::import_products,
        crate::handlers::products::create_product,
        crate::handlers::products::get_product,
        crate::handlers::products::update_product,
        crate::handlers::products::delete_product,
        crate::handlers::products::product_history,
    ),
    components(
        schemas(
            crate::entities::ProductModel,
            crate::entities::InventoryLogModel,
            crate::services::ProductInput,
            crate::services::ImportSummary,
            crate::handlers::common::SuccessFlag,
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

/// Serves the generated document as JSON
pub fn openapi_routes() -> Router<AppState> {
    Router::new().route(
        OPENAPI_JSON_PATH,
        get(|| async { Json(ApiDocV1::openapi()) }),
    )
}
