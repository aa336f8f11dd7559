//! HTTP transport for the catalog. Maps routes to [`Catalog`] calls.
//!
//! Requires the `http` feature. Uses axum for routing.
//!
//! ## Routes
//!
//! - `GET /ping`
//! - `GET|POST /v1/books`, `GET|PUT|DELETE /v1/books/:id`
//! - `PUT /v1/books/:id/fill`, `PUT /v1/books/:id/sale` with `{"amount": n}`
//! - `GET|POST /v1/books/:id/reviews`, `GET|PUT|DELETE /v1/books/:id/reviews/:review_id`
//! - `GET /v1/reports/best-selling-books`, `GET /v1/reports/best-selling-categories`
//!
//! Errors are returned as `{"error": "<message>"}` with the status code from
//! [`CatalogError::status_code`].
//!
//! ## Example
//!
//! ```ignore
//! use catalog_rust::{http, Catalog, CatalogConfig, InMemoryEntityStore};
//!
//! let catalog = Catalog::new(InMemoryEntityStore::new());
//!
//! // Get the router to compose with other axum routes
//! let app = http::router(catalog, CatalogConfig::default());
//!
//! // Or serve directly on `config.bind_addr`
//! http::serve(catalog, CatalogConfig::default()).await?;
//! ```

mod handlers;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use serde_json::json;

use crate::catalog::Catalog;
use crate::config::CatalogConfig;
use crate::error::CatalogError;
use crate::store::{EntityStore, StoreError};

/// Shared handler state.
pub struct AppState<S> {
    pub catalog: Catalog<S>,
    pub config: CatalogConfig,
}

/// Build an axum `Router` serving the catalog.
pub fn router<S: EntityStore + 'static>(catalog: Catalog<S>, config: CatalogConfig) -> Router {
    let state = Arc::new(AppState { catalog, config });

    // Book and review routes share the `:id` segment name; the router
    // rejects differently named parameters at the same position.
    Router::new()
        .route("/ping", get(handlers::ping))
        .route(
            "/v1/books",
            get(handlers::list_books::<S>).post(handlers::create_book::<S>),
        )
        .route(
            "/v1/books/:id",
            get(handlers::get_book::<S>)
                .put(handlers::update_book::<S>)
                .delete(handlers::delete_book::<S>),
        )
        .route("/v1/books/:id/fill", put(handlers::fill_book::<S>))
        .route("/v1/books/:id/sale", put(handlers::sale_book::<S>))
        .route(
            "/v1/books/:id/reviews",
            get(handlers::list_reviews::<S>).post(handlers::create_review::<S>),
        )
        .route(
            "/v1/books/:id/reviews/:review_id",
            get(handlers::get_review::<S>)
                .put(handlers::update_review::<S>)
                .delete(handlers::delete_review::<S>),
        )
        .route(
            "/v1/reports/best-selling-books",
            get(handlers::best_selling_books::<S>),
        )
        .route(
            "/v1/reports/best-selling-categories",
            get(handlers::best_selling_categories::<S>),
        )
        .with_state(state)
}

/// Serve the catalog over HTTP at `config.bind_addr`.
pub async fn serve<S: EntityStore + 'static>(
    catalog: Catalog<S>,
    config: CatalogConfig,
) -> Result<(), std::io::Error> {
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "catalog listening");
    axum::serve(listener, router(catalog, config)).await
}

impl IntoResponse for CatalogError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!("request failed: {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Run a catalog call on the blocking pool; store calls do synchronous I/O.
async fn blocking<S, T, F>(state: &Arc<AppState<S>>, call: F) -> Result<T, CatalogError>
where
    S: EntityStore + 'static,
    T: Send + 'static,
    F: FnOnce(&Catalog<S>) -> Result<T, CatalogError> + Send + 'static,
{
    let state = Arc::clone(state);
    tokio::task::spawn_blocking(move || call(&state.catalog))
        .await
        .map_err(|e| CatalogError::Storage(StoreError::Storage(format!("task failed: {}", e))))?
}
