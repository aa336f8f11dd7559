use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{blocking, AppState};
use crate::catalog::{BestSellerBook, BestSellerCategory, BookQuery};
use crate::config::CatalogConfig;
use crate::error::CatalogError;
use crate::model::{Book, BookInput, Review, ReviewInput};
use crate::store::{EntityStore, SortOrder};

type AppResult<T> = Result<T, CatalogError>;

/// Raw list parameters. Numbers that fail to parse fall back to defaults.
#[derive(Debug, Default, Deserialize)]
pub(super) struct ListParams {
    title: Option<String>,
    sort: Option<String>,
    order: Option<String>,
    size: Option<String>,
    offset: Option<String>,
}

impl ListParams {
    fn into_query(self, config: &CatalogConfig) -> BookQuery {
        let size = self.size.as_deref().and_then(|s| s.parse().ok());
        BookQuery {
            title: self.title.filter(|t| !t.is_empty()),
            sort_by: self.sort.filter(|s| !s.is_empty()),
            order: self
                .order
                .as_deref()
                .and_then(SortOrder::parse)
                .unwrap_or_default(),
            limit: Some(config.page_size(size)),
            offset: self
                .offset
                .as_deref()
                .and_then(|s| s.parse().ok())
                .unwrap_or(0),
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct BookList {
    total: usize,
    size: usize,
    data: Vec<Book>,
}

#[derive(Debug, Deserialize)]
struct AmountBody {
    amount: u64,
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> AppResult<T> {
    serde_json::from_slice(body)
        .map_err(|e| CatalogError::InvalidInput(format!("invalid payload: {}", e)))
}

pub(super) async fn ping() -> &'static str {
    "pong"
}

pub(super) async fn list_books<S: EntityStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<ListParams>,
) -> AppResult<Json<BookList>> {
    let query = params.into_query(&state.config);
    let page = blocking(&state, move |catalog| catalog.list_books(&query)).await?;
    Ok(Json(BookList {
        total: page.total,
        size: page.books.len(),
        data: page.books,
    }))
}

pub(super) async fn create_book<S: EntityStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    body: Bytes,
) -> AppResult<impl IntoResponse> {
    let input: BookInput = decode(&body)?;
    let book = blocking(&state, move |catalog| catalog.create_book(input)).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

pub(super) async fn get_book<S: EntityStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> AppResult<Json<Book>> {
    let book = blocking(&state, move |catalog| catalog.get_book(&id)).await?;
    Ok(Json(book))
}

pub(super) async fn update_book<S: EntityStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    body: Bytes,
) -> AppResult<Json<Book>> {
    let input: BookInput = decode(&body)?;
    let book = blocking(&state, move |catalog| catalog.update_book(&id, input)).await?;
    Ok(Json(book))
}

pub(super) async fn delete_book<S: EntityStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    blocking(&state, move |catalog| catalog.delete_book(&id)).await?;
    Ok(StatusCode::OK)
}

pub(super) async fn fill_book<S: EntityStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    body: Bytes,
) -> AppResult<Json<Book>> {
    let AmountBody { amount } = decode(&body)?;
    let book = blocking(&state, move |catalog| catalog.fill_book(&id, amount)).await?;
    Ok(Json(book))
}

pub(super) async fn sale_book<S: EntityStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    body: Bytes,
) -> AppResult<Json<Book>> {
    let AmountBody { amount } = decode(&body)?;
    let book = blocking(&state, move |catalog| catalog.sale_book(&id, amount)).await?;
    Ok(Json(book))
}

pub(super) async fn list_reviews<S: EntityStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(book_id): Path<String>,
) -> AppResult<Json<Vec<Review>>> {
    let reviews = blocking(&state, move |catalog| catalog.list_reviews(&book_id)).await?;
    Ok(Json(reviews))
}

pub(super) async fn create_review<S: EntityStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(book_id): Path<String>,
    body: Bytes,
) -> AppResult<impl IntoResponse> {
    let input: ReviewInput = decode(&body)?;
    let review = blocking(&state, move |catalog| catalog.create_review(&book_id, input)).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

pub(super) async fn get_review<S: EntityStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path((book_id, id)): Path<(String, String)>,
) -> AppResult<Json<Review>> {
    let review = blocking(&state, move |catalog| catalog.get_review(&book_id, &id)).await?;
    Ok(Json(review))
}

pub(super) async fn update_review<S: EntityStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path((book_id, id)): Path<(String, String)>,
    body: Bytes,
) -> AppResult<Json<Review>> {
    let input: ReviewInput = decode(&body)?;
    let review = blocking(&state, move |catalog| {
        catalog.update_review(&book_id, &id, input)
    })
    .await?;
    Ok(Json(review))
}

pub(super) async fn delete_review<S: EntityStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path((book_id, id)): Path<(String, String)>,
) -> AppResult<StatusCode> {
    blocking(&state, move |catalog| catalog.delete_review(&book_id, &id)).await?;
    Ok(StatusCode::OK)
}

pub(super) async fn best_selling_books<S: EntityStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> AppResult<Json<Vec<BestSellerBook>>> {
    let report = blocking(&state, |catalog| catalog.best_selling_books()).await?;
    Ok(Json(report))
}

pub(super) async fn best_selling_categories<S: EntityStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> AppResult<Json<Vec<BestSellerCategory>>> {
    let report = blocking(&state, |catalog| catalog.best_selling_categories()).await?;
    Ok(Json(report))
}
