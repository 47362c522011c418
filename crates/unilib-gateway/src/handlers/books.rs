//! Book endpoints.
//!
//! The find endpoints accept `populate=author`, which adds an `author` object
//! next to `authorId`.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use unilib_catalog::Catalog;
use unilib_core::EntityKind;
use unilib_store::types::{Author, Book, BookPatch};
use unilib_store::{Document, Populated};

use crate::error::ApiError;
use crate::handlers::{deleted, listing, present, ListParams, RecordResponse};
use crate::state::GatewayState;

// =============================================================================
// Request/Response Types
// =============================================================================

/// A book with its author expanded.
#[derive(Debug, Serialize)]
pub struct BookWithAuthor {
    /// The book.
    #[serde(flatten)]
    pub book: RecordResponse<Book>,
    /// The author, or `null` if the reference dangles.
    pub author: Option<RecordResponse<Author>>,
}

impl From<Populated<Book, Author>> for BookWithAuthor {
    fn from(populated: Populated<Book, Author>) -> Self {
        Self {
            book: populated.record.into(),
            author: populated.related.map(RecordResponse::from),
        }
    }
}

/// Query string of `GET /v1/books/find/:code`.
#[derive(Debug, Default, Deserialize)]
pub struct FindBookParams {
    /// Relationship to expand.
    #[serde(default)]
    pub populate: Option<String>,
}

/// Whether `populate` asks for the author.
fn wants_author(populate: Option<&str>) -> Result<bool, ApiError> {
    match populate {
        None | Some("") => Ok(false),
        Some("author") => Ok(true),
        Some(other) => Err(ApiError::bad_request(format!(
            "cannot populate {other}; only author is supported"
        ))),
    }
}

fn validate_patch(patch: &BookPatch) -> Result<(), ApiError> {
    present("title", patch.title.as_ref())?;
    present("publisher", patch.publisher.as_ref())?;
    present("type", patch.kind.as_ref())?;
    if patch.year.is_some_and(|year| year <= 0) {
        return Err(ApiError::bad_request("year must be positive"));
    }
    if patch.quantity.is_some_and(|quantity| quantity < 0) {
        return Err(ApiError::bad_request("quantity must not be negative"));
    }
    Ok(())
}

// =============================================================================
// Handlers
// =============================================================================

/// Create a book in its tenant and the aggregate.
///
/// # Errors
///
/// Returns an error if:
/// - The body is invalid
/// - The referenced author doesn't exist
/// - The code is already taken
pub async fn create_book<C>(
    State(state): State<Arc<GatewayState<C>>>,
    payload: Result<Json<Book>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
    C: Catalog + 'static,
{
    let Json(book) = payload?;
    book.validate()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    let record = state.catalog.create_book(book).await?;
    Ok((StatusCode::CREATED, Json(RecordResponse::from(record))))
}

/// Update a book by code.
///
/// # Errors
///
/// Returns an error if the body is invalid or the book doesn't exist.
pub async fn update_book<C>(
    State(state): State<Arc<GatewayState<C>>>,
    Path(code): Path<String>,
    payload: Result<Json<BookPatch>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
    C: Catalog + 'static,
{
    let Json(patch) = payload?;
    validate_patch(&patch)?;

    let record = state.catalog.update_book(&code, patch).await?;
    Ok(Json(RecordResponse::from(record)))
}

/// Delete a book by code.
///
/// # Errors
///
/// Returns an error if the book doesn't exist.
pub async fn delete_book<C>(
    State(state): State<Arc<GatewayState<C>>>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
    C: Catalog + 'static,
{
    state.catalog.delete_book(&code).await?;
    Ok(deleted())
}

/// List books, optionally with authors.
///
/// # Errors
///
/// Returns an error if the query is invalid or the database is unreachable.
pub async fn list_books<C>(
    State(state): State<Arc<GatewayState<C>>>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Response, ApiError>
where
    C: Catalog + 'static,
{
    let Query(params) = params?;
    let query = params.to_query()?;

    if wants_author(params.populate.as_deref())? {
        let page = state.catalog.list_books_with_author(query).await?;
        Ok(listing(EntityKind::Book, page.map(BookWithAuthor::from))?.into_response())
    } else {
        let page = state.catalog.list_books(query).await?;
        Ok(listing(EntityKind::Book, page.map(RecordResponse::from))?.into_response())
    }
}

/// Get a book by code, optionally with its author.
///
/// # Errors
///
/// Returns an error if the book doesn't exist.
pub async fn find_book<C>(
    State(state): State<Arc<GatewayState<C>>>,
    Path(code): Path<String>,
    params: Result<Query<FindBookParams>, QueryRejection>,
) -> Result<Response, ApiError>
where
    C: Catalog + 'static,
{
    let Query(params) = params?;

    if wants_author(params.populate.as_deref())? {
        let populated = state.catalog.find_book_with_author(&code).await?;
        Ok(Json(BookWithAuthor::from(populated)).into_response())
    } else {
        let record = state.catalog.find_book_by_code(&code).await?;
        Ok(Json(RecordResponse::from(record)).into_response())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn populate_values() {
        assert!(!wants_author(None).unwrap());
        assert!(wants_author(Some("author")).unwrap());
        assert!(wants_author(Some("publisher")).is_err());
    }

    #[test]
    fn patch_ranges() {
        let ok = BookPatch {
            year: Some(2020),
            ..BookPatch::default()
        };
        assert!(validate_patch(&ok).is_ok());

        let negative = BookPatch {
            quantity: Some(-3),
            ..BookPatch::default()
        };
        assert!(validate_patch(&negative).is_err());

        let blank = BookPatch {
            title: Some(" ".to_string()),
            ..BookPatch::default()
        };
        assert!(validate_patch(&blank).is_err());
    }
}
