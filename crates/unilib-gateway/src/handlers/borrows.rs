//! Loan endpoints.
//!
//! Loans have no code of their own; they are addressed by
//! `/:book_code/:student_code` and routed by the student code.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use unilib_catalog::{Catalog, LoanKey};
use unilib_core::EntityKind;
use unilib_store::types::{Borrow, BorrowPatch};
use unilib_store::Document;

use crate::error::ApiError;
use crate::handlers::{deleted, listing, ListParams, RecordResponse};
use crate::state::GatewayState;

/// Record a loan.
///
/// # Errors
///
/// Returns an error if the body is invalid.
pub async fn create_borrow<C>(
    State(state): State<Arc<GatewayState<C>>>,
    payload: Result<Json<Borrow>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
    C: Catalog + 'static,
{
    let Json(borrow) = payload?;
    borrow
        .validate()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    let record = state.catalog.create_borrow(borrow).await?;
    Ok((StatusCode::CREATED, Json(RecordResponse::from(record))))
}

/// Update a loan's dates.
///
/// # Errors
///
/// Returns an error if the body is invalid or the loan doesn't exist.
pub async fn update_borrow<C>(
    State(state): State<Arc<GatewayState<C>>>,
    Path((book_code, student_code)): Path<(String, String)>,
    payload: Result<Json<BorrowPatch>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
    C: Catalog + 'static,
{
    let Json(patch) = payload?;
    let key = LoanKey::new(book_code, student_code);
    let record = state.catalog.update_borrow(&key, patch).await?;
    Ok(Json(RecordResponse::from(record)))
}

/// Delete a loan.
///
/// # Errors
///
/// Returns an error if the loan doesn't exist.
pub async fn delete_borrow<C>(
    State(state): State<Arc<GatewayState<C>>>,
    Path((book_code, student_code)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError>
where
    C: Catalog + 'static,
{
    state
        .catalog
        .delete_borrow(&LoanKey::new(book_code, student_code))
        .await?;
    Ok(deleted())
}

/// List loans.
///
/// # Errors
///
/// Returns an error if the query is invalid or the database is unreachable.
pub async fn list_borrows<C>(
    State(state): State<Arc<GatewayState<C>>>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError>
where
    C: Catalog + 'static,
{
    let Query(params) = params?;
    let page = state.catalog.list_borrows(params.to_query()?).await?;
    listing(EntityKind::Borrow, page.map(RecordResponse::from))
}

/// Get a loan.
///
/// # Errors
///
/// Returns an error if the loan doesn't exist.
pub async fn find_borrow<C>(
    State(state): State<Arc<GatewayState<C>>>,
    Path((book_code, student_code)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError>
where
    C: Catalog + 'static,
{
    let record = state
        .catalog
        .find_borrow(&LoanKey::new(book_code, student_code))
        .await?;
    Ok(Json(RecordResponse::from(record)))
}
