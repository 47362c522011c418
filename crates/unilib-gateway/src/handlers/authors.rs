//! Author endpoints.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use unilib_catalog::Catalog;
use unilib_core::EntityKind;
use unilib_store::types::{Author, AuthorPatch};

use crate::error::ApiError;
use crate::handlers::{deleted, listing, present, required, ListParams, RecordResponse};
use crate::state::GatewayState;

/// Create an author.
///
/// # Errors
///
/// Returns an error if the body is invalid or the code is taken.
pub async fn create_author<C>(
    State(state): State<Arc<GatewayState<C>>>,
    payload: Result<Json<Author>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
    C: Catalog + 'static,
{
    let Json(author) = payload?;
    required("code", &author.code)?;
    required("fullName", &author.full_name)?;

    let record = state.catalog.create_author(author).await?;
    Ok((StatusCode::CREATED, Json(RecordResponse::from(record))))
}

/// Update an author by code.
///
/// # Errors
///
/// Returns an error if the body is invalid or the author doesn't exist.
pub async fn update_author<C>(
    State(state): State<Arc<GatewayState<C>>>,
    Path(code): Path<String>,
    payload: Result<Json<AuthorPatch>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
    C: Catalog + 'static,
{
    let Json(patch) = payload?;
    present("fullName", patch.full_name.as_ref())?;

    let record = state.catalog.update_author(&code, patch).await?;
    Ok(Json(RecordResponse::from(record)))
}

/// Delete an author by code.
///
/// # Errors
///
/// Returns an error if the author doesn't exist.
pub async fn delete_author<C>(
    State(state): State<Arc<GatewayState<C>>>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
    C: Catalog + 'static,
{
    state.catalog.delete_author(&code).await?;
    Ok(deleted())
}

/// List authors.
///
/// # Errors
///
/// Returns an error if the query is invalid or the database is unreachable.
pub async fn list_authors<C>(
    State(state): State<Arc<GatewayState<C>>>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError>
where
    C: Catalog + 'static,
{
    let Query(params) = params?;
    let page = state.catalog.list_authors(params.to_query()?).await?;
    listing(EntityKind::Author, page.map(RecordResponse::from))
}

/// Get an author by code.
///
/// # Errors
///
/// Returns an error if the author doesn't exist.
pub async fn find_author<C>(
    State(state): State<Arc<GatewayState<C>>>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
    C: Catalog + 'static,
{
    let record = state.catalog.find_author_by_code(&code).await?;
    Ok(Json(RecordResponse::from(record)))
}
