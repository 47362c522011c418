//! Student endpoints.
//!
//! Students are created in the tenant named by their `university`; every
//! other operation routes by code.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use unilib_catalog::Catalog;
use unilib_core::EntityKind;
use unilib_store::types::{Student, StudentPatch};
use unilib_store::Document;

use crate::error::ApiError;
use crate::handlers::{deleted, listing, present, ListParams, RecordResponse};
use crate::state::GatewayState;

/// Create a student.
///
/// # Errors
///
/// Returns an error if the body is invalid or the code is taken.
pub async fn create_student<C>(
    State(state): State<Arc<GatewayState<C>>>,
    payload: Result<Json<Student>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
    C: Catalog + 'static,
{
    let Json(student) = payload?;
    student
        .validate()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;
    if student.borrow_count < 0 {
        return Err(ApiError::bad_request("borrowCount must not be negative"));
    }

    let record = state.catalog.create_student(student).await?;
    Ok((StatusCode::CREATED, Json(RecordResponse::from(record))))
}

/// Update a student by code.
///
/// # Errors
///
/// Returns an error if the body is invalid or the student doesn't exist.
pub async fn update_student<C>(
    State(state): State<Arc<GatewayState<C>>>,
    Path(code): Path<String>,
    payload: Result<Json<StudentPatch>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
    C: Catalog + 'static,
{
    let Json(patch) = payload?;
    present("fullName", patch.full_name.as_ref())?;
    present("address", patch.address.as_ref())?;
    present("major", patch.major.as_ref())?;
    if patch.borrow_count.is_some_and(|count| count < 0) {
        return Err(ApiError::bad_request("borrowCount must not be negative"));
    }

    let record = state.catalog.update_student(&code, patch).await?;
    Ok(Json(RecordResponse::from(record)))
}

/// Delete a student by code.
///
/// # Errors
///
/// Returns an error if the student doesn't exist.
pub async fn delete_student<C>(
    State(state): State<Arc<GatewayState<C>>>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
    C: Catalog + 'static,
{
    state.catalog.delete_student(&code).await?;
    Ok(deleted())
}

/// List students.
///
/// # Errors
///
/// Returns an error if the query is invalid or the database is unreachable.
pub async fn list_students<C>(
    State(state): State<Arc<GatewayState<C>>>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError>
where
    C: Catalog + 'static,
{
    let Query(params) = params?;
    let page = state.catalog.list_students(params.to_query()?).await?;
    listing(EntityKind::Student, page.map(RecordResponse::from))
}

/// Get a student by code.
///
/// # Errors
///
/// Returns an error if the student doesn't exist.
pub async fn find_student<C>(
    State(state): State<Arc<GatewayState<C>>>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
    C: Catalog + 'static,
{
    let record = state.catalog.find_student_by_code(&code).await?;
    Ok(Json(RecordResponse::from(record)))
}
