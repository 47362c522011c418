//! Employee endpoints.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use unilib_catalog::Catalog;
use unilib_core::EntityKind;
use unilib_store::types::{Employee, EmployeePatch};
use unilib_store::Document;

use crate::error::ApiError;
use crate::handlers::{deleted, listing, present, ListParams, RecordResponse};
use crate::state::GatewayState;

/// Create an employee.
///
/// # Errors
///
/// Returns an error if the body is invalid or the code is taken.
pub async fn create_employee<C>(
    State(state): State<Arc<GatewayState<C>>>,
    payload: Result<Json<Employee>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
    C: Catalog + 'static,
{
    let Json(employee) = payload?;
    employee
        .validate()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    let record = state.catalog.create_employee(employee).await?;
    Ok((StatusCode::CREATED, Json(RecordResponse::from(record))))
}

/// Update an employee by code.
///
/// # Errors
///
/// Returns an error if the body is invalid or the employee doesn't exist.
pub async fn update_employee<C>(
    State(state): State<Arc<GatewayState<C>>>,
    Path(code): Path<String>,
    payload: Result<Json<EmployeePatch>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
    C: Catalog + 'static,
{
    let Json(patch) = payload?;
    present("fullName", patch.full_name.as_ref())?;
    present("address", patch.address.as_ref())?;
    present("status", patch.status.as_ref())?;

    let record = state.catalog.update_employee(&code, patch).await?;
    Ok(Json(RecordResponse::from(record)))
}

/// Delete an employee by code.
///
/// # Errors
///
/// Returns an error if the employee doesn't exist.
pub async fn delete_employee<C>(
    State(state): State<Arc<GatewayState<C>>>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
    C: Catalog + 'static,
{
    state.catalog.delete_employee(&code).await?;
    Ok(deleted())
}

/// List employees.
///
/// # Errors
///
/// Returns an error if the query is invalid or the database is unreachable.
pub async fn list_employees<C>(
    State(state): State<Arc<GatewayState<C>>>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError>
where
    C: Catalog + 'static,
{
    let Query(params) = params?;
    let page = state.catalog.list_employees(params.to_query()?).await?;
    listing(EntityKind::Employee, page.map(RecordResponse::from))
}

/// Get an employee by code.
///
/// # Errors
///
/// Returns an error if the employee doesn't exist.
pub async fn find_employee<C>(
    State(state): State<Arc<GatewayState<C>>>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
    C: Catalog + 'static,
{
    let record = state.catalog.find_employee_by_code(&code).await?;
    Ok(Json(RecordResponse::from(record)))
}
