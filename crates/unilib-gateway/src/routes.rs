//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;

use axum::routing::{delete, get, patch, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use unilib_catalog::Catalog;

use crate::config::GatewayConfig;
use crate::handlers::{authors, books, borrows, employees, health, students};
use crate::state::GatewayState;

/// Create the gateway router with all routes and middleware.
///
/// # Routes
///
/// - `GET /health` - Health check
///
/// For each of `authors`, `books`, `students` and `employees`:
///
/// - `POST /v1/<entity>/create` - Create
/// - `PATCH /v1/<entity>/update/:code` - Partial update
/// - `DELETE /v1/<entity>/delete/:code` - Delete
/// - `GET /v1/<entity>/find` - List (`filter`, `page`, `limit`)
/// - `GET /v1/<entity>/find/:code` - Get by code
///
/// Loans use the same verbs with `/:book_code/:student_code` in place of `/:code`.
pub fn create_router<C>(state: GatewayState<C>) -> Router
where
    C: Catalog + 'static,
{
    let cors = build_cors_layer(&state.config);
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout = state.config.request_timeout();

    let state = Arc::new(state);

    Router::new()
        .route("/health", get(health::health::<C>))
        // Authors
        .route("/v1/authors/create", post(authors::create_author::<C>))
        .route("/v1/authors/update/:code", patch(authors::update_author::<C>))
        .route("/v1/authors/delete/:code", delete(authors::delete_author::<C>))
        .route("/v1/authors/find", get(authors::list_authors::<C>))
        .route("/v1/authors/find/:code", get(authors::find_author::<C>))
        // Books
        .route("/v1/books/create", post(books::create_book::<C>))
        .route("/v1/books/update/:code", patch(books::update_book::<C>))
        .route("/v1/books/delete/:code", delete(books::delete_book::<C>))
        .route("/v1/books/find", get(books::list_books::<C>))
        .route("/v1/books/find/:code", get(books::find_book::<C>))
        // Students
        .route("/v1/students/create", post(students::create_student::<C>))
        .route("/v1/students/update/:code", patch(students::update_student::<C>))
        .route("/v1/students/delete/:code", delete(students::delete_student::<C>))
        .route("/v1/students/find", get(students::list_students::<C>))
        .route("/v1/students/find/:code", get(students::find_student::<C>))
        // Employees
        .route("/v1/employees/create", post(employees::create_employee::<C>))
        .route(
            "/v1/employees/update/:code",
            patch(employees::update_employee::<C>),
        )
        .route(
            "/v1/employees/delete/:code",
            delete(employees::delete_employee::<C>),
        )
        .route("/v1/employees/find", get(employees::list_employees::<C>))
        .route("/v1/employees/find/:code", get(employees::find_employee::<C>))
        // Borrows
        .route("/v1/borrows/create", post(borrows::create_borrow::<C>))
        .route(
            "/v1/borrows/update/:book_code/:student_code",
            patch(borrows::update_borrow::<C>),
        )
        .route(
            "/v1/borrows/delete/:book_code/:student_code",
            delete(borrows::delete_borrow::<C>),
        )
        .route("/v1/borrows/find", get(borrows::list_borrows::<C>))
        .route(
            "/v1/borrows/find/:book_code/:student_code",
            get(borrows::find_borrow::<C>),
        )
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(request_timeout))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(config: &GatewayConfig) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if config.allows_any_origin() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<_> = config
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    layer.allow_origin(origins)
}
