use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Account creation and token issuance for both kinds of party, plus the health probe.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers and compose health checks.
        .route("/health", get(|| async { "ok" }))
        // POST /companies/register, POST /companies/login
        .route("/companies/register", post(handlers::register_company))
        .route("/companies/login", post(handlers::login_company))
        // POST /students/register, POST /students/login
        .route("/students/register", post(handlers::register_student))
        .route("/students/login", post(handlers::login_student))
}
