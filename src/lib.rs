use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::{IntoResponse, Response},
};
use std::any::Any;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any as AnyOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod models;
pub mod policy;
pub mod repository;
pub mod response;
pub mod storage;
pub mod textgen;
pub mod validation;
pub mod validators;

pub mod routes;
use auth::AuthUser;
use error::ApiError;
use routes::{authenticated, public};

// --- Public Re-exports ---

pub use auth::TokenService;
pub use config::AppConfig;
pub use repository::{PostgresRepository, RepositoryState};
pub use storage::{MockStorageService, S3StorageClient, StorageState};
pub use textgen::TextGenState;

/// ApiDoc
///
/// OpenAPI document aggregated from every `#[utoipa::path]` handler and `ToSchema` model.
/// Served at `/api-docs/openapi.json` and rendered by Swagger UI at `/swagger-ui`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::register_company, handlers::login_company, handlers::register_student,
        handlers::login_student, handlers::edit_student_profile, handlers::post_internship,
        handlers::update_internship, handlers::list_internships, handlers::get_internship,
        handlers::draft_description, handlers::list_applicants, handlers::resume_upload_url,
        handlers::apply_to_internship
    ),
    components(
        schemas(
            models::Company, models::Student, models::Internship, models::InternshipListing,
            models::InternshipDetails, models::Application, models::Applicant, models::Location,
            models::Role, models::InternshipType, models::InternshipStatus,
            models::RegisterCompanyRequest, models::CompanyLoginRequest,
            models::RegisterStudentRequest, models::StudentLoginRequest,
            models::EditProfileRequest, models::LocationInput, models::NumericInput,
            models::CreateInternshipRequest, models::UpdateInternshipRequest,
            models::ApplyRequest, models::ResumeUploadRequest, models::DescriptionDraftRequest,
            models::LoginResponse, models::ResumeUploadResponse, models::DescriptionDraft,
        )
    ),
    tags(
        (name = "internship-portal", description = "Internship marketplace API")
    )
)]
pub struct ApiDoc;

/// AppState
///
/// Single immutable container of every collaborator, built once at startup and cloned
/// into each request. Nothing in it is mutated after the server starts.
#[derive(Clone)]
pub struct AppState {
    /// Persistence collaborator (Postgres in production).
    pub repo: RepositoryState,
    /// Resume artifact storage (S3/MinIO).
    pub storage: StorageState,
    /// Text-completion provider for description drafts.
    pub textgen: TextGenState,
    /// Token signing and verification with the process-wide secret.
    pub tokens: TokenService,
    pub config: AppConfig,
}

impl AppState {
    /// Assembles the state from its collaborators; the token service is derived from the
    /// configuration so the secret has exactly one source.
    pub fn new(
        repo: RepositoryState,
        storage: StorageState,
        textgen: TextGenState,
        config: AppConfig,
    ) -> Self {
        Self {
            repo,
            storage,
            textgen,
            tokens: TokenService::from_config(&config),
            config,
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for StorageState {
    fn from_ref(app_state: &AppState) -> StorageState {
        app_state.storage.clone()
    }
}

impl FromRef<AppState> for TextGenState {
    fn from_ref(app_state: &AppState) -> TextGenState {
        app_state.textgen.clone()
    }
}

impl FromRef<AppState> for TokenService {
    fn from_ref(app_state: &AppState) -> TokenService {
        app_state.tokens.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Route layer for `authenticated_routes`. Extracting `AuthUser` runs the authentication
/// guard; a missing or invalid token rejects the request with 401 before any handler runs.
/// The resolved identity is left in the request extensions for the handler's extractor.
async fn auth_middleware(_auth_user: AuthUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

async fn endpoint_not_found() -> ApiError {
    ApiError::NotFound("Endpoint is not correct".into())
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

/// Renders a handler panic as a 500 envelope. The panic payload is logged, not returned.
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };
    tracing::error!("handler panicked: {}", detail);
    ApiError::Internal("Internal server error".into()).into_response()
}

/// create_router
///
/// Assembles the routing tree, the scoped auth layer and the global observability stack.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(AnyOrigin)
        .allow_origin(AnyOrigin)
        .allow_headers(AnyOrigin)
        .expose_headers([axum::http::header::AUTHORIZATION]);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(
            authenticated::authenticated_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        // Must follow the merges: it only reaches routes registered before it.
        .method_not_allowed_fallback(method_not_allowed)
        .fallback(endpoint_not_found)
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id))
                .layer(CatchPanicLayer::custom(handle_panic)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span factory for `TraceLayer`: method, URI and the generated `x-request-id`, so every
/// log line of one request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
