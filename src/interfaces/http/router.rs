//! API Router with Swagger UI

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, FromRef},
    middleware,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use super::common::{ApiResponse, PaginatedResponse};
use super::middleware::{auth_middleware, require_capability, AuthState};
use super::modules::admin::{self, AdminHandlerState};
use super::modules::auth::{self, AuthHandlerState};
use super::modules::health::{self, HealthState};
use super::modules::metrics::{http_metrics_middleware, prometheus_metrics, MetricsState};
use super::modules::request_id::request_id_middleware;
use super::modules::visitors::{self, VisitorDto, VisitorHandlerState};
use crate::application::{CredentialService, ImageStore, ReportingService, VisitorLifecycleService};
use crate::domain::Capability;

/// Default cap on a multipart visitor submission (two photos plus fields).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Unified state for every API route. Handlers extract their own slice via
/// `FromRef`.
#[derive(Clone)]
pub struct AppState {
    pub credentials: Arc<CredentialService>,
    pub visitors: Arc<VisitorLifecycleService>,
    pub reporting: Arc<ReportingService>,
    pub images: Arc<dyn ImageStore>,
    pub health: HealthState,
}

impl FromRef<AppState> for AuthHandlerState {
    fn from_ref(s: &AppState) -> Self {
        AuthHandlerState {
            credentials: Arc::clone(&s.credentials),
        }
    }
}

impl FromRef<AppState> for VisitorHandlerState {
    fn from_ref(s: &AppState) -> Self {
        VisitorHandlerState {
            visitors: Arc::clone(&s.visitors),
            images: Arc::clone(&s.images),
        }
    }
}

impl FromRef<AppState> for AdminHandlerState {
    fn from_ref(s: &AppState) -> Self {
        AdminHandlerState {
            reporting: Arc::clone(&s.reporting),
            credentials: Arc::clone(&s.credentials),
        }
    }
}

impl FromRef<AppState> for HealthState {
    fn from_ref(s: &AppState) -> Self {
        s.health.clone()
    }
}

/// Router knobs that are not part of the shared state.
#[derive(Clone, Default)]
pub struct RouterOptions {
    /// Served under `/uploads` when set
    pub uploads_dir: Option<PathBuf>,
    /// Mounts `/metrics` when set
    pub metrics: Option<PrometheusHandle>,
    /// Falls back to [`DEFAULT_MAX_UPLOAD_BYTES`]
    pub max_upload_bytes: Option<usize>,
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Session token from /api/auth/login"))
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        auth::get_current_user,
        visitors::create_visitor,
        visitors::approve_visitor,
        visitors::reject_visitor,
        visitors::list_security_visitors,
        admin::get_dashboard,
        admin::list_visitors,
        admin::export_visitors,
        admin::add_admin_emails,
        admin::add_security_emails,
    ),
    components(
        schemas(
            ApiResponse<String>,
            PaginatedResponse<VisitorDto>,
            health::HealthResponse,
            health::ComponentHealth,
            auth::RegisterRequest,
            auth::LoginRequest,
            auth::AuthResponse,
            auth::UserInfo,
            visitors::VisitorDto,
            visitors::VisitorForm,
            visitors::VisitorListResponse,
            admin::DashboardDto,
            admin::ExportResponse,
            admin::AddAdminEmailsRequest,
            admin::AddSecurityEmailsRequest,
            admin::AddEmailResult,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Service health"),
        (name = "Authentication", description = "Registration of pre-approved staff, login, current user"),
        (name = "Visitors", description = "Gate submissions and owner approval links"),
        (name = "Admin", description = "Dashboard, visitor log, export and allow-lists"),
    ),
    info(
        title = "Visitor Gate API",
        version = "1.0.0",
        description = "Visitor registration at the gate with owner approval by email"
    )
)]
pub struct ApiDoc;

/// Bearer session required, plus `capability` when given.
fn protected(router: Router<AppState>, auth: &AuthState, capability: Option<Capability>) -> Router<AppState> {
    let router = match capability {
        Some(capability) => router.route_layer(middleware::from_fn_with_state(capability, require_capability)),
        None => router,
    };
    router.route_layer(middleware::from_fn_with_state(auth.clone(), auth_middleware))
}

/// Create the API router with all routes
pub fn create_api_router(state: AppState, options: RouterOptions) -> Router {
    let auth_state = AuthState {
        jwt_config: state.credentials.jwt_config().clone(),
    };

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .merge(protected(
            Router::new().route("/me", get(auth::get_current_user)),
            &auth_state,
            None,
        ));

    let visitor_routes = Router::new()
        .route("/approve/{token}", get(visitors::approve_visitor))
        .route("/reject/{token}", get(visitors::reject_visitor))
        .merge(protected(
            Router::new()
                .route("/", post(visitors::create_visitor))
                .layer(DefaultBodyLimit::max(
                    options.max_upload_bytes.unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
                )),
            &auth_state,
            Some(Capability::SubmitVisitors),
        ))
        .merge(protected(
            Router::new().route("/security", get(visitors::list_security_visitors)),
            &auth_state,
            Some(Capability::ViewOwnVisitors),
        ));

    let admin_routes = protected(
        Router::new()
            .route("/dashboard", get(admin::get_dashboard))
            .route("/visitors", get(admin::list_visitors))
            .route("/export", get(admin::export_visitors)),
        &auth_state,
        Some(Capability::ViewReports),
    )
    .merge(protected(
        Router::new().route("/add-admin-emails", post(admin::add_admin_emails)),
        &auth_state,
        Some(Capability::ManageAdminAllowList),
    ))
    .merge(protected(
        Router::new().route("/add-security-emails", post(admin::add_security_emails)),
        &auth_state,
        Some(Capability::ManageSecurityAllowList),
    ));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let swagger_routes = SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi());

    let mut router = Router::new()
        .route("/health", get(health::health_check))
        .nest("/api/auth", auth_routes)
        .nest("/api/visitors", visitor_routes)
        .nest("/api/admin", admin_routes)
        .with_state(state)
        .merge(swagger_routes);

    if let Some(handle) = options.metrics {
        router = router.route(
            "/metrics",
            get(prometheus_metrics).with_state(MetricsState { handle }),
        );
    }

    if let Some(dir) = options.uploads_dir {
        router = router.nest_service("/uploads", ServeDir::new(dir));
    }

    router
        .layer(middleware::from_fn(http_metrics_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
