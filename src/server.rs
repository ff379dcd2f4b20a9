//! Server runtime
//!
//! [`ServerHandle`] owns the full lifecycle: database and migrations,
//! operator provisioning, outbound gateways, the REST API, the approval
//! token sweep and graceful shutdown.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusHandle;
use sea_orm::DatabaseConnection;
use tracing::{error, info, warn};

use crate::application::{
    CredentialService, ImageStore, NotificationGateway, PlateRecognizer, PublicLinks, ReportingService,
    TokenSweeper, VisitorLifecycleService,
};
use crate::config::AppConfig;
use crate::domain::RepositoryProvider;
use crate::infrastructure::{
    init_database, run_migrations, HttpPlateRecognizer, LocalImageStore, LogNotificationGateway,
    SeaOrmRepositoryProvider, SmtpNotificationGateway,
};
use crate::interfaces::http::modules::health::HealthState;
use crate::interfaces::http::modules::metrics::install_recorder;
use crate::interfaces::http::{create_api_router, AppState, RouterOptions};
use crate::shared::shutdown::{ShutdownCoordinator, ShutdownSignal};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

// ── Options ────────────────────────────────────────────────────────

pub struct ServerOptions {
    pub config: AppConfig,
    /// Run database migrations on startup (default: true).
    pub auto_migrate: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            config: AppConfig::default(),
            auto_migrate: true,
        }
    }
}

// ── ServerHandle ───────────────────────────────────────────────────

/// Handle to a running server.
///
/// ```rust,no_run
/// use visitor_gate::server::{ServerHandle, ServerOptions};
///
/// #[tokio::main]
/// async fn main() -> Result<(), visitor_gate::server::BoxError> {
///     let handle = ServerHandle::start(ServerOptions::default()).await?;
///     handle.install_signal_handler();
///     handle.shutdown_signal().wait().await;
///     handle.wait().await;
///     Ok(())
/// }
/// ```
pub struct ServerHandle {
    pub repos: Arc<dyn RepositoryProvider>,
    pub config: AppConfig,
    /// Port actually bound, useful when configured as 0.
    pub api_port: u16,

    db: DatabaseConnection,
    shutdown: ShutdownCoordinator,
    api_task: tokio::task::JoinHandle<()>,
    sweep_task: tokio::task::JoinHandle<()>,
}

/// The global recorder can be installed once per process; later starts
/// reuse the first handle.
fn prometheus_handle() -> Option<PrometheusHandle> {
    static HANDLE: OnceLock<Option<PrometheusHandle>> = OnceLock::new();
    HANDLE
        .get_or_init(|| match install_recorder() {
            Ok(handle) => {
                info!("📊 Prometheus metrics recorder installed");
                Some(handle)
            }
            Err(e) => {
                warn!(error = %e, "Prometheus recorder unavailable, /metrics disabled");
                None
            }
        })
        .clone()
}

fn notification_gateway(config: &AppConfig) -> Result<Arc<dyn NotificationGateway>, BoxError> {
    match &config.mail {
        Some(mail) => {
            info!(host = %mail.host, port = mail.port, from = %mail.from_email, "SMTP notifications enabled");
            Ok(Arc::new(SmtpNotificationGateway::new(mail)?))
        }
        None => {
            warn!("No [mail] section, emails will only be logged");
            Ok(Arc::new(LogNotificationGateway::new()))
        }
    }
}

fn plate_recognizer(
    config: &AppConfig,
    images: Arc<dyn ImageStore>,
) -> Result<Option<Arc<dyn PlateRecognizer>>, BoxError> {
    match &config.recognition {
        Some(recognition) => {
            info!(endpoint = %recognition.endpoint, "Plate recognition enabled");
            Ok(Some(Arc::new(HttpPlateRecognizer::new(recognition, images)?)))
        }
        None => {
            info!("No [recognition] section, bike numbers come from manual input only");
            Ok(None)
        }
    }
}

impl ServerHandle {
    /// Start the service.
    ///
    /// 1. Install the Prometheus recorder
    /// 2. Connect to the database and run migrations
    /// 3. Provision configured operator accounts
    /// 4. Build gateways and services
    /// 5. Start the approval token sweep
    /// 6. Start the REST API (with Swagger UI)
    pub async fn start(opts: ServerOptions) -> Result<Self, BoxError> {
        let app_cfg = opts.config;
        app_cfg.validate()?;

        info!("Starting visitor-gate...");
        let prometheus = prometheus_handle();

        if app_cfg.security.uses_dev_secret() {
            warn!("⚠️  Using the built-in JWT secret; set security.jwt_secret or JWT_SECRET");
        }

        // ── Database ───────────────────────────────────────────
        let db = init_database(&app_cfg.database.to_database_config()).await?;
        if opts.auto_migrate {
            run_migrations(&db).await?;
        }
        let repos: Arc<dyn RepositoryProvider> = Arc::new(SeaOrmRepositoryProvider::new(db.clone()));

        // ── Identity ───────────────────────────────────────────
        let jwt_config = app_cfg.security.jwt_config();
        info!(expiration_hours = jwt_config.expiration_hours, "JWT configured");
        let credentials = Arc::new(CredentialService::new(
            repos.clone(),
            jwt_config,
            app_cfg.security.bcrypt_cost,
        ));

        let operators = app_cfg.operator_credentials();
        let provisioned = credentials.provision_operators(&operators).await?;
        info!(provisioned, configured = operators.len(), "Operator accounts ready");

        // ── Outbound collaborators ─────────────────────────────
        let images: Arc<dyn ImageStore> = Arc::new(LocalImageStore::open(&app_cfg.uploads.directory).await?);
        info!(directory = %app_cfg.uploads.directory.display(), "Image uploads stored locally");
        let notifier = notification_gateway(&app_cfg)?;
        let recognizer = plate_recognizer(&app_cfg, images.clone())?;

        // ── Services ───────────────────────────────────────────
        let visitors = Arc::new(VisitorLifecycleService::new(
            repos.clone(),
            notifier,
            recognizer,
            PublicLinks::new(&app_cfg.server.public_base_url),
            app_cfg.lifecycle_settings(),
        ));
        let reporting = Arc::new(ReportingService::new(repos.clone()));

        // ── Background tasks ───────────────────────────────────
        let shutdown = ShutdownCoordinator::new(app_cfg.server.shutdown_timeout);
        let shutdown_signal = shutdown.signal();

        let sweep_task = TokenSweeper::new(
            repos.clone(),
            Duration::from_secs(app_cfg.approval.sweep_interval_secs),
        )
        .start(shutdown_signal.clone());

        // ── REST API server ────────────────────────────────────
        let router = create_api_router(
            AppState {
                credentials,
                visitors,
                reporting,
                images,
                health: HealthState::new(Some(db.clone())),
            },
            RouterOptions {
                uploads_dir: Some(app_cfg.uploads.directory.clone()),
                metrics: prometheus,
                max_upload_bytes: Some(app_cfg.uploads.max_bytes),
            },
        );

        let listener = tokio::net::TcpListener::bind(app_cfg.server.address()).await?;
        let local_addr = listener.local_addr()?;
        info!("REST API server listening on http://{}", local_addr);
        info!("Swagger UI available at http://{}/docs/", local_addr);

        let api_shutdown = shutdown_signal.clone();
        let api_server = axum::serve(listener, router).with_graceful_shutdown(async move {
            api_shutdown.wait().await;
            info!("🛑 REST API server received shutdown signal");
        });

        let api_task = tokio::spawn(async move {
            if let Err(e) = api_server.await {
                error!(error = %e, "REST API server error");
            }
        });

        info!("🚀 visitor-gate started");

        Ok(Self {
            repos,
            config: app_cfg,
            api_port: local_addr.port(),
            db,
            shutdown,
            api_task,
            sweep_task,
        })
    }

    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.signal()
    }

    /// Install OS signal listeners (SIGTERM, SIGINT) that trigger shutdown.
    pub fn install_signal_handler(&self) {
        self.shutdown.start_signal_listener();
    }

    pub fn trigger_shutdown(&self) {
        self.shutdown.signal().trigger();
    }

    /// Wait for the server to stop after shutdown has been triggered,
    /// bounded by `server.shutdown_timeout`.
    pub async fn wait(self) {
        let Self {
            db,
            shutdown,
            api_task,
            sweep_task,
            ..
        } = self;

        shutdown
            .drain(async move {
                match api_task.await {
                    Ok(()) => info!("REST API server stopped"),
                    Err(e) => error!(error = %e, "REST API server task panicked"),
                }
                if let Err(e) = sweep_task.await {
                    error!(error = %e, "Token sweep task panicked");
                }
            })
            .await;

        if let Err(e) = db.close().await {
            warn!(error = %e, "Error closing database connection");
        } else {
            info!("✅ Database connection closed");
        }

        info!("👋 visitor-gate shutdown complete");
    }

    /// Trigger shutdown and wait for completion.
    pub async fn shutdown(self) {
        info!("🛑 Shutting down visitor-gate...");
        self.trigger_shutdown();
        self.wait().await;
    }

    pub fn is_running(&self) -> bool {
        !self.api_task.is_finished()
    }
}

// ── Helpers ────────────────────────────────────────────────────────

/// Initialize tracing from the application config. `RUST_LOG` wins over
/// `logging.level`.
///
/// Call once at process startup, before [`ServerHandle::start`].
pub fn init_tracing(config: &AppConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    let result = match config.logging.format.to_lowercase().as_str() {
        "json" => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
        _ => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init(),
    };

    if let Err(e) = result {
        eprintln!("tracing already initialized: {}", e);
    }
}
