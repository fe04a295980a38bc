//! Client core of the event staffing admin dashboard.
//!
//! Everything below the view layer lives here: the REST client with its
//! session-expiry interceptor, the session store, routing guard, forms,
//! debounced search and the paged worker lists.
//!
//! # Architecture
//!
//! - `api`: HTTP client, typed endpoints and response interceptors
//! - `session`: persisted session state and the sign-in/sign-out flows
//! - `routes`: named routes and the auth guard
//! - `search`: debounce primitive, search coordinator, table query string
//! - `paging`: page cursor state machine and infinite lists
//! - `forms`: validators, schemas and submit handling
//! - `attendance`: per-day clock-in/clock-out log
//! - `bus`: UI event bus (toasts, navigation, session changes)
//! - `db`: SQLite-backed local storage
//! - `cache`: list query cache

pub mod api;
pub mod attendance;
pub mod bus;
pub mod cache;
pub mod config;
pub mod db;
pub mod forms;
pub mod model;
pub mod paging;
pub mod routes;
pub mod search;
pub mod session;

use std::sync::Arc;

use api::{ApiClient, SessionExpiryInterceptor};
use attendance::AttendanceLog;
use bus::EventBus;
use config::ClientConfig;
use db::Database;
use paging::WorkerPicker;
use routes::Navigator;
use session::auth::AuthFlow;
use session::SessionStore;

// ---------------------------------------------------------------------------
// Shared error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Db(#[from] db::DbError),
    #[error("{0}")]
    Api(#[from] api::ApiError),
    #[error("{0}")]
    Config(#[from] config::ConfigError),
    #[error("{0}")]
    Attendance(#[from] attendance::AttendanceError),
    #[error("{0}")]
    Other(String),
}

// ---------------------------------------------------------------------------
// Application context
// ---------------------------------------------------------------------------

/// Every long-lived service, wired together once at startup.
pub struct AppContext {
    pub config: ClientConfig,
    pub db: Arc<Database>,
    pub bus: Arc<EventBus>,
    pub session: Arc<SessionStore>,
    pub navigator: Arc<Navigator>,
    pub api: Arc<ApiClient>,
    pub auth: AuthFlow,
    pub attendance: AttendanceLog,
}

impl AppContext {
    /// Open local storage under the configured data directory and wire the
    /// services.
    pub fn bootstrap(config: ClientConfig) -> Result<Self, AppError> {
        std::fs::create_dir_all(&config.data_dir).map_err(|e| {
            AppError::Other(format!(
                "failed to create data directory {}: {e}",
                config.data_dir.display()
            ))
        })?;
        let db = Arc::new(Database::open(config.db_path())?);
        Self::with_database(config, db)
    }

    pub fn with_database(config: ClientConfig, db: Arc<Database>) -> Result<Self, AppError> {
        let bus = Arc::new(EventBus::new());
        let session = Arc::new(SessionStore::load(db.clone(), bus.clone())?);
        let navigator = Arc::new(Navigator::new(session.clone(), bus.clone()));

        let interceptor = Arc::new(SessionExpiryInterceptor::new(
            session.clone(),
            navigator.clone(),
            bus.clone(),
        ));
        let api = Arc::new(ApiClient::new(&config)?.with_interceptor(interceptor));

        let auth = AuthFlow::new(api.clone(), session.clone(), navigator.clone(), bus.clone());
        let attendance = AttendanceLog::new(db.clone());

        tracing::info!(
            "client ready for {} (signed in: {})",
            config.api_url,
            session.is_authenticated()
        );

        Ok(Self {
            config,
            db,
            bus,
            session,
            navigator,
            api,
            auth,
            attendance,
        })
    }

    /// A worker combobox bound to this context. Must be called from within
    /// a tokio runtime.
    pub fn worker_picker(&self) -> WorkerPicker {
        WorkerPicker::for_api(self.api.clone(), self.bus.clone(), self.config.search_delay)
    }
}

/// Install the global `tracing` subscriber. `RUST_LOG` overrides the default
/// filter. Calling this twice is harmless.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("eventstaff_lib=debug,info")),
        )
        .try_init();
}
