//! Application state - shared across all handlers.

use std::sync::Arc;

use mockable::DefaultClock;

use quill_core::PostService;
use quill_core::ports::{PostRepository, UserRepository};
use quill_infra::database::DatabaseConfig;
use quill_infra::{InMemoryPostRepository, InMemoryUserRepository};

#[cfg(feature = "postgres")]
use quill_infra::{PostgresPostRepository, PostgresUserRepository, database::connect};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub posts: PostService,
    pub users: Arc<dyn UserRepository>,
    /// `"postgres"` or `"memory"`, reported by the health check.
    pub storage: &'static str,
}

impl AppState {
    /// Build state over the given stores.
    pub fn with_stores(
        posts: Arc<dyn PostRepository>,
        users: Arc<dyn UserRepository>,
        storage: &'static str,
    ) -> Self {
        Self {
            posts: PostService::new(posts, Arc::new(DefaultClock)),
            users,
            storage,
        }
    }

    /// Volatile state; data is lost on restart.
    pub fn in_memory() -> Self {
        Self::with_stores(
            Arc::new(InMemoryPostRepository::new()),
            Arc::new(InMemoryUserRepository::new()),
            "memory",
        )
    }

    /// Connect to Postgres when configured, otherwise fall back to memory.
    pub async fn new(db_config: Option<&DatabaseConfig>) -> Self {
        let Some(config) = db_config else {
            tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
            return Self::in_memory();
        };

        #[cfg(feature = "postgres")]
        {
            match connect(config).await {
                Ok(conn) => {
                    tracing::info!("Application state initialized on postgres");
                    Self::with_stores(
                        Arc::new(PostgresPostRepository::new(conn.clone())),
                        Arc::new(PostgresUserRepository::new(conn)),
                        "postgres",
                    )
                }
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        "Failed to connect to database. Using in-memory fallback."
                    );
                    Self::in_memory()
                }
            }
        }

        #[cfg(not(feature = "postgres"))]
        {
            tracing::info!(
                url_set = !config.url.is_empty(),
                "Built without postgres feature - using in-memory repository"
            );
            Self::in_memory()
        }
    }
}
