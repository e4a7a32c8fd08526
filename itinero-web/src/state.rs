//! Application state management

use crate::auth::ArgonCredentials;
use crate::database::{self, SqlLeadStore, SqlUserStore};
use crate::{WebConfig, WebResult};
use itinero_applications::{
    AuthContext, LeadService, LeadStore, MemoryLeadStore, MemoryUserStore, UserDirectory,
    UserStore,
};
use itinero_core::{unauthenticated_error, ItineroResult, User};
use std::sync::Arc;
use tracing::info;

/// Shared application state for the HTTP layer
#[derive(Clone)]
pub struct AppState {
    /// Configuration
    pub config: WebConfig,
    /// User lifecycle and hierarchy service
    pub directory: UserDirectory,
    /// Lead service with per-caller isolation
    pub leads: LeadService,
}

impl AppState {
    /// Create a new application state
    ///
    /// With a configured database URL the SQLite backends are used;
    /// otherwise everything lives in memory (development and tests).
    pub async fn new(config: WebConfig) -> WebResult<Self> {
        let credentials = Arc::new(ArgonCredentials);

        let (user_store, lead_store): (Arc<dyn UserStore>, Arc<dyn LeadStore>) =
            match &config.database_url {
                Some(database_url) => {
                    let pool = database::connect(database_url).await?;
                    database::create_tables(&pool).await?;
                    info!("Database initialized successfully");
                    (
                        Arc::new(SqlUserStore::new(pool.clone())),
                        Arc::new(SqlLeadStore::new(pool)),
                    )
                }
                None => {
                    info!("No database configured; using in-memory stores");
                    (
                        Arc::new(MemoryUserStore::new()),
                        Arc::new(MemoryLeadStore::new()),
                    )
                }
            };

        Ok(Self {
            config,
            directory: UserDirectory::new(user_store, credentials),
            leads: LeadService::new(lead_store),
        })
    }

    /// Resolve a verified token context to a live user record
    ///
    /// Token claims are only trusted as far as pointing at an account; the
    /// record itself decides whether the actor still exists and is active.
    pub async fn load_actor(&self, context: &AuthContext) -> ItineroResult<User> {
        let user = self
            .directory
            .require_user(context.user_id)
            .await
            .map_err(|_| unauthenticated_error!("account no longer exists", "auth"))?;

        if !user.is_active {
            return Err(unauthenticated_error!("account is deactivated", "auth"));
        }
        Ok(user)
    }
}
