//! Application state shared by every handler
//!
//! Holds the configuration, the two stores, the session table and the page
//! renderer. Cloning is cheap; every field is reference counted.

use crate::auth::SessionStore;
use crate::config::SnippetboxConfig;
use crate::models::{MemoryStore, MySqlStore, SnippetStore, UserStore};
use crate::template::Renderer;
use std::sync::Arc;

/// Application state for snippetbox
///
/// # Example
///
/// ```rust
/// use snippetbox::{config::SnippetboxConfig, state::AppState};
///
/// let state = AppState::in_memory(SnippetboxConfig::default());
/// assert!(state.sessions().is_empty());
/// ```
#[derive(Clone)]
pub struct AppState {
    config: Arc<SnippetboxConfig>,
    snippets: Arc<dyn SnippetStore>,
    users: Arc<dyn UserStore>,
    sessions: SessionStore,
    renderer: Arc<Renderer>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("sessions", &self.sessions.len())
            .field("renderer", &self.renderer)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Assemble state from explicit stores
    #[must_use]
    pub fn new(
        config: SnippetboxConfig,
        snippets: Arc<dyn SnippetStore>,
        users: Arc<dyn UserStore>,
    ) -> Self {
        let sessions = SessionStore::new(config.security.session_lifetime());
        Self {
            config: Arc::new(config),
            snippets,
            users,
            sessions,
            renderer: Arc::new(Renderer::new()),
        }
    }

    /// State backed by `store` for both snippets and users
    #[must_use]
    pub fn with_memory_store(config: SnippetboxConfig, store: MemoryStore) -> Self {
        let snippets: Arc<dyn SnippetStore> = Arc::new(store.clone());
        let users: Arc<dyn UserStore> = Arc::new(store);
        Self::new(config, snippets, users)
    }

    /// State backed by a fresh in-memory store
    #[must_use]
    pub fn in_memory(config: SnippetboxConfig) -> Self {
        Self::with_memory_store(config, MemoryStore::new())
    }

    /// Build state for `config`
    ///
    /// Connects to MySQL and applies migrations when a database URL is
    /// configured; falls back to the in-memory store otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be reached or migrated.
    pub async fn connect(config: SnippetboxConfig) -> anyhow::Result<Self> {
        let Some(url) = config.database.url.clone() else {
            tracing::warn!("no database configured; using the in-memory store");
            return Ok(Self::in_memory(config));
        };

        let store = MySqlStore::connect(&url, config.database.max_connections).await?;
        store.migrate().await?;
        tracing::info!(max_connections = config.database.max_connections, "connected to MySQL");

        let snippets: Arc<dyn SnippetStore> = Arc::new(store.clone());
        let users: Arc<dyn UserStore> = Arc::new(store);
        Ok(Self::new(config, snippets, users))
    }

    /// Get the application configuration
    #[must_use]
    pub fn config(&self) -> &SnippetboxConfig {
        &self.config
    }

    /// Snippet store
    #[must_use]
    pub fn snippets(&self) -> &Arc<dyn SnippetStore> {
        &self.snippets
    }

    /// User store
    #[must_use]
    pub fn users(&self) -> &Arc<dyn UserStore> {
        &self.users
    }

    /// Session table
    #[must_use]
    pub const fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Page renderer
    #[must_use]
    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }
}
