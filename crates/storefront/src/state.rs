//! Application state shared by front ends.

use std::sync::Arc;

use crate::config::StorefrontConfig;
use crate::pocketbase::PocketBaseClient;
use crate::services::auth::AuthService;
use crate::session::ShopSession;

/// Application state shared across commands.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// configuration and the backend client.
#[derive(Debug, Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

#[derive(Debug)]
struct AppStateInner {
    config: StorefrontConfig,
    client: PocketBaseClient,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: StorefrontConfig) -> crate::error::Result<Self> {
        let client = PocketBaseClient::new(&config)?;

        Ok(Self {
            inner: Arc::new(AppStateInner { config, client }),
        })
    }

    /// Load configuration from the environment and build the state.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is missing or invalid.
    pub fn from_env() -> crate::error::Result<Self> {
        Self::new(StorefrontConfig::from_env()?)
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the backend client.
    #[must_use]
    pub fn client(&self) -> &PocketBaseClient {
        &self.inner.client
    }

    /// Authentication service bound to this state's client.
    #[must_use]
    pub fn auth(&self) -> AuthService<'_> {
        AuthService::new(&self.inner.client)
    }

    /// A fresh shopping session backed by the live catalog.
    #[must_use]
    pub fn session(&self) -> ShopSession<'_, PocketBaseClient, PocketBaseClient> {
        ShopSession::new(&self.inner.client, &self.inner.client)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_state_shares_client() {
        let config = StorefrontConfig::for_api_url("http://127.0.0.1:8090/").unwrap();
        let state = AppState::new(config).unwrap();
        let clone = state.clone();

        assert_eq!(state.config().api_base(), "http://127.0.0.1:8090");
        assert!(std::ptr::eq(state.client(), clone.client()));
        assert!(state.session().cart().is_empty());
    }
}
