//! CLI command implementations.
//!
//! Commands write their results to the `out` writer they are given and log
//! through `tracing`, so they can be exercised against an in-memory buffer.

pub mod auth;
pub mod output;
pub mod products;
pub mod shop;

use thiserror::Error;

use pocket_shop_storefront::{AppError, AppState};
use pocket_shop_storefront::config::ConfigError;
use pocket_shop_storefront::pocketbase::BackendError;
use pocket_shop_storefront::services::{AuthError, CheckoutError};

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Storefront operation failed.
    #[error(transparent)]
    App(#[from] AppError),

    /// Writing output or reading input failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CommandError {
    /// Message safe to show to the person at the terminal.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::App(err) => err.user_message(),
            Self::Io(err) => err.to_string(),
        }
    }
}

macro_rules! impl_from_app_error {
    ($($source:ty),* $(,)?) => {
        $(
            impl From<$source> for CommandError {
                fn from(err: $source) -> Self {
                    Self::App(AppError::from(err))
                }
            }
        )*
    };
}

impl_from_app_error!(ConfigError, BackendError, AuthError, CheckoutError);

/// Load configuration from the environment and build the shared state.
///
/// # Errors
///
/// Returns an error if `POCKET_SHOP_API_URL` is missing or invalid.
pub fn load_state() -> Result<AppState, CommandError> {
    Ok(AppState::from_env()?)
}
