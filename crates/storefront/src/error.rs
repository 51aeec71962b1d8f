//! Unified error handling.
//!
//! Provides a unified `AppError` type for everything the storefront can
//! fail at. Front ends show [`AppError::user_message`] and log the full
//! error.

use thiserror::Error;

use crate::config::ConfigError;
use crate::pocketbase::BackendError;
use crate::services::auth::AuthError;
use crate::services::checkout::CheckoutError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Backend operation failed.
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Checkout failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),
}

impl AppError {
    /// Whether this error comes from our side rather than the user's input.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        match self {
            Self::Config(_) => true,
            Self::Backend(err)
            | Self::Auth(AuthError::Backend(err))
            | Self::Checkout(CheckoutError::Backend(err)) => backend_is_internal(err),
            Self::Auth(_) | Self::Checkout(_) => false,
        }
    }

    /// Message safe to show to the shopper.
    ///
    /// Transport and decoding details are never exposed.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Config(err) => format!("Configuration problem: {err}"),
            Self::Backend(err) => backend_message(err),
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => "Invalid credentials".to_string(),
                AuthError::UserAlreadyExists => {
                    "An account with this email already exists".to_string()
                }
                AuthError::WeakPassword(msg) => msg.clone(),
                AuthError::InvalidEmail(_) => "Invalid email address".to_string(),
                AuthError::Backend(err) => backend_message(err),
            },
            Self::Checkout(err) => match err {
                CheckoutError::Unauthorized(_) => {
                    "Session expired, please sign in again".to_string()
                }
                CheckoutError::Backend(err) => backend_message(err),
                other => other.to_string(),
            },
        }
    }
}

const fn backend_is_internal(err: &BackendError) -> bool {
    !matches!(
        err,
        BackendError::NotFound(_) | BackendError::RateLimited(_) | BackendError::Unauthorized(_)
    )
}

fn backend_message(err: &BackendError) -> String {
    match err {
        BackendError::NotFound(what) => format!("Not found: {what}"),
        BackendError::RateLimited(secs) => format!("Too many requests, retry in {secs}s"),
        BackendError::Unauthorized(_) => "Please sign in again".to_string(),
        BackendError::Api(api) if (400..500).contains(&api.status) => api.message.clone(),
        _ => "The shop is unavailable right now".to_string(),
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pocket_shop_core::Email;

    use super::*;
    use crate::pocketbase::ApiError;

    #[test]
    fn test_app_error_display() {
        let err = AppError::from(ConfigError::MissingEnvVar("POCKET_SHOP_API_URL".to_string()));
        assert_eq!(
            err.to_string(),
            "Config error: Missing environment variable: POCKET_SHOP_API_URL"
        );

        let err = AppError::from(BackendError::NotFound("product p1".to_string()));
        assert_eq!(err.to_string(), "Backend error: Not found: product p1");
    }

    #[test]
    fn test_user_message_hides_internals() {
        let parse_err = serde_json::from_str::<u32>("nope").unwrap_err();
        let err = AppError::from(BackendError::Parse(parse_err));
        assert!(err.is_internal());
        assert_eq!(err.user_message(), "The shop is unavailable right now");

        let err = AppError::from(BackendError::Api(ApiError::from_body(
            500,
            r#"{"message": "db locked at /var/pb_data"}"#,
        )));
        assert!(err.is_internal());
        assert!(!err.user_message().contains("pb_data"));

        let err = AppError::from(ConfigError::MissingEnvVar("POCKET_SHOP_API_URL".to_string()));
        assert!(err.is_internal());
    }

    #[test]
    fn test_user_message_for_shopper_errors() {
        let err = AppError::from(AuthError::InvalidCredentials);
        assert!(!err.is_internal());
        assert_eq!(err.user_message(), "Invalid credentials");

        let err = AppError::from(AuthError::from(Email::parse("nope").unwrap_err()));
        assert_eq!(err.user_message(), "Invalid email address");

        let err = AppError::from(CheckoutError::EmptyCart);
        assert_eq!(err.user_message(), "cart is empty");

        let err = AppError::from(CheckoutError::Rejected("Insufficient stock".to_string()));
        assert_eq!(err.user_message(), "order rejected: Insufficient stock");

        let err = AppError::from(BackendError::RateLimited(30));
        assert_eq!(err.user_message(), "Too many requests, retry in 30s");
    }
}
