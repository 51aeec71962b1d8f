//! Authentication service.
//!
//! Password login and sign-up against the backend's auth collection. The
//! backend owns credentials; this service validates input locally and maps
//! backend failures onto [`AuthError`].

mod error;

pub use error::AuthError;

use secrecy::{ExposeSecret, SecretString};
use tracing::{info, instrument, warn};

use pocket_shop_core::{Email, UserId};

use crate::pocketbase::{BackendError, PocketBaseClient, UserRecord};

/// Minimum password length (the backend's default for auth collections).
const MIN_PASSWORD_LENGTH: usize = 8;

/// An authenticated user and the token that proves it.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct AuthSession {
    token: SecretString,
    user: UserRecord,
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("token", &"[REDACTED]")
            .field("user", &self.user)
            .finish()
    }
}

impl AuthSession {
    /// Build a session from a token and the user it belongs to.
    #[must_use]
    pub const fn new(token: SecretString, user: UserRecord) -> Self {
        Self { token, user }
    }

    /// The auth token to send with requests.
    #[must_use]
    pub const fn token(&self) -> &SecretString {
        &self.token
    }

    #[must_use]
    pub const fn user(&self) -> &UserRecord {
        &self.user
    }

    #[must_use]
    pub const fn user_id(&self) -> &UserId {
        &self.user.id
    }
}

/// Authentication service.
pub struct AuthService<'a> {
    client: &'a PocketBaseClient,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(client: &'a PocketBaseClient) -> Self {
        Self { client }
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::InvalidCredentials` if the backend rejects the
    /// email/password pair.
    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<AuthSession, AuthError> {
        let email = Email::parse(email)?;

        let response = self
            .client
            .auth_with_password(email.as_str(), password)
            .await
            .map_err(|e| match e {
                BackendError::Api(api) if api.status == 400 => {
                    warn!(email = %email, "Login rejected");
                    AuthError::InvalidCredentials
                }
                other => AuthError::Backend(other),
            })?;

        info!(user_id = %response.record.id, "Logged in");
        Ok(AuthSession::new(
            SecretString::from(response.token),
            response.record,
        ))
    }

    /// Register a new user with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    #[instrument(skip(self, password))]
    pub async fn sign_up(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<UserRecord, AuthError> {
        let email = Email::parse(email)?;
        validate_password(password.expose_secret())?;

        let user = self
            .client
            .create_user(email.as_str(), password)
            .await
            .map_err(|e| match e {
                BackendError::Api(api) if api.field("email").is_some() => {
                    AuthError::UserAlreadyExists
                }
                BackendError::Api(api) if api.field("password").is_some() => {
                    AuthError::WeakPassword(
                        api.field("password")
                            .map(|f| f.message.clone())
                            .unwrap_or_default(),
                    )
                }
                other => AuthError::Backend(other),
            })?;

        info!(user_id = %user.id, "Signed up");
        Ok(user)
    }

    /// Sign up, then log in with the same credentials.
    ///
    /// # Errors
    ///
    /// See [`Self::sign_up`] and [`Self::login`].
    pub async fn sign_up_and_login(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<AuthSession, AuthError> {
        self.sign_up(email, password).await?;
        self.login(email, password).await
    }
}

/// Validate password requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    if password.trim().is_empty() {
        return Err(AuthError::WeakPassword(
            "password cannot be only whitespace".to_string(),
        ));
    }
    Ok(())
}
