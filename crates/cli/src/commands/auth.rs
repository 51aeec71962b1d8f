//! Account commands.
//!
//! # Usage
//!
//! ```bash
//! POCKET_SHOP_PASSWORD=... ps-cli auth login -e shopper@example.com
//! ps-cli auth signup -e shopper@example.com --password '...'
//! ```
//!
//! Tokens are never printed.

use std::io::Write;

use secrecy::SecretString;

use pocket_shop_storefront::AppState;

use super::CommandError;

/// Log in and report who we are.
pub async fn login(
    state: &AppState,
    email: &str,
    password: &SecretString,
    out: &mut impl Write,
) -> Result<(), CommandError> {
    let session = state.auth().login(email, password).await?;
    writeln!(
        out,
        "Logged in as {} ({})",
        session.user().email,
        session.user_id()
    )?;
    Ok(())
}

/// Create an account, then log in with it.
pub async fn signup(
    state: &AppState,
    email: &str,
    password: &SecretString,
    out: &mut impl Write,
) -> Result<(), CommandError> {
    let session = state.auth().sign_up_and_login(email, password).await?;
    writeln!(
        out,
        "Account created for {} ({})",
        session.user().email,
        session.user_id()
    )?;
    Ok(())
}
