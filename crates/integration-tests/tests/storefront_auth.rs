//! Login and sign-up against the stub backend.

use pocket_shop_integration_tests::{StubBackend, StubProduct};
use pocket_shop_storefront::services::{AuthError, AuthService};
use secrecy::SecretString;

fn password(s: &str) -> SecretString {
    SecretString::from(s)
}

#[tokio::test]
async fn test_login_with_valid_credentials() {
    let backend = StubBackend::start(Vec::<StubProduct>::new()).await;
    let user_id = backend.add_user("shopper@example.com", "correct horse");
    let client = backend.client();

    let session = AuthService::new(&client)
        .login("  shopper@example.com ", &password("correct horse"))
        .await
        .expect("Login should succeed");

    assert_eq!(session.user_id().as_str(), user_id);
    assert_eq!(session.user().email, "shopper@example.com");
}

#[tokio::test]
async fn test_login_with_wrong_password() {
    let backend = StubBackend::start(Vec::new()).await;
    backend.add_user("shopper@example.com", "correct horse");
    let client = backend.client();

    let err = AuthService::new(&client)
        .login("shopper@example.com", &password("battery staple"))
        .await
        .expect_err("Login should fail");
    assert!(matches!(err, AuthError::InvalidCredentials));
}

#[tokio::test]
async fn test_sign_up_then_duplicate() {
    let backend = StubBackend::start(Vec::new()).await;
    let client = backend.client();
    let auth = AuthService::new(&client);

    let session = auth
        .sign_up_and_login("new@example.com", &password("long enough"))
        .await
        .expect("Sign-up should succeed");
    assert_eq!(session.user().email, "new@example.com");

    let err = auth
        .sign_up("new@example.com", &password("long enough"))
        .await
        .expect_err("Duplicate sign-up should fail");
    assert!(matches!(err, AuthError::UserAlreadyExists));
}

#[tokio::test]
async fn test_local_validation_makes_no_request() {
    let backend = StubBackend::start(Vec::new()).await;
    let client = backend.client();
    let auth = AuthService::new(&client);

    let err = auth
        .sign_up("new@example.com", &password("short"))
        .await
        .expect_err("Weak password should fail");
    assert!(matches!(err, AuthError::WeakPassword(_)));

    let err = auth
        .login("not-an-email", &password("long enough"))
        .await
        .expect_err("Bad email should fail");
    assert!(matches!(err, AuthError::InvalidEmail(_)));

    assert_eq!(backend.request_count(), 0);
}
