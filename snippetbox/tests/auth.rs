//! Signup, login, logout and the protected routes

mod common;

use axum::http::{header, StatusCode};
use common::TestApp;

#[tokio::test]
async fn test_signup_then_login_authenticates() {
    let app = TestApp::new();
    let mut client = app.client();

    let signup = client
        .signup("Alice", "alice@example.com", "correct horse battery")
        .await;
    assert_eq!(signup.status, StatusCode::SEE_OTHER);

    let login = client.login("alice@example.com", "correct horse battery").await;
    assert_eq!(login.status, StatusCode::SEE_OTHER);
    assert_eq!(login.location(), Some("/snippet/create"));

    let create = client.get("/snippet/create").await;
    assert_eq!(create.status, StatusCode::OK);
    assert!(create.body.contains("Logout"));
}

#[tokio::test]
async fn test_duplicate_signup_reports_email_and_changes_nothing() {
    let app = TestApp::new();
    let mut client = app.client();
    client
        .signup("Alice", "alice@example.com", "correct horse battery")
        .await;

    let mut other = app.client();
    let second = other
        .signup("Impostor", "alice@example.com", "a different password")
        .await;

    assert_eq!(second.status, StatusCode::OK);
    assert!(second.body.contains("Address is already in use"));
    assert!(second.body.contains(r#"value="Impostor""#));

    let login = other.login("alice@example.com", "a different password").await;
    assert!(login.body.contains("Email or Password is incorrect"));
    let login = other.login("alice@example.com", "correct horse battery").await;
    assert_eq!(login.status, StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_signup_validation_errors_rerender_with_200() {
    let app = TestApp::new();
    let mut client = app.client();

    let response = client
        .signup("", "not-an-email", "short")
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("This field is required"));
    assert!(response.body.contains("This field is invalid"));
    assert!(response.body.contains("This field is too short (minimum is 10 characters)"));
    assert!(response.body.contains(r#"value="not-an-email""#));
}

#[tokio::test]
async fn test_signup_stores_trimmed_name() {
    let app = TestApp::new();
    let mut client = app.client();

    let name = format!(" {} ", "n".repeat(255));
    let response = client
        .signup(&name, "alice@example.com", "correct horse battery")
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);

    let user = app.state.users().get(1).await.unwrap();
    assert_eq!(user.name, "n".repeat(255));

    let padded = client
        .signup("Bob", " bob@example.com ", "correct horse battery")
        .await;
    assert_eq!(padded.status, StatusCode::OK);
    assert!(padded.body.contains("This field is invalid"));
}

#[tokio::test]
async fn test_wrong_password_gives_generic_error() {
    let app = TestApp::new();
    let mut client = app.client();
    client
        .signup("Alice", "alice@example.com", "correct horse battery")
        .await;

    let response = client.login("alice@example.com", "wrong password!").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body.matches("Email or Password is incorrect").count(), 1);
    assert!(!response.body.contains("This field"));

    let unknown = client.login("nobody@example.com", "wrong password!").await;
    assert_eq!(unknown.status, StatusCode::OK);
    assert!(unknown.body.contains("Email or Password is incorrect"));
}

#[tokio::test]
async fn test_anonymous_create_redirects_to_login() {
    let app = TestApp::new();
    let mut client = app.client();

    let response = client.get("/snippet/create").await;

    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/user/login"));
    assert!(response.headers.get(header::CACHE_CONTROL).is_none());
    assert!(!response.body.contains("Create a New Snippet"));
}

#[tokio::test]
async fn test_protected_pages_are_not_cacheable() {
    let app = TestApp::new();
    let mut client = app.client();
    client.logged_in("alice@example.com").await;

    let response = client.get("/snippet/create").await;
    assert_eq!(response.headers[header::CACHE_CONTROL], "no-store");

    let public = client.get("/").await;
    assert!(public.headers.get(header::CACHE_CONTROL).is_none());
}

#[tokio::test]
async fn test_deactivated_user_is_demoted_and_purged() {
    let app = TestApp::new();
    let mut client = app.client();
    client.logged_in("alice@example.com").await;
    assert_eq!(client.get("/snippet/create").await.status, StatusCode::OK);

    app.store.set_active(1, false).unwrap();
    let response = client.get("/snippet/create").await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/user/login"));

    // the stale ID is gone, so reactivation does not log the session back in
    app.store.set_active(1, true).unwrap();
    let response = client.get("/snippet/create").await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_deleted_user_is_demoted() {
    let app = TestApp::new();
    let mut client = app.client();
    client.logged_in("alice@example.com").await;

    app.store.delete_user(1).unwrap();
    let home = client.get("/").await;
    assert_eq!(home.status, StatusCode::OK);
    assert!(home.body.contains("/user/login"));
    assert!(!home.body.contains("Logout"));
}

#[tokio::test]
async fn test_deleted_user_session_does_not_pass_to_next_signup() {
    let app = TestApp::new();
    let mut alice = app.client();
    alice.logged_in("alice@example.com").await;

    app.store.delete_user(1).unwrap();
    let mut bob = app.client();
    bob.logged_in("bob@example.com").await;

    let response = alice.get("/snippet/create").await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/user/login"));
    assert_eq!(bob.get("/snippet/create").await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_logout() {
    let app = TestApp::new();
    let mut client = app.client();
    client.logged_in("alice@example.com").await;

    let response = client.submit("/", "/user/logout", &[]).await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/"));

    let home = client.get("/").await;
    assert!(home.body.contains("You've been logged out successfully!"));
    assert!(!home.body.contains("Logout"));
    assert_eq!(client.get("/snippet/create").await.status, StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_anonymous_logout_redirects_to_login() {
    let app = TestApp::new();
    let mut client = app.client();

    let response = client.submit("/user/login", "/user/logout", &[]).await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/user/login"));
}
