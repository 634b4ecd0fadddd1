//! Registration, sign-in and sign-out through the HTTP surface.

use axum::http::StatusCode;
use campground_server::db::users;
use campground_server::error::AUTH_FAILURE_MESSAGE;
use campground_server::middleware::auth::SIGN_IN_REQUIRED;
use campground_server::test_support::TestApp;
use rstest::rstest;

#[tokio::test]
async fn registration_signs_the_user_in() {
    let app = TestApp::new().await;
    let mut alice = app.signed_up("alice").await;

    let page = alice.get("/campgrounds").await;

    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Welcome to Yelp Camp!"));
    assert!(page.body.contains("href=\"/logout\""));
    assert!(page.body.contains("alice"));
}

#[tokio::test]
async fn duplicate_username_is_rejected_without_creating_a_user() {
    let app = TestApp::new().await;
    app.signed_up("alice").await;

    let response = app
        .client()
        .post_form(
            "/register",
            &[
                ("username", "alice"),
                ("email", "other@example.com"),
                ("password", "password123"),
            ],
        )
        .await;

    assert_eq!(response.status, StatusCode::CONFLICT);
    assert!(response.body.contains("already"));
    assert!(response.body.contains("value=\"other@example.com\""));
    assert_eq!(users::count(&app.state.db).await.unwrap(), 1);
}

#[rstest]
#[case("al", "al@example.com", "password123", "Username must be")]
#[case("alice", "not-an-email", "password123", "Email must be a valid address")]
#[case("alice", "alice@example.com", "short", "Password must be at least")]
#[tokio::test]
async fn invalid_registration_rerenders_the_form(
    #[case] username: &str,
    #[case] email: &str,
    #[case] password: &str,
    #[case] expected: &str,
) {
    let app = TestApp::new().await;

    let response = app
        .client()
        .post_form(
            "/register",
            &[("username", username), ("email", email), ("password", password)],
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body.contains(expected), "{}", response.body);
    assert_eq!(users::count(&app.state.db).await.unwrap(), 0);
}

#[tokio::test]
async fn wrong_password_and_unknown_user_fail_identically() {
    let app = TestApp::new().await;
    app.signed_up("alice").await;

    let mut wrong_password = app.client();
    let first = wrong_password
        .post_form("/login", &[("username", "alice"), ("password", "wrong-password")])
        .await;
    let first_page = wrong_password.get("/login").await;

    let mut unknown_user = app.client();
    let second = unknown_user
        .post_form("/login", &[("username", "mallory"), ("password", "password123")])
        .await;
    let second_page = unknown_user.get("/login").await;

    assert_eq!(first.status, StatusCode::SEE_OTHER);
    assert_eq!(first.status, second.status);
    assert_eq!(first.location.as_deref(), Some("/login"));
    assert_eq!(first.location, second.location);
    assert!(first_page.body.contains(AUTH_FAILURE_MESSAGE));
    assert_eq!(first_page.body, second_page.body);
}

#[tokio::test]
async fn login_returns_to_the_interrupted_page() {
    let app = TestApp::new().await;
    app.signed_up("alice").await;
    let mut client = app.client();

    let blocked = client.get("/campgrounds/new").await;
    assert_eq!(blocked.status, StatusCode::SEE_OTHER);
    assert_eq!(blocked.location.as_deref(), Some("/login"));
    assert!(client.get("/login").await.body.contains(SIGN_IN_REQUIRED));

    let login = client
        .post_form("/login", &[("username", "alice"), ("password", "password123")])
        .await;
    assert_eq!(login.location.as_deref(), Some("/campgrounds/new"));

    let form = client.get("/campgrounds/new").await;
    assert_eq!(form.status, StatusCode::OK);
    assert!(form.body.contains("welcome back!"));
}

#[tokio::test]
async fn login_without_a_pending_page_lands_on_the_index() {
    let app = TestApp::new().await;
    app.signed_up("alice").await;

    let login = app
        .client()
        .post_form("/login", &[("username", "alice"), ("password", "password123")])
        .await;

    assert_eq!(login.location.as_deref(), Some("/campgrounds"));
}

#[tokio::test]
async fn logout_ends_the_session() {
    let app = TestApp::new().await;
    let mut alice = app.signed_up("alice").await;

    let logout = alice.get("/logout").await;
    assert_eq!(logout.location.as_deref(), Some("/campgrounds"));
    assert!(alice.get("/campgrounds").await.body.contains("Goodbye!"));

    let blocked = alice.get("/campgrounds/new").await;
    assert_eq!(blocked.location.as_deref(), Some("/login"));
}

#[tokio::test]
async fn interrupted_form_submissions_return_to_the_index() {
    let app = TestApp::new().await;
    app.signed_up("alice").await;
    let mut client = app.client();

    client.get("/campgrounds/new").await;
    let blocked = client
        .post_form("/campgrounds/some-id/reviews", &[("body", "Nice"), ("rating", "4")])
        .await;
    assert_eq!(blocked.location.as_deref(), Some("/login"));

    let login = client
        .post_form("/login", &[("username", "alice"), ("password", "password123")])
        .await;
    assert_eq!(login.location.as_deref(), Some("/campgrounds"));
}
