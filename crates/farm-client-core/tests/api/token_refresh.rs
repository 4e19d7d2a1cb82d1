use farm_client_core::ApiClient;
use farm_shared::{
    const_config::{path::PathSpec, route::ROUTE_LOGIN, storage::STORAGE_KEY_USER},
    token::TokenPair,
    uac::ApiError,
};
use reqwest::StatusCode;
use secrecy::ExposeSecret as _;

use crate::helpers::{
    admin_client_with_stale_token, no_cb, spawn_hang_up_backend, RefreshReply, TestBackend,
    TestContext, FRESH_ACCESS, GOOD_REFRESH, ROTATED_REFRESH, STALE_ACCESS,
};

const LIVESTOCK: PathSpec = PathSpec::get("/livestock/");
const REPORTS: PathSpec = PathSpec::get("/reports/");

#[tokio::test]
async fn valid_token_needs_no_refresh() {
    // Arrange
    let backend = TestBackend::spawn(RefreshReply::NewTokens).await;
    let test_context = TestContext::new();
    test_context.login_admin().await;
    test_context
        .context
        .store_tokens(TokenPair::new(FRESH_ACCESS, GOOD_REFRESH));
    let client = ApiClient::new(backend.api_url.clone(), test_context.context.clone());

    // Act
    let animals: Vec<serde_json::Value> = client
        .send_request_expect_json(LIVESTOCK, &(), no_cb)
        .await
        .unwrap()
        .unwrap();

    // Assert
    assert_eq!(animals.len(), 2);
    assert_eq!(backend.state.livestock_hits(), 1);
    assert_eq!(backend.state.refresh_hits(), 0);
}

#[tokio::test]
async fn expired_token_is_refreshed_and_request_retried_once() {
    // Arrange
    let backend = TestBackend::spawn(RefreshReply::NewTokens).await;
    let client = backend.admin_client_with_stale_token().await;

    // Act
    let animals: Vec<serde_json::Value> = client
        .send_request_expect_json(LIVESTOCK, &(), no_cb)
        .await
        .unwrap()
        .unwrap();

    // Assert
    assert_eq!(animals.len(), 2);
    assert_eq!(backend.state.livestock_hits(), 2);
    assert_eq!(backend.state.refresh_hits(), 1);
    assert_eq!(
        backend.state.seen_authorization(),
        vec![
            Some(format!("Bearer {STALE_ACCESS}")),
            Some(format!("Bearer {FRESH_ACCESS}")),
        ]
    );
    let context = client.context();
    assert_eq!(context.access_token().unwrap().expose_secret(), FRESH_ACCESS);
    assert_eq!(
        context.refresh_token().unwrap().expose_secret(),
        ROTATED_REFRESH
    );
    assert!(context.is_logged_in());
}

#[tokio::test]
async fn failed_refresh_ends_session() {
    // Arrange
    let backend = TestBackend::spawn(RefreshReply::Rejected).await;
    let test_context = TestContext::new();
    test_context.login_admin().await;
    test_context
        .context
        .store_tokens(TokenPair::new(STALE_ACCESS, GOOD_REFRESH));
    assert!(test_context.context.take_redirect().is_some());
    let client = ApiClient::new(backend.api_url.clone(), test_context.context.clone());

    // Act
    let err = client
        .send_request_expect_json::<_, _, serde_json::Value>(LIVESTOCK, &(), no_cb)
        .await
        .unwrap()
        .unwrap_err();

    // Assert
    assert!(err.is_session_expired());
    assert_eq!(backend.state.livestock_hits(), 1);
    assert_eq!(backend.state.refresh_hits(), 1);
    assert!(!test_context.context.is_logged_in());
    assert!(test_context.context.access_token().is_none());
    assert_eq!(test_context.store.get(STORAGE_KEY_USER).unwrap(), None);
    assert_eq!(test_context.context.take_redirect(), Some(ROUTE_LOGIN));
}

#[tokio::test]
async fn malformed_refresh_reply_ends_session() {
    // Arrange
    let backend = TestBackend::spawn(RefreshReply::MalformedBody).await;
    let client = backend.admin_client_with_stale_token().await;

    // Act
    let err = client
        .send_request_expect_json::<_, _, serde_json::Value>(LIVESTOCK, &(), no_cb)
        .await
        .unwrap()
        .unwrap_err();

    // Assert
    assert!(err.is_session_expired());
    assert_eq!(backend.state.livestock_hits(), 1);
    assert_eq!(backend.state.refresh_hits(), 1);
    let context = client.context();
    assert!(!context.is_logged_in());
    assert!(context.access_token().is_none());
    assert_eq!(context.take_redirect(), Some(ROUTE_LOGIN));
}

#[tokio::test]
async fn refresh_connection_failure_ends_session() {
    // Arrange
    let (api_url, request_lines) = spawn_hang_up_backend();
    let client = admin_client_with_stale_token(&api_url).await;

    // Act
    let err = client
        .send_request_expect_json::<_, _, serde_json::Value>(LIVESTOCK, &(), no_cb)
        .await
        .unwrap()
        .unwrap_err();

    // Assert
    assert!(err.is_session_expired());
    assert_eq!(
        *request_lines.lock().unwrap(),
        vec![
            "GET /api/livestock/".to_string(),
            "POST /api/token/refresh/".to_string(),
        ]
    );
    let context = client.context();
    assert!(!context.is_logged_in());
    assert!(context.refresh_token().is_none());
    assert_eq!(context.take_redirect(), Some(ROUTE_LOGIN));
}

#[tokio::test]
async fn missing_refresh_token_ends_session() {
    // Arrange
    let backend = TestBackend::spawn(RefreshReply::NewTokens).await;
    let test_context = TestContext::new();
    test_context.login_standard().await;
    let client = ApiClient::new(backend.api_url.clone(), test_context.context.clone());

    // Act
    let err = client
        .send_request_expect_empty(LIVESTOCK, &(), no_cb)
        .await
        .unwrap()
        .unwrap_err();

    // Assert
    assert!(matches!(err, ApiError::SessionExpired));
    assert_eq!(backend.state.seen_authorization(), vec![None]);
    assert_eq!(backend.state.refresh_hits(), 0);
    assert!(!test_context.context.is_logged_in());
}

#[tokio::test]
async fn second_unauthorized_is_not_retried() {
    // Arrange
    let backend = TestBackend::spawn(RefreshReply::NewTokens).await;
    let client = backend.admin_client_with_stale_token().await;

    // Act
    let err = client
        .send_request_expect_json::<_, _, serde_json::Value>(REPORTS, &(), no_cb)
        .await
        .unwrap()
        .unwrap_err();

    // Assert
    match err {
        ApiError::RequestFailed { status, detail } => {
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(detail, "Given token not valid for any token type");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(backend.state.reports_hits(), 2);
    assert_eq!(backend.state.refresh_hits(), 1);
    assert!(client.context().is_logged_in());
}
