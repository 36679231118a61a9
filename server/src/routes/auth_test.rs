use axum::extract::FromRequestParts;
use axum::http::Request;
use axum::http::header::COOKIE;

use super::*;
use crate::state::test_helpers;

fn parts(header: Option<(&str, &str)>) -> Parts {
    let mut builder = Request::builder().uri("/api/projects/p1/document");
    if let Some((name, value)) = header {
        builder = builder.header(name, value);
    }
    builder.body(()).unwrap().into_parts().0
}

#[test]
fn bearer_scheme_is_case_insensitive() {
    assert_eq!(parse_bearer("Bearer abc"), Some("abc"));
    assert_eq!(parse_bearer("bearer   abc "), Some("abc"));
    assert_eq!(parse_bearer("Basic abc"), None);
    assert_eq!(parse_bearer("Bearer"), None);
    assert_eq!(parse_bearer("Bearer  "), None);
}

#[test]
fn token_from_header_or_cookie() {
    assert_eq!(request_token(&parts(Some((AUTHORIZATION.as_str(), "Bearer alice")))).as_deref(), Some("alice"));
    assert_eq!(request_token(&parts(Some((COOKIE.as_str(), "session_token=bob")))).as_deref(), Some("bob"));
    assert_eq!(request_token(&parts(Some((COOKIE.as_str(), "session_token=")))), None);
    assert_eq!(request_token(&parts(None)), None);
}

#[tokio::test]
async fn extractor_resolves_dev_identity() {
    let state = test_helpers::test_app_state();
    let mut parts = parts(Some((AUTHORIZATION.as_str(), "Bearer alice")));

    let Ok(user) = AuthUser::from_request_parts(&mut parts, &state).await else {
        panic!("expected an authenticated user");
    };
    assert_eq!(user.identity.user_id, "alice");
}

#[tokio::test]
async fn extractor_rejects_missing_token() {
    let state = test_helpers::test_app_state();
    let mut parts = parts(None);

    let result = AuthUser::from_request_parts(&mut parts, &state).await;
    assert_eq!(result.err(), Some(StatusCode::UNAUTHORIZED));
}
