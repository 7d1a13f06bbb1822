mod common;

use chrono::{Duration, Utc};
use common::{count, test_pool};
use rollbook::AppError;
use rollbook::db::users;
use rollbook::models::{Flash, Session};
use rollbook::services::auth;

#[tokio::test]
async fn register_then_login() {
    let pool = test_pool().await;

    let user = auth::register(&pool, " teacher ", "secret", "secret").await.unwrap();
    assert_eq!(user.username, "teacher");
    assert_ne!(user.password_hash, "secret");

    let logged_in = auth::authenticate(&pool, "teacher", "secret").await.unwrap();
    assert_eq!(logged_in.id, user.id);

    let err = auth::authenticate(&pool, "teacher", "wrong").await.unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));
    let err = auth::authenticate(&pool, "nobody", "secret").await.unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));
}

#[tokio::test]
async fn duplicate_username_is_a_conflict() {
    let pool = test_pool().await;
    auth::register(&pool, "teacher", "secret", "secret").await.unwrap();

    let err = auth::register(&pool, "teacher", "other", "other").await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(ref m) if m == "username taken"));
    assert_eq!(count(&pool, "users").await, 1);
}

#[tokio::test]
async fn registration_validation() {
    let pool = test_pool().await;

    let err = auth::register(&pool, "  ", "secret", "secret").await.unwrap_err();
    assert!(matches!(err, AppError::Validation(ref m) if m == "username required"));
    let err = auth::register(&pool, "t", "", "").await.unwrap_err();
    assert!(matches!(err, AppError::Validation(ref m) if m == "password required"));
    let err = auth::register(&pool, "t", "a", "b").await.unwrap_err();
    assert!(matches!(err, AppError::Validation(ref m) if m == "passwords do not match"));
    assert_eq!(count(&pool, "users").await, 0);
}

#[tokio::test]
async fn sessions_resolve_until_logout() {
    let pool = test_pool().await;
    let user = auth::register(&pool, "teacher", "secret", "secret").await.unwrap();

    let session = auth::start_session(&pool, &user, Duration::hours(1)).await.unwrap();
    let resolved = auth::resolve_session(&pool, &session.token).await.unwrap();
    assert_eq!(resolved.map(|u| u.id), Some(user.id));

    auth::end_session(&pool, &session.token).await.unwrap();
    assert!(auth::resolve_session(&pool, &session.token).await.unwrap().is_none());
    assert!(auth::resolve_session(&pool, "no-such-token").await.unwrap().is_none());
}

#[tokio::test]
async fn expired_sessions_are_dropped() {
    let pool = test_pool().await;
    let user = auth::register(&pool, "teacher", "secret", "secret").await.unwrap();

    let session = Session {
        token: "stale".to_string(),
        user_id: user.id,
        expires_at: (Utc::now() - Duration::minutes(5)).to_rfc3339(),
    };
    users::insert_session(&pool, &session).await.unwrap();

    assert!(auth::resolve_session(&pool, "stale").await.unwrap().is_none());
    assert_eq!(count(&pool, "sessions").await, 0);
}

#[tokio::test]
async fn flash_is_shown_once() {
    let pool = test_pool().await;
    let user = auth::register(&pool, "teacher", "secret", "secret").await.unwrap();
    let session = auth::start_session(&pool, &user, Duration::hours(1)).await.unwrap();

    assert_eq!(users::take_flash(&pool, &session.token).await.unwrap(), None);

    users::set_flash(&pool, &session.token, &Flash::success("Saved")).await.unwrap();
    assert_eq!(
        users::take_flash(&pool, &session.token).await.unwrap(),
        Some(Flash::success("Saved"))
    );
    assert_eq!(users::take_flash(&pool, &session.token).await.unwrap(), None);
}

#[tokio::test]
async fn session_lifetime_past_the_calendar_is_an_error() {
    let pool = test_pool().await;
    let user = auth::register(&pool, "teacher", "secret", "secret").await.unwrap();

    let err = auth::start_session(&pool, &user, Duration::days(100_000_000))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Internal(_)));
    assert_eq!(count(&pool, "sessions").await, 0);
}
