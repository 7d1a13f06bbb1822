use axum::{
    Router,
    extract::State,
    http::{StatusCode, Uri, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::json;
use tracing::error;

use crate::state::AppState;
use crate::views::STYLESHEET;
use crate::{api, web};

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(web::router())
        .nest("/api", api::router())
        .route("/health", get(health))
        .route("/static/style.css", get(stylesheet))
        .fallback(not_found)
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("select 1").execute(&state.db).await {
        Ok(_) => StatusCode::OK,
        Err(err) => {
            error!("health check failed: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

async fn stylesheet() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/css")], STYLESHEET)
}

async fn not_found(State(state): State<AppState>, uri: Uri) -> Response {
    state.views.page(
        StatusCode::NOT_FOUND,
        "not_found",
        None,
        None,
        json!({ "path": uri.path() }),
    )
}
