//! Server-rendered pages. Each handler is a thin shell over `services`,
//! turning [`AppError`] kinds into flashes, re-rendered forms or redirects.

pub mod attendance;
pub mod auth;
pub mod students;

use axum::{
    Router,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};

use crate::error::AppError;
use crate::models::Flash;
use crate::session::CurrentUser;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(students::index))
        .route("/add", get(students::add_form).post(students::add_submit))
        .route("/edit/{id}", get(students::edit_form).post(students::edit_submit))
        .route("/delete/{id}", post(students::delete))
        .route("/attendance", get(attendance::home))
        .route(
            "/mark_attendance",
            get(attendance::mark_form).post(attendance::mark_submit),
        )
        .route("/view_attendance", get(attendance::pick_date))
        .route("/view_attendance/{date}", get(attendance::view))
        .route("/report", get(attendance::report))
        .route("/attendance_dates", get(attendance::dates))
        .route("/login", get(auth::login_form).post(auth::login_submit))
        .route("/register", get(auth::register_form).post(auth::register_submit))
        .route("/logout", post(auth::logout))
}

/// Stores `flash` on the session and sends the browser to `to`.
pub(crate) async fn flash_redirect(
    state: &AppState,
    user: &CurrentUser,
    flash: Flash,
    to: &str,
) -> Response {
    user.flash(state, flash).await;
    Redirect::to(to).into_response()
}

pub(crate) async fn error_redirect(
    state: &AppState,
    user: &CurrentUser,
    err: AppError,
    to: &str,
) -> Response {
    flash_redirect(state, user, Flash::error(err.user_message()), to).await
}
