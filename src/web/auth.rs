use axum::{
    Form,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use crate::models::Flash;
use crate::services::auth;
use crate::session::{self, MaybeUser};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm: String,
}

fn render_login(state: &AppState, code: StatusCode, username: &str, flash: Option<Flash>) -> Response {
    state.views.page(code, "login", None, flash, json!({ "form": { "username": username } }))
}

pub async fn login_form(State(state): State<AppState>, MaybeUser(user): MaybeUser) -> Response {
    if user.is_some() {
        return Redirect::to("/").into_response();
    }
    render_login(&state, StatusCode::OK, "", None)
}

pub async fn login_submit(State(state): State<AppState>, Form(form): Form<LoginForm>) -> Response {
    let user = match auth::authenticate(&state.db, &form.username, &form.password).await {
        Ok(user) => user,
        Err(e) => {
            let flash = Some(Flash::error(e.user_message()));
            return render_login(&state, e.status(), &form.username, flash);
        }
    };

    let cookie = match auth::start_session(&state.db, &user, state.session_ttl)
        .await
        .and_then(|s| session::session_cookie(&s.token, state.session_ttl))
    {
        Ok(cookie) => cookie,
        Err(e) => {
            let flash = Some(Flash::error(e.user_message()));
            return render_login(&state, e.status(), &form.username, flash);
        }
    };

    ([(header::SET_COOKIE, cookie)], Redirect::to("/")).into_response()
}

pub async fn register_form(State(state): State<AppState>) -> Response {
    state.views.page(
        StatusCode::OK,
        "register",
        None,
        None,
        json!({ "form": { "username": "" } }),
    )
}

pub async fn register_submit(State(state): State<AppState>, Form(form): Form<RegisterForm>) -> Response {
    match auth::register(&state.db, &form.username, &form.password, &form.confirm).await {
        Ok(user) => render_login(
            &state,
            StatusCode::OK,
            &user.username,
            Some(Flash::success("Registration successful, please log in")),
        ),
        Err(e) => state.views.page(
            e.status(),
            "register",
            None,
            Some(Flash::error(e.user_message())),
            json!({ "form": { "username": form.username } }),
        ),
    }
}

/// Ends the session named by the cookie, live or not, and clears the cookie.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(token) = session::session_token(&headers) {
        if let Err(e) = auth::end_session(&state.db, &token).await {
            warn!("could not end session: {}", e);
        }
    }

    ([(header::SET_COOKIE, session::expired_cookie())], Redirect::to("/login")).into_response()
}
