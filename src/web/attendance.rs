use std::collections::HashMap;

use axum::{
    Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Local;
use serde::Deserialize;
use serde_json::json;

use crate::error::AppError;
use crate::models::Flash;
use crate::services::{attendance, roster};
use crate::session::CurrentUser;
use crate::state::AppState;
use crate::web::{error_redirect, flash_redirect};

const STUDENT_FIELD_PREFIX: &str = "student_";

fn today() -> String {
    Local::now().date_naive().format(attendance::DATE_FORMAT).to_string()
}

/// Pulls the date and the `student_<id>` radio fields out of the submitted
/// form. Other fields are ignored; a `student_` field without a numeric id is
/// rejected.
pub fn parse_mark_form(
    mut fields: HashMap<String, String>,
) -> Result<(String, HashMap<i64, String>), AppError> {
    let date = fields.remove("date").unwrap_or_default();

    let mut marks = HashMap::new();
    for (key, value) in fields {
        let Some(raw_id) = key.strip_prefix(STUDENT_FIELD_PREFIX) else {
            continue;
        };
        let id = raw_id
            .parse::<i64>()
            .map_err(|_| AppError::Validation(format!("unknown student field {}", key)))?;
        marks.insert(id, value);
    }

    Ok((date, marks))
}

pub async fn home(State(state): State<AppState>, user: CurrentUser) -> Response {
    let mut flash = user.take_flash(&state).await;
    let stats = match attendance::stats(&state.db).await {
        Ok(stats) => Some(stats),
        Err(e) => {
            flash = Some(Flash::error(e.user_message()));
            None
        }
    };

    state.views.page(
        StatusCode::OK,
        "attendance",
        Some(user.username()),
        flash,
        json!({ "stats": stats, "today": today() }),
    )
}

pub async fn mark_form(State(state): State<AppState>, user: CurrentUser) -> Response {
    let mut flash = user.take_flash(&state).await;
    let students = match roster::list_students(&state.db).await {
        Ok(students) => students,
        Err(e) => {
            flash = Some(Flash::error(e.user_message()));
            Vec::new()
        }
    };

    state.views.page(
        StatusCode::OK,
        "mark_attendance",
        Some(user.username()),
        flash,
        json!({ "students": students, "today": today() }),
    )
}

pub async fn mark_submit(
    State(state): State<AppState>,
    user: CurrentUser,
    Form(fields): Form<HashMap<String, String>>,
) -> Response {
    let result = match parse_mark_form(fields) {
        Ok((date, marks)) => attendance::mark_attendance(&state.db, &date, &marks).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(summary) => {
            let msg = format!("Attendance marked for {}", summary.date);
            flash_redirect(&state, &user, Flash::success(msg), "/attendance").await
        }
        Err(e) => error_redirect(&state, &user, e, "/mark_attendance").await,
    }
}

#[derive(Debug, Deserialize)]
pub struct DateQuery {
    #[serde(default)]
    date: String,
}

/// Target of the date picker on the attendance page.
pub async fn pick_date(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<DateQuery>,
) -> Response {
    match attendance::parse_date(&query.date) {
        Ok(date) => Redirect::to(&format!("/view_attendance/{}", date)).into_response(),
        Err(e) => error_redirect(&state, &user, e, "/attendance").await,
    }
}

pub async fn view(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(date): Path<String>,
) -> Response {
    match attendance::attendance_on(&state.db, &date).await {
        Ok((date, records)) => {
            let flash = user.take_flash(&state).await;
            state.views.page(
                StatusCode::OK,
                "view_attendance",
                Some(user.username()),
                flash,
                json!({ "date": date, "records": records }),
            )
        }
        Err(e) => error_redirect(&state, &user, e, "/attendance").await,
    }
}

pub async fn report(State(state): State<AppState>, user: CurrentUser) -> Response {
    let mut flash = user.take_flash(&state).await;
    let report = match attendance::report(&state.db).await {
        Ok(report) => report,
        Err(e) => {
            flash = Some(Flash::error(e.user_message()));
            Vec::new()
        }
    };

    state.views.page(
        StatusCode::OK,
        "report",
        Some(user.username()),
        flash,
        json!({ "report": report }),
    )
}

pub async fn dates(State(state): State<AppState>, user: CurrentUser) -> Response {
    let mut flash = user.take_flash(&state).await;
    let dates = match attendance::dates(&state.db).await {
        Ok(dates) => dates,
        Err(e) => {
            flash = Some(Flash::error(e.user_message()));
            Vec::new()
        }
    };

    state.views.page(
        StatusCode::OK,
        "attendance_dates",
        Some(user.username()),
        flash,
        json!({ "dates": dates }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn reads_date_and_student_fields() {
        let (date, marks) = parse_mark_form(fields(&[
            ("date", "2024-01-10"),
            ("student_1", "present"),
            ("student_2", "absent"),
            ("csrf", "ignored"),
        ]))
        .unwrap();
        assert_eq!(date, "2024-01-10");
        assert_eq!(marks.len(), 2);
        assert_eq!(marks[&1], "present");
        assert_eq!(marks[&2], "absent");
    }

    #[test]
    fn rejects_non_numeric_student_keys() {
        let err = parse_mark_form(fields(&[("date", "2024-01-10"), ("student_x", "present")]))
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn missing_date_is_empty() {
        let (date, marks) = parse_mark_form(fields(&[])).unwrap();
        assert!(date.is_empty());
        assert!(marks.is_empty());
    }
}
