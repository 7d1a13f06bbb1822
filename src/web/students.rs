use axum::{
    Form,
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};
use serde_json::json;

use crate::error::AppError;
use crate::models::{Flash, Student, StudentForm};
use crate::services::roster;
use crate::session::CurrentUser;
use crate::state::AppState;
use crate::web::{error_redirect, flash_redirect};

/// Splits a stored full name back into form fields: first word, last word and
/// whatever sits between them.
fn form_from_student(student: &Student) -> StudentForm {
    let parts: Vec<&str> = student.name.split_whitespace().collect();
    let (first, middle, last) = match parts.as_slice() {
        [] => ("", String::new(), ""),
        [only] => (*only, String::new(), ""),
        [first, middle @ .., last] => (*first, middle.join(" "), *last),
    };

    StudentForm {
        first_name: first.to_string(),
        middle_name: middle,
        last_name: last.to_string(),
        age: student.age.to_string(),
        course: student.course.clone(),
    }
}

fn render_form(
    state: &AppState,
    user: &CurrentUser,
    code: StatusCode,
    action: &str,
    heading: &str,
    form: &StudentForm,
    flash: Option<Flash>,
) -> Response {
    state.views.page(
        code,
        "student_form",
        Some(user.username()),
        flash,
        json!({ "action": action, "heading": heading, "form": form }),
    )
}

pub async fn index(State(state): State<AppState>, user: CurrentUser) -> Response {
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
        "index",
        Some(user.username()),
        flash,
        json!({ "students": students }),
    )
}

pub async fn add_form(State(state): State<AppState>, user: CurrentUser) -> Response {
    let flash = user.take_flash(&state).await;
    render_form(&state, &user, StatusCode::OK, "/add", "Add student", &StudentForm::default(), flash)
}

pub async fn add_submit(
    State(state): State<AppState>,
    user: CurrentUser,
    Form(form): Form<StudentForm>,
) -> Response {
    match roster::add_student(&state.db, &form).await {
        Ok(_) => flash_redirect(&state, &user, Flash::success("Student added successfully!"), "/").await,
        Err(e) => {
            let flash = Some(Flash::error(e.user_message()));
            render_form(&state, &user, e.status(), "/add", "Add student", &form, flash)
        }
    }
}

pub async fn edit_form(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Response {
    match roster::get_student(&state.db, id).await {
        Ok(student) => {
            let flash = user.take_flash(&state).await;
            let action = format!("/edit/{}", id);
            render_form(&state, &user, StatusCode::OK, &action, "Edit student", &form_from_student(&student), flash)
        }
        Err(e) => error_redirect(&state, &user, e, "/").await,
    }
}

pub async fn edit_submit(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Form(form): Form<StudentForm>,
) -> Response {
    match roster::update_student(&state.db, id, &form).await {
        Ok(_) => flash_redirect(&state, &user, Flash::success("Student updated successfully!"), "/").await,
        Err(AppError::NotFound) => error_redirect(&state, &user, AppError::NotFound, "/").await,
        Err(e) => {
            let flash = Some(Flash::error(e.user_message()));
            let action = format!("/edit/{}", id);
            render_form(&state, &user, e.status(), &action, "Edit student", &form, flash)
        }
    }
}

pub async fn delete(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Response {
    match roster::delete_student(&state.db, id).await {
        Ok(student) => {
            let msg = format!("Student {} deleted successfully!", student.name);
            flash_redirect(&state, &user, Flash::success(msg), "/").await
        }
        Err(e) => error_redirect(&state, &user, e, "/").await,
    }
}
