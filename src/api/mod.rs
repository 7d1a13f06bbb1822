mod extract;

use axum::Json;
use axum::routing::get;
use axum::{Router, extract::State};

use crate::error::AppError;
use crate::models::{MarkAttendanceRequest, Student};
use crate::services::attendance::{self, DateSummary, DayEntry, GlobalStats, MarkSummary, StudentReport};
use crate::services::roster;
use crate::session::ApiUser;
use crate::state::AppState;

pub use extract::{ApiJson, ApiPath};

#[derive(serde::Serialize)]
struct DayView {
    date: String,
    records: Vec<DayEntry>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/students", get(list_students))
        .route("/students/{id}", get(get_student))
        .route("/attendance", axum::routing::post(mark_attendance))
        .route("/attendance/stats", get(stats))
        .route("/attendance/dates", get(dates))
        .route("/attendance/{date}", get(attendance_on))
        .route("/report", get(report))
}

async fn list_students(
    State(state): State<AppState>,
    _user: ApiUser,
) -> Result<Json<Vec<Student>>, AppError> {
    let students = roster::list_students(&state.db).await?;
    Ok(Json(students))
}

async fn get_student(
    State(state): State<AppState>,
    _user: ApiUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Student>, AppError> {
    let student = roster::get_student(&state.db, id).await?;
    Ok(Json(student))
}

async fn mark_attendance(
    State(state): State<AppState>,
    _user: ApiUser,
    ApiJson(req): ApiJson<MarkAttendanceRequest>,
) -> Result<Json<MarkSummary>, AppError> {
    let summary = attendance::mark_attendance(&state.db, &req.date, &req.marks).await?;
    Ok(Json(summary))
}

async fn stats(State(state): State<AppState>, _user: ApiUser) -> Result<Json<GlobalStats>, AppError> {
    Ok(Json(attendance::stats(&state.db).await?))
}

async fn dates(
    State(state): State<AppState>,
    _user: ApiUser,
) -> Result<Json<Vec<DateSummary>>, AppError> {
    Ok(Json(attendance::dates(&state.db).await?))
}

async fn attendance_on(
    State(state): State<AppState>,
    _user: ApiUser,
    ApiPath(date): ApiPath<String>,
) -> Result<Json<DayView>, AppError> {
    let (date, records) = attendance::attendance_on(&state.db, &date).await?;
    Ok(Json(DayView { date, records }))
}

async fn report(
    State(state): State<AppState>,
    _user: ApiUser,
) -> Result<Json<Vec<StudentReport>>, AppError> {
    Ok(Json(attendance::report(&state.db).await?))
}
