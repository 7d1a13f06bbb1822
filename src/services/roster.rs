use sqlx::SqlitePool;
use tracing::info;

use crate::db::repository;
use crate::error::AppError;
use crate::models::{NewStudent, Student, StudentForm};

pub const MIN_AGE: i64 = 1;
pub const MAX_AGE: i64 = 150;

/// Checks the raw form and builds the full name. The first failing check wins:
/// names, then age, then course.
pub fn validate_student(form: &StudentForm) -> Result<NewStudent, AppError> {
    let first = form.first_name.trim();
    let middle = form.middle_name.trim();
    let last = form.last_name.trim();
    let course = form.course.trim();

    if first.is_empty() || last.is_empty() {
        return Err(AppError::validation("name required"));
    }

    let age = parse_age(&form.age).ok_or_else(|| AppError::validation("invalid age"))?;

    if course.is_empty() {
        return Err(AppError::validation("course required"));
    }

    let name = [first, middle, last]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    Ok(NewStudent {
        name,
        age,
        course: course.to_string(),
    })
}

/// Digits only, no sign or embedded whitespace.
fn parse_age(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse::<i64>()
        .ok()
        .filter(|age| (MIN_AGE..=MAX_AGE).contains(age))
}

pub async fn list_students(db: &SqlitePool) -> Result<Vec<Student>, AppError> {
    Ok(repository::fetch_students(db).await?)
}

pub async fn get_student(db: &SqlitePool, id: i64) -> Result<Student, AppError> {
    repository::find_student_by_id(db, id)
        .await?
        .ok_or(AppError::NotFound)
}

pub async fn add_student(db: &SqlitePool, form: &StudentForm) -> Result<Student, AppError> {
    let new_student = validate_student(form)?;

    let mut tx = db.begin().await?;
    let student = repository::insert_student(&mut *tx, &new_student).await?;
    tx.commit().await?;

    info!("added student {} ({})", student.id, student.name);
    Ok(student)
}

pub async fn update_student(
    db: &SqlitePool,
    id: i64,
    form: &StudentForm,
) -> Result<Student, AppError> {
    let new_student = validate_student(form)?;

    let mut tx = db.begin().await?;
    if !repository::update_student(&mut *tx, id, &new_student).await? {
        return Err(AppError::NotFound);
    }
    tx.commit().await?;

    info!("updated student {}", id);
    Ok(Student {
        id,
        name: new_student.name,
        age: new_student.age,
        course: new_student.course,
    })
}

/// Removes the student and every attendance row it owns, or nothing at all.
pub async fn delete_student(db: &SqlitePool, id: i64) -> Result<Student, AppError> {
    let mut tx = db.begin().await?;

    let student = repository::find_student_by_id(&mut *tx, id)
        .await?
        .ok_or(AppError::NotFound)?;

    let removed = repository::delete_attendance_for_student(&mut *tx, id).await?;
    if !repository::delete_student(&mut *tx, id).await? {
        return Err(AppError::NotFound);
    }
    tx.commit().await?;

    info!("deleted student {} and {} attendance records", id, removed);
    Ok(student)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(first: &str, middle: &str, last: &str, age: &str, course: &str) -> StudentForm {
        StudentForm {
            first_name: first.to_string(),
            middle_name: middle.to_string(),
            last_name: last.to_string(),
            age: age.to_string(),
            course: course.to_string(),
        }
    }

    fn message(err: AppError) -> String {
        match err {
            AppError::Validation(msg) => msg,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn joins_name_parts_and_skips_empty_middle() {
        let s = validate_student(&form(" Ada ", "", "Lovelace", "36", "Maths")).unwrap();
        assert_eq!(s.name, "Ada Lovelace");
        assert_eq!(s.age, 36);
        assert_eq!(s.course, "Maths");

        let s = validate_student(&form("Mary", "Ann", "Evans", "1", " Lit ")).unwrap();
        assert_eq!(s.name, "Mary Ann Evans");
        assert_eq!(s.course, "Lit");
    }

    #[test]
    fn rejects_missing_names() {
        let err = validate_student(&form("Ada", "B", "  ", "20", "Maths")).unwrap_err();
        assert_eq!(message(err), "name required");
        let err = validate_student(&form("", "", "Lovelace", "20", "Maths")).unwrap_err();
        assert_eq!(message(err), "name required");
    }

    #[test]
    fn age_bounds() {
        for bad in ["0", "151", "-3", "+4", "12.5", "abc", "", "99999999999999999999"] {
            let err = validate_student(&form("A", "", "B", bad, "C")).unwrap_err();
            assert_eq!(message(err), "invalid age", "age {:?}", bad);
        }
        for good in ["1", "150", " 42 "] {
            assert!(validate_student(&form("A", "", "B", good, "C")).is_ok(), "age {:?}", good);
        }
    }

    #[test]
    fn rejects_blank_course() {
        let err = validate_student(&form("A", "", "B", "20", "   ")).unwrap_err();
        assert_eq!(message(err), "course required");
    }

    #[test]
    fn name_checked_before_age() {
        let err = validate_student(&form("", "", "", "0", "")).unwrap_err();
        assert_eq!(message(err), "name required");
    }
}
