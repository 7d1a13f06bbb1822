use sqlx::SqliteExecutor;

use crate::models::{AttendanceRecord, AttendanceStatus, NewStudent, Student};

pub async fn fetch_students<'e, E: SqliteExecutor<'e>>(db: E) -> Result<Vec<Student>, sqlx::Error> {
    sqlx::query_as::<_, Student>(
        "SELECT id, name, age, course FROM students ORDER BY name, id"
    )
    .fetch_all(db)
    .await
}

pub async fn fetch_student_ids<'e, E: SqliteExecutor<'e>>(db: E) -> Result<Vec<i64>, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT id FROM students ORDER BY id")
        .fetch_all(db)
        .await
}

pub async fn find_student_by_id<'e, E: SqliteExecutor<'e>>(
    db: E,
    id: i64,
) -> Result<Option<Student>, sqlx::Error> {
    sqlx::query_as::<_, Student>(
        "SELECT id, name, age, course FROM students WHERE id = ?"
    )
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn insert_student<'e, E: SqliteExecutor<'e>>(
    db: E,
    student: &NewStudent,
) -> Result<Student, sqlx::Error> {
    let id = sqlx::query(
        "INSERT INTO students (name, age, course) VALUES (?1, ?2, ?3)"
    )
    .bind(&student.name)
    .bind(student.age)
    .bind(&student.course)
    .execute(db)
    .await?
    .last_insert_rowid();

    Ok(Student {
        id,
        name: student.name.clone(),
        age: student.age,
        course: student.course.clone(),
    })
}

/// Overwrites name, age and course. Returns false when no row has `id`.
pub async fn update_student<'e, E: SqliteExecutor<'e>>(
    db: E,
    id: i64,
    student: &NewStudent,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE students SET name = ?1, age = ?2, course = ?3 WHERE id = ?4"
    )
    .bind(&student.name)
    .bind(student.age)
    .bind(&student.course)
    .bind(id)
    .execute(db)
    .await?
    .rows_affected();

    Ok(result > 0)
}

pub async fn delete_student<'e, E: SqliteExecutor<'e>>(db: E, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM students WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?
        .rows_affected();

    Ok(result > 0)
}

pub async fn delete_attendance_for_student<'e, E: SqliteExecutor<'e>>(
    db: E,
    student_id: i64,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM attendance WHERE student_id = ?")
        .bind(student_id)
        .execute(db)
        .await?;

    Ok(result.rows_affected())
}

pub async fn fetch_ledger<'e, E: SqliteExecutor<'e>>(db: E) -> Result<Vec<AttendanceRecord>, sqlx::Error> {
    sqlx::query_as::<_, AttendanceRecord>(
        "SELECT id, student_id, date, status FROM attendance ORDER BY date, student_id"
    )
    .fetch_all(db)
    .await
}

pub async fn fetch_records_for_student<'e, E: SqliteExecutor<'e>>(
    db: E,
    student_id: i64,
) -> Result<Vec<AttendanceRecord>, sqlx::Error> {
    sqlx::query_as::<_, AttendanceRecord>(
        "SELECT id, student_id, date, status FROM attendance WHERE student_id = ? ORDER BY date"
    )
    .bind(student_id)
    .fetch_all(db)
    .await
}

/// Inserts the (student, date) mark or overwrites the status of the existing one.
pub async fn upsert_attendance<'e, E: SqliteExecutor<'e>>(
    db: E,
    student_id: i64,
    date: &str,
    status: AttendanceStatus,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO attendance (student_id, date, status)
        VALUES (?1, ?2, ?3)
        ON CONFLICT(student_id, date) DO UPDATE SET status = excluded.status
        "#
    )
    .bind(student_id)
    .bind(date)
    .bind(status)
    .execute(db)
    .await?;

    Ok(())
}
