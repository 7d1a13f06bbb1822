mod common;

use std::collections::HashMap;

use common::{add, count, student_form, test_pool};
use rollbook::AppError;
use rollbook::models::StudentForm;
use rollbook::services::{attendance, roster};

#[tokio::test]
async fn add_then_fetch_returns_joined_name() {
    let pool = test_pool().await;

    let form = StudentForm {
        first_name: "Mary".to_string(),
        middle_name: "Ann".to_string(),
        last_name: "Evans".to_string(),
        age: "19".to_string(),
        course: "Literature".to_string(),
    };
    let created = roster::add_student(&pool, &form).await.unwrap();
    let fetched = roster::get_student(&pool, created.id).await.unwrap();

    assert_eq!(fetched.name, "Mary Ann Evans");
    assert_eq!(fetched.age, 19);
    assert_eq!(fetched.course, "Literature");
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn invalid_students_are_not_stored() {
    let pool = test_pool().await;

    for form in [
        student_form("Ada", "Lovelace", "0", "Maths"),
        student_form("Ada", "Lovelace", "151", "Maths"),
        student_form("Ada", "", "30", "Maths"),
        student_form("Ada", "Lovelace", "30", " "),
    ] {
        let err = roster::add_student(&pool, &form).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)), "{:?}", err);
    }

    assert_eq!(count(&pool, "students").await, 0);
}

#[tokio::test]
async fn list_is_ordered_by_name() {
    let pool = test_pool().await;
    add(&pool, "Carol", "Zed").await;
    add(&pool, "Alice", "Young").await;
    add(&pool, "Bob", "Xu").await;

    let names: Vec<String> = roster::list_students(&pool)
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.name)
        .collect();
    assert_eq!(names, vec!["Alice Young", "Bob Xu", "Carol Zed"]);
}

#[tokio::test]
async fn edit_replaces_every_field() {
    let pool = test_pool().await;
    let student = add(&pool, "Alan", "Turing").await;

    let updated = roster::update_student(
        &pool,
        student.id,
        &student_form("Alonzo", "Church", "40", "Logic"),
    )
    .await
    .unwrap();
    assert_eq!(updated.name, "Alonzo Church");

    let fetched = roster::get_student(&pool, student.id).await.unwrap();
    assert_eq!(fetched.name, "Alonzo Church");
    assert_eq!(fetched.age, 40);
    assert_eq!(fetched.course, "Logic");
}

#[tokio::test]
async fn edit_validation_leaves_row_untouched() {
    let pool = test_pool().await;
    let student = add(&pool, "Alan", "Turing").await;

    let err = roster::update_student(&pool, student.id, &student_form("Alan", "Turing", "200", "CS"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(ref m) if m == "invalid age"));

    let fetched = roster::get_student(&pool, student.id).await.unwrap();
    assert_eq!(fetched, student);
}

#[tokio::test]
async fn missing_students_are_not_found() {
    let pool = test_pool().await;

    assert!(matches!(roster::get_student(&pool, 42).await, Err(AppError::NotFound)));
    assert!(matches!(
        roster::update_student(&pool, 42, &student_form("A", "B", "20", "C")).await,
        Err(AppError::NotFound)
    ));
    assert!(matches!(roster::delete_student(&pool, 42).await, Err(AppError::NotFound)));
}

#[tokio::test]
async fn failed_delete_keeps_student_and_records() {
    let pool = test_pool().await;
    let alice = add(&pool, "Alice", "Adams").await;
    let marks = HashMap::from([(alice.id, "present".to_string())]);
    attendance::mark_attendance(&pool, "2024-01-10", &marks).await.unwrap();

    sqlx::query(
        "CREATE TRIGGER keep_students BEFORE DELETE ON students \
         BEGIN SELECT RAISE(ABORT, 'rejected'); END",
    )
    .execute(&pool)
    .await
    .unwrap();

    let err = roster::delete_student(&pool, alice.id).await.unwrap_err();
    assert!(matches!(err, AppError::Database(_)));
    assert_eq!(count(&pool, "students").await, 1);
    assert_eq!(count(&pool, "attendance").await, 1);
}
