#![allow(dead_code)]

use std::str::FromStr;

use rollbook::models::{Student, StudentForm};
use rollbook::services::roster;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

/// A fresh migrated in-memory database. One connection only, so every query
/// sees the same database.
pub async fn test_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("Failed to parse options")
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .expect("Failed to create database");

    rollbook::db::migrate(&pool)
        .await
        .expect("Failed to run migrations");

    pool
}

pub fn student_form(first: &str, last: &str, age: &str, course: &str) -> StudentForm {
    StudentForm {
        first_name: first.to_string(),
        middle_name: String::new(),
        last_name: last.to_string(),
        age: age.to_string(),
        course: course.to_string(),
    }
}

pub async fn add(pool: &SqlitePool, first: &str, last: &str) -> Student {
    roster::add_student(pool, &student_form(first, last, "20", "CS"))
        .await
        .expect("Failed to add student")
}

pub async fn count(pool: &SqlitePool, table: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(pool)
        .await
        .expect("Failed to count rows")
}
