use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Student {
    pub id: i64,
    pub name: String,
    pub age: i64,
    pub course: String,
}

/// Raw add/edit form input, exactly as submitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StudentForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub middle_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub age: String,
    #[serde(default)]
    pub course: String,
}

/// A validated student, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStudent {
    pub name: String,
    pub age: i64,
    pub course: String,
}
