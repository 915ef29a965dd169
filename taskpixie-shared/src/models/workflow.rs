/// Priority and status enumerations shared by projects and tasks
///
/// Both enums are stored as PostgreSQL enum types and travel over the wire
/// with the exact strings below.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE priority_level AS ENUM ('Low', 'High', 'Urgent');
/// CREATE TYPE work_status AS ENUM ('To Do', 'In Progress', 'Completed', 'Canceled');
/// ```

use serde::{Deserialize, Serialize};

/// How urgent a project or task is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "priority_level")]
pub enum Priority {
    Low,
    High,
    Urgent,
}

impl Priority {
    /// Wire and database representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::High => "High",
            Priority::Urgent => "Urgent",
        }
    }
}

/// Where a project or task is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "work_status")]
pub enum Status {
    #[serde(rename = "To Do")]
    #[sqlx(rename = "To Do")]
    ToDo,

    #[serde(rename = "In Progress")]
    #[sqlx(rename = "In Progress")]
    InProgress,

    Completed,

    Canceled,
}

impl Status {
    /// Wire and database representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::ToDo => "To Do",
            Status::InProgress => "In Progress",
            Status::Completed => "Completed",
            Status::Canceled => "Canceled",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
