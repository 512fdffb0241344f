use std::fmt;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::model::attendance::{Attendance, NewAttendance};

pub mod memory;
pub mod mysql;

#[derive(Debug, Clone)]
pub enum RepositoryError {
    /// The per-day uniqueness key rejected the write
    Duplicate,
    Database(String),
}

impl fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepositoryError::Duplicate => write!(f, "attendance record already exists"),
            RepositoryError::Database(msg) => write!(f, "database error: {}", msg),
        }
    }
}

impl std::error::Error for RepositoryError {}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        // Duplicate key on (user_id, date)
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some("23000") {
                return RepositoryError::Duplicate;
            }
        }
        RepositoryError::Database(err.to_string())
    }
}

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct AttendanceFilter {
    /// Restrict to a single user
    #[param(example = 42)]
    pub user_id: Option<u64>,
    /// Restrict to a single calendar date
    #[param(example = "2026-08-04", value_type = String)]
    #[schema(example = "2026-08-04", value_type = String)]
    pub date: Option<NaiveDate>,
    /// Pagination page number (start with 1)
    #[param(example = 1)]
    pub page: Option<u64>,
    /// Items per page
    #[param(example = 10)]
    pub per_page: Option<u64>,
}

impl AttendanceFilter {
    pub fn pagination(&self) -> (u64, u64) {
        let per_page = self.per_page.unwrap_or(10).min(100);
        let page = self.page.unwrap_or(1).max(1);
        (page, per_page)
    }
}

#[async_trait]
pub trait AttendanceRepository: Send + Sync {
    /// Record for (user, date), if one exists.
    async fn find_for_date(
        &self,
        user_id: u64,
        date: NaiveDate,
    ) -> Result<Option<Attendance>, RepositoryError>;

    /// Insert a new record. A second record for the same (user, date) must
    /// fail with `RepositoryError::Duplicate`.
    async fn insert(&self, record: NewAttendance) -> Result<Attendance, RepositoryError>;

    /// Filtered page of records plus the total match count.
    async fn list(
        &self,
        filter: &AttendanceFilter,
    ) -> Result<(Vec<Attendance>, i64), RepositoryError>;
}
