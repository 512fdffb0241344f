use std::fmt;
use std::sync::Arc;

use chrono::Local;
use serde::Deserialize;
use serde_json::Value;
use utoipa::ToSchema;

use crate::model::attendance::{Attendance, AttendanceStatus, NewAttendance};
use crate::storage::{AttendanceFilter, AttendanceRepository, RepositoryError};

/// Check-in payload as received from the client. Coordinates arrive as raw
/// JSON values because mobile clients send both numbers and numeric strings;
/// what counts as numeric is decided here, not by deserialization.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CheckInRequest {
    #[schema(example = json!(-6.2), value_type = f64)]
    #[serde(default)]
    pub latitude: Option<Value>,

    #[schema(example = 106.8, value_type = f64)]
    #[serde(default)]
    pub longitude: Option<Value>,

    /// Distance in meters from the expected check-in location
    #[schema(example = 12.5, value_type = f64)]
    #[serde(default)]
    pub jarak: Option<Value>,
}

fn as_numeric(value: &Option<Value>) -> Option<f64> {
    match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

impl CheckInRequest {
    fn numeric_fields(&self) -> Result<(f64, f64, f64), CheckInError> {
        let latitude = as_numeric(&self.latitude);
        let longitude = as_numeric(&self.longitude);
        let jarak = as_numeric(&self.jarak);

        let mut invalid = Vec::new();
        if latitude.is_none() {
            invalid.push("latitude");
        }
        if longitude.is_none() {
            invalid.push("longitude");
        }
        if jarak.is_none() {
            invalid.push("jarak");
        }

        match (latitude, longitude, jarak) {
            (Some(latitude), Some(longitude), Some(jarak)) => Ok((latitude, longitude, jarak)),
            _ => Err(CheckInError::Validation(invalid)),
        }
    }
}

#[derive(Debug, Clone)]
pub enum CheckInError {
    /// A record for (user, today) already exists
    AlreadyCheckedIn,
    /// Required fields missing or non-numeric
    Validation(Vec<&'static str>),
    /// Storage failure, surfaced as-is, never retried
    Repository(RepositoryError),
}

impl fmt::Display for CheckInError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckInError::AlreadyCheckedIn => write!(f, "already checked in today"),
            CheckInError::Validation(fields) => {
                write!(f, "missing or non-numeric fields: {}", fields.join(", "))
            }
            CheckInError::Repository(e) => write!(f, "storage failure: {}", e),
        }
    }
}

impl std::error::Error for CheckInError {}

impl From<RepositoryError> for CheckInError {
    fn from(err: RepositoryError) -> Self {
        match err {
            // A lost race on the per-day key is still a duplicate check-in
            RepositoryError::Duplicate => CheckInError::AlreadyCheckedIn,
            other => CheckInError::Repository(other),
        }
    }
}

/// Enforces the one-check-in-per-day rule over an explicit repository seam.
#[derive(Clone)]
pub struct AttendanceService {
    repo: Arc<dyn AttendanceRepository>,
}

impl AttendanceService {
    pub fn new(repo: Arc<dyn AttendanceRepository>) -> Self {
        Self { repo }
    }

    /// Record today's attendance for `user_id`.
    ///
    /// The duplicate check runs before field validation, so a client retrying
    /// with a broken payload after a successful check-in still learns it
    /// already checked in today.
    pub async fn check_in(
        &self,
        user_id: u64,
        request: &CheckInRequest,
    ) -> Result<Attendance, CheckInError> {
        let now = Local::now().naive_local();
        let today = now.date();

        if self.repo.find_for_date(user_id, today).await?.is_some() {
            return Err(CheckInError::AlreadyCheckedIn);
        }

        let (latitude, longitude, jarak) = request.numeric_fields()?;

        let record = self
            .repo
            .insert(NewAttendance {
                user_id,
                check_in: now,
                latitude,
                longitude,
                jarak,
                status: AttendanceStatus::Present,
            })
            .await?;

        Ok(record)
    }

    /// The caller's record for the current date, if any.
    pub async fn today(&self, user_id: u64) -> Result<Option<Attendance>, CheckInError> {
        let today = Local::now().date_naive();
        Ok(self.repo.find_for_date(user_id, today).await?)
    }

    pub async fn list(
        &self,
        filter: &AttendanceFilter,
    ) -> Result<(Vec<Attendance>, i64), CheckInError> {
        Ok(self.repo.list(filter).await?)
    }
}
