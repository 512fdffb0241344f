use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The only status this flow ever records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "user_id": 42,
        "check_in": "2026-08-04T08:15:00",
        "latitude": -6.2,
        "longitude": 106.8,
        "jarak": 12.5,
        "status": "present"
    })
)]
pub struct Attendance {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = 42)]
    pub user_id: u64,

    #[schema(example = "2026-08-04T08:15:00", value_type = String, format = "date-time")]
    pub check_in: NaiveDateTime,

    #[schema(example = json!(-6.2))]
    pub latitude: f64,

    #[schema(example = 106.8)]
    pub longitude: f64,

    /// Distance in meters from the expected check-in location
    #[schema(example = 12.5)]
    pub jarak: f64,

    #[schema(example = "present")]
    pub status: String,
}

/// Insert payload; the id is assigned by the store.
#[derive(Debug, Clone)]
pub struct NewAttendance {
    pub user_id: u64,
    pub check_in: NaiveDateTime,
    pub latitude: f64,
    pub longitude: f64,
    pub jarak: f64,
    pub status: AttendanceStatus,
}
