use crate::auth::auth::AuthUser;
use crate::model::attendance::Attendance;
use crate::service::attendance::{AttendanceService, CheckInError, CheckInRequest};
use crate::storage::AttendanceFilter;
use actix_web::{HttpResponse, Responder, web};
use serde::Serialize;
use serde_json::json;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct AttendanceListResponse {
    pub data: Vec<Attendance>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub per_page: u32,
    #[schema(example = 1)]
    pub total: i64,
}

/// Check-in endpoint
#[utoipa::path(
    post,
    path = "/api/v1/attendance/check-in",
    request_body(
        content = CheckInRequest,
        description = "Geolocation captured by the client at check-in time",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Checked in successfully", body = Object, example = json!({
            "message": "Checked in successfully"
        })),
        (status = 400, description = "Already checked in today", body = Object, example = json!({
            "message": "Already checked in today"
        })),
        (status = 422, description = "Missing or non-numeric fields", body = Object, example = json!({
            "message": "Missing or non-numeric fields",
            "fields": ["latitude"]
        })),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_in(
    auth: AuthUser,
    service: web::Data<AttendanceService>,
    payload: web::Json<CheckInRequest>,
) -> actix_web::Result<impl Responder> {
    match service.check_in(auth.user_id, &payload).await {
        Ok(record) => Ok(HttpResponse::Created().json(json!({
            "message": "Checked in successfully",
            "data": record
        }))),

        Err(CheckInError::AlreadyCheckedIn) => Ok(HttpResponse::BadRequest().json(json!({
            "message": "Already checked in today"
        }))),

        Err(CheckInError::Validation(fields)) => {
            Ok(HttpResponse::UnprocessableEntity().json(json!({
                "message": "Missing or non-numeric fields",
                "fields": fields
            })))
        }

        Err(CheckInError::Repository(e)) => {
            tracing::error!(error = %e, user_id = auth.user_id, "Check-in failed");
            Err(actix_web::error::ErrorInternalServerError(
                "Internal Server Error",
            ))
        }
    }
}

/// Today's record for the caller
#[utoipa::path(
    get,
    path = "/api/v1/attendance/today",
    responses(
        (status = 200, description = "Today's attendance record", body = Attendance),
        (status = 404, description = "No check-in recorded today", body = Object, example = json!({
            "message": "No check-in recorded today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn today(
    auth: AuthUser,
    service: web::Data<AttendanceService>,
) -> actix_web::Result<impl Responder> {
    let record = service.today(auth.user_id).await.map_err(|e| {
        tracing::error!(error = %e, user_id = auth.user_id, "Failed to fetch today's attendance");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    match record {
        Some(data) => Ok(HttpResponse::Ok().json(data)),
        None => Ok(HttpResponse::NotFound().json(json!({
            "message": "No check-in recorded today"
        }))),
    }
}

/// Attendance listing (admin)
#[utoipa::path(
    get,
    path = "/api/v1/attendance",
    params(AttendanceFilter),
    responses(
        (status = 200, description = "Paginated attendance list", body = AttendanceListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn list_attendance(
    auth: AuthUser,
    service: web::Data<AttendanceService>,
    query: web::Query<AttendanceFilter>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let (page, per_page) = query.pagination();

    let (records, total) = service.list(&query).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to list attendance");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(AttendanceListResponse {
        data: records,
        page: page as u32,
        per_page: per_page as u32,
        total,
    }))
}
