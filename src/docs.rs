use crate::api::attendance::AttendanceListResponse;
use crate::model::attendance::Attendance;
use crate::service::attendance::CheckInRequest;
use crate::storage::AttendanceFilter;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Absensi API",
        version = "1.0.0",
        description = r#"
## Geolocation Attendance (Absensi) Service

Records one geolocation-stamped attendance check-in per user per day.

### 🔹 Key Features
- **Check-in**
  - One check-in per calendar day, stamped with coordinates and distance
- **Attendance queries**
  - Own record for today, admin listing with filters and pagination

### 🔐 Security
All attendance endpoints require **JWT Bearer authentication**.
The listing endpoint is restricted to the **Admin** role.

### 📦 Response Format
- JSON-based RESTful responses
- Pagination supported for the listing endpoint

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::attendance::check_in,
        crate::api::attendance::today,
        crate::api::attendance::list_attendance,
    ),
    components(
        schemas(
            CheckInRequest,
            Attendance,
            AttendanceListResponse,
            AttendanceFilter
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Attendance", description = "Geolocation attendance APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
