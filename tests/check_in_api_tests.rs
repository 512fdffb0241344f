use std::sync::Arc;

use absensi::api::attendance;
use absensi::auth::jwt::generate_access_token;
use absensi::config::Config;
use absensi::service::attendance::AttendanceService;
use absensi::storage::memory::InMemoryAttendanceRepository;
use actix_web::http::StatusCode;
use actix_web::{App, test, web};
use serde_json::{Value, json};

fn test_config() -> Config {
    Config {
        server_addr: "127.0.0.1:0".into(),
        database_url: String::new(),
        jwt_secret: "test-secret".into(),
        access_token_ttl: 900,
        refresh_token_ttl: 604800,
        rate_login_per_min: 60,
        rate_register_per_min: 30,
        rate_refresh_per_min: 30,
        rate_protected_per_min: 1000,
        api_prefix: "/api/v1".into(),
    }
}

macro_rules! attendance_app {
    ($config:expr, $service:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($config.clone()))
                .app_data(web::Data::new($service.clone()))
                .service(
                    web::scope("/attendance")
                        .service(
                            web::resource("").route(web::get().to(attendance::list_attendance)),
                        )
                        .service(
                            web::resource("/check-in").route(web::post().to(attendance::check_in)),
                        )
                        .service(web::resource("/today").route(web::get().to(attendance::today))),
                ),
        )
    };
}

fn bearer(config: &Config, user_id: u64, username: &str, role: u8) -> (&'static str, String) {
    let token = generate_access_token(
        user_id,
        username.to_string(),
        role,
        &config.jwt_secret,
        config.access_token_ttl,
    );
    ("Authorization", format!("Bearer {}", token))
}

#[actix_web::test]
async fn check_in_returns_created_then_bad_request() {
    let config = test_config();
    let service = AttendanceService::new(Arc::new(InMemoryAttendanceRepository::new()));
    let app = attendance_app!(config, service).await;

    let req = test::TestRequest::post()
        .uri("/attendance/check-in")
        .insert_header(bearer(&config, 42, "budi", 2))
        .set_json(json!({"latitude": -6.2, "longitude": 106.8, "jarak": 12.5}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Checked in successfully");
    assert_eq!(body["data"]["user_id"], 42);
    assert_eq!(body["data"]["status"], "present");

    // Second attempt the same day
    let req = test::TestRequest::post()
        .uri("/attendance/check-in")
        .insert_header(bearer(&config, 42, "budi", 2))
        .set_json(json!({"latitude": -6.2, "longitude": 106.8, "jarak": 12.5}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Already checked in today");
}

#[actix_web::test]
async fn invalid_payload_returns_unprocessable_entity() {
    let config = test_config();
    let service = AttendanceService::new(Arc::new(InMemoryAttendanceRepository::new()));
    let app = attendance_app!(config, service).await;

    let req = test::TestRequest::post()
        .uri("/attendance/check-in")
        .insert_header(bearer(&config, 42, "budi", 2))
        .set_json(json!({"latitude": "office", "longitude": 106.8}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body: Value = test::read_body_json(resp).await;
    let fields: Vec<&str> = body["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f.as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["latitude", "jarak"]);
}

#[actix_web::test]
async fn missing_token_is_unauthorized() {
    let config = test_config();
    let service = AttendanceService::new(Arc::new(InMemoryAttendanceRepository::new()));
    let app = attendance_app!(config, service).await;

    let req = test::TestRequest::post()
        .uri("/attendance/check-in")
        .set_json(json!({"latitude": -6.2, "longitude": 106.8, "jarak": 12.5}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn today_reports_not_found_then_found() {
    let config = test_config();
    let service = AttendanceService::new(Arc::new(InMemoryAttendanceRepository::new()));
    let app = attendance_app!(config, service).await;

    let req = test::TestRequest::get()
        .uri("/attendance/today")
        .insert_header(bearer(&config, 42, "budi", 2))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::post()
        .uri("/attendance/check-in")
        .insert_header(bearer(&config, 42, "budi", 2))
        .set_json(json!({"latitude": -6.2, "longitude": 106.8, "jarak": 12.5}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let req = test::TestRequest::get()
        .uri("/attendance/today")
        .insert_header(bearer(&config, 42, "budi", 2))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["user_id"], 42);
    assert_eq!(body["status"], "present");
}

#[actix_web::test]
async fn listing_requires_admin_role() {
    let config = test_config();
    let service = AttendanceService::new(Arc::new(InMemoryAttendanceRepository::new()));
    let app = attendance_app!(config, service).await;

    let req = test::TestRequest::get()
        .uri("/attendance")
        .insert_header(bearer(&config, 42, "budi", 2))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::get()
        .uri("/attendance")
        .insert_header(bearer(&config, 1, "admin", 1))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["total"], 0);
    assert_eq!(body["page"], 1);
}
