use actix_web::{App, test, web};
use serde_json::{Value, json};
use sqlx::SqlitePool;

use crate::api::{attendance, payroll};
use crate::config::Config;
use crate::db;
use crate::utils::clock;

const LAT: f64 = -6.2088;
const LNG: f64 = 106.8456;

// Deterministic schedule inputs: a start this late can never mark LATE, an
// end of midnight can never mark EARLY_LEAVE, so lifecycle assertions don't
// depend on when the test runs.
fn never_late() -> Value {
    json!({ "work_start_time": "23:59", "late_threshold": 0 })
}

fn never_early() -> Value {
    json!({ "work_end_time": "00:00" })
}

async fn seed_outlet(pool: &SqlitePool, id: &str, lat: f64, lng: f64, radius: i64, rate: f64) {
    sqlx::query(
        r#"
        INSERT INTO outlets
            (id, name, latitude, longitude, radius, daily_rate,
             work_start_time, work_end_time, is_active, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, '09:00', '17:00', 1, '2026-01-01 00:00:00', '2026-01-01 00:00:00')
        "#,
    )
    .bind(id)
    .bind(format!("Outlet {id}"))
    .bind(lat)
    .bind(lng)
    .bind(radius)
    .bind(rate)
    .execute(pool)
    .await
    .unwrap();
}

async fn seed_employee(pool: &SqlitePool, id: &str, code: &str, outlet_id: Option<&str>) {
    sqlx::query(
        r#"
        INSERT INTO employees
            (id, employee_code, name, email, position, outlet_id,
             is_active, created_at, updated_at)
        VALUES (?, ?, ?, ?, 'Staff', ?, 1, '2026-01-01 00:00:00', '2026-01-01 00:00:00')
        "#,
    )
    .bind(id)
    .bind(code)
    .bind(format!("Employee {code}"))
    .bind(format!("{code}@test.local"))
    .bind(outlet_id)
    .execute(pool)
    .await
    .unwrap();
}

async fn seed_attendance(
    pool: &SqlitePool,
    id: &str,
    employee_id: &str,
    date: &str,
    status: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO attendance
            (id, employee_id, date, clock_in, status, created_at, updated_at)
        VALUES (?, ?, ?, '09:00:00', ?, '2026-01-01 00:00:00', '2026-01-01 00:00:00')
        "#,
    )
    .bind(id)
    .bind(employee_id)
    .bind(date)
    .bind(status)
    .execute(pool)
    .await
    .map(|_| ())
}

macro_rules! clock_app {
    ($pool:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($pool.clone()))
                .app_data(web::Data::new(Config::for_tests()))
                .route(
                    "/attendance/clock-in",
                    web::post().to(attendance::clock_in),
                )
                .route(
                    "/attendance/clock-out",
                    web::post().to(attendance::clock_out),
                )
                .route("/attendance/today", web::get().to(attendance::today)),
        )
        .await
    };
}

#[actix_web::test]
async fn clock_in_then_out_lifecycle() {
    let pool = db::memory_pool().await;
    seed_employee(&pool, "e1", "EMP-001", None).await;
    let app = clock_app!(pool);

    // clock in
    let req = test::TestRequest::post()
        .uri("/attendance/clock-in")
        .set_json(json!({ "employee_id": "e1", "settings": never_late() }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "PRESENT");
    assert!(!body["clock_in"].is_null());
    assert!(body["clock_out"].is_null());

    // double clock-in is a conflict
    let req = test::TestRequest::post()
        .uri("/attendance/clock-in")
        .set_json(json!({ "employee_id": "e1", "settings": never_late() }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Already clocked in today");

    // clock out
    let req = test::TestRequest::post()
        .uri("/attendance/clock-out")
        .set_json(json!({ "employee_id": "e1", "settings": never_early() }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "PRESENT");
    assert!(!body["clock_out"].is_null());

    // double clock-out is a conflict
    let req = test::TestRequest::post()
        .uri("/attendance/clock-out")
        .set_json(json!({ "employee_id": "e1", "settings": never_early() }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Already clocked out today");
}

#[actix_web::test]
async fn clock_out_without_clock_in_is_not_found() {
    let pool = db::memory_pool().await;
    seed_employee(&pool, "e1", "EMP-001", None).await;
    let app = clock_app!(pool);

    let req = test::TestRequest::post()
        .uri("/attendance/clock-out")
        .set_json(json!({ "employee_id": "e1" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "No clock in record found for today");
}

#[actix_web::test]
async fn unknown_employee_is_not_found() {
    let pool = db::memory_pool().await;
    let app = clock_app!(pool);

    let req = test::TestRequest::post()
        .uri("/attendance/clock-in")
        .set_json(json!({ "employee_id": "ghost" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}

#[actix_web::test]
async fn assigned_outlet_geofence_blocks_and_admits() {
    let pool = db::memory_pool().await;
    seed_outlet(&pool, "o1", LAT, LNG, 100, 0.0).await;
    seed_employee(&pool, "e1", "EMP-001", Some("o1")).await;
    let app = clock_app!(pool);

    // ~155m north of the outlet: blocked, with measurements in the body
    let req = test::TestRequest::post()
        .uri("/attendance/clock-in")
        .set_json(json!({
            "employee_id": "e1",
            "location": { "lat": LAT + 0.0014, "lng": LNG },
            "settings": never_late()
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 403);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["distance"].as_i64().unwrap() > 100);
    assert_eq!(body["radius"], 100);
    assert_eq!(body["outlet"], "Outlet o1");

    // ~55m away: admitted, attendance pinned to the assigned outlet
    let req = test::TestRequest::post()
        .uri("/attendance/clock-in")
        .set_json(json!({
            "employee_id": "e1",
            "location": { "lat": LAT + 0.0005, "lng": LNG },
            "settings": never_late()
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["outlet_id"], "o1");
    assert_eq!(body["status"], "PRESENT");
}

#[actix_web::test]
async fn missing_location_skips_geofencing() {
    let pool = db::memory_pool().await;
    seed_outlet(&pool, "o1", LAT, LNG, 100, 0.0).await;
    seed_employee(&pool, "e1", "EMP-001", Some("o1")).await;
    let app = clock_app!(pool);

    let req = test::TestRequest::post()
        .uri("/attendance/clock-in")
        .set_json(json!({ "employee_id": "e1", "settings": never_late() }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
    let body: Value = test::read_body_json(resp).await;
    // no location, no outlet match, no violation
    assert!(body["outlet_id"].is_null());
    assert!(body["clock_in_location"].is_null());
}

#[actix_web::test]
async fn unassigned_employee_matches_the_nearest_outlet_in_range() {
    let pool = db::memory_pool().await;
    seed_outlet(&pool, "near", LAT + 0.0003, LNG, 200, 0.0).await;
    seed_outlet(&pool, "far", LAT + 0.0010, LNG, 200, 0.0).await;
    seed_employee(&pool, "e1", "EMP-001", None).await;
    let app = clock_app!(pool);

    let req = test::TestRequest::post()
        .uri("/attendance/clock-in")
        .set_json(json!({
            "employee_id": "e1",
            "location": { "lat": LAT, "lng": LNG },
            "settings": never_late()
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["outlet_id"], "near");
    assert_eq!(body["outlet_name"], "Outlet near");
}

#[actix_web::test]
async fn no_outlet_in_range_still_clocks_in() {
    let pool = db::memory_pool().await;
    seed_outlet(&pool, "o1", LAT + 1.0, LNG, 100, 0.0).await;
    seed_employee(&pool, "e1", "EMP-001", None).await;
    let app = clock_app!(pool);

    let req = test::TestRequest::post()
        .uri("/attendance/clock-in")
        .set_json(json!({
            "employee_id": "e1",
            "location": { "lat": LAT, "lng": LNG },
            "settings": never_late()
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["outlet_id"].is_null());
}

#[actix_web::test]
async fn today_endpoint_returns_the_record_or_null() {
    let pool = db::memory_pool().await;
    seed_employee(&pool, "e1", "EMP-001", None).await;
    let app = clock_app!(pool);

    let req = test::TestRequest::get()
        .uri("/attendance/today?employee_id=e1")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert!(body.is_null());

    let req = test::TestRequest::post()
        .uri("/attendance/clock-in")
        .set_json(json!({ "employee_id": "e1", "settings": never_late() }))
        .to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::get()
        .uri("/attendance/today?employee_id=e1")
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["employee_id"], "e1");
    assert_eq!(body["date"], clock::today_string(7));
}

#[actix_web::test]
async fn storage_enforces_one_row_per_employee_and_date() {
    let pool = db::memory_pool().await;
    seed_employee(&pool, "e1", "EMP-001", None).await;

    seed_attendance(&pool, "a1", "e1", "2026-02-14", "PRESENT")
        .await
        .unwrap();

    // the interleaved-writer case the application pre-check cannot exclude
    let err = seed_attendance(&pool, "a2", "e1", "2026-02-14", "PRESENT")
        .await
        .unwrap_err();
    match err {
        sqlx::Error::Database(db_err) => assert!(db_err.is_unique_violation()),
        other => panic!("expected unique violation, got {other:?}"),
    }
}

#[actix_web::test]
async fn payroll_counts_worked_days_and_splits_incentives() {
    let pool = db::memory_pool().await;
    seed_outlet(&pool, "o1", LAT, LNG, 100, 100_000.0).await;
    seed_employee(&pool, "e1", "EMP-001", Some("o1")).await;
    seed_employee(&pool, "e2", "EMP-002", None).await;

    // in range: leap-year February edges included; ABSENT never counts
    seed_attendance(&pool, "a1", "e1", "2024-02-01", "PRESENT").await.unwrap();
    seed_attendance(&pool, "a2", "e1", "2024-02-15", "LATE").await.unwrap();
    seed_attendance(&pool, "a3", "e1", "2024-02-29", "EARLY_LEAVE").await.unwrap();
    seed_attendance(&pool, "a4", "e1", "2024-02-10", "ABSENT").await.unwrap();
    // out of range
    seed_attendance(&pool, "a5", "e1", "2024-03-01", "PRESENT").await.unwrap();
    seed_attendance(&pool, "a6", "e1", "2024-01-31", "PRESENT").await.unwrap();

    sqlx::query(
        r#"
        INSERT INTO payroll_incentives (id, employee_id, month, name, amount, type, created_at)
        VALUES
            ('i1', 'e1', '2024-02', 'Bonus', 50000, 'ADDITION', '2024-02-01 00:00:00'),
            ('i2', 'e1', '2024-02', 'Kasbon', 120000, 'DEDUCTION', '2024-02-01 00:00:00'),
            ('i3', 'e2', '2024-02', 'Kasbon', 75000, 'DEDUCTION', '2024-02-01 00:00:00'),
            ('i4', 'e1', '2024-03', 'Bonus', 99999, 'ADDITION', '2024-03-01 00:00:00')
        "#,
    )
    .execute(&pool)
    .await
    .unwrap();

    let mut rows = payroll::compute_monthly_payroll(&pool, "2024-02", None)
        .await
        .unwrap();
    rows.sort_by(|a, b| a.employee_code.cmp(&b.employee_code));
    assert_eq!(rows.len(), 2);

    let e1 = &rows[0];
    assert_eq!(e1.present_days, 3);
    assert_eq!(e1.basic_salary, 300_000.0);
    assert_eq!(e1.additions, 50_000.0);
    assert_eq!(e1.deductions, 120_000.0);
    assert_eq!(e1.total_pay, 230_000.0);
    assert_eq!(e1.incentives.len(), 2);
    assert_eq!(e1.outlet_name.as_deref(), Some("Outlet o1"));

    // zero attendance, no outlet: empty but present row, and the deduction
    // pushes the total negative with no floor
    let e2 = &rows[1];
    assert_eq!(e2.present_days, 0);
    assert_eq!(e2.basic_salary, 0.0);
    assert_eq!(e2.total_pay, -75_000.0);
}

#[actix_web::test]
async fn payroll_outlet_filter_narrows_the_roster() {
    let pool = db::memory_pool().await;
    seed_outlet(&pool, "o1", LAT, LNG, 100, 50_000.0).await;
    seed_employee(&pool, "e1", "EMP-001", Some("o1")).await;
    seed_employee(&pool, "e2", "EMP-002", None).await;

    let rows = payroll::compute_monthly_payroll(&pool, "2026-01", Some("o1"))
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].employee_code, "EMP-001");
}

#[actix_web::test]
async fn inactive_employees_are_excluded_from_payroll() {
    let pool = db::memory_pool().await;
    seed_employee(&pool, "e1", "EMP-001", None).await;
    sqlx::query("UPDATE employees SET is_active = 0 WHERE id = 'e1'")
        .execute(&pool)
        .await
        .unwrap();

    let rows = payroll::compute_monthly_payroll(&pool, "2026-01", None)
        .await
        .unwrap();
    assert!(rows.is_empty());
}
