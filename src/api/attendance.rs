use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::error::ApiError;
use crate::face::matcher::{self, MIN_MATCH_SCORE};
use crate::geofence;
use crate::model::attendance::{Attendance, AttendanceDetail};
use crate::model::employee::Employee;
use crate::model::outlet::{Outlet, Shift};
use crate::schedule;
use crate::utils::clock;
use crate::utils::roster_cache;

#[derive(Debug, Deserialize, ToSchema)]
pub struct GeoLocation {
    #[schema(example = -6.2088)]
    pub lat: f64,
    #[schema(example = 106.8456)]
    pub lng: f64,
}

/// Caller-supplied schedule defaults; the lowest-but-one precedence tier.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ClockSettings {
    pub work_start_time: Option<String>,
    pub work_end_time: Option<String>,
    pub late_threshold: Option<u32>,
}

#[derive(Deserialize, ToSchema)]
pub struct ClockRequest {
    pub employee_id: String,
    /// Absent when GPS acquisition failed; geofencing is skipped then.
    pub location: Option<GeoLocation>,
    pub settings: Option<ClockSettings>,
}

#[derive(Deserialize, IntoParams)]
pub struct TodayQuery {
    pub employee_id: Option<String>,
}

#[derive(Deserialize, IntoParams)]
pub struct AttendanceQuery {
    pub date: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub employee_id: Option<String>,
}

#[derive(Deserialize, IntoParams)]
pub struct ReportQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub department_id: Option<String>,
    pub outlet_id: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct IdentifyRequest {
    /// Live embedding in any supported serialized shape.
    #[schema(value_type = Object)]
    pub descriptor: serde_json::Value,
    pub min_score: Option<u8>,
}

const DETAIL_SELECT: &str = r#"
    SELECT a.id, a.employee_id, a.outlet_id, a.date, a.clock_in, a.clock_out,
           a.clock_in_location, a.clock_out_location, a.status, a.notes,
           e.name AS employee_name, e.employee_code,
           d.name AS department_name, o.name AS outlet_name
    FROM attendance a
    JOIN employees e ON e.id = a.employee_id
    LEFT JOIN departments d ON d.id = e.department_id
    LEFT JOIN outlets o ON o.id = a.outlet_id
"#;

async fn fetch_employee(pool: &SqlitePool, id: &str) -> Result<Employee, ApiError> {
    sqlx::query_as::<_, Employee>("SELECT * FROM employees WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("Employee not found".into()))
}

async fn fetch_outlet(pool: &SqlitePool, id: &str) -> Result<Option<Outlet>, ApiError> {
    Ok(sqlx::query_as::<_, Outlet>("SELECT * FROM outlets WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?)
}

async fn fetch_shift(pool: &SqlitePool, id: &str) -> Result<Option<Shift>, ApiError> {
    Ok(sqlx::query_as::<_, Shift>("SELECT * FROM shifts WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?)
}

async fn fetch_detail(pool: &SqlitePool, attendance_id: &str) -> Result<AttendanceDetail, ApiError> {
    let sql = format!("{DETAIL_SELECT} WHERE a.id = ?");
    sqlx::query_as::<_, AttendanceDetail>(&sql)
        .bind(attendance_id)
        .fetch_optional(pool)
        .await?
        .ok_or(ApiError::Internal)
}

/// Clock in with GPS validation. An assigned outlet out of range blocks the
/// operation; without an assignment the nearest in-range active outlet is
/// matched (none is fine); without a location geofencing is skipped.
#[utoipa::path(
    post,
    path = "/api/v1/attendance/clock-in",
    request_body = ClockRequest,
    responses(
        (status = 201, description = "Clocked in", body = AttendanceDetail),
        (status = 400, description = "Already clocked in today"),
        (status = 403, description = "Outside the outlet geofence", body = Object, example = json!({
            "error": "You are 150m away from Outlet Kemang. Maximum allowed: 100m.",
            "distance": 150, "outlet": "Outlet Kemang", "radius": 100
        })),
        (status = 404, description = "Employee not found")
    ),
    tag = "Attendance"
)]
pub async fn clock_in(
    pool: web::Data<SqlitePool>,
    config: web::Data<Config>,
    payload: web::Json<ClockRequest>,
) -> Result<HttpResponse, ApiError> {
    let offset = config.tz_offset_hours;
    let today = clock::today_string(offset);
    let now = clock::local_now(offset);

    let employee = fetch_employee(&pool, &payload.employee_id).await?;

    let existing = sqlx::query_as::<_, Attendance>(
        "SELECT * FROM attendance WHERE employee_id = ? AND date = ?",
    )
    .bind(&employee.id)
    .bind(&today)
    .fetch_optional(pool.get_ref())
    .await?;

    if let Some(a) = &existing {
        if a.clock_in.is_some() {
            return Err(ApiError::Conflict("Already clocked in today".into()));
        }
    }

    let assigned_outlet = match &employee.outlet_id {
        Some(id) => fetch_outlet(&pool, id).await?,
        None => None,
    };
    let shift = match &employee.shift_id {
        Some(id) => fetch_shift(&pool, id).await?,
        None => None,
    };

    let mut matched_outlet_id: Option<String> = None;
    let mut location_str: Option<String> = None;

    if let Some(location) = &payload.location {
        location_str = Some(format!("{},{}", location.lat, location.lng));

        if let Some(outlet) = &assigned_outlet {
            // assigned outlet: out of range blocks the clock-in entirely
            geofence::check_within_radius(location.lat, location.lng, outlet)?;
            matched_outlet_id = Some(outlet.id.clone());
        } else {
            let outlets =
                sqlx::query_as::<_, Outlet>("SELECT * FROM outlets WHERE is_active = 1")
                    .fetch_all(pool.get_ref())
                    .await?;
            matched_outlet_id = geofence::nearest_in_range(location.lat, location.lng, &outlets)
                .map(|(outlet, _)| outlet.id.clone());
        }
    }

    // schedule source is the outlet matched above, not the assignment
    let schedule_outlet = match &matched_outlet_id {
        Some(id) => fetch_outlet(&pool, id).await?,
        None => None,
    };

    let settings = payload.settings.as_ref();
    let start = schedule::resolve_schedule_time(
        shift.as_ref().map(|s| s.start_time.as_str()),
        schedule_outlet.as_ref().map(|o| o.work_start_time.as_str()),
        settings.and_then(|s| s.work_start_time.as_deref()),
        schedule::DEFAULT_WORK_START,
    );
    let threshold = settings
        .and_then(|s| s.late_threshold)
        .unwrap_or(schedule::DEFAULT_LATE_THRESHOLD_MIN);
    let status = schedule::clock_in_status(start, threshold, now.time());

    let current_time = clock::time_string(offset);
    let stamp = clock::timestamp_string(offset);

    let attendance_id = match existing {
        Some(a) => {
            // a clock-in-less row (e.g. seeded absence) gets filled in place
            let updated = sqlx::query(
                r#"
                UPDATE attendance
                SET clock_in = ?, clock_in_location = ?, outlet_id = ?, status = ?, updated_at = ?
                WHERE id = ? AND clock_in IS NULL
                "#,
            )
            .bind(&current_time)
            .bind(&location_str)
            .bind(&matched_outlet_id)
            .bind(status.to_string())
            .bind(&stamp)
            .bind(&a.id)
            .execute(pool.get_ref())
            .await?;

            if updated.rows_affected() == 0 {
                return Err(ApiError::Conflict("Already clocked in today".into()));
            }
            a.id
        }
        None => {
            let id = Uuid::new_v4().to_string();
            let result = sqlx::query(
                r#"
                INSERT INTO attendance
                    (id, employee_id, outlet_id, date, clock_in, clock_in_location, status, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&id)
            .bind(&employee.id)
            .bind(&matched_outlet_id)
            .bind(&today)
            .bind(&current_time)
            .bind(&location_str)
            .bind(status.to_string())
            .bind(&stamp)
            .bind(&stamp)
            .execute(pool.get_ref())
            .await;

            match result {
                Ok(_) => id,
                Err(e) => {
                    // two terminals racing the same employee: the unique
                    // constraint decides, the loser sees the usual conflict
                    if let sqlx::Error::Database(db_err) = &e {
                        if db_err.is_unique_violation() {
                            return Err(ApiError::Conflict("Already clocked in today".into()));
                        }
                    }
                    tracing::error!(error = %e, employee_id = %employee.id, "clock-in insert failed");
                    return Err(ApiError::Internal);
                }
            }
        }
    };

    tracing::info!(
        employee_id = %employee.id,
        status = %status,
        outlet_id = ?matched_outlet_id,
        "clock-in recorded"
    );

    let detail = fetch_detail(&pool, &attendance_id).await?;
    Ok(HttpResponse::Created().json(detail))
}

/// Clock out. Geofence runs against the outlet used at clock-in, falling
/// back to the employee's assignment; the status may become EARLY_LEAVE,
/// otherwise the clock-in status stands.
#[utoipa::path(
    post,
    path = "/api/v1/attendance/clock-out",
    request_body = ClockRequest,
    responses(
        (status = 200, description = "Clocked out", body = AttendanceDetail),
        (status = 400, description = "Already clocked out today"),
        (status = 403, description = "Outside the outlet geofence"),
        (status = 404, description = "Employee or today's clock-in not found")
    ),
    tag = "Attendance"
)]
pub async fn clock_out(
    pool: web::Data<SqlitePool>,
    config: web::Data<Config>,
    payload: web::Json<ClockRequest>,
) -> Result<HttpResponse, ApiError> {
    let offset = config.tz_offset_hours;
    let today = clock::today_string(offset);
    let now = clock::local_now(offset);

    let employee = fetch_employee(&pool, &payload.employee_id).await?;

    let attendance = sqlx::query_as::<_, Attendance>(
        "SELECT * FROM attendance WHERE employee_id = ? AND date = ?",
    )
    .bind(&employee.id)
    .bind(&today)
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or_else(|| ApiError::NotFound("No clock in record found for today".into()))?;

    if attendance.clock_out.is_some() {
        return Err(ApiError::Conflict("Already clocked out today".into()));
    }

    // the outlet recorded at clock-in wins; assignment is the fallback
    let check_outlet = match attendance.outlet_id.as_ref().or(employee.outlet_id.as_ref()) {
        Some(id) => fetch_outlet(&pool, id).await?,
        None => None,
    };

    let mut location_str: Option<String> = None;
    if let Some(location) = &payload.location {
        location_str = Some(format!("{},{}", location.lat, location.lng));
        if let Some(outlet) = &check_outlet {
            geofence::check_within_radius(location.lat, location.lng, outlet)?;
        }
    }

    let shift = match &employee.shift_id {
        Some(id) => fetch_shift(&pool, id).await?,
        None => None,
    };

    let settings = payload.settings.as_ref();
    let end = schedule::resolve_schedule_time(
        shift.as_ref().map(|s| s.end_time.as_str()),
        check_outlet.as_ref().map(|o| o.work_end_time.as_str()),
        settings.and_then(|s| s.work_end_time.as_deref()),
        schedule::DEFAULT_WORK_END,
    );
    let status = schedule::clock_out_status(end, now.time(), attendance.status());

    let updated = sqlx::query(
        r#"
        UPDATE attendance
        SET clock_out = ?, clock_out_location = ?, status = ?, updated_at = ?
        WHERE id = ? AND clock_out IS NULL
        "#,
    )
    .bind(clock::time_string(offset))
    .bind(&location_str)
    .bind(status.to_string())
    .bind(clock::timestamp_string(offset))
    .bind(&attendance.id)
    .execute(pool.get_ref())
    .await?;

    if updated.rows_affected() == 0 {
        return Err(ApiError::Conflict("Already clocked out today".into()));
    }

    tracing::info!(employee_id = %employee.id, status = %status, "clock-out recorded");

    let detail = fetch_detail(&pool, &attendance.id).await?;
    Ok(HttpResponse::Ok().json(detail))
}

/// Today's attendance: one record for an employee, or everyone's.
#[utoipa::path(
    get,
    path = "/api/v1/attendance/today",
    params(TodayQuery),
    responses(
        (status = 200, description = "Today's record(s); null when the employee has none")
    ),
    tag = "Attendance"
)]
pub async fn today(
    pool: web::Data<SqlitePool>,
    config: web::Data<Config>,
    query: web::Query<TodayQuery>,
) -> Result<HttpResponse, ApiError> {
    let today = clock::today_string(config.tz_offset_hours);

    if let Some(employee_id) = &query.employee_id {
        let sql = format!("{DETAIL_SELECT} WHERE a.employee_id = ? AND a.date = ?");
        let detail = sqlx::query_as::<_, AttendanceDetail>(&sql)
            .bind(employee_id)
            .bind(&today)
            .fetch_optional(pool.get_ref())
            .await?;
        return Ok(HttpResponse::Ok().json(detail));
    }

    let sql = format!("{DETAIL_SELECT} WHERE a.date = ? ORDER BY a.clock_in ASC");
    let rows = sqlx::query_as::<_, AttendanceDetail>(&sql)
        .bind(&today)
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(rows))
}

/// Attendance list with date/range/employee filters (admin).
#[utoipa::path(
    get,
    path = "/api/v1/attendance",
    params(AttendanceQuery),
    responses((status = 200, description = "Filtered attendance rows")),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn list(
    _auth: AuthUser,
    pool: web::Data<SqlitePool>,
    query: web::Query<AttendanceQuery>,
) -> Result<HttpResponse, ApiError> {
    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<String> = Vec::new();

    if let Some(date) = &query.date {
        where_sql.push_str(" AND a.date = ?");
        args.push(date.clone());
    } else if let (Some(start), Some(end)) = (&query.start_date, &query.end_date) {
        where_sql.push_str(" AND a.date >= ? AND a.date <= ?");
        args.push(start.clone());
        args.push(end.clone());
    }

    if let Some(employee_id) = &query.employee_id {
        where_sql.push_str(" AND a.employee_id = ?");
        args.push(employee_id.clone());
    }

    let sql = format!("{DETAIL_SELECT}{where_sql} ORDER BY a.created_at DESC");
    let mut q = sqlx::query_as::<_, AttendanceDetail>(&sql);
    for arg in &args {
        q = q.bind(arg);
    }

    let rows = q.fetch_all(pool.get_ref()).await?;
    Ok(HttpResponse::Ok().json(rows))
}

/// Attendance report across a range, optionally narrowed to one department
/// or outlet assignment (admin).
#[utoipa::path(
    get,
    path = "/api/v1/attendance/report",
    params(ReportQuery),
    responses((status = 200, description = "Report rows, newest date first")),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn report(
    _auth: AuthUser,
    pool: web::Data<SqlitePool>,
    query: web::Query<ReportQuery>,
) -> Result<HttpResponse, ApiError> {
    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<String> = Vec::new();

    if let (Some(start), Some(end)) = (&query.start_date, &query.end_date) {
        where_sql.push_str(" AND a.date >= ? AND a.date <= ?");
        args.push(start.clone());
        args.push(end.clone());
    }

    if let Some(department_id) = query.department_id.as_deref().filter(|d| *d != "all") {
        where_sql.push_str(" AND e.department_id = ?");
        args.push(department_id.to_string());
    }

    if let Some(outlet_id) = query.outlet_id.as_deref().filter(|o| *o != "all") {
        where_sql.push_str(" AND e.outlet_id = ?");
        args.push(outlet_id.to_string());
    }

    let sql = format!("{DETAIL_SELECT}{where_sql} ORDER BY a.date DESC, a.clock_in ASC");
    let mut q = sqlx::query_as::<_, AttendanceDetail>(&sql);
    for arg in &args {
        q = q.bind(arg);
    }

    let rows = q.fetch_all(pool.get_ref()).await?;
    Ok(HttpResponse::Ok().json(rows))
}

/// One-shot identification of a live descriptor against the registered
/// roster. A null match means nobody scored high enough — the terminal
/// prompts a re-scan rather than guessing.
#[utoipa::path(
    post,
    path = "/api/v1/attendance/identify",
    request_body = IdentifyRequest,
    responses(
        (status = 200, description = "Best match or null", body = Object, example = json!({
            "match": { "employee_id": "ckw9x0001", "name": "Budi Santoso", "score": 87 }
        })),
        (status = 400, description = "Descriptor not decodable")
    ),
    tag = "Attendance"
)]
pub async fn identify(
    pool: web::Data<SqlitePool>,
    payload: web::Json<IdentifyRequest>,
) -> Result<HttpResponse, ApiError> {
    let live = crate::face::descriptor::normalize(&payload.descriptor)
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let roster = roster_cache::roster(pool.get_ref()).await?;
    let min_score = payload.min_score.unwrap_or(MIN_MATCH_SCORE);
    let best = matcher::best_match(&live, &roster, min_score);

    Ok(HttpResponse::Ok().json(json!({ "match": best })))
}
