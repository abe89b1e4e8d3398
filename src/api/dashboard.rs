use actix_web::{HttpResponse, web};
use chrono::Duration;
use serde::Serialize;
use sqlx::SqlitePool;
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::error::ApiError;
use crate::model::attendance::{AttendanceDetail, AttendanceStatus};
use crate::utils::clock;

#[derive(Serialize, ToSchema)]
pub struct DayBreakdown {
    pub date: String,
    pub present: i64,
    pub late: i64,
    pub absent: i64,
}

#[derive(Serialize, ToSchema)]
pub struct DepartmentHeadcount {
    pub name: String,
    pub count: i64,
}

#[derive(Serialize, ToSchema)]
pub struct DashboardStats {
    pub total_employees: i64,
    pub present_today: i64,
    pub late_today: i64,
    pub absent_today: i64,
    pub recent_attendance: Vec<AttendanceDetail>,
    pub weekly_data: Vec<DayBreakdown>,
    pub department_breakdown: Vec<DepartmentHeadcount>,
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

async fn day_counts(
    pool: &SqlitePool,
    date: &str,
    total_employees: i64,
) -> Result<DayBreakdown, ApiError> {
    let rows = sqlx::query_as::<_, (String, i64)>(
        "SELECT status, COUNT(*) FROM attendance WHERE date = ? GROUP BY status",
    )
    .bind(date)
    .fetch_all(pool)
    .await?;

    let mut present = 0;
    let mut late = 0;
    let mut attended = 0;
    for (status, count) in rows {
        attended += count;
        match status.as_str() {
            s if s == AttendanceStatus::Present.to_string() => present = count,
            s if s == AttendanceStatus::Late.to_string() => late = count,
            _ => {}
        }
    }

    Ok(DayBreakdown {
        date: date.to_string(),
        present,
        late,
        absent: (total_employees - attended).max(0),
    })
}

/// Admin dashboard statistics: today's headline numbers, the most recent
/// clock events, a 7-day series and per-department headcounts.
#[utoipa::path(
    get,
    path = "/api/v1/dashboard",
    responses((status = 200, body = DashboardStats)),
    security(("bearer_auth" = [])),
    tag = "Dashboard"
)]
pub async fn dashboard(
    _auth: AuthUser,
    pool: web::Data<SqlitePool>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    let offset = config.tz_offset_hours;
    let today = clock::today_string(offset);

    let total_employees =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM employees WHERE is_active = 1")
            .fetch_one(pool.get_ref())
            .await?;

    let today_counts = day_counts(pool.get_ref(), &today, total_employees).await?;

    let sql = format!("{DETAIL_SELECT} ORDER BY a.created_at DESC LIMIT 10");
    let recent_attendance = sqlx::query_as::<_, AttendanceDetail>(&sql)
        .fetch_all(pool.get_ref())
        .await?;

    let now = clock::local_now(offset);
    let mut weekly_data = Vec::with_capacity(7);
    for days_ago in (0..7).rev() {
        let date = (now - Duration::days(days_ago)).format("%Y-%m-%d").to_string();
        weekly_data.push(day_counts(pool.get_ref(), &date, total_employees).await?);
    }

    let department_breakdown = sqlx::query_as::<_, (String, i64)>(
        r#"
        SELECT d.name, COUNT(e.id)
        FROM departments d
        LEFT JOIN employees e ON e.department_id = d.id
        GROUP BY d.id
        ORDER BY d.name ASC
        "#,
    )
    .fetch_all(pool.get_ref())
    .await?
    .into_iter()
    .map(|(name, count)| DepartmentHeadcount { name, count })
    .collect();

    Ok(HttpResponse::Ok().json(DashboardStats {
        total_employees,
        present_today: today_counts.present,
        late_today: today_counts.late,
        absent_today: today_counts.absent,
        recent_attendance,
        weekly_data,
        department_breakdown,
    }))
}
