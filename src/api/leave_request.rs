use std::str::FromStr;

use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::error::ApiError;
use crate::model::leave_request::{LeaveRequestDetail, LeaveStatus, LeaveType};
use crate::utils::clock;

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    pub employee_id: String,
    #[serde(rename = "type")]
    #[schema(example = "SAKIT")]
    pub leave_type: String,
    #[schema(example = "2026-03-02")]
    pub start_date: String,
    #[schema(example = "2026-03-04")]
    pub end_date: String,
    pub reason: String,
    pub evidence: Option<String>,
    pub evidence_name: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct ProcessLeave {
    #[schema(example = "APPROVED")]
    pub status: String,
    pub admin_notes: Option<String>,
}

const DETAIL_SELECT: &str = r#"
    SELECT l.id, l.employee_id, l.type, l.start_date, l.end_date, l.reason,
           l.evidence, l.evidence_name, l.status, l.admin_notes, l.created_at,
           e.name AS employee_name, e.employee_code, e.position
    FROM leave_requests l
    JOIN employees e ON e.id = l.employee_id
"#;

async fn fetch_detail(pool: &SqlitePool, id: &str) -> Result<LeaveRequestDetail, ApiError> {
    let sql = format!("{DETAIL_SELECT} WHERE l.id = ?");
    sqlx::query_as::<_, LeaveRequestDetail>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("Leave request not found".into()))
}

/// All leave requests, newest first (admin).
#[utoipa::path(
    get,
    path = "/api/v1/leave-requests",
    responses((status = 200, description = "Leave requests", body = [LeaveRequestDetail])),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn list_leave_requests(
    _auth: AuthUser,
    pool: web::Data<SqlitePool>,
) -> Result<HttpResponse, ApiError> {
    let sql = format!("{DETAIL_SELECT} ORDER BY l.created_at DESC");
    let rows = sqlx::query_as::<_, LeaveRequestDetail>(&sql)
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(rows))
}

/// Submit a leave request; it starts PENDING.
#[utoipa::path(
    post,
    path = "/api/v1/leave-requests",
    request_body = CreateLeave,
    responses(
        (status = 201, description = "Submitted", body = LeaveRequestDetail),
        (status = 400, description = "Missing fields or invalid type/dates"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Leave"
)]
pub async fn create_leave_request(
    pool: web::Data<SqlitePool>,
    config: web::Data<Config>,
    payload: web::Json<CreateLeave>,
) -> Result<HttpResponse, ApiError> {
    if payload.reason.trim().is_empty()
        || payload.start_date.is_empty()
        || payload.end_date.is_empty()
    {
        return Err(ApiError::Validation("Missing required fields".into()));
    }

    let leave_type = LeaveType::from_str(&payload.leave_type)
        .map_err(|_| ApiError::Validation("Type must be IZIN or SAKIT".into()))?;

    if payload.start_date > payload.end_date {
        return Err(ApiError::Validation(
            "start_date cannot be after end_date".into(),
        ));
    }

    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM employees WHERE id = ? LIMIT 1)",
    )
    .bind(&payload.employee_id)
    .fetch_one(pool.get_ref())
    .await?;
    if !exists {
        return Err(ApiError::NotFound("Employee not found".into()));
    }

    let id = Uuid::new_v4().to_string();
    let stamp = clock::timestamp_string(config.tz_offset_hours);

    sqlx::query(
        r#"
        INSERT INTO leave_requests
            (id, employee_id, type, start_date, end_date, reason,
             evidence, evidence_name, status, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&payload.employee_id)
    .bind(leave_type.to_string())
    .bind(&payload.start_date)
    .bind(&payload.end_date)
    .bind(payload.reason.trim())
    .bind(&payload.evidence)
    .bind(&payload.evidence_name)
    .bind(LeaveStatus::Pending.to_string())
    .bind(&stamp)
    .bind(&stamp)
    .execute(pool.get_ref())
    .await?;

    let detail = fetch_detail(pool.get_ref(), &id).await?;
    Ok(HttpResponse::Created().json(detail))
}

/// Approve or reject a pending request (admin). PENDING is the only state
/// that can be processed; APPROVED/REJECTED are terminal.
#[utoipa::path(
    patch,
    path = "/api/v1/leave-requests/{id}",
    params(("id", description = "Leave request ID")),
    request_body = ProcessLeave,
    responses(
        (status = 200, description = "Processed", body = LeaveRequestDetail),
        (status = 400, description = "Invalid status, or already processed")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn process_leave_request(
    _auth: AuthUser,
    pool: web::Data<SqlitePool>,
    config: web::Data<Config>,
    path: web::Path<String>,
    payload: web::Json<ProcessLeave>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();

    let status = LeaveStatus::from_str(&payload.status)
        .ok()
        .filter(|s| matches!(s, LeaveStatus::Approved | LeaveStatus::Rejected))
        .ok_or_else(|| ApiError::Validation("Status must be APPROVED or REJECTED".into()))?;

    let result = sqlx::query(
        r#"
        UPDATE leave_requests
        SET status = ?, admin_notes = ?, updated_at = ?
        WHERE id = ? AND status = 'PENDING'
        "#,
    )
    .bind(status.to_string())
    .bind(&payload.admin_notes)
    .bind(clock::timestamp_string(config.tz_offset_hours))
    .bind(&id)
    .execute(pool.get_ref())
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::Conflict(
            "Leave request not found or already processed".into(),
        ));
    }

    let detail = fetch_detail(pool.get_ref(), &id).await?;
    Ok(HttpResponse::Ok().json(detail))
}

/// Delete a leave request (admin).
#[utoipa::path(
    delete,
    path = "/api/v1/leave-requests/{id}",
    params(("id", description = "Leave request ID")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 404, description = "Leave request not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn delete_leave_request(
    _auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();

    let result = sqlx::query("DELETE FROM leave_requests WHERE id = ?")
        .bind(&id)
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Leave request not found".into()));
    }

    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}
