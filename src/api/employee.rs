use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::SqlitePool;
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::error::ApiError;
use crate::face::descriptor::{self, DESCRIPTOR_LEN};
use crate::model::employee::{Employee, EmployeeDetail};
use crate::utils::clock;
use crate::utils::db_utils::{build_update_sql, execute_update};
use crate::utils::employee_filter;
use crate::utils::roster_cache;

#[derive(Deserialize, ToSchema)]
pub struct CreateEmployee {
    #[schema(example = "EMP-001")]
    pub employee_code: String,
    #[schema(example = "Budi Santoso")]
    pub name: String,
    #[schema(example = "budi@company.co.id")]
    pub email: String,
    pub phone: Option<String>,
    #[schema(example = "Kasir")]
    pub position: String,
    pub department_id: Option<String>,
    pub outlet_id: Option<String>,
    pub shift_id: Option<String>,
    /// Optional embedding captured at registration, any supported shape.
    #[schema(value_type = Object)]
    pub face_descriptor: Option<serde_json::Value>,
}

/// Partial update; only the listed fields can change. The descriptor has its
/// own endpoint.
#[derive(Deserialize, Serialize, ToSchema)]
pub struct UpdateEmployee {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outlet_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shift_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[derive(Deserialize, ToSchema)]
pub struct RegisterFace {
    #[schema(value_type = Object)]
    pub face_descriptor: serde_json::Value,
}

const UPDATE_COLUMNS: &[&str] = &[
    "name",
    "email",
    "phone",
    "position",
    "department_id",
    "outlet_id",
    "shift_id",
    "is_active",
    "updated_at",
];

const DETAIL_SELECT: &str = r#"
    SELECT e.id, e.employee_code, e.name, e.email, e.phone, e.position,
           e.department_id, d.name AS department_name,
           e.outlet_id, o.name AS outlet_name,
           e.shift_id, s.name AS shift_name,
           s.start_time AS shift_start_time, s.end_time AS shift_end_time,
           e.face_descriptor, e.is_active, e.created_at, e.updated_at
    FROM employees e
    LEFT JOIN departments d ON d.id = e.department_id
    LEFT JOIN outlets o ON o.id = e.outlet_id
    LEFT JOIN shifts s ON s.id = e.shift_id
"#;

/// Canonicalizes an incoming descriptor to the JSON the matcher stores.
/// Any of the tolerated shapes is accepted; undecodable input is a 400.
fn canonical_descriptor(value: &serde_json::Value) -> Result<String, ApiError> {
    let parsed = descriptor::normalize(value)
        .map_err(|e| ApiError::Validation(format!("Invalid face descriptor: {e}")))?;

    if parsed.len() != DESCRIPTOR_LEN {
        tracing::warn!(
            len = parsed.len(),
            "registered descriptor length differs from the recognition model's"
        );
    }

    serde_json::to_string(&parsed).map_err(|_| ApiError::Internal)
}

/// Full roster with assignment details. Public: the clock terminal loads
/// this once per boot for its on-device preview.
#[utoipa::path(
    get,
    path = "/api/v1/employees",
    responses((status = 200, description = "All employees, newest first", body = [EmployeeDetail])),
    tag = "Employee"
)]
pub async fn list_employees(pool: web::Data<SqlitePool>) -> Result<HttpResponse, ApiError> {
    let sql = format!("{DETAIL_SELECT} ORDER BY e.created_at DESC");
    let rows = sqlx::query_as::<_, EmployeeDetail>(&sql)
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(rows))
}

/// Create an employee (admin).
#[utoipa::path(
    post,
    path = "/api/v1/employees",
    request_body = CreateEmployee,
    responses(
        (status = 201, description = "Employee created"),
        (status = 400, description = "Missing fields or duplicate code/email")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn create_employee(
    _auth: AuthUser,
    pool: web::Data<SqlitePool>,
    config: web::Data<Config>,
    payload: web::Json<CreateEmployee>,
) -> Result<HttpResponse, ApiError> {
    let employee_code = payload.employee_code.trim();
    let name = payload.name.trim();
    let email = payload.email.trim();
    let position = payload.position.trim();

    if employee_code.is_empty() || name.is_empty() || email.is_empty() || position.is_empty() {
        return Err(ApiError::Validation(
            "Missing required fields: employee_code, name, email, position".into(),
        ));
    }

    if !employee_filter::is_code_available(employee_code, pool.get_ref()).await {
        return Err(ApiError::Conflict("Employee ID already exists".into()));
    }
    if !employee_filter::is_email_available(email, pool.get_ref()).await {
        return Err(ApiError::Conflict("Email already exists".into()));
    }

    // an unknown department is tolerated, the reference just becomes null
    let department_id = match payload.department_id.as_deref().filter(|d| !d.is_empty()) {
        Some(id) => sqlx::query_scalar::<_, String>("SELECT id FROM departments WHERE id = ?")
            .bind(id)
            .fetch_optional(pool.get_ref())
            .await?,
        None => None,
    };

    let face_descriptor = match &payload.face_descriptor {
        Some(value) => Some(canonical_descriptor(value)?),
        None => None,
    };

    let id = Uuid::new_v4().to_string();
    let stamp = clock::timestamp_string(config.tz_offset_hours);

    let result = sqlx::query(
        r#"
        INSERT INTO employees
            (id, employee_code, name, email, phone, position,
             department_id, outlet_id, shift_id, face_descriptor,
             is_active, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 1, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(employee_code)
    .bind(name)
    .bind(email)
    .bind(payload.phone.as_deref().filter(|p| !p.is_empty()))
    .bind(position)
    .bind(&department_id)
    .bind(payload.outlet_id.as_deref().filter(|o| !o.is_empty()))
    .bind(payload.shift_id.as_deref().filter(|s| !s.is_empty()))
    .bind(&face_descriptor)
    .bind(&stamp)
    .bind(&stamp)
    .execute(pool.get_ref())
    .await;

    if let Err(e) = result {
        // a concurrent create with the same code/email slipped past the filter
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.is_unique_violation() {
                return Err(ApiError::Conflict("Employee ID already exists".into()));
            }
        }
        error!(error = %e, "Failed to create employee");
        return Err(ApiError::Internal);
    }

    employee_filter::insert(employee_code);
    employee_filter::insert(email);
    if face_descriptor.is_some() {
        roster_cache::invalidate().await;
    }

    Ok(HttpResponse::Created().json(json!({
        "id": id,
        "employee_code": employee_code,
        "name": name,
        "message": "Employee created successfully"
    })))
}

/// Get one employee (admin).
#[utoipa::path(
    get,
    path = "/api/v1/employees/{id}",
    params(("id", description = "Employee ID")),
    responses(
        (status = 200, body = EmployeeDetail),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn get_employee(
    _auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();

    let sql = format!("{DETAIL_SELECT} WHERE e.id = ?");
    let employee = sqlx::query_as::<_, EmployeeDetail>(&sql)
        .bind(&id)
        .fetch_optional(pool.get_ref())
        .await?
        .ok_or_else(|| ApiError::NotFound("Employee not found".into()))?;

    Ok(HttpResponse::Ok().json(employee))
}

/// Partial update (admin).
#[utoipa::path(
    put,
    path = "/api/v1/employees/{id}",
    params(("id", description = "Employee ID")),
    request_body = UpdateEmployee,
    responses(
        (status = 200, description = "Employee updated"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn update_employee(
    _auth: AuthUser,
    pool: web::Data<SqlitePool>,
    config: web::Data<Config>,
    path: web::Path<String>,
    payload: web::Json<UpdateEmployee>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();

    let mut fields = serde_json::to_value(&payload.into_inner()).map_err(|_| ApiError::Internal)?;
    if let Some(obj) = fields.as_object_mut() {
        obj.insert(
            "updated_at".into(),
            json!(clock::timestamp_string(config.tz_offset_hours)),
        );
    }

    let update = build_update_sql("employees", &fields, UPDATE_COLUMNS, "id", &id)?;
    let affected = execute_update(pool.get_ref(), update).await.map_err(|e| {
        error!(error = %e, employee_id = %id, "Failed to update employee");
        ApiError::Internal
    })?;

    if affected == 0 {
        return Err(ApiError::NotFound("Employee not found".into()));
    }

    roster_cache::invalidate().await;

    Ok(HttpResponse::Ok().json(json!({ "message": "Employee updated successfully" })))
}

/// Delete an employee (admin). Attendance rows are removed explicitly first;
/// incentives and leave requests cascade with the row.
#[utoipa::path(
    delete,
    path = "/api/v1/employees/{id}",
    params(("id", description = "Employee ID")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn delete_employee(
    _auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();

    let employee = sqlx::query_as::<_, Employee>("SELECT * FROM employees WHERE id = ?")
        .bind(&id)
        .fetch_optional(pool.get_ref())
        .await?
        .ok_or_else(|| ApiError::NotFound("Employee not found".into()))?;

    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM attendance WHERE employee_id = ?")
        .bind(&id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM employees WHERE id = ?")
        .bind(&id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    employee_filter::remove(&employee.employee_code);
    employee_filter::remove(&employee.email);
    roster_cache::invalidate().await;

    Ok(HttpResponse::Ok().json(json!({ "message": "Employee deleted successfully" })))
}

/// Register (or replace) an employee's face descriptor (admin).
#[utoipa::path(
    post,
    path = "/api/v1/employees/{id}/face",
    params(("id", description = "Employee ID")),
    request_body = RegisterFace,
    responses(
        (status = 200, description = "Descriptor stored", body = Employee),
        (status = 400, description = "Descriptor not decodable"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn register_face(
    _auth: AuthUser,
    pool: web::Data<SqlitePool>,
    config: web::Data<Config>,
    path: web::Path<String>,
    payload: web::Json<RegisterFace>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let canonical = canonical_descriptor(&payload.face_descriptor)?;

    let result = sqlx::query(
        "UPDATE employees SET face_descriptor = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&canonical)
    .bind(clock::timestamp_string(config.tz_offset_hours))
    .bind(&id)
    .execute(pool.get_ref())
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Employee not found".into()));
    }

    roster_cache::invalidate().await;

    let employee = sqlx::query_as::<_, Employee>("SELECT * FROM employees WHERE id = ?")
        .bind(&id)
        .fetch_one(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(employee))
}
