use actix_web::{HttpResponse, web};
use serde::Deserialize;
use sqlx::SqlitePool;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::error::ApiError;
use crate::model::department::Department;
use crate::utils::clock;

#[derive(Deserialize, ToSchema)]
pub struct CreateDepartment {
    #[schema(example = "Operasional")]
    pub name: String,
}

/// Departments, for the employee-assignment dropdowns (admin).
#[utoipa::path(
    get,
    path = "/api/v1/departments",
    responses((status = 200, body = [Department])),
    security(("bearer_auth" = [])),
    tag = "Department"
)]
pub async fn list_departments(
    _auth: AuthUser,
    pool: web::Data<SqlitePool>,
) -> Result<HttpResponse, ApiError> {
    let departments =
        sqlx::query_as::<_, Department>("SELECT * FROM departments ORDER BY name ASC")
            .fetch_all(pool.get_ref())
            .await?;

    Ok(HttpResponse::Ok().json(departments))
}

/// Create a department (admin).
#[utoipa::path(
    post,
    path = "/api/v1/departments",
    request_body = CreateDepartment,
    responses(
        (status = 201, body = Department),
        (status = 400, description = "Empty or duplicate name")
    ),
    security(("bearer_auth" = [])),
    tag = "Department"
)]
pub async fn create_department(
    _auth: AuthUser,
    pool: web::Data<SqlitePool>,
    config: web::Data<Config>,
    payload: web::Json<CreateDepartment>,
) -> Result<HttpResponse, ApiError> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(ApiError::Validation("Name must not be empty".into()));
    }

    let id = Uuid::new_v4().to_string();
    let result = sqlx::query("INSERT INTO departments (id, name, created_at) VALUES (?, ?, ?)")
        .bind(&id)
        .bind(name)
        .bind(clock::timestamp_string(config.tz_offset_hours))
        .execute(pool.get_ref())
        .await;

    if let Err(e) = result {
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.is_unique_violation() {
                return Err(ApiError::Conflict("Department name already exists".into()));
            }
        }
        tracing::error!(error = %e, "Failed to create department");
        return Err(ApiError::Internal);
    }

    let department = sqlx::query_as::<_, Department>("SELECT * FROM departments WHERE id = ?")
        .bind(&id)
        .fetch_one(pool.get_ref())
        .await?;

    Ok(HttpResponse::Created().json(department))
}
