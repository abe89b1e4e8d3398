use std::collections::HashMap;

use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::error::ApiError;
use crate::model::outlet::{Outlet, OutletDetail, Shift};
use crate::schedule;
use crate::utils::clock;

#[derive(Deserialize, ToSchema)]
pub struct ShiftInput {
    /// Present when updating an existing shift, absent for a new one.
    pub id: Option<String>,
    #[schema(example = "Shift Pagi")]
    pub name: String,
    #[schema(example = "07:00")]
    pub start_time: String,
    #[schema(example = "15:00")]
    pub end_time: String,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateOutlet {
    pub name: String,
    pub address: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    #[schema(example = 100)]
    pub radius: Option<i64>,
    pub daily_rate: Option<f64>,
    pub work_start_time: Option<String>,
    pub work_end_time: Option<String>,
    pub shifts: Option<Vec<ShiftInput>>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateOutlet {
    pub name: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub radius: Option<i64>,
    pub daily_rate: Option<f64>,
    pub work_start_time: Option<String>,
    pub work_end_time: Option<String>,
    pub is_active: Option<bool>,
    /// Full replacement set: kept shifts carry their id, new ones don't,
    /// missing ones are deleted.
    pub shifts: Option<Vec<ShiftInput>>,
}

async fn outlet_detail(pool: &SqlitePool, outlet: Outlet) -> Result<OutletDetail, ApiError> {
    let shifts = sqlx::query_as::<_, Shift>(
        "SELECT * FROM shifts WHERE outlet_id = ? ORDER BY start_time ASC",
    )
    .bind(&outlet.id)
    .fetch_all(pool)
    .await?;

    let employee_count =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM employees WHERE outlet_id = ?")
            .bind(&outlet.id)
            .fetch_one(pool)
            .await?;

    Ok(OutletDetail {
        outlet,
        shifts,
        employee_count,
    })
}

/// All outlets with their shifts and headcounts (admin).
#[utoipa::path(
    get,
    path = "/api/v1/outlets",
    responses((status = 200, description = "Outlets, newest first")),
    security(("bearer_auth" = [])),
    tag = "Outlet"
)]
pub async fn list_outlets(
    _auth: AuthUser,
    pool: web::Data<SqlitePool>,
) -> Result<HttpResponse, ApiError> {
    let outlets = sqlx::query_as::<_, Outlet>("SELECT * FROM outlets ORDER BY created_at DESC")
        .fetch_all(pool.get_ref())
        .await?;

    let shifts = sqlx::query_as::<_, Shift>("SELECT * FROM shifts ORDER BY start_time ASC")
        .fetch_all(pool.get_ref())
        .await?;
    let mut shifts_by_outlet: HashMap<String, Vec<Shift>> = HashMap::new();
    for shift in shifts {
        shifts_by_outlet
            .entry(shift.outlet_id.clone())
            .or_default()
            .push(shift);
    }

    let counts: HashMap<String, i64> = sqlx::query_as::<_, (String, i64)>(
        "SELECT outlet_id, COUNT(*) FROM employees WHERE outlet_id IS NOT NULL GROUP BY outlet_id",
    )
    .fetch_all(pool.get_ref())
    .await?
    .into_iter()
    .collect();

    let details: Vec<OutletDetail> = outlets
        .into_iter()
        .map(|outlet| {
            let shifts = shifts_by_outlet.remove(&outlet.id).unwrap_or_default();
            let employee_count = counts.get(&outlet.id).copied().unwrap_or(0);
            OutletDetail {
                outlet,
                shifts,
                employee_count,
            }
        })
        .collect();

    Ok(HttpResponse::Ok().json(details))
}

/// Create an outlet with its shifts (admin).
#[utoipa::path(
    post,
    path = "/api/v1/outlets",
    request_body = CreateOutlet,
    responses(
        (status = 201, description = "Outlet created"),
        (status = 400, description = "Missing fields, bad radius or duplicate name")
    ),
    security(("bearer_auth" = [])),
    tag = "Outlet"
)]
pub async fn create_outlet(
    _auth: AuthUser,
    pool: web::Data<SqlitePool>,
    config: web::Data<Config>,
    payload: web::Json<CreateOutlet>,
) -> Result<HttpResponse, ApiError> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(ApiError::Validation(
            "Missing required fields: name, latitude, longitude".into(),
        ));
    }

    let radius = payload.radius.unwrap_or(100);
    if radius <= 0 {
        return Err(ApiError::Validation("Radius must be greater than 0".into()));
    }

    let taken = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM outlets WHERE name = ? LIMIT 1)",
    )
    .bind(name)
    .fetch_one(pool.get_ref())
    .await?;
    if taken {
        return Err(ApiError::Conflict("Outlet name already exists".into()));
    }

    let id = Uuid::new_v4().to_string();
    let stamp = clock::timestamp_string(config.tz_offset_hours);

    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO outlets
            (id, name, address, latitude, longitude, radius, daily_rate,
             work_start_time, work_end_time, is_active, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 1, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(name)
    .bind(&payload.address)
    .bind(payload.latitude)
    .bind(payload.longitude)
    .bind(radius)
    .bind(payload.daily_rate.unwrap_or(0.0))
    .bind(
        payload
            .work_start_time
            .as_deref()
            .unwrap_or(schedule::DEFAULT_WORK_START),
    )
    .bind(
        payload
            .work_end_time
            .as_deref()
            .unwrap_or(schedule::DEFAULT_WORK_END),
    )
    .bind(&stamp)
    .bind(&stamp)
    .execute(&mut *tx)
    .await?;

    for shift in payload.shifts.as_deref().unwrap_or_default() {
        sqlx::query(
            r#"
            INSERT INTO shifts (id, outlet_id, name, start_time, end_time, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&id)
        .bind(&shift.name)
        .bind(&shift.start_time)
        .bind(&shift.end_time)
        .bind(&stamp)
        .bind(&stamp)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    let outlet = sqlx::query_as::<_, Outlet>("SELECT * FROM outlets WHERE id = ?")
        .bind(&id)
        .fetch_one(pool.get_ref())
        .await?;
    let detail = outlet_detail(pool.get_ref(), outlet).await?;

    Ok(HttpResponse::Created().json(detail))
}

/// Update an outlet; when `shifts` is present the set is reconciled —
/// missing ones deleted, kept ones updated, new ones created (admin).
#[utoipa::path(
    put,
    path = "/api/v1/outlets/{id}",
    params(("id", description = "Outlet ID")),
    request_body = UpdateOutlet,
    responses(
        (status = 200, description = "Outlet updated"),
        (status = 404, description = "Outlet not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Outlet"
)]
pub async fn update_outlet(
    _auth: AuthUser,
    pool: web::Data<SqlitePool>,
    config: web::Data<Config>,
    path: web::Path<String>,
    payload: web::Json<UpdateOutlet>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();

    let current = sqlx::query_as::<_, Outlet>("SELECT * FROM outlets WHERE id = ?")
        .bind(&id)
        .fetch_optional(pool.get_ref())
        .await?
        .ok_or_else(|| ApiError::NotFound("Outlet not found".into()))?;

    let name = payload
        .name
        .as_deref()
        .map(str::trim)
        .unwrap_or(&current.name)
        .to_string();
    if name != current.name {
        let taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM outlets WHERE name = ? AND id != ? LIMIT 1)",
        )
        .bind(&name)
        .bind(&id)
        .fetch_one(pool.get_ref())
        .await?;
        if taken {
            return Err(ApiError::Conflict("Outlet name already exists".into()));
        }
    }

    let radius = payload.radius.unwrap_or(current.radius);
    if radius <= 0 {
        return Err(ApiError::Validation("Radius must be greater than 0".into()));
    }

    let stamp = clock::timestamp_string(config.tz_offset_hours);
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        UPDATE outlets
        SET name = ?, address = ?, latitude = ?, longitude = ?, radius = ?,
            daily_rate = ?, work_start_time = ?, work_end_time = ?, is_active = ?,
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&name)
    .bind(payload.address.as_ref().or(current.address.as_ref()))
    .bind(payload.latitude.unwrap_or(current.latitude))
    .bind(payload.longitude.unwrap_or(current.longitude))
    .bind(radius)
    .bind(payload.daily_rate.unwrap_or(current.daily_rate))
    .bind(
        payload
            .work_start_time
            .as_deref()
            .unwrap_or(&current.work_start_time),
    )
    .bind(
        payload
            .work_end_time
            .as_deref()
            .unwrap_or(&current.work_end_time),
    )
    .bind(payload.is_active.unwrap_or(current.is_active))
    .bind(&stamp)
    .bind(&id)
    .execute(&mut *tx)
    .await?;

    if let Some(shifts) = &payload.shifts {
        let kept_ids: Vec<&str> = shifts.iter().filter_map(|s| s.id.as_deref()).collect();

        if kept_ids.is_empty() {
            sqlx::query("DELETE FROM shifts WHERE outlet_id = ?")
                .bind(&id)
                .execute(&mut *tx)
                .await?;
        } else {
            let placeholders = vec!["?"; kept_ids.len()].join(", ");
            let sql = format!(
                "DELETE FROM shifts WHERE outlet_id = ? AND id NOT IN ({placeholders})"
            );
            let mut q = sqlx::query(&sql).bind(&id);
            for kept in &kept_ids {
                q = q.bind(*kept);
            }
            q.execute(&mut *tx).await?;
        }

        for shift in shifts {
            match &shift.id {
                Some(shift_id) => {
                    sqlx::query(
                        r#"
                        UPDATE shifts
                        SET name = ?, start_time = ?, end_time = ?, updated_at = ?
                        WHERE id = ? AND outlet_id = ?
                        "#,
                    )
                    .bind(&shift.name)
                    .bind(&shift.start_time)
                    .bind(&shift.end_time)
                    .bind(&stamp)
                    .bind(shift_id)
                    .bind(&id)
                    .execute(&mut *tx)
                    .await?;
                }
                None => {
                    sqlx::query(
                        r#"
                        INSERT INTO shifts
                            (id, outlet_id, name, start_time, end_time, created_at, updated_at)
                        VALUES (?, ?, ?, ?, ?, ?, ?)
                        "#,
                    )
                    .bind(Uuid::new_v4().to_string())
                    .bind(&id)
                    .bind(&shift.name)
                    .bind(&shift.start_time)
                    .bind(&shift.end_time)
                    .bind(&stamp)
                    .bind(&stamp)
                    .execute(&mut *tx)
                    .await?;
                }
            }
        }
    }

    tx.commit().await?;

    let outlet = sqlx::query_as::<_, Outlet>("SELECT * FROM outlets WHERE id = ?")
        .bind(&id)
        .fetch_one(pool.get_ref())
        .await?;
    let detail = outlet_detail(pool.get_ref(), outlet).await?;

    Ok(HttpResponse::Ok().json(detail))
}

/// Delete an outlet; blocked while employees are assigned (admin).
#[utoipa::path(
    delete,
    path = "/api/v1/outlets/{id}",
    params(("id", description = "Outlet ID")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 400, description = "Employees still assigned"),
        (status = 404, description = "Outlet not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Outlet"
)]
pub async fn delete_outlet(
    _auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();

    let employee_count =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM employees WHERE outlet_id = ?")
            .bind(&id)
            .fetch_one(pool.get_ref())
            .await?;

    if employee_count > 0 {
        return Err(ApiError::Validation(format!(
            "Cannot delete outlet with {employee_count} assigned employee(s). Reassign them first."
        )));
    }

    let result = sqlx::query("DELETE FROM outlets WHERE id = ?")
        .bind(&id)
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Outlet not found".into()));
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Outlet deleted successfully" })))
}
