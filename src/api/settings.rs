use actix_web::{HttpResponse, web};
use sqlx::SqlitePool;

use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::model::setting::{SettingRow, Settings};

/// Current settings with defaults applied. Public: the kiosk seeds its
/// clock requests from this.
#[utoipa::path(
    get,
    path = "/api/v1/settings",
    responses((status = 200, body = Settings)),
    tag = "Settings"
)]
pub async fn get_settings(pool: web::Data<SqlitePool>) -> Result<HttpResponse, ApiError> {
    let rows = sqlx::query_as::<_, SettingRow>("SELECT key, value FROM settings")
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(Settings::from_rows(&rows)))
}

/// Replace the settings (admin). Each key is upserted individually.
#[utoipa::path(
    put,
    path = "/api/v1/settings",
    request_body = Settings,
    responses((status = 200, body = Settings)),
    security(("bearer_auth" = [])),
    tag = "Settings"
)]
pub async fn update_settings(
    _auth: AuthUser,
    pool: web::Data<SqlitePool>,
    payload: web::Json<Settings>,
) -> Result<HttpResponse, ApiError> {
    let settings = payload.into_inner();

    let entries = [
        ("companyName", settings.company_name.clone()),
        ("workStartTime", settings.work_start_time.clone()),
        ("workEndTime", settings.work_end_time.clone()),
        ("lateThreshold", settings.late_threshold.to_string()),
    ];

    for (key, value) in &entries {
        sqlx::query(
            r#"
            INSERT INTO settings (key, value) VALUES (?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(pool.get_ref())
        .await?;
    }

    Ok(HttpResponse::Ok().json(settings))
}
