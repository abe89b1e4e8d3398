use std::sync::{Arc, Mutex};
use std::time::Duration;

use actix_web::{HttpResponse, web};
use moka::future::Cache;
use once_cell::sync::Lazy;
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiError;
use crate::face::descriptor;
use crate::face::matcher::MIN_MATCH_SCORE;
use crate::face::session::{FrameOutcome, ScanSession, ScanState};

/// Live scan sessions, keyed by session id. Abandoned kiosks (operator
/// walked away, page closed) expire on idle instead of leaking.
static SCAN_SESSIONS: Lazy<Cache<String, Arc<Mutex<ScanSession>>>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(10_000)
        .time_to_idle(Duration::from_secs(120))
        .build()
});

#[derive(Deserialize, ToSchema)]
pub struct CreateScan {
    pub min_score: Option<u8>,
}

#[derive(Deserialize, ToSchema)]
pub struct ScanFrame {
    /// Live embedding for one captured frame, any supported shape.
    #[schema(value_type = Object)]
    pub descriptor: serde_json::Value,
}

async fn get_session(id: &str) -> Result<Arc<Mutex<ScanSession>>, ApiError> {
    SCAN_SESSIONS
        .get(id)
        .await
        .ok_or_else(|| ApiError::NotFound("Scan session not found or expired".into()))
}

fn session_json(id: &str, session: &ScanSession) -> serde_json::Value {
    json!({
        "session_id": id,
        "state": session.state(),
        "match": session.matched(),
        "frames_seen": session.frames_seen(),
    })
}

/// Open a scan session; it starts out scanning.
#[utoipa::path(
    post,
    path = "/api/v1/attendance/scan",
    request_body = CreateScan,
    responses((status = 201, description = "Session opened", body = Object, example = json!({
        "session_id": "5f6c...", "state": "SCANNING", "match": null, "frames_seen": 0
    }))),
    tag = "Scan"
)]
pub async fn create_session(payload: web::Json<CreateScan>) -> Result<HttpResponse, ApiError> {
    let id = Uuid::new_v4().to_string();
    let mut session = ScanSession::new(payload.min_score.unwrap_or(MIN_MATCH_SCORE));
    session.start();

    let body = session_json(&id, &session);
    SCAN_SESSIONS.insert(id, Arc::new(Mutex::new(session))).await;

    Ok(HttpResponse::Created().json(body))
}

/// Submit one captured frame. Only a scanning session accepts frames: after
/// a match or a cancellation, stale in-flight frames come back rejected
/// instead of silently re-identifying somebody.
#[utoipa::path(
    post,
    path = "/api/v1/attendance/scan/{id}/frame",
    params(("id", description = "Scan session ID")),
    request_body = ScanFrame,
    responses(
        (status = 200, description = "Frame processed; state and match reflect the outcome"),
        (status = 400, description = "Descriptor not decodable"),
        (status = 404, description = "Session unknown or expired")
    ),
    tag = "Scan"
)]
pub async fn submit_frame(
    pool: web::Data<SqlitePool>,
    path: web::Path<String>,
    payload: web::Json<ScanFrame>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let session = get_session(&id).await?;

    let live = descriptor::normalize(&payload.descriptor)
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let roster = crate::utils::roster_cache::roster(pool.get_ref()).await?;

    let mut session = session.lock().expect("scan session poisoned");
    let outcome = session.submit_frame(&live, &roster);

    if let FrameOutcome::Matched(m) = &outcome {
        tracing::info!(session_id = %id, employee_id = %m.employee_id, score = m.score, "face matched");
    }

    Ok(HttpResponse::Ok().json(session_json(&id, &session)))
}

/// Re-arm a session for the next person (after a match, a cancellation, or
/// a no-match cycle the operator wants to retry).
#[utoipa::path(
    post,
    path = "/api/v1/attendance/scan/{id}/restart",
    params(("id", description = "Scan session ID")),
    responses(
        (status = 200, description = "Session scanning again"),
        (status = 404, description = "Session unknown or expired")
    ),
    tag = "Scan"
)]
pub async fn restart_session(path: web::Path<String>) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let session = get_session(&id).await?;

    let mut session = session.lock().expect("scan session poisoned");
    session.start();

    Ok(HttpResponse::Ok().json(session_json(&id, &session)))
}

/// Cancel a session. Takes effect immediately; the state machine rejects
/// anything still in flight.
#[utoipa::path(
    delete,
    path = "/api/v1/attendance/scan/{id}",
    params(("id", description = "Scan session ID")),
    responses(
        (status = 200, description = "Session cancelled"),
        (status = 404, description = "Session unknown or expired")
    ),
    tag = "Scan"
)]
pub async fn cancel_session(path: web::Path<String>) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let session = get_session(&id).await?;

    let body = {
        let mut session = session.lock().expect("scan session poisoned");
        session.cancel();
        session_json(&id, &session)
    };

    SCAN_SESSIONS.invalidate(&id).await;

    Ok(HttpResponse::Ok().json(body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_json_shape() {
        let mut session = ScanSession::new(MIN_MATCH_SCORE);
        session.start();
        let body = session_json("abc", &session);
        assert_eq!(body["state"], "SCANNING");
        assert!(body["match"].is_null());
    }
}
