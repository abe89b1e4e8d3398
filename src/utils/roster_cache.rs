use anyhow::Result;
use futures_util::StreamExt;
use moka::future::Cache;
use once_cell::sync::Lazy;
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;

use crate::error::ApiError;
use crate::face::descriptor;
use crate::face::matcher::FaceCandidate;

const ROSTER_KEY: &str = "roster";

/// The kiosk submits frames at ~1s intervals; re-reading and re-parsing
/// every stored descriptor per frame would dominate the request. The parsed
/// roster is cached briefly and invalidated on any employee/face mutation.
static ROSTER_CACHE: Lazy<Cache<&'static str, Arc<Vec<FaceCandidate>>>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(1)
        .time_to_live(Duration::from_secs(60))
        .build()
});

/// The parsed face roster: active employees with a decodable descriptor.
/// Rows whose stored descriptor does not decode are skipped, not errors —
/// the matcher never sees them.
pub async fn roster(pool: &SqlitePool) -> Result<Arc<Vec<FaceCandidate>>, ApiError> {
    ROSTER_CACHE
        .try_get_with(ROSTER_KEY, load_roster(pool))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "failed to load face roster");
            ApiError::Internal
        })
}

async fn load_roster(pool: &SqlitePool) -> Result<Arc<Vec<FaceCandidate>>, sqlx::Error> {
    let mut stream = sqlx::query_as::<_, (String, String, String)>(
        r#"
        SELECT id, name, face_descriptor
        FROM employees
        WHERE is_active = 1 AND face_descriptor IS NOT NULL
        "#,
    )
    .fetch(pool);

    let mut candidates = Vec::new();
    while let Some(row) = stream.next().await {
        let (id, name, raw) = row?;
        match descriptor::parse(&raw) {
            Ok(parsed) => candidates.push(FaceCandidate {
                employee_id: id,
                name,
                descriptor: parsed,
            }),
            Err(e) => {
                tracing::debug!(employee_id = %id, error = %e, "skipping undecodable face descriptor");
            }
        }
    }

    Ok(Arc::new(candidates))
}

/// Drops the cached roster; the next frame rebuilds it.
pub async fn invalidate() {
    ROSTER_CACHE.invalidate(&ROSTER_KEY).await;
}

/// Startup warmup so the first kiosk frame doesn't pay the load.
pub async fn warmup_roster(pool: &SqlitePool) -> Result<()> {
    let roster = ROSTER_CACHE
        .try_get_with(ROSTER_KEY, load_roster(pool))
        .await
        .map_err(|e| anyhow::anyhow!("roster warmup failed: {e}"))?;

    tracing::info!(candidates = roster.len(), "face roster warmed up");
    Ok(())
}
