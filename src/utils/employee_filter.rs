use anyhow::Result;
use autoscale_cuckoo_filter::CuckooFilter;
use futures::StreamExt;
use once_cell::sync::Lazy;
use sqlx::SqlitePool;
use std::sync::RwLock;

/// Expected capacity and false-positive rate; sized for small/medium
/// businesses with plenty of headroom.
const FILTER_CAPACITY: usize = 100_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;

/// Holds every known employee code and email. A miss here is a definite
/// "available"; a hit still needs the database check.
static EMPLOYEE_KEY_FILTER: Lazy<RwLock<CuckooFilter<String>>> =
    Lazy::new(|| RwLock::new(CuckooFilter::new(FILTER_CAPACITY, FALSE_POSITIVE_RATE)));

#[inline]
fn normalize(key: &str) -> String {
    key.to_lowercase()
}

/// Check if a code/email might already be taken (false positives possible)
pub fn might_exist(key: &str) -> bool {
    let key = normalize(key);
    EMPLOYEE_KEY_FILTER
        .read()
        .expect("employee filter poisoned")
        .contains(&key)
}

pub fn insert(key: &str) {
    let key = normalize(key);
    EMPLOYEE_KEY_FILTER
        .write()
        .expect("employee filter poisoned")
        .add(&key);
}

pub fn remove(key: &str) {
    let key = normalize(key);
    EMPLOYEE_KEY_FILTER
        .write()
        .expect("employee filter poisoned")
        .remove(&key);
}

/// true  => employee code AVAILABLE
/// false => employee code TAKEN
pub async fn is_code_available(code: &str, pool: &SqlitePool) -> bool {
    if !might_exist(code) {
        return true;
    }

    !sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM employees WHERE employee_code = ? COLLATE NOCASE LIMIT 1)",
    )
    .bind(code)
    .fetch_one(pool)
    .await
    .unwrap_or(true) // fail-safe: treat lookup errors as taken
}

pub async fn is_email_available(email: &str, pool: &SqlitePool) -> bool {
    if !might_exist(email) {
        return true;
    }

    !sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM employees WHERE email = ? COLLATE NOCASE LIMIT 1)",
    )
    .bind(email)
    .fetch_one(pool)
    .await
    .unwrap_or(true)
}

/// Warm up the filter from existing employees using streaming + batching
pub async fn warmup_employee_filter(pool: &SqlitePool, batch_size: usize) -> Result<()> {
    let mut stream =
        sqlx::query_as::<_, (String, String)>("SELECT employee_code, email FROM employees")
            .fetch(pool);

    let mut batch = Vec::with_capacity(batch_size);
    let mut total = 0usize;

    while let Some(row) = stream.next().await {
        let (code, email) = row?;
        batch.push(code);
        batch.push(email);

        if batch.len() >= batch_size {
            flush(&mut batch);
            total += batch_size;
        }
    }

    total += batch.len();
    flush(&mut batch);

    tracing::info!(keys = total, "employee availability filter warmed up");
    Ok(())
}

fn flush(batch: &mut Vec<String>) {
    let mut filter = EMPLOYEE_KEY_FILTER
        .write()
        .expect("employee filter poisoned");
    for key in batch.drain(..) {
        filter.add(&normalize(&key));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_is_case_insensitive() {
        insert("EMP-TEST-001");
        assert!(might_exist("emp-test-001"));
        remove("EMP-TEST-001");
    }
}
