use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;

/// Embedded DDL; applied idempotently at startup. Attendance carries the
/// UNIQUE(employee_id, date) constraint the clock-in race depends on.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS departments (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL UNIQUE,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS outlets (
    id              TEXT PRIMARY KEY,
    name            TEXT NOT NULL UNIQUE,
    address         TEXT,
    latitude        REAL NOT NULL,
    longitude       REAL NOT NULL,
    radius          INTEGER NOT NULL DEFAULT 100,
    daily_rate      REAL NOT NULL DEFAULT 0,
    work_start_time TEXT NOT NULL DEFAULT '09:00',
    work_end_time   TEXT NOT NULL DEFAULT '17:00',
    is_active       INTEGER NOT NULL DEFAULT 1,
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS shifts (
    id          TEXT PRIMARY KEY,
    outlet_id   TEXT NOT NULL REFERENCES outlets(id) ON DELETE CASCADE,
    name        TEXT NOT NULL,
    start_time  TEXT NOT NULL,
    end_time    TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS employees (
    id              TEXT PRIMARY KEY,
    employee_code   TEXT NOT NULL UNIQUE,
    name            TEXT NOT NULL,
    email           TEXT NOT NULL UNIQUE,
    phone           TEXT,
    position        TEXT NOT NULL,
    department_id   TEXT REFERENCES departments(id) ON DELETE SET NULL,
    outlet_id       TEXT REFERENCES outlets(id) ON DELETE SET NULL,
    shift_id        TEXT REFERENCES shifts(id) ON DELETE SET NULL,
    face_descriptor TEXT,
    is_active       INTEGER NOT NULL DEFAULT 1,
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS attendance (
    id                  TEXT PRIMARY KEY,
    employee_id         TEXT NOT NULL REFERENCES employees(id),
    outlet_id           TEXT REFERENCES outlets(id) ON DELETE SET NULL,
    date                TEXT NOT NULL,
    clock_in            TEXT,
    clock_out           TEXT,
    clock_in_location   TEXT,
    clock_out_location  TEXT,
    status              TEXT NOT NULL DEFAULT 'PRESENT',
    notes               TEXT,
    created_at          TEXT NOT NULL,
    updated_at          TEXT NOT NULL,
    UNIQUE (employee_id, date)
);

CREATE TABLE IF NOT EXISTS payroll_incentives (
    id          TEXT PRIMARY KEY,
    employee_id TEXT NOT NULL REFERENCES employees(id) ON DELETE CASCADE,
    month       TEXT NOT NULL,
    name        TEXT NOT NULL,
    amount      REAL NOT NULL,
    type        TEXT NOT NULL DEFAULT 'ADDITION',
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS leave_requests (
    id            TEXT PRIMARY KEY,
    employee_id   TEXT NOT NULL REFERENCES employees(id) ON DELETE CASCADE,
    type          TEXT NOT NULL,
    start_date    TEXT NOT NULL,
    end_date      TEXT NOT NULL,
    reason        TEXT NOT NULL,
    evidence      TEXT,
    evidence_name TEXT,
    status        TEXT NOT NULL DEFAULT 'PENDING',
    admin_notes   TEXT,
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS settings (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_attendance_date ON attendance(date);
CREATE INDEX IF NOT EXISTS idx_incentives_month ON payroll_incentives(month);
"#;

pub async fn init_db(database_url: &str) -> SqlitePool {
    let options = SqliteConnectOptions::from_str(database_url)
        .expect("invalid DATABASE_URL")
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .connect_with(options)
        .await
        .expect("Failed to connect to database");

    apply_schema(&pool).await.expect("Failed to apply schema");
    pool
}

pub async fn apply_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for statement in SCHEMA.split(';') {
        let statement = statement.trim();
        if !statement.is_empty() {
            sqlx::query(statement).execute(pool).await?;
        }
    }
    Ok(())
}

/// In-memory database for tests. A single connection keeps the database
/// alive for the pool's lifetime.
#[cfg(test)]
pub async fn memory_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .unwrap();

    apply_schema(&pool).await.unwrap();
    pool
}
