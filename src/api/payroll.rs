use std::collections::HashMap;
use std::str::FromStr;

use actix_web::{HttpResponse, web};
use chrono::{Duration, NaiveDate};
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::error::ApiError;
use crate::model::payroll::{IncentiveType, PayrollIncentive, PayrollRow};
use crate::utils::clock;

#[derive(Deserialize, IntoParams)]
pub struct PayrollQuery {
    /// Payroll month, "YYYY-MM".
    pub month: Option<String>,
    /// Restrict to one outlet; "all" or absent means everyone.
    pub outlet_id: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateIncentive {
    pub employee_id: String,
    #[schema(example = "2026-02")]
    pub month: String,
    #[schema(example = "Bonus lebaran")]
    pub name: String,
    #[schema(example = 250000.0)]
    pub amount: f64,
    #[serde(rename = "type")]
    #[schema(example = "ADDITION")]
    pub incentive_type: Option<String>,
}

#[derive(sqlx::FromRow)]
struct PayrollEmployeeRow {
    id: String,
    employee_code: String,
    name: String,
    department_name: Option<String>,
    outlet_name: Option<String>,
    daily_rate: Option<f64>,
}

/// First and last calendar day of a "YYYY-MM" month, as date strings.
/// Handles variable month lengths, leap February and the December rollover.
pub fn month_range(month: &str) -> Result<(String, String), ApiError> {
    let invalid = || ApiError::Validation("Month parameter (YYYY-MM) is required".into());

    let (year_str, month_str) = month.split_once('-').ok_or_else(invalid)?;
    let year: i32 = year_str.parse().map_err(|_| invalid())?;
    let month_num: u32 = month_str.parse().map_err(|_| invalid())?;

    let first = NaiveDate::from_ymd_opt(year, month_num, 1).ok_or_else(invalid)?;
    let next_month = if month_num == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month_num + 1, 1)
    }
    .ok_or_else(invalid)?;
    let last = next_month - Duration::days(1);

    Ok((
        first.format("%Y-%m-%d").to_string(),
        last.format("%Y-%m-%d").to_string(),
    ))
}

/// Monthly payroll: present days × the assigned outlet's daily rate, plus
/// the month's incentives split by type. The total has no floor; a negative
/// number means over-deduction and is meant to be seen.
pub async fn compute_monthly_payroll(
    pool: &SqlitePool,
    month: &str,
    outlet_id: Option<&str>,
) -> Result<Vec<PayrollRow>, ApiError> {
    let (start_date, end_date) = month_range(month)?;

    let mut employee_sql = String::from(
        r#"
        SELECT e.id, e.employee_code, e.name,
               d.name AS department_name,
               o.name AS outlet_name, o.daily_rate
        FROM employees e
        LEFT JOIN departments d ON d.id = e.department_id
        LEFT JOIN outlets o ON o.id = e.outlet_id
        WHERE e.is_active = 1
        "#,
    );
    if outlet_id.is_some() {
        employee_sql.push_str(" AND e.outlet_id = ?");
    }

    let mut employee_query = sqlx::query_as::<_, PayrollEmployeeRow>(&employee_sql);
    if let Some(outlet_id) = outlet_id {
        employee_query = employee_query.bind(outlet_id);
    }
    let employees = employee_query.fetch_all(pool).await?;

    let present_counts: HashMap<String, i64> = sqlx::query_as::<_, (String, i64)>(
        r#"
        SELECT employee_id, COUNT(*)
        FROM attendance
        WHERE date >= ? AND date <= ?
          AND status IN ('PRESENT', 'LATE', 'EARLY_LEAVE')
        GROUP BY employee_id
        "#,
    )
    .bind(&start_date)
    .bind(&end_date)
    .fetch_all(pool)
    .await?
    .into_iter()
    .collect();

    let mut incentives_by_employee: HashMap<String, Vec<PayrollIncentive>> = HashMap::new();
    let incentives = sqlx::query_as::<_, PayrollIncentive>(
        "SELECT * FROM payroll_incentives WHERE month = ?",
    )
    .bind(month)
    .fetch_all(pool)
    .await?;
    for incentive in incentives {
        incentives_by_employee
            .entry(incentive.employee_id.clone())
            .or_default()
            .push(incentive);
    }

    let rows = employees
        .into_iter()
        .map(|emp| {
            let present_days = present_counts.get(&emp.id).copied().unwrap_or(0);
            let daily_rate = emp.daily_rate.unwrap_or(0.0);
            let basic_salary = present_days as f64 * daily_rate;

            let incentives = incentives_by_employee.remove(&emp.id).unwrap_or_default();
            let mut additions = 0.0;
            let mut deductions = 0.0;
            for incentive in &incentives {
                match IncentiveType::from_str(&incentive.incentive_type) {
                    Ok(IncentiveType::Addition) => additions += incentive.amount,
                    Ok(IncentiveType::Deduction) => deductions += incentive.amount,
                    Err(_) => {}
                }
            }

            PayrollRow {
                id: emp.id,
                employee_code: emp.employee_code,
                name: emp.name,
                department_name: emp.department_name,
                outlet_name: emp.outlet_name,
                daily_rate,
                present_days,
                basic_salary,
                additions,
                deductions,
                total_pay: basic_salary + additions - deductions,
                incentives,
            }
        })
        .collect();

    Ok(rows)
}

/// Monthly payroll rows (admin).
#[utoipa::path(
    get,
    path = "/api/v1/payroll",
    params(PayrollQuery),
    responses(
        (status = 200, description = "One row per active employee", body = [PayrollRow]),
        (status = 400, description = "Missing or malformed month")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn monthly_payroll(
    _auth: AuthUser,
    pool: web::Data<SqlitePool>,
    query: web::Query<PayrollQuery>,
) -> Result<HttpResponse, ApiError> {
    let month = query
        .month
        .as_deref()
        .ok_or_else(|| ApiError::Validation("Month parameter (YYYY-MM) is required".into()))?;
    let outlet_id = query.outlet_id.as_deref().filter(|o| *o != "all");

    let rows = compute_monthly_payroll(pool.get_ref(), month, outlet_id).await?;
    Ok(HttpResponse::Ok().json(rows))
}

/// Record an addition or deduction on one employee's month (admin).
#[utoipa::path(
    post,
    path = "/api/v1/payroll/incentive",
    request_body = CreateIncentive,
    responses(
        (status = 201, description = "Incentive recorded", body = PayrollIncentive),
        (status = 400, description = "Invalid type, month or amount"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn create_incentive(
    _auth: AuthUser,
    pool: web::Data<SqlitePool>,
    config: web::Data<Config>,
    payload: web::Json<CreateIncentive>,
) -> Result<HttpResponse, ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::Validation("Name must not be empty".into()));
    }

    // also validates the month format
    month_range(&payload.month)?;

    if !payload.amount.is_finite() || payload.amount < 0.0 {
        return Err(ApiError::Validation(
            "Amount must be a positive number".into(),
        ));
    }

    let incentive_type = match payload.incentive_type.as_deref() {
        Some(raw) => IncentiveType::from_str(raw).map_err(|_| {
            ApiError::Validation("Invalid type. Must be one of ADDITION, DEDUCTION".into())
        })?,
        None => IncentiveType::Addition,
    };

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
    sqlx::query(
        r#"
        INSERT INTO payroll_incentives (id, employee_id, month, name, amount, type, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&payload.employee_id)
    .bind(&payload.month)
    .bind(payload.name.trim())
    .bind(payload.amount)
    .bind(incentive_type.to_string())
    .bind(clock::timestamp_string(config.tz_offset_hours))
    .execute(pool.get_ref())
    .await?;

    let incentive =
        sqlx::query_as::<_, PayrollIncentive>("SELECT * FROM payroll_incentives WHERE id = ?")
            .bind(&id)
            .fetch_one(pool.get_ref())
            .await?;

    Ok(HttpResponse::Created().json(incentive))
}

/// Remove an incentive or deduction (admin).
#[utoipa::path(
    delete,
    path = "/api/v1/payroll/incentive/{id}",
    params(("id", description = "Incentive ID")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 404, description = "Incentive not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn delete_incentive(
    _auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();

    let result = sqlx::query("DELETE FROM payroll_incentives WHERE id = ?")
        .bind(&id)
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Incentive not found".into()));
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Incentive deleted successfully" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leap_february_range() {
        let (start, end) = month_range("2024-02").unwrap();
        assert_eq!(start, "2024-02-01");
        assert_eq!(end, "2024-02-29");
    }

    #[test]
    fn december_rolls_over_the_year() {
        let (start, end) = month_range("2025-12").unwrap();
        assert_eq!(start, "2025-12-01");
        assert_eq!(end, "2025-12-31");
    }

    #[test]
    fn thirty_day_month() {
        let (_, end) = month_range("2026-04").unwrap();
        assert_eq!(end, "2026-04-30");
    }

    #[test]
    fn malformed_months_are_rejected() {
        assert!(month_range("2026").is_err());
        assert!(month_range("2026-13").is_err());
        assert!(month_range("abcd-ef").is_err());
    }
}
