use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IncentiveType {
    Addition,
    Deduction,
}

/// A named amount applied to one employee's pay in one year-month bucket.
/// `month` is the "YYYY-MM" string the payroll query matches exactly.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct PayrollIncentive {
    pub id: String,
    pub employee_id: String,
    #[schema(example = "2026-02")]
    pub month: String,
    #[schema(example = "Bonus lebaran")]
    pub name: String,
    #[schema(example = 250000.0)]
    pub amount: f64,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    #[schema(example = "ADDITION")]
    pub incentive_type: String,
    pub created_at: String,
}

/// One payroll line, denormalized for direct display/export. `total_pay`
/// may go negative; over-deduction is surfaced, not floored away.
#[derive(Debug, Serialize, ToSchema)]
pub struct PayrollRow {
    pub id: String,
    pub employee_code: String,
    pub name: String,
    pub department_name: Option<String>,
    pub outlet_name: Option<String>,
    pub daily_rate: f64,
    pub present_days: i64,
    pub basic_salary: f64,
    pub additions: f64,
    pub deductions: f64,
    pub total_pay: f64,
    pub incentives: Vec<PayrollIncentive>,
}
