use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceStatus {
    Present,
    Late,
    EarlyLeave,
    Absent,
}

impl AttendanceStatus {
    /// Statuses that count as a worked day in payroll.
    pub fn counts_as_worked(self) -> bool {
        matches!(self, Self::Present | Self::Late | Self::EarlyLeave)
    }
}

/// One row per (employee, date); `clock_in`/`clock_out` are local wall-clock
/// strings, locations are raw "lat,lng" text captured at the terminal.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Attendance {
    pub id: String,
    pub employee_id: String,
    pub outlet_id: Option<String>,
    #[schema(example = "2026-02-14")]
    pub date: String,
    #[schema(example = "08:52:10")]
    pub clock_in: Option<String>,
    pub clock_out: Option<String>,
    #[schema(example = "-6.2088,106.8456")]
    pub clock_in_location: Option<String>,
    pub clock_out_location: Option<String>,
    #[schema(example = "PRESENT")]
    pub status: String,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Attendance {
    pub fn status(&self) -> AttendanceStatus {
        AttendanceStatus::from_str(&self.status).unwrap_or(AttendanceStatus::Present)
    }
}

/// Attendance joined with the display fields the dashboard and reports need,
/// so callers never re-join.
#[derive(Debug, Serialize, sqlx::FromRow, ToSchema)]
pub struct AttendanceDetail {
    pub id: String,
    pub employee_id: String,
    pub outlet_id: Option<String>,
    pub date: String,
    pub clock_in: Option<String>,
    pub clock_out: Option<String>,
    pub clock_in_location: Option<String>,
    pub clock_out_location: Option<String>,
    pub status: String,
    pub notes: Option<String>,
    pub employee_name: String,
    pub employee_code: String,
    pub department_name: Option<String>,
    pub outlet_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_its_storage_string() {
        assert_eq!(AttendanceStatus::EarlyLeave.to_string(), "EARLY_LEAVE");
        assert_eq!(
            AttendanceStatus::from_str("EARLY_LEAVE").unwrap(),
            AttendanceStatus::EarlyLeave
        );
    }

    #[test]
    fn worked_day_statuses() {
        assert!(AttendanceStatus::Present.counts_as_worked());
        assert!(AttendanceStatus::Late.counts_as_worked());
        assert!(AttendanceStatus::EarlyLeave.counts_as_worked());
        assert!(!AttendanceStatus::Absent.counts_as_worked());
    }
}
