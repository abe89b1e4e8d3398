use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeaveType {
    /// Personal leave (izin).
    Izin,
    /// Sick leave (sakit).
    Sakit,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct LeaveRequest {
    pub id: String,
    pub employee_id: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    #[schema(example = "SAKIT")]
    pub leave_type: String,
    #[schema(example = "2026-03-02")]
    pub start_date: String,
    #[schema(example = "2026-03-04")]
    pub end_date: String,
    pub reason: String,
    /// Optional evidence blob (e.g. a doctor's note, base64).
    pub evidence: Option<String>,
    pub evidence_name: Option<String>,
    #[schema(example = "PENDING")]
    pub status: String,
    pub admin_notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Serialize, sqlx::FromRow, ToSchema)]
pub struct LeaveRequestDetail {
    pub id: String,
    pub employee_id: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub leave_type: String,
    pub start_date: String,
    pub end_date: String,
    pub reason: String,
    pub evidence: Option<String>,
    pub evidence_name: Option<String>,
    pub status: String,
    pub admin_notes: Option<String>,
    pub created_at: String,
    pub employee_name: String,
    pub employee_code: String,
    pub position: String,
}
