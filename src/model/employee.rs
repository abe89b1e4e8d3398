use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Employee {
    pub id: String,
    #[schema(example = "EMP-001")]
    pub employee_code: String,
    #[schema(example = "Budi Santoso")]
    pub name: String,
    #[schema(example = "budi@company.co.id")]
    pub email: String,
    pub phone: Option<String>,
    #[schema(example = "Kasir")]
    pub position: String,
    pub department_id: Option<String>,
    pub outlet_id: Option<String>,
    pub shift_id: Option<String>,
    /// Stored face embedding as JSON text; shape-tolerant, normalized on use.
    pub face_descriptor: Option<String>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Employee joined with its assignment display fields. The kiosk consumes
/// this list (descriptor included) for on-device preview; the admin list
/// shows the same rows.
#[derive(Debug, Serialize, sqlx::FromRow, ToSchema)]
pub struct EmployeeDetail {
    pub id: String,
    pub employee_code: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub position: String,
    pub department_id: Option<String>,
    pub department_name: Option<String>,
    pub outlet_id: Option<String>,
    pub outlet_name: Option<String>,
    pub shift_id: Option<String>,
    pub shift_name: Option<String>,
    pub shift_start_time: Option<String>,
    pub shift_end_time: Option<String>,
    pub face_descriptor: Option<String>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}
