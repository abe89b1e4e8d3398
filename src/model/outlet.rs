use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A physical work site with a geofence. `radius` is meters; `daily_rate`
/// is the per-day pay for employees assigned here.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Outlet {
    pub id: String,
    #[schema(example = "Outlet Kemang")]
    pub name: String,
    pub address: Option<String>,
    #[schema(example = -6.2607)]
    pub latitude: f64,
    #[schema(example = 106.8137)]
    pub longitude: f64,
    #[schema(example = 100)]
    pub radius: i64,
    #[schema(example = 150000.0)]
    pub daily_rate: f64,
    #[schema(example = "09:00")]
    pub work_start_time: String,
    #[schema(example = "17:00")]
    pub work_end_time: String,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// A named work-time window scoped to one outlet; overrides the outlet's
/// default schedule for employees assigned to it.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Shift {
    pub id: String,
    pub outlet_id: String,
    #[schema(example = "Shift Pagi")]
    pub name: String,
    #[schema(example = "07:00")]
    pub start_time: String,
    #[schema(example = "15:00")]
    pub end_time: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OutletDetail {
    #[serde(flatten)]
    pub outlet: Outlet,
    pub shifts: Vec<Shift>,
    pub employee_count: i64,
}
