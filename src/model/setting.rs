use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SettingRow {
    pub key: String,
    pub value: String,
}

/// The typed view over the key/value store. Missing rows fall back to these
/// defaults; the kiosk reads this to seed its clock requests.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Settings {
    #[schema(example = "PT. Example Company")]
    pub company_name: String,
    #[schema(example = "09:00")]
    pub work_start_time: String,
    #[schema(example = "17:00")]
    pub work_end_time: String,
    #[schema(example = 15)]
    pub late_threshold: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            company_name: "PT. Example Company".into(),
            work_start_time: crate::schedule::DEFAULT_WORK_START.into(),
            work_end_time: crate::schedule::DEFAULT_WORK_END.into(),
            late_threshold: crate::schedule::DEFAULT_LATE_THRESHOLD_MIN,
        }
    }
}

impl Settings {
    /// Overlays stored rows onto the defaults. Unknown keys are ignored; a
    /// malformed late_threshold keeps the default rather than failing the
    /// request.
    pub fn from_rows(rows: &[SettingRow]) -> Self {
        let mut settings = Self::default();
        for row in rows {
            match row.key.as_str() {
                "companyName" => settings.company_name = row.value.clone(),
                "workStartTime" => settings.work_start_time = row.value.clone(),
                "workEndTime" => settings.work_end_time = row.value.clone(),
                "lateThreshold" => {
                    if let Ok(v) = row.value.parse() {
                        settings.late_threshold = v;
                    }
                }
                _ => {}
            }
        }
        settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_no_rows_exist() {
        let s = Settings::from_rows(&[]);
        assert_eq!(s.work_start_time, "09:00");
        assert_eq!(s.late_threshold, 15);
    }

    #[test]
    fn stored_rows_override_defaults() {
        let rows = vec![
            SettingRow {
                key: "workStartTime".into(),
                value: "08:30".into(),
            },
            SettingRow {
                key: "lateThreshold".into(),
                value: "10".into(),
            },
            SettingRow {
                key: "lateThresholdTypo".into(),
                value: "99".into(),
            },
        ];
        let s = Settings::from_rows(&rows);
        assert_eq!(s.work_start_time, "08:30");
        assert_eq!(s.late_threshold, 10);
        assert_eq!(s.work_end_time, "17:00");
    }
}
