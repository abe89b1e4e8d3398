use chrono::{NaiveTime, Timelike};

use crate::model::attendance::AttendanceStatus;

pub const DEFAULT_WORK_START: &str = "09:00";
pub const DEFAULT_WORK_END: &str = "17:00";
pub const DEFAULT_LATE_THRESHOLD_MIN: u32 = 15;

/// The clock-out grace window is a fixed 15 minutes, independent of the
/// configurable late threshold.
pub const EARLY_LEAVE_GRACE_MIN: u32 = 15;

/// Parses "HH:MM" or "HH:MM:SS" into minutes since midnight. Seconds are
/// truncated; schedule comparisons run at minute granularity.
pub fn minutes_of_day(time: &str) -> Option<u32> {
    let mut parts = time.split(':');
    let hour: u32 = parts.next()?.parse().ok()?;
    let minute: u32 = parts.next()?.parse().ok()?;
    if hour > 23 || minute > 59 {
        return None;
    }
    Some(hour * 60 + minute)
}

/// Schedule precedence, highest first: the employee's assigned shift, the
/// resolved outlet's work hours, caller-supplied settings, the hardcoded
/// default.
pub fn resolve_schedule_time<'a>(
    shift_time: Option<&'a str>,
    outlet_time: Option<&'a str>,
    settings_time: Option<&'a str>,
    default: &'a str,
) -> &'a str {
    shift_time
        .or(outlet_time)
        .or(settings_time)
        .unwrap_or(default)
}

/// LATE iff strictly past the schedule start plus the threshold; arriving
/// exactly on the threshold minute is still PRESENT.
pub fn clock_in_status(
    schedule_start: &str,
    late_threshold_min: u32,
    now: NaiveTime,
) -> AttendanceStatus {
    let start = minutes_of_day(schedule_start)
        .unwrap_or_else(|| minutes_of_day(DEFAULT_WORK_START).unwrap());
    let current = now.hour() * 60 + now.minute();

    if current > start + late_threshold_min {
        AttendanceStatus::Late
    } else {
        AttendanceStatus::Present
    }
}

/// EARLY_LEAVE iff leaving more than the fixed grace window before the
/// schedule end; otherwise the clock-in status is preserved unchanged.
pub fn clock_out_status(
    schedule_end: &str,
    now: NaiveTime,
    previous: AttendanceStatus,
) -> AttendanceStatus {
    let end =
        minutes_of_day(schedule_end).unwrap_or_else(|| minutes_of_day(DEFAULT_WORK_END).unwrap());
    let current = now.hour() * 60 + now.minute();

    if current + EARLY_LEAVE_GRACE_MIN < end {
        AttendanceStatus::EarlyLeave
    } else {
        previous
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn on_time_is_present() {
        assert_eq!(clock_in_status("09:00", 15, at(8, 55)), AttendanceStatus::Present);
        assert_eq!(clock_in_status("09:00", 15, at(9, 14)), AttendanceStatus::Present);
    }

    #[test]
    fn threshold_boundary_is_still_present() {
        // current == start + threshold: non-strict late
        assert_eq!(clock_in_status("09:00", 15, at(9, 15)), AttendanceStatus::Present);
    }

    #[test]
    fn past_threshold_is_late() {
        assert_eq!(clock_in_status("09:00", 15, at(9, 16)), AttendanceStatus::Late);
    }

    #[test]
    fn seconds_are_truncated_in_schedule_strings() {
        assert_eq!(minutes_of_day("09:00:59"), Some(540));
        assert_eq!(minutes_of_day("17:30"), Some(1050));
        assert_eq!(minutes_of_day("24:00"), None);
        assert_eq!(minutes_of_day("nonsense"), None);
    }

    #[test]
    fn leaving_early_flags_early_leave() {
        assert_eq!(
            clock_out_status("17:00", at(16, 44), AttendanceStatus::Present),
            AttendanceStatus::EarlyLeave
        );
    }

    #[test]
    fn grace_window_boundary_preserves_status() {
        // 16:45 is exactly end - 15; not early leave
        assert_eq!(
            clock_out_status("17:00", at(16, 45), AttendanceStatus::Late),
            AttendanceStatus::Late
        );
        assert_eq!(
            clock_out_status("17:00", at(17, 10), AttendanceStatus::Present),
            AttendanceStatus::Present
        );
    }

    #[test]
    fn precedence_prefers_shift_then_outlet_then_settings() {
        assert_eq!(
            resolve_schedule_time(Some("10:00"), Some("08:00"), Some("07:00"), DEFAULT_WORK_START),
            "10:00"
        );
        assert_eq!(
            resolve_schedule_time(None, Some("08:00"), Some("07:00"), DEFAULT_WORK_START),
            "08:00"
        );
        assert_eq!(
            resolve_schedule_time(None, None, Some("07:00"), DEFAULT_WORK_START),
            "07:00"
        );
        assert_eq!(
            resolve_schedule_time(None, None, None, DEFAULT_WORK_START),
            "09:00"
        );
    }
}
