use chrono::{DateTime, FixedOffset, Utc};

/// WIB (Asia/Jakarta), UTC+7. The zone has no DST, so a fixed offset is the
/// whole timezone story.
pub const DEFAULT_TZ_OFFSET_HOURS: i32 = 7;

/// Current wall-clock time at the configured offset.
pub fn local_now(offset_hours: i32) -> DateTime<FixedOffset> {
    let offset = FixedOffset::east_opt(offset_hours * 3600)
        .unwrap_or_else(|| FixedOffset::east_opt(DEFAULT_TZ_OFFSET_HOURS * 3600).unwrap());
    Utc::now().with_timezone(&offset)
}

/// Today's calendar date as the "YYYY-MM-DD" string attendance is keyed by.
pub fn today_string(offset_hours: i32) -> String {
    local_now(offset_hours).format("%Y-%m-%d").to_string()
}

/// Current time of day as "HH:MM:SS".
pub fn time_string(offset_hours: i32) -> String {
    local_now(offset_hours).format("%H:%M:%S").to_string()
}

/// Row timestamp; lexicographic order matches chronological order.
pub fn timestamp_string(offset_hours: i32) -> String {
    local_now(offset_hours).format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn offset_shifts_the_wall_clock() {
        let utc = local_now(0);
        let jakarta = local_now(7);
        let diff = (jakarta.hour() as i32 - utc.hour() as i32).rem_euclid(24);
        assert_eq!(diff, 7);
    }

    #[test]
    fn out_of_range_offset_falls_back_to_wib() {
        // FixedOffset rejects offsets beyond +/-24h
        let t = local_now(99);
        assert_eq!(t.offset().local_minus_utc(), 7 * 3600);
    }

    #[test]
    fn date_string_shape() {
        let d = today_string(7);
        assert_eq!(d.len(), 10);
        assert_eq!(&d[4..5], "-");
    }
}
