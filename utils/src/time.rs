//! Human-readable durations for log lines.

use tru_types::Timestamp;

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;

/// Format a duration in seconds using its two most significant units.
pub fn format_duration(secs: u64) -> String {
    match secs {
        s if s < MINUTE => format!("{s}s"),
        s if s < HOUR => format!("{}m {}s", s / MINUTE, s % MINUTE),
        s if s < DAY => format!("{}h {}m", s / HOUR, (s % HOUR) / MINUTE),
        s => format!("{}d {}h", s / DAY, (s % DAY) / HOUR),
    }
}

/// Time left until `deadline`, or `"expired"` once it has passed.
pub fn format_remaining(now: Timestamp, deadline: Timestamp) -> String {
    if deadline.is_after(now) {
        format_duration(deadline.as_secs() - now.as_secs())
    } else {
        "expired".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_each_unit() {
        assert_eq!(format_duration(42), "42s");
        assert_eq!(format_duration(90), "1m 30s");
        assert_eq!(format_duration(2 * HOUR + 5 * MINUTE), "2h 5m");
        assert_eq!(format_duration(3 * DAY + 4 * HOUR), "3d 4h");
    }

    #[test]
    fn remaining_saturates_at_deadline() {
        let deadline = Timestamp::new(1_000);
        assert_eq!(format_remaining(Timestamp::new(940), deadline), "1m 0s");
        assert_eq!(format_remaining(deadline, deadline), "expired");
    }
}
