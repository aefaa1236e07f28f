use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time as fractional Unix seconds.
///
/// Frame timestamps and session clocks are plain f64 seconds so that
/// scripted inputs can carry their own timeline.
pub fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_is_positive_and_recent() {
        let t = now_secs();
        // 2024-01-01T00:00:00Z
        assert!(t > 1_704_067_200.0, "clock should be past 2024: {t}");
    }

    #[test]
    fn test_now_is_monotonic_enough() {
        let a = now_secs();
        let b = now_secs();
        assert!(b >= a);
    }
}
