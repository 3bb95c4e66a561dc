// src/health/elapsed.rs
use chrono::Duration;
use std::fmt::Write;

const MICROS_PER_SECOND: i64 = 1_000_000;
const MICROS_PER_DAY: i64 = 86_400 * MICROS_PER_SECOND;

/// Render an elapsed time as `[D day[s], ]H:MM:SS[.ffffff]`.
///
/// Negative spans keep a positive clock part and borrow from the day count,
/// so one second in the future reads `-1 day, 23:59:59`. The monitor's
/// freshness sentences were written against this format.
pub fn format_elapsed(elapsed: Duration) -> String {
    let total = elapsed
        .num_microseconds()
        .unwrap_or_else(|| elapsed.num_milliseconds().saturating_mul(1_000));

    let days = total.div_euclid(MICROS_PER_DAY);
    let rest = total.rem_euclid(MICROS_PER_DAY);
    let seconds = rest / MICROS_PER_SECOND;
    let micros = rest % MICROS_PER_SECOND;

    let mut out = String::new();
    if days != 0 {
        let unit = if days.abs() == 1 { "day" } else { "days" };
        let _ = write!(out, "{days} {unit}, ");
    }
    let _ = write!(
        out,
        "{}:{:02}:{:02}",
        seconds / 3600,
        seconds % 3600 / 60,
        seconds % 60
    );
    if micros != 0 {
        let _ = write!(out, ".{micros:06}");
    }
    out
}
