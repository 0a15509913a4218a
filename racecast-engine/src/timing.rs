//! F1-style timing strings for lap times and gaps.

use crate::numbers::floor_f64_to_u32;

/// `1:33.191`, `45.120s`, or `1:02:03.000` for runs past an hour.
#[must_use]
pub fn format_lap_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "--:--".to_string();
    }
    let hours = floor_f64_to_u32(seconds / 3600.0);
    let minutes = floor_f64_to_u32((seconds % 3600.0) / 60.0);
    let secs = seconds % 60.0;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:06.3}")
    } else if minutes > 0 {
        format!("{minutes}:{secs:06.3}")
    } else {
        format!("{secs:.3}s")
    }
}

/// `Leader`, `+4.512`, `+1:04.512`, or `+2 laps` for lapped finishers.
#[must_use]
pub fn format_gap(gap: f64, laps_down: u32) -> String {
    if laps_down > 0 {
        let plural = if laps_down > 1 { "s" } else { "" };
        return format!("+{laps_down} lap{plural}");
    }
    if !gap.is_finite() || gap <= 0.0 {
        return "Leader".to_string();
    }
    if gap < 60.0 {
        format!("+{gap:.3}")
    } else {
        let minutes = floor_f64_to_u32(gap / 60.0);
        let secs = gap % 60.0;
        format!("+{minutes}:{secs:06.3}")
    }
}
