use chrono::{NaiveDate, NaiveTime, TimeDelta, Timelike};

use crate::config::PickupSettings;

/// Parses human-readable pickup date input relative to `today`.
///
/// Supported formats:
/// - Relative: "+2d", "+1w", "2d"
/// - Keywords: "today", "tomorrow"
/// - ISO dates: "2026-10-20", "2026/10/20"
/// - Day-first dates: "20/10/2026", "20-10-2026", "20.10.2026"
pub fn parse_pickup_date(input: &str, today: NaiveDate) -> Option<NaiveDate> {
    let input = input.trim().to_lowercase();
    if input.is_empty() {
        return None;
    }

    match input.as_str() {
        "today" => return Some(today),
        "tomorrow" => return today.succ_opt(),
        _ => {}
    }

    // Relative: +3d, 3d, +1w
    let stripped = input.strip_prefix('+').unwrap_or(&input);
    let val_str: String = stripped.chars().take_while(|c| c.is_ascii_digit()).collect();
    if !val_str.is_empty()
        && let Ok(val) = val_str.parse::<i64>()
    {
        let unit = stripped[val_str.len()..].trim();
        let is_unit = matches!(
            unit,
            "d" | "day" | "days" | "w" | "wk" | "week" | "weeks"
        );
        if is_unit {
            // out-of-range offsets are rejected, not clamped
            let delta = if unit.starts_with('d') {
                TimeDelta::try_days(val)
            } else {
                TimeDelta::try_weeks(val)
            };
            return delta.and_then(|delta| today.checked_add_signed(delta));
        }
    }

    ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&input, fmt).ok())
}

/// Parses "14:30", "2:30 PM", "2:30pm" or "2 pm".
pub fn parse_pickup_time(input: &str) -> Option<NaiveTime> {
    let input = input.trim().to_uppercase();
    if input.is_empty() {
        return None;
    }
    if let Ok(t) = NaiveTime::parse_from_str(&input, "%H:%M") {
        return Some(t);
    }
    let compact: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    // "2PM" carries no minutes, which chrono requires
    let hour_digits = compact.trim_end_matches(['A', 'M', 'P']);
    let normalized = if !hour_digits.is_empty()
        && hour_digits.len() + 2 == compact.len()
        && hour_digits.chars().all(|c| c.is_ascii_digit())
    {
        format!("{hour_digits}:00{}", &compact[hour_digits.len()..])
    } else {
        compact.clone()
    };
    NaiveTime::parse_from_str(&normalized, "%I:%M%p").ok()
}

/// Next bookable pickup dates, from the earliest lead day up to the horizon.
pub fn future_dates(today: NaiveDate, settings: &PickupSettings) -> Vec<NaiveDate> {
    (settings.min_lead_days..=settings.max_days_ahead)
        .map_while(|offset| TimeDelta::try_days(offset).and_then(|d| today.checked_add_signed(d)))
        .collect()
}

/// Slot start times between opening (inclusive) and closing (exclusive).
pub fn time_slots(settings: &PickupSettings) -> Vec<NaiveTime> {
    let (Some(open), Some(close)) = (settings.opening(), settings.closing()) else {
        return Vec::new();
    };
    let step = TimeDelta::minutes(i64::from(settings.slot_minutes.max(1)));
    let mut slots = Vec::new();
    let mut current = open;
    while current < close {
        slots.push(current);
        let (next, wrapped) = current.overflowing_add_signed(step);
        if wrapped != 0 {
            break;
        }
        current = next;
    }
    slots
}

/// Time-of-day greeting for the home screen.
pub fn greeting(time: NaiveTime) -> &'static str {
    match time.hour() {
        5..=11 => "Good morning",
        12..=16 => "Good afternoon",
        _ => "Good evening",
    }
}
