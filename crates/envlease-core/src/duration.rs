//! Human duration strings.
//!
//! Accepts `90`, `45m`, `2h`, `1h12m` and `1h 12m` (case-insensitive). A bare
//! number means minutes. Each unit may appear at most once.

use crate::error::CoreError;

fn invalid(input: &str, reason: &str) -> CoreError {
    CoreError::InvalidDuration {
        input: input.to_string(),
        reason: reason.to_string(),
    }
}

/// Parses a duration string into whole minutes.
pub fn parse_duration_minutes(input: &str) -> Result<i64, CoreError> {
    let text = input.trim().to_ascii_lowercase();
    if text.is_empty() {
        return Err(invalid(input, "empty duration"));
    }
    if text.chars().all(|c| c.is_ascii_digit()) {
        return text
            .parse::<i64>()
            .map_err(|_| invalid(input, "number too large"));
    }

    let mut hours: Option<i64> = None;
    let mut minutes: Option<i64> = None;
    let mut digits = String::new();

    for c in text.chars() {
        match c {
            '0'..='9' => digits.push(c),
            ' ' if digits.is_empty() => {}
            'h' | 'm' => {
                if digits.is_empty() {
                    return Err(invalid(input, "unit without a number"));
                }
                let value = digits
                    .parse::<i64>()
                    .map_err(|_| invalid(input, "number too large"))?;
                digits.clear();
                let slot = if c == 'h' { &mut hours } else { &mut minutes };
                if slot.replace(value).is_some() {
                    return Err(invalid(input, "unit given twice"));
                }
            }
            other => {
                return Err(invalid(input, &format!("unexpected character '{}'", other)));
            }
        }
    }
    if !digits.is_empty() {
        return Err(invalid(input, "trailing number without a unit"));
    }

    hours
        .unwrap_or(0)
        .checked_mul(60)
        .and_then(|h| h.checked_add(minutes.unwrap_or(0)))
        .ok_or_else(|| invalid(input, "number too large"))
}

/// Renders minutes as `XhYm`, dropping a zero component.
pub fn format_minutes(total: i64) -> String {
    let (hours, minutes) = (total / 60, total % 60);
    match (hours, minutes) {
        (0, m) => format!("{}m", m),
        (h, 0) => format!("{}h", h),
        (h, m) => format!("{}h{}m", h, m),
    }
}
