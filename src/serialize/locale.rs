//! `en-US` display formatting for numbers and dates.
use chrono::{DateTime, Utc};

/// Grouped thousands, at most three fraction digits, `∞` for infinities.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".into();
    }
    let sign = if n.is_sign_negative() { "-" } else { "" };
    if n.is_infinite() {
        return format!("{sign}∞");
    }
    let fixed = format!("{:.3}", n.abs());
    let (int, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let frac = frac.trim_end_matches('0');
    let mut out = String::from(sign);
    out.push_str(&group_thousands(int));
    if !frac.is_empty() {
        out.push('.');
        out.push_str(frac);
    }
    out
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// `M/D/YYYY, h:mm:ss AM` in UTC, or `Invalid Date`.
pub fn format_date(epoch_millis: f64) -> String {
    to_utc(epoch_millis)
        .map(|date| date.format("%-m/%-d/%Y, %-I:%M:%S %p").to_string())
        .unwrap_or_else(|| "Invalid Date".into())
}

fn to_utc(epoch_millis: f64) -> Option<DateTime<Utc>> {
    if !epoch_millis.is_finite() {
        return None;
    }
    DateTime::from_timestamp_millis(epoch_millis.trunc() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers() {
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(42.0), "42");
        assert_eq!(format_number(1234567.891), "1,234,567.891");
        assert_eq!(format_number(-1000.5), "-1,000.5");
        assert_eq!(format_number(3.14159), "3.142");
        assert_eq!(format_number(999.9999), "1,000");
        assert_eq!(format_number(f64::NAN), "NaN");
        assert_eq!(format_number(f64::INFINITY), "∞");
        assert_eq!(format_number(f64::NEG_INFINITY), "-∞");
    }

    #[test]
    fn dates() {
        assert_eq!(format_date(0.0), "1/1/1970, 12:00:00 AM");
        assert_eq!(format_date(1_700_000_000_000.0), "11/14/2023, 10:13:20 PM");
        assert_eq!(format_date(f64::NAN), "Invalid Date");
    }
}
