/// Substitute 1 for denominators below 1.
///
/// Every ratio in the engine divides by `max(x, 1)` rather than raising on a
/// zero denominator.
pub fn at_least_one(value: f64) -> f64 {
    if value.is_nan() {
        return 1.0;
    }
    value.max(1.0)
}

/// Clamp to zero or above, mapping NaN to zero.
pub fn non_negative(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.max(0.0)
    }
}

/// Case-insensitive substring match. `needle_lower` must already be lowercase.
pub fn contains_ignore_case(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

/// Format a currency amount with thousands separators.
///
/// Example: 1234567.4 → "$1,234,567"
pub fn format_currency(amount: f64) -> String {
    let rounded = amount.round();
    let negative = rounded < 0.0;
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    if negative {
        format!("-${}", grouped)
    } else {
        format!("${}", grouped)
    }
}

/// "1 day" / "3 days"
pub fn pluralize_days(days: u32) -> String {
    format!("{} day{}", days, if days == 1 { "" } else { "s" })
}
