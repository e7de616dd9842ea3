/// Format a number with thousands separators and a fixed number of decimals.
///
/// # Examples
///
/// ```
/// use carshare_core::formatting::format_number;
///
/// assert_eq!(format_number(1234.5, 2), "1,234.50");
/// assert_eq!(format_number(30.0, 2), "30.00");
/// assert_eq!(format_number(-9876.5, 1), "-9,876.5");
/// ```
pub fn format_number(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let formatted = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (formatted.as_str(), None),
    };

    let mut out = String::with_capacity(formatted.len() + int_part.len() / 3 + 1);
    // "-0.00" reads oddly; only keep the sign when something non-zero is shown.
    if value < 0.0 && formatted.chars().any(|c| c.is_ascii_digit() && c != '0') {
        out.push('-');
    }
    out.push_str(&group_thousands(int_part));
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}

/// Format an integer count with thousands separators.
pub fn format_count(count: usize) -> String {
    group_thousands(&count.to_string())
}

/// Format a distance in kilometres the way the dashboard headline shows it.
///
/// ```
/// use carshare_core::formatting::format_distance;
///
/// assert_eq!(format_distance(12345.678), "12,345.68");
/// ```
pub fn format_distance(km: f64) -> String {
    format_number(km, 2)
}

/// Format a duration in minutes with one decimal, e.g. `"45.0 min"`.
pub fn format_minutes(minutes: f64) -> String {
    format!("{} min", format_number(minutes, 1))
}

/// Short label for chart annotations: `950`, `1.2k`, `3.4M`.
pub fn format_compact(value: f64) -> String {
    let abs = value.abs();
    let sign = if value < 0.0 { "-" } else { "" };
    if abs >= 1_000_000.0 {
        format!("{sign}{:.1}M", abs / 1_000_000.0)
    } else if abs >= 1_000.0 {
        format!("{sign}{:.1}k", abs / 1_000.0)
    } else if abs.fract() == 0.0 {
        format!("{sign}{abs:.0}")
    } else {
        format!("{sign}{abs:.1}")
    }
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
