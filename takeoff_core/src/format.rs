//! Number formatting for breakdown text and reports.

/// Marker shown wherever a value is not available.
pub const NOT_AVAILABLE: &str = "N/A";

/// Format with a fixed number of decimals and comma thousands separators.
///
/// ```rust
/// use takeoff_core::format::grouped;
///
/// assert_eq!(grouped(1234567.891, 2), "1,234,567.89");
/// assert_eq!(grouped(-950.0, 0), "-950");
/// ```
pub fn grouped(value: f64, decimals: usize) -> String {
    let plain = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match plain.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (plain.as_str(), None),
    };

    let mut out = String::with_capacity(plain.len() + int_part.len() / 3 + 1);
    let digits = int_part.len();
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (digits - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }

    // Only keep the sign if something non-zero survived rounding
    let nonzero = plain.chars().any(|c| c.is_ascii_digit() && c != '0');
    if value < 0.0 && nonzero {
        out.insert(0, '-');
    }
    out
}

/// Currency amount with two decimals, e.g. `$12,000.00`.
pub fn money(value: f64) -> String {
    money_with(value, "$")
}

/// Currency amount with a custom symbol.
pub fn money_with(value: f64, symbol: &str) -> String {
    let body = grouped(value, 2);
    match body.strip_prefix('-') {
        Some(abs) => format!("-{}{}", symbol, abs),
        None => format!("{}{}", symbol, body),
    }
}
