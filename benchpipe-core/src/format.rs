//! Locale-Independent Decimal Formatting
//!
//! The measurement runtime prints scores through this function; output must be
//! identical regardless of host locale or calling thread, so everything is
//! computed from the digits directly with no shared formatter state.

/// Format `value` with `precision` fractional digits.
///
/// The integer part is grouped in runs of three from the right with `,` when
/// `use_grouping` is set. With `precision == 0` only the integer part is
/// returned. Otherwise the fractional part (`value - trunc(value)`) is
/// formatted to `precision` digits with standard rounding and appended with
/// its leading zero stripped (`0.73` contributes `.73`).
pub fn format_decimal(value: f64, precision: usize, use_grouping: bool) -> String {
    let int_part = value.trunc() as i64;
    let integer_text = if use_grouping {
        group_thousands(int_part)
    } else {
        int_part.to_string()
    };

    if precision == 0 {
        return integer_text;
    }

    let fractional = value - int_part as f64;
    let fraction_text = format!("{fractional:.precision$}");
    let suffix = fraction_text.strip_prefix('0').unwrap_or(&fraction_text);
    format!("{integer_text}{suffix}")
}

/// Insert `,` separators into the decimal digits of `value`, grouping in
/// threes from the right.
fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    let len = digits.len();
    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(digit);
    }
    out
}
