/// Enough fractional digits to see past the rounding digit of any f64
/// in the ranges a sensor reports.
const TIE_CHECK_DIGITS: usize = 80;

/// Format `value` with exactly `digits` decimals.
/// Values sitting exactly halfway between two outputs round away from zero
/// (2.5 -> "3"), everything else rounds to the nearest output.
/// Negative zero prints without a sign.
pub fn to_fixed(value: f64, digits: usize) -> String {
    let value = if value == 0.0 { 0.0 } else { value };
    if is_exact_tie(value, digits) {
        // The scaled tie is exactly representable, so `round` sees the true half.
        let scale = 10f64.powi(digits as i32);
        return format!("{:.*}", digits, (value * scale).round() / scale);
    }
    format!("{:.*}", digits, value)
}

/// Format `value` the way it appears as a JSON number.
/// Integral values have no fractional part and negative zero prints as "0".
pub fn json_number(value: f64) -> String {
    if value == 0.0 {
        return "0".into();
    }
    value.to_string()
}

/// True if the exact decimal expansion of `value` ends with a 5 right after
/// the last kept digit.
fn is_exact_tie(value: f64, digits: usize) -> bool {
    if !value.is_finite() {
        return false;
    }
    let expanded = format!("{:.*}", digits + TIE_CHECK_DIGITS, value.abs());
    let fraction = match expanded.split_once('.') {
        Some((_, fraction)) => fraction.as_bytes(),
        None => return false,
    };
    fraction[digits] == b'5' && fraction[digits + 1..].iter().all(|&b| b == b'0')
}
