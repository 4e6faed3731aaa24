//! Permissive number coercion for form values.
//!
//! Browser form fields arrive as strings and are coerced by taking the longest
//! leading decimal literal: `"12abc"` is `12`, `" 7.5"` is `7.5`, and a value
//! with no numeric prefix is `NaN`.

/// Parses the longest decimal literal at the start of `input`.
///
/// Leading whitespace is skipped. A sign, integer digits, an optional fraction
/// and an optional exponent are accepted; `Infinity` is recognised as well.
/// Returns `f64::NAN` when no prefix forms a number.
pub fn parse_float(input: &str) -> f64 {
    let trimmed = input.trim_start();
    let bytes = trimmed.as_bytes();

    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }

    if trimmed[end..].starts_with("Infinity") {
        return if bytes.first() == Some(&b'-') { f64::NEG_INFINITY } else { f64::INFINITY };
    }

    let int_digits = count_digits(&bytes[end..]);
    end += int_digits;

    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = count_digits(&bytes[end + 1..]);
        if frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }

    if int_digits == 0 && frac_digits == 0 {
        return f64::NAN;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exponent_end = end + 1;
        if matches!(bytes.get(exponent_end), Some(b'+' | b'-')) {
            exponent_end += 1;
        }
        let exponent_digits = count_digits(&bytes[exponent_end..]);
        if exponent_digits > 0 {
            end = exponent_end + exponent_digits;
        }
    }

    trimmed[..end].parse::<f64>().unwrap_or(f64::NAN)
}

/// Like [`parse_float`] but maps `NaN` to zero, for amounts where an
/// unreadable value should not poison a sum.
pub fn parse_amount_or_zero(input: &str) -> f64 {
    let value = parse_float(input);
    if value.is_nan() {
        0.0
    } else {
        value
    }
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|byte| byte.is_ascii_digit()).count()
}
