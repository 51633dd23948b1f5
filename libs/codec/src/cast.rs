//! Lenient string-to-integer conversion
//!
//! Control heads are converted the way scripting hosts cast strings to
//! integers: leading whitespace is skipped, an optional sign
//! and a decimal (or `0x` hexadecimal) digit run are read, and everything after
//! the digits is ignored. Anything that yields no digits, or does not fit in an
//! `i32`, becomes `0`, which the protocol reads as "terminal".

/// Convert `text` to an integer, degrading to `0` instead of failing
///
/// ```
/// use linkchain_codec::lenient_int;
///
/// assert_eq!(lenient_int("12"), 12);
/// assert_eq!(lenient_int("  -4"), -4);
/// assert_eq!(lenient_int("7abc"), 7);
/// assert_eq!(lenient_int("0x1F"), 31);
/// assert_eq!(lenient_int("abc"), 0);
/// assert_eq!(lenient_int(""), 0);
/// ```
pub fn lenient_int(text: &str) -> i32 {
    let trimmed = text.trim_start();
    let (negative, unsigned) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let (radix, digits) = match unsigned
        .strip_prefix("0x")
        .or_else(|| unsigned.strip_prefix("0X"))
    {
        Some(hex) if hex.starts_with(|c: char| c.is_ascii_hexdigit()) => (16, hex),
        _ => (10, unsigned),
    };

    let end = digits
        .find(|c: char| !c.is_digit(radix))
        .unwrap_or(digits.len());
    if end == 0 {
        return 0;
    }

    match i64::from_str_radix(&digits[..end], radix) {
        Ok(magnitude) => {
            let value = if negative { -magnitude } else { magnitude };
            i32::try_from(value).unwrap_or(0)
        }
        // Digit run too long for i64 - certainly out of range
        Err(_) => 0,
    }
}
