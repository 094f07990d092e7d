//! Number recognition for the integer, double precision and numeric types.

use num_bigint::BigUint;
use num_traits::Zero;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ValueFormatError;

use super::descriptor::Verdict;

/// Plain decimal notation: optional sign, integer digits, optional fraction.
static PLAIN_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?([0-9]+)(?:\.([0-9]+))?$").unwrap());

/// Plain integer notation.
static PLAIN_INTEGER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[+-]?([0-9]+)$").unwrap());

/// Bits in the significand of a double, hidden bit included.
const DOUBLE_SIGNIFICAND_BITS: u64 = 53;

/// Exponent bounds of a double: values stay below `2^1024`, and the
/// smallest subnormal is `2^-1074`.
const DOUBLE_MAX_EXPONENT: i64 = 1024;
const DOUBLE_MIN_EXPONENT: i64 = -1074;

/// Integer digits with a superfluous leading zero (`"07"`, `"-012.5"`).
/// A lone `0` before the decimal point is not a leading zero.
fn has_leading_zero(integer_digits: &str) -> bool {
    integer_digits.len() > 1 && integer_digits.starts_with('0')
}

fn parse_digits(value: &str, digits: &str) -> Result<BigUint, Verdict> {
    BigUint::parse_bytes(digits.as_bytes(), 10)
        .ok_or_else(|| Verdict::InvalidInput(ValueFormatError::NotANumber(value.to_string())))
}

/// Integer rule: plain integer notation of any size, no leading zero, and
/// the integer equals the value read as a double.
pub(crate) fn check_integer(value: &str) -> Verdict {
    let Some(captures) = PLAIN_INTEGER.captures(value) else {
        return Verdict::InvalidInput(ValueFormatError::NotANumber(value.to_string()));
    };
    let digits = captures.get(1).map_or("", |m| m.as_str());

    if has_leading_zero(digits) {
        return Verdict::DoesNotMatch("leading zero");
    }

    let magnitude = match parse_digits(value, digits) {
        Ok(m) => m,
        Err(verdict) => return verdict,
    };
    if !is_binary_exact(&magnitude, 0) {
        return Verdict::DoesNotMatch("integer is not exact as double precision");
    }

    Verdict::Matches
}

/// Double precision rule: a non-integral number whose decimal value is
/// exactly representable as a double.
pub(crate) fn check_double(value: &str) -> Verdict {
    let (mantissa, scale) = match parse_fractional(value) {
        Ok(parts) => parts,
        Err(verdict) => return verdict,
    };
    if !is_binary_exact(&mantissa, scale) {
        return Verdict::DoesNotMatch("not exactly representable as double precision");
    }
    Verdict::Matches
}

/// Numeric rule: a non-integral exact decimal that a double cannot hold
/// without rounding. Precision is unbounded.
pub(crate) fn check_numeric(value: &str) -> Verdict {
    let (mantissa, scale) = match parse_fractional(value) {
        Ok(parts) => parts,
        Err(verdict) => return verdict,
    };
    if is_binary_exact(&mantissa, scale) {
        return Verdict::DoesNotMatch("exactly representable as double precision");
    }
    Verdict::Matches
}

/// Shared lexing for the two fractional types: plain notation, no leading
/// zero, not integral. Returns the magnitude as `mantissa / 10^scale`
/// with trailing fraction zeros removed.
fn parse_fractional(value: &str) -> Result<(BigUint, u32), Verdict> {
    let captures = PLAIN_NUMBER
        .captures(value)
        .ok_or_else(|| Verdict::InvalidInput(ValueFormatError::NotANumber(value.to_string())))?;

    let integer = captures.get(1).map_or("", |m| m.as_str());
    if has_leading_zero(integer) {
        return Err(Verdict::DoesNotMatch("leading zero"));
    }

    let fraction = captures
        .get(2)
        .map_or("", |m| m.as_str())
        .trim_end_matches('0');
    if fraction.is_empty() {
        return Err(Verdict::DoesNotMatch("integral value"));
    }

    let scale = u32::try_from(fraction.len())
        .map_err(|_| Verdict::InvalidInput(ValueFormatError::OutOfRange(value.to_string())))?;
    let mantissa = parse_digits(value, &format!("{}{}", integer, fraction))?;

    Ok((mantissa, scale))
}

/// Whether `mantissa / 10^scale` equals a double exactly.
///
/// The value reduces to `k / 2^scale` only when `5^scale` divides the
/// mantissa. Writing `k = odd * 2^t`, it is a double when `odd` fits the
/// significand and `odd * 2^(t - scale)` lies inside the exponent range.
pub(crate) fn is_binary_exact(mantissa: &BigUint, scale: u32) -> bool {
    if mantissa.is_zero() {
        return true;
    }

    let five_pow = BigUint::from(5u32).pow(scale);
    if !(mantissa % &five_pow).is_zero() {
        return false;
    }

    let k = mantissa / five_pow;
    let twos = k.trailing_zeros().unwrap_or(0);
    let odd_bits = (k >> twos).bits();
    let exponent = twos as i64 - i64::from(scale);

    odd_bits <= DOUBLE_SIGNIFICAND_BITS
        && exponent >= DOUBLE_MIN_EXPONENT
        && odd_bits as i64 + exponent <= DOUBLE_MAX_EXPONENT
}
