//! Exact fixed-point decimals.
//!
//! A [`Decimal`] is an `i128` mantissa plus a scale, the same layout Arrow uses
//! for `Decimal128`. Every arithmetic method is checked: results that would
//! need more than [`MAX_DECIMAL_PRECISION`] digits come back as `None`, and
//! callers turn that into an overflow error.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::utils::error::{Error, Result};

/// Maximum number of significant digits a decimal can hold.
pub const MAX_DECIMAL_PRECISION: u8 = 38;

/// Maximum number of digits after the decimal point.
pub const MAX_DECIMAL_SCALE: u8 = 30;

const POW10: [i128; 39] = {
    let mut table = [1i128; 39];
    let mut i = 1;
    while i < 39 {
        table[i] = table[i - 1] * 10;
        i += 1;
    }
    table
};

#[inline]
fn pow10(exp: u8) -> i128 {
    POW10[usize::from(exp)]
}

/// Number of decimal digits in `v`, counting zero as one digit.
#[inline]
fn digit_count(v: i128) -> u32 {
    v.unsigned_abs().checked_ilog10().map_or(1, |d| d + 1)
}

/// An exact decimal number: `mantissa * 10^-scale`.
///
/// Equality and ordering compare numeric values, so `1.5` equals `1.50`.
///
/// # Examples
///
/// ```
/// use vireo_common::types::Decimal;
///
/// let a: Decimal = "12.50".parse().unwrap();
/// let b = Decimal::from_f64(0.25).unwrap();
/// assert_eq!(a.checked_add(b).unwrap().to_string(), "12.75");
/// ```
#[derive(Clone, Copy, Default)]
pub struct Decimal {
    mantissa: i128,
    scale: u8,
}

impl Decimal {
    /// Zero with scale 0.
    pub const ZERO: Decimal = Decimal {
        mantissa: 0,
        scale: 0,
    };

    /// Builds a decimal from its raw parts.
    pub fn new(mantissa: i128, scale: u8) -> Result<Self> {
        if scale > MAX_DECIMAL_SCALE {
            return Err(Error::Conversion(format!(
                "decimal scale {scale} exceeds maximum {MAX_DECIMAL_SCALE}"
            )));
        }
        if digit_count(mantissa) > u32::from(MAX_DECIMAL_PRECISION) {
            return Err(Error::overflow("DECIMAL", mantissa.to_string()));
        }
        Ok(Self { mantissa, scale })
    }

    /// Converts an integer exactly.
    #[must_use]
    pub const fn from_i64(v: i64) -> Self {
        Self {
            mantissa: v as i128,
            scale: 0,
        }
    }

    /// Converts a float through its shortest round-trip representation.
    ///
    /// `0.1` becomes exactly `0.1`, not the binary expansion of the float.
    pub fn from_f64(v: f64) -> Result<Self> {
        if !v.is_finite() {
            return Err(Error::Conversion(format!("{v} cannot be a decimal")));
        }
        format!("{v}").parse()
    }

    /// The raw unscaled integer.
    #[must_use]
    pub const fn mantissa(&self) -> i128 {
        self.mantissa
    }

    /// Digits after the decimal point.
    #[must_use]
    pub const fn scale(&self) -> u8 {
        self.scale
    }

    /// Returns true if the value is zero at any scale.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.mantissa == 0
    }

    /// Returns true if the value is below zero.
    #[must_use]
    pub const fn is_negative(&self) -> bool {
        self.mantissa < 0
    }

    /// Number of significant digits in the mantissa.
    #[must_use]
    pub fn precision(&self) -> u8 {
        // digit_count is at most 39 for any i128
        digit_count(self.mantissa) as u8
    }

    fn checked(mantissa: i128, scale: u8) -> Option<Self> {
        (digit_count(mantissa) <= u32::from(MAX_DECIMAL_PRECISION)).then_some(Self { mantissa, scale })
    }

    /// Brings two decimals to a common scale.
    fn align(self, other: Self) -> Option<(i128, i128, u8)> {
        let scale = self.scale.max(other.scale);
        let a = self.mantissa.checked_mul(pow10(scale - self.scale))?;
        let b = other.mantissa.checked_mul(pow10(scale - other.scale))?;
        Some((a, b, scale))
    }

    /// `self + other`, or `None` on overflow.
    #[must_use]
    pub fn checked_add(self, other: Self) -> Option<Self> {
        let (a, b, scale) = self.align(other)?;
        Self::checked(a.checked_add(b)?, scale)
    }

    /// `self - other`, or `None` on overflow.
    #[must_use]
    pub fn checked_sub(self, other: Self) -> Option<Self> {
        let (a, b, scale) = self.align(other)?;
        Self::checked(a.checked_sub(b)?, scale)
    }

    /// `self * other`, or `None` on overflow.
    ///
    /// Scales add up; a product finer than [`MAX_DECIMAL_SCALE`] is rounded.
    #[must_use]
    pub fn checked_mul(self, other: Self) -> Option<Self> {
        let mantissa = self.mantissa.checked_mul(other.mantissa)?;
        let scale = self.scale + other.scale;
        if scale > MAX_DECIMAL_SCALE {
            return Self { mantissa, scale }.rescale(MAX_DECIMAL_SCALE);
        }
        Self::checked(mantissa, scale)
    }

    /// Changes the scale, rounding half away from zero when digits are dropped.
    #[must_use]
    pub fn rescale(self, scale: u8) -> Option<Self> {
        if scale > MAX_DECIMAL_SCALE {
            return None;
        }
        match scale.cmp(&self.scale) {
            Ordering::Equal => Self::checked(self.mantissa, scale),
            Ordering::Greater => {
                let mantissa = self.mantissa.checked_mul(pow10(scale - self.scale))?;
                Self::checked(mantissa, scale)
            }
            Ordering::Less => {
                let divisor = pow10(self.scale - scale);
                let mut quotient = self.mantissa / divisor;
                let remainder = self.mantissa % divisor;
                if remainder.unsigned_abs() * 2 >= divisor.unsigned_abs() {
                    quotient += self.mantissa.signum();
                }
                Self::checked(quotient, scale)
            }
        }
    }

    /// Rescales to `scale` and checks the result has at most `precision` digits.
    #[must_use]
    pub fn fit(self, precision: u8, scale: u8) -> Option<Self> {
        let value = self.rescale(scale)?;
        (digit_count(value.mantissa) <= u32::from(precision)).then_some(value)
    }

    /// Nearest `f64`.
    #[must_use]
    pub fn to_f64(&self) -> f64 {
        self.to_string().parse().unwrap_or_else(|_| {
            #[allow(clippy::cast_precision_loss)]
            let m = self.mantissa as f64;
            m / 10f64.powi(i32::from(self.scale))
        })
    }

    /// The same value with trailing fractional zeros removed.
    #[must_use]
    pub fn normalize(self) -> Self {
        let mut value = self;
        while value.scale > 0 && value.mantissa % 10 == 0 {
            value.mantissa /= 10;
            value.scale -= 1;
        }
        value
    }
}

impl From<i64> for Decimal {
    fn from(v: i64) -> Self {
        Self::from_i64(v)
    }
}

impl FromStr for Decimal {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::Conversion(format!("'{s}' is not a valid decimal"));
        let text = s.trim();
        let (negative, rest) = match text.as_bytes().first() {
            Some(b'-') => (true, &text[1..]),
            Some(b'+') => (false, &text[1..]),
            _ => (false, text),
        };
        let (number, exponent) = match rest.find(['e', 'E']) {
            Some(pos) => (
                &rest[..pos],
                rest[pos + 1..].parse::<i32>().map_err(|_| invalid())?,
            ),
            None => (rest, 0),
        };
        let (int_part, frac_part) = number.split_once('.').unwrap_or((number, ""));
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }
        if !int_part.bytes().chain(frac_part.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let mut digits: Vec<u8> = int_part
            .bytes()
            .chain(frac_part.bytes())
            .map(|b| b - b'0')
            .collect();
        let frac_len = i32::try_from(frac_part.len()).map_err(|_| invalid())?;
        let mut scale = frac_len.checked_sub(exponent).ok_or_else(invalid)?;
        if scale < 0 {
            let pad = usize::try_from(-scale).map_err(|_| invalid())?;
            if pad > usize::from(MAX_DECIMAL_PRECISION) {
                return Err(Error::overflow("DECIMAL", s));
            }
            digits.resize(digits.len() + pad, 0);
            scale = 0;
        }

        let max_scale = i32::from(MAX_DECIMAL_SCALE);
        let mut round_up = false;
        if scale > max_scale {
            let drop = usize::try_from(scale - max_scale).map_err(|_| invalid())?;
            if drop <= digits.len() {
                let keep = digits.len() - drop;
                round_up = digits[keep] >= 5;
                digits.truncate(keep);
            } else {
                digits.clear();
            }
            scale = max_scale;
        }

        let mut mantissa: i128 = 0;
        for &d in digits.iter().skip_while(|d| **d == 0) {
            mantissa = mantissa
                .checked_mul(10)
                .and_then(|m| m.checked_add(i128::from(d)))
                .ok_or_else(|| Error::overflow("DECIMAL", s))?;
        }
        if round_up {
            mantissa += 1;
        }
        if negative {
            mantissa = -mantissa;
        }
        let scale = u8::try_from(scale).map_err(|_| invalid())?;
        Self::checked(mantissa, scale).ok_or_else(|| Error::overflow("DECIMAL", s))
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scale == 0 {
            return write!(f, "{}", self.mantissa);
        }
        let digits = self.mantissa.unsigned_abs().to_string();
        let scale = usize::from(self.scale);
        let padded = if digits.len() <= scale {
            format!("{}{digits}", "0".repeat(scale + 1 - digits.len()))
        } else {
            digits
        };
        let (int_part, frac_part) = padded.split_at(padded.len() - scale);
        let sign = if self.mantissa < 0 { "-" } else { "" };
        write!(f, "{sign}{int_part}.{frac_part}")
    }
}

impl fmt::Debug for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Decimal({self})")
    }
}

impl PartialEq for Decimal {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Decimal {}

impl PartialOrd for Decimal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Decimal {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.scale == other.scale {
            return self.mantissa.cmp(&other.mantissa);
        }
        // Only the coarser side is scaled up. If that overflows its magnitude
        // exceeds anything the finer side can hold, so its sign decides.
        if self.scale < other.scale {
            match self.mantissa.checked_mul(pow10(other.scale - self.scale)) {
                Some(a) => a.cmp(&other.mantissa),
                None if self.mantissa > 0 => Ordering::Greater,
                None => Ordering::Less,
            }
        } else {
            other.cmp(self).reverse()
        }
    }
}

impl Hash for Decimal {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let normalized = self.normalize();
        normalized.mantissa.hash(state);
        normalized.scale.hash(state);
    }
}
