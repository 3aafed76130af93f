//! Arbitrary-precision rational arithmetic with explicit, local rounding.
//!
//! Every value is stored as a [`BigInt`] mantissa over an implicit scale of
//! `10^PRECISION_DIGITS`. There is no mutable global rounding mode anywhere in
//! this module: every operation that can lose precision (`mul`, `div`, `pow`,
//! `sqrt`) takes a [`RoundingMode`] explicitly, per §9 of the design notes.

use std::cmp::Ordering;
use std::fmt;

use num_bigint::{BigInt, Sign};
use num_integer::Integer;
use num_traits::{Signed, ToPrimitive, Zero};

use crate::error::{PricingError, PricingResult};

/// Number of significant decimal digits carried by every [`FixedPoint`] value.
/// The spec requires 40+ digits to cover the product of two 64-bit reserves
/// scaled by `WAD`; we use exactly that floor.
pub const PRECISION_DIGITS: u32 = 40;

/// `6e-17`, added to the double-precision result of a real-valued power
/// before rounding it back into a [`FixedPoint`]. See `pow_real` and the
/// design notes on `FLOAT_ROUND_UP_EPSILON`: this is a deliberate
/// approximation, safe only because callers re-establish the conservative
/// bound with a ceil-multiply and an invariant check immediately afterward.
pub const FLOAT_ROUND_UP_EPSILON: f64 = 6e-17;

/// How many significant decimal digits an `f64` round-trip through
/// `pow_real` is trusted to carry. IEEE-754 doubles have ~15-17 significant
/// decimal digits; we deliberately do not pretend to carry the full
/// [`PRECISION_DIGITS`] through the float path.
const FLOAT_SIGNIFICANT_DIGITS: u32 = 17;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundingMode {
  Ceil,
  Floor,
  HalfEven,
}

/// A fixed-point rational value: `mantissa / 10^PRECISION_DIGITS`.
#[derive(Clone, PartialEq, Eq)]
pub struct FixedPoint {
  mantissa: BigInt,
}

fn scale() -> BigInt {
  BigInt::from(10u32).pow(PRECISION_DIGITS)
}

/// Divide `n` by `d`, rounding per `mode`. `d` must be non-zero; callers that
/// cannot guarantee this should go through [`checked_div_round`] instead.
fn div_round_nonzero(n: &BigInt, d: &BigInt, mode: RoundingMode) -> BigInt {
  debug_assert!(!d.is_zero(), "div_round_nonzero called with zero divisor");
  let (n, d) = if d.sign() == Sign::Minus {
    (-n, -d)
  } else {
    (n.clone(), d.clone())
  };
  let (q, r) = n.div_mod_floor(&d);
  if r.is_zero() {
    return q;
  }
  match mode {
    RoundingMode::Floor => q,
    RoundingMode::Ceil => q + 1,
    RoundingMode::HalfEven => {
      let twice_r = &r * 2u32;
      match twice_r.cmp(&d) {
        Ordering::Less => q,
        Ordering::Greater => q + 1,
        Ordering::Equal => {
          if (&q % 2).is_zero() {
            q
          } else {
            q + 1
          }
        }
      }
    }
  }
}

fn checked_div_round(n: &BigInt, d: &BigInt, mode: RoundingMode) -> PricingResult<BigInt> {
  if d.is_zero() {
    return Err(PricingError::DomainError("division by zero".to_string()));
  }
  Ok(div_round_nonzero(n, d, mode))
}

impl FixedPoint {
  pub fn zero() -> Self {
    Self {
      mantissa: BigInt::zero(),
    }
  }

  pub fn one() -> Self {
    Self::from_integer(1)
  }

  pub fn from_integer(n: impl Into<BigInt>) -> Self {
    Self {
      mantissa: n.into() * scale(),
    }
  }

  pub fn from_bigint_ratio(num: &BigInt, den: &BigInt, mode: RoundingMode) -> PricingResult<Self> {
    let mantissa = checked_div_round(&(num * scale()), den, mode)?;
    Ok(Self { mantissa })
  }

  /// Parse a decimal string (`"123.456"`, `"-0.5"`, `"0"`) into a
  /// [`FixedPoint`]. Empty-string / NaN handling is the quote engine's
  /// responsibility, not this parser's: an empty string is rejected here as
  /// `InvalidAmount` so callers must special-case it explicitly.
  pub fn from_decimal_str(s: &str) -> PricingResult<Self> {
    let s = s.trim();
    if s.is_empty() {
      return Err(PricingError::InvalidAmount("empty amount".to_string()));
    }
    let negative = s.starts_with('-');
    let unsigned = s.trim_start_matches(['+', '-']);
    if unsigned.is_empty() {
      return Err(PricingError::InvalidAmount(format!("not a number: {s}")));
    }
    let mut parts = unsigned.splitn(2, '.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next().unwrap_or("");
    let valid_int = int_part.is_empty() || int_part.bytes().all(|b| b.is_ascii_digit());
    let valid_frac = frac_part.bytes().all(|b| b.is_ascii_digit());
    if !valid_int || !valid_frac {
      return Err(PricingError::InvalidAmount(format!("not a number: {s}")));
    }
    if frac_part.len() > PRECISION_DIGITS as usize {
      return Err(PricingError::InvalidAmount(format!(
        "too many fractional digits: {s}"
      )));
    }
    let int_big = if int_part.is_empty() {
      BigInt::zero()
    } else {
      int_part
        .parse::<BigInt>()
        .map_err(|_| PricingError::InvalidAmount(format!("not a number: {s}")))?
    };
    let mut frac_digits = frac_part.to_string();
    while frac_digits.len() < PRECISION_DIGITS as usize {
      frac_digits.push('0');
    }
    let frac_big = if frac_digits.is_empty() {
      BigInt::zero()
    } else {
      frac_digits
        .parse::<BigInt>()
        .map_err(|_| PricingError::InvalidAmount(format!("not a number: {s}")))?
    };
    let mut mantissa = int_big * scale() + frac_big;
    if negative {
      mantissa = -mantissa;
    }
    Ok(Self { mantissa })
  }

  /// Render to a decimal string with exactly `fractional_digits` places,
  /// rounding per `mode`. The default mode for display-only conversions is
  /// [`RoundingMode::HalfEven`].
  pub fn to_decimal_string(&self, fractional_digits: u32, mode: RoundingMode) -> String {
    let target_mantissa = if fractional_digits >= PRECISION_DIGITS {
      &self.mantissa * BigInt::from(10u32).pow(fractional_digits - PRECISION_DIGITS)
    } else {
      let divisor = BigInt::from(10u32).pow(PRECISION_DIGITS - fractional_digits);
      div_round_nonzero(&self.mantissa, &divisor, mode)
    };
    let negative = target_mantissa.sign() == Sign::Minus;
    let digits = target_mantissa.abs().to_str_radix(10);
    if fractional_digits == 0 {
      return format!("{}{}", if negative { "-" } else { "" }, digits);
    }
    let digits = if digits.len() <= fractional_digits as usize {
      format!(
        "{}{}",
        "0".repeat(fractional_digits as usize - digits.len() + 1),
        digits
      )
    } else {
      digits
    };
    let split_at = digits.len() - fractional_digits as usize;
    let (int_part, frac_part) = digits.split_at(split_at);
    format!(
      "{}{}.{}",
      if negative { "-" } else { "" },
      int_part,
      frac_part
    )
  }

  pub fn add(&self, other: &Self) -> Self {
    Self {
      mantissa: &self.mantissa + &other.mantissa,
    }
  }

  pub fn sub(&self, other: &Self) -> Self {
    Self {
      mantissa: &self.mantissa - &other.mantissa,
    }
  }

  pub fn mul(&self, other: &Self, mode: RoundingMode) -> Self {
    let product = &self.mantissa * &other.mantissa;
    Self {
      mantissa: div_round_nonzero(&product, &scale(), mode),
    }
  }

  pub fn div(&self, other: &Self, mode: RoundingMode) -> PricingResult<Self> {
    let numerator = &self.mantissa * scale();
    let mantissa = checked_div_round(&numerator, &other.mantissa, mode)?;
    Ok(Self { mantissa })
  }

  pub fn neg(&self) -> Self {
    Self {
      mantissa: -&self.mantissa,
    }
  }

  pub fn abs(&self) -> Self {
    Self {
      mantissa: self.mantissa.abs(),
    }
  }

  pub fn is_zero(&self) -> bool {
    self.mantissa.is_zero()
  }

  pub fn is_positive(&self) -> bool {
    self.mantissa.sign() == Sign::Plus
  }

  pub fn is_negative(&self) -> bool {
    self.mantissa.sign() == Sign::Minus
  }

  pub fn min(&self, other: &Self) -> Self {
    if self <= other {
      self.clone()
    } else {
      other.clone()
    }
  }

  pub fn max(&self, other: &Self) -> Self {
    if self >= other {
      self.clone()
    } else {
      other.clone()
    }
  }

  /// Integer-part extraction: truncate toward zero, discarding the
  /// fractional remainder.
  pub fn trunc_to_integer(&self) -> BigInt {
    &self.mantissa / scale()
  }

  /// Round to the nearest whole unit per `mode` (as opposed to
  /// [`trunc_to_integer`], which always truncates toward zero).
  pub fn round_to_integer(&self, mode: RoundingMode) -> BigInt {
    div_round_nonzero(&self.mantissa, &scale(), mode)
  }

  /// Exponentiation by squaring for a small non-negative integer exponent,
  /// rounding at every intermediate multiplication per `mode`.
  pub fn pow_u32(&self, mut exponent: u32, mode: RoundingMode) -> Self {
    let mut result = Self::one();
    let mut base = self.clone();
    while exponent > 0 {
      if exponent & 1 == 1 {
        result = result.mul(&base, mode);
      }
      base = base.mul(&base, mode);
      exponent >>= 1;
    }
    result
  }

  /// Square root via a single Newton loop over integer mantissas, with a
  /// final directional adjustment for `mode`. `Ceil`/`Floor` give the exact
  /// ceiling/floor root; `HalfEven` rounds to the nearer of the two,
  /// breaking ties to the even mantissa.
  pub fn sqrt(&self, mode: RoundingMode) -> PricingResult<Self> {
    if self.is_negative() {
      return Err(PricingError::DomainError(
        "square root of a negative value".to_string(),
      ));
    }
    if self.is_zero() {
      return Ok(Self::zero());
    }
    // value = mantissa / scale; we want y with y^2/scale == mantissa, i.e.
    // y == floor(sqrt(mantissa * scale)).
    let target = &self.mantissa * scale();
    let floor_root = isqrt_floor(&target);
    let exact = &floor_root * &floor_root == target;
    let mantissa = if exact {
      floor_root
    } else {
      match mode {
        RoundingMode::Floor => floor_root,
        RoundingMode::Ceil => floor_root + 1,
        RoundingMode::HalfEven => {
          let ceil_root = &floor_root + 1;
          let lower_gap = &target - &floor_root * &floor_root;
          let upper_gap = &ceil_root * &ceil_root - &target;
          match lower_gap.cmp(&upper_gap) {
            Ordering::Less => floor_root,
            Ordering::Greater => ceil_root,
            Ordering::Equal => {
              if (&floor_root % 2).is_zero() {
                floor_root
              } else {
                ceil_root
              }
            }
          }
        }
      }
    };
    Ok(Self { mantissa })
  }

  fn to_f64_lossy(&self) -> f64 {
    let scale_f64 = 10f64.powi(PRECISION_DIGITS as i32);
    self.mantissa.to_f64().unwrap_or(f64::NAN) / scale_f64
  }

  fn from_f64_lossy(value: f64) -> PricingResult<Self> {
    if !value.is_finite() {
      return Err(PricingError::DomainError(
        "non-finite intermediate value".to_string(),
      ));
    }
    let shift = 10f64.powi(FLOAT_SIGNIFICANT_DIGITS as i32);
    let scaled = (value * shift).round();
    if !scaled.is_finite() {
      return Err(PricingError::DomainError(
        "non-finite intermediate value".to_string(),
      ));
    }
    let as_bigint = BigInt::from(scaled as i128);
    let remaining = BigInt::from(10u32).pow(PRECISION_DIGITS - FLOAT_SIGNIFICANT_DIGITS);
    Ok(Self {
      mantissa: as_bigint * remaining,
    })
  }

  /// Real-valued power `self^exponent`, evaluated via `f64::powf` with the
  /// documented epsilon bias. This is the one deliberately approximate
  /// operation in this module (see the module docs and design notes); every
  /// call site immediately re-establishes a conservative bound with a
  /// ceil-rounded multiplication and an invariant check.
  pub fn pow_real(&self, exponent: &Self) -> PricingResult<Self> {
    if self.is_negative() {
      return Err(PricingError::DomainError(
        "real-valued power of a negative base".to_string(),
      ));
    }
    let base = self.to_f64_lossy();
    let exp = exponent.to_f64_lossy();
    let raw = base.powf(exp) + FLOAT_ROUND_UP_EPSILON;
    Self::from_f64_lossy(raw)
  }
}

/// Floor integer square root via Newton's method.
fn isqrt_floor(n: &BigInt) -> BigInt {
  if n.is_zero() {
    return BigInt::zero();
  }
  let mut x = n.clone();
  let mut y = (&x + 1u32) / 2u32;
  while y < x {
    x = y.clone();
    y = (&x + n / &x) / 2u32;
  }
  x
}

impl PartialOrd for FixedPoint {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.mantissa.cmp(&other.mantissa))
  }
}

impl Ord for FixedPoint {
  fn cmp(&self, other: &Self) -> Ordering {
    self.mantissa.cmp(&other.mantissa)
  }
}

impl fmt::Debug for FixedPoint {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "FixedPoint({})",
      self.to_decimal_string(18, RoundingMode::HalfEven)
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn fp(s: &str) -> FixedPoint {
    FixedPoint::from_decimal_str(s).unwrap()
  }

  #[test]
  fn parses_and_renders_round_trip() {
    let v = fp("123.456000");
    assert_eq!(v.to_decimal_string(6, RoundingMode::HalfEven), "123.456000");
  }

  #[test]
  fn parses_negative() {
    let v = fp("-0.5");
    assert!(v.is_negative());
    assert_eq!(v.to_decimal_string(1, RoundingMode::HalfEven), "-0.5");
  }

  #[test]
  fn rejects_empty_and_garbage() {
    assert!(FixedPoint::from_decimal_str("").is_err());
    assert!(FixedPoint::from_decimal_str("abc").is_err());
    assert!(FixedPoint::from_decimal_str("1.2.3").is_err());
  }

  #[test]
  fn ceil_div_rounds_away_from_zero_on_remainder() {
    let one = FixedPoint::from_integer(1);
    let three = FixedPoint::from_integer(3);
    let q = one.div(&three, RoundingMode::Ceil).unwrap();
    let exact_third = one.div(&three, RoundingMode::Floor).unwrap();
    assert!(q > exact_third);
  }

  #[test]
  fn div_by_zero_is_domain_error() {
    let one = FixedPoint::from_integer(1);
    let zero = FixedPoint::zero();
    assert!(matches!(
      one.div(&zero, RoundingMode::Floor),
      Err(PricingError::DomainError(_))
    ));
  }

  #[test]
  fn sqrt_of_negative_is_domain_error() {
    let neg = fp("-4");
    assert!(matches!(
      neg.sqrt(RoundingMode::Ceil),
      Err(PricingError::DomainError(_))
    ));
  }

  #[test]
  fn sqrt_perfect_square_is_exact() {
    let four = FixedPoint::from_integer(4);
    let root = four.sqrt(RoundingMode::Floor).unwrap();
    assert_eq!(root, FixedPoint::from_integer(2));
  }

  #[test]
  fn sqrt_non_perfect_square_respects_direction() {
    let two = FixedPoint::from_integer(2);
    let floor_root = two.sqrt(RoundingMode::Floor).unwrap();
    let ceil_root = two.sqrt(RoundingMode::Ceil).unwrap();
    assert!(floor_root < ceil_root);
    assert!(floor_root.mul(&floor_root, RoundingMode::Floor) <= two);
    assert!(ceil_root.mul(&ceil_root, RoundingMode::Ceil) >= two);
  }

  #[test]
  fn pow_u32_matches_repeated_multiplication() {
    let base = fp("1.001");
    let squared = base.mul(&base, RoundingMode::HalfEven);
    let powed = base.pow_u32(2, RoundingMode::HalfEven);
    assert_eq!(squared, powed);
  }

  #[test]
  fn half_even_breaks_ties_to_even() {
    // 0.5 rounded to an integer (scale of 1) should go to 0 (even).
    let half = FixedPoint {
      mantissa: scale() / 2u32,
    };
    let rounded = half.round_to_integer(RoundingMode::HalfEven);
    assert_eq!(rounded, BigInt::zero());
  }

  #[test]
  fn trunc_to_integer_discards_fraction() {
    let v = fp("7.999");
    assert_eq!(v.trunc_to_integer(), BigInt::from(7));
  }
}
