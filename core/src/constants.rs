//! Scaled constants shared across the pricing core, mirroring the way the
//! upstream protocol expresses prices and quantities as fixed-precision
//! integers rather than floats.

use crate::fixed_point::{FixedPoint, PRECISION_DIGITS};

/// `10^PRECISION_DIGITS`, the implicit denominator of every [`FixedPoint`].
pub fn wad_digits() -> u32 {
  PRECISION_DIGITS
}

/// A `FixedPoint` representing exactly `0`.
pub fn zero() -> FixedPoint {
  FixedPoint::zero()
}

/// A `FixedPoint` representing exactly `1`.
pub fn one() -> FixedPoint {
  FixedPoint::one()
}

/// A `FixedPoint` representing exactly `2`.
pub fn two() -> FixedPoint {
  FixedPoint::from_integer(2)
}

/// Default number of decimal places used when a [`TokenDescriptor`] does not
/// specify one. Matches the common case of a 9-decimal SPL mint.
pub const DEFAULT_TOKEN_DECIMALS: u8 = 9;

/// Ceiling on the number of decimals any token in this system may declare;
/// guards against a corrupt catalog entry overflowing scale computations.
pub const MAX_TOKEN_DECIMALS: u8 = 24;
