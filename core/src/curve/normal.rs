//! Normal-swap (logarithmic) curve kernel. See §4.B.1-4.B.3.
//!
//! The source conflates forward and inverse quoting by feeding a negative
//! `m` into one formula. This module keeps the shared arithmetic in
//! [`forward_raw`] but exposes two explicit entry points, `forward_out` and
//! `inverse_in`, per the design notes' "cleaner decomposition". The
//! equivalence `inverse_in(out) == -forward_raw(b, a, B, A, 1/P, -out)` was
//! checked by hand: substituting the closed form's definition into the
//! inverted-argument kernel and simplifying recovers exactly the algebraic
//! inverse of the forward formula.

use num_bigint::BigInt;
use num_traits::ToPrimitive;

use crate::curve::KernelOutcome;
use crate::error::{PricingError, PricingResult};
use crate::fixed_point::{FixedPoint, RoundingMode};

/// `exp = P * A / B`, rounded Floor at the division per §4.B.1.
fn exponent(price: &FixedPoint, target_in: &FixedPoint, target_out: &FixedPoint) -> PricingResult<FixedPoint> {
  let numerator = price.mul(target_in, RoundingMode::HalfEven);
  numerator.div(target_out, RoundingMode::Floor)
}

/// The closed form of §4.B.1. Returns `None` when `a + m <= 0` (the
/// sentinel for an infeasible trade), `Some(output)` otherwise. `output`
/// may be negative when called internally with a negative `m` (the inverse
/// path); callers at the public boundary never see a negative forward
/// output.
fn closed_form(
  reserve_in: &FixedPoint,
  reserve_out: &FixedPoint,
  target_in: &FixedPoint,
  target_out: &FixedPoint,
  price: &FixedPoint,
  m: &FixedPoint,
) -> PricingResult<Option<FixedPoint>> {
  let denom = reserve_in.add(m);
  if !denom.is_positive() {
    return Ok(None);
  }
  let core = reserve_in.div(&denom, RoundingMode::Ceil)?;
  let exp = exponent(price, target_in, target_out)?;
  let core_pow = core.pow_real(&exp)?;
  let b_core = reserve_out.mul(&core_pow, RoundingMode::Ceil);
  Ok(Some(reserve_out.sub(&b_core)))
}

/// `implied = m * (b/a) * P * (A/B)`, the linear-price upper bound used
/// both for the approximation and the final invariant check.
fn implied_amount_out(
  reserve_in: &FixedPoint,
  reserve_out: &FixedPoint,
  target_in: &FixedPoint,
  target_out: &FixedPoint,
  price: &FixedPoint,
  m: &FixedPoint,
) -> PricingResult<FixedPoint> {
  let ratio = reserve_out.div(reserve_in, RoundingMode::Ceil)?;
  let exp = exponent(price, target_in, target_out)?;
  Ok(m.mul(&ratio, RoundingMode::Ceil).mul(&exp, RoundingMode::Ceil))
}

/// §4.B.2. `None` means "skip the approximation"; never conflated with a
/// legitimate `Some(FixedPoint::zero())` result (see design notes).
fn approximate(
  reserve_in: &FixedPoint,
  reserve_out: &FixedPoint,
  target_in: &FixedPoint,
  target_out: &FixedPoint,
  price: &FixedPoint,
  m: &FixedPoint,
) -> PricingResult<Option<FixedPoint>> {
  let exp_rational = exponent(price, target_in, target_out)?;
  let exp_ceil_big = exp_rational.round_to_integer(RoundingMode::Ceil);
  if exp_ceil_big.sign() == num_bigint::Sign::Minus {
    return Ok(None);
  }
  let exp_ceil_u32 = exp_ceil_big
    .to_u32()
    .ok_or_else(|| PricingError::DomainError("approximation exponent too large".to_string()))?;
  let exp_ceil_fp = FixedPoint::from_integer(BigInt::from(exp_ceil_u32));

  let m_times_exp = m.mul(&exp_ceil_fp, RoundingMode::HalfEven);
  if *reserve_in <= m_times_exp || *reserve_out <= *m {
    return Ok(None);
  }

  let denom = reserve_in.add(m);
  if !denom.is_positive() {
    return Ok(None);
  }
  let base = reserve_in.div(&denom, RoundingMode::Ceil)?;
  let core_high = base.pow_u32(exp_ceil_u32, RoundingMode::Ceil);

  let core_low_numerator = reserve_in.sub(&m_times_exp);
  let core_low = core_low_numerator.div(reserve_in, RoundingMode::Floor)?;
  if core_low.is_zero() {
    return Ok(None);
  }
  let k = core_high.div(&core_low, RoundingMode::Ceil)?;

  let implied = implied_amount_out(reserve_in, reserve_out, target_in, target_out, price, m)?;
  let k_minus_one = k.sub(&FixedPoint::one());
  let diff = k_minus_one.mul(&reserve_out.sub(&implied), RoundingMode::HalfEven);

  if implied.abs() <= diff.abs() {
    return Ok(None);
  }

  let approx_exact = implied.sub(&diff);
  let approx_floor_bigint = approx_exact.round_to_integer(RoundingMode::Floor);
  Ok(Some(FixedPoint::from_integer(approx_floor_bigint)))
}

/// Shared kernel for both the forward and inverse entry points. `m` may be
/// negative (the inverse path); the combined-result invariant (`output <=
/// implied`) is still enforced, since `implied` is negative too in that
/// case and the comparison remains meaningful.
fn forward_raw(
  reserve_in: &FixedPoint,
  reserve_out: &FixedPoint,
  target_in: &FixedPoint,
  target_out: &FixedPoint,
  price: &FixedPoint,
  m: &FixedPoint,
) -> PricingResult<KernelOutcome> {
  let closed = match closed_form(reserve_in, reserve_out, target_in, target_out, price, m)? {
    None => return Ok(KernelOutcome::Infeasible),
    Some(v) => v,
  };
  let approx = approximate(reserve_in, reserve_out, target_in, target_out, price, m)?;
  let implied = implied_amount_out(reserve_in, reserve_out, target_in, target_out, price, m)?;

  let output = match approx {
    Some(a) => a.max(&closed),
    None => closed,
  };

  if output > implied {
    return Err(PricingError::InternalInvariant(
      "normal-swap output exceeds implied linear-price bound".to_string(),
    ));
  }

  Ok(KernelOutcome::Output(output))
}

/// Given `m >= 0` units of the in-side token, returns the raw (pool-scale,
/// undecimated) output. Non-negative by construction when `m >= 0`.
pub fn forward_out(
  reserve_in: &FixedPoint,
  reserve_out: &FixedPoint,
  target_in: &FixedPoint,
  target_out: &FixedPoint,
  price: &FixedPoint,
  m: &FixedPoint,
) -> PricingResult<KernelOutcome> {
  if m.is_negative() {
    return Err(PricingError::InvalidAmount("forward_out requires a non-negative input".to_string()));
  }
  forward_raw(reserve_in, reserve_out, target_in, target_out, price, m)
}

/// Given a desired non-negative output `out`, returns the raw input
/// required to produce it. Implemented by reusing `forward_raw` with
/// reserves/targets swapped, price inverted, and a negated input — see the
/// module docs for the algebraic justification.
pub fn inverse_in(
  reserve_in: &FixedPoint,
  reserve_out: &FixedPoint,
  target_in: &FixedPoint,
  target_out: &FixedPoint,
  price: &FixedPoint,
  desired_out: &FixedPoint,
) -> PricingResult<KernelOutcome> {
  if desired_out.is_negative() {
    return Err(PricingError::InvalidAmount(
      "inverse_in requires a non-negative desired output".to_string(),
    ));
  }
  if desired_out.is_zero() {
    return Ok(KernelOutcome::Output(FixedPoint::zero()));
  }
  let inverted_price = FixedPoint::one().div(price, RoundingMode::Ceil)?;
  let negated_out = desired_out.neg();
  let outcome = forward_raw(
    reserve_out,
    reserve_in,
    target_out,
    target_in,
    &inverted_price,
    &negated_out,
  )?;
  match outcome {
    KernelOutcome::Infeasible => Ok(KernelOutcome::Infeasible),
    KernelOutcome::Output(v) => {
      let input = v.neg();
      if input.is_negative() {
        return Err(PricingError::InternalInvariant(
          "inverse_in produced a negative required input".to_string(),
        ));
      }
      Ok(KernelOutcome::Output(input))
    }
  }
}

/// §4.B.3: `impact = |implied_price - actual_price| / actual_price`.
/// `implied_price = P * (b/a) * (A/B)`; `actual_price = output / m`.
pub fn price_impact(
  reserve_in: &FixedPoint,
  reserve_out: &FixedPoint,
  target_in: &FixedPoint,
  target_out: &FixedPoint,
  price: &FixedPoint,
  m: &FixedPoint,
  output: &FixedPoint,
) -> PricingResult<FixedPoint> {
  if m.is_zero() {
    return Ok(FixedPoint::zero());
  }
  let ratio = reserve_out.div(reserve_in, RoundingMode::HalfEven)?;
  let target_ratio = target_in.div(target_out, RoundingMode::HalfEven)?;
  let implied_price = price.mul(&ratio, RoundingMode::HalfEven).mul(&target_ratio, RoundingMode::HalfEven);
  if output.is_zero() {
    return Ok(implied_price.abs());
  }
  let actual_price = output.div(m, RoundingMode::HalfEven)?;
  let diff = implied_price.sub(&actual_price).abs();
  diff.div(&actual_price, RoundingMode::HalfEven)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn fp(s: &str) -> FixedPoint {
    FixedPoint::from_decimal_str(s).unwrap()
  }

  #[test]
  fn forward_out_small_trade_matches_scenario_2() {
    // target_base=10_000_000, target_quote=20_000_000, base_reserve=9_500_000,
    // quote_reserve=20_500_000, P=2, input=1.
    let a = fp("9500000");
    let b = fp("20500000");
    let target_in = fp("10000000");
    let target_out = fp("20000000");
    let price = fp("2");
    let m = fp("1");
    let outcome = forward_out(&a, &b, &target_in, &target_out, &price, &m).unwrap();
    let out = outcome.into_output().expect("feasible trade");
    assert!(out > fp("1.9") && out < fp("2.1"), "got {out:?}");
  }

  #[test]
  fn forward_out_is_never_negative_for_nonnegative_input() {
    let a = fp("1000000");
    let b = fp("1000000");
    let target_in = fp("1000000");
    let target_out = fp("1000000");
    let price = fp("1");
    let m = fp("0");
    let outcome = forward_out(&a, &b, &target_in, &target_out, &price, &m).unwrap();
    let out = outcome.into_output().unwrap();
    assert!(!out.is_negative());
  }

  #[test]
  fn forward_out_rejects_negative_input() {
    let a = fp("1000000");
    let b = fp("1000000");
    let target_in = fp("1000000");
    let target_out = fp("1000000");
    let price = fp("1");
    let m = fp("-1");
    assert!(matches!(
      forward_out(&a, &b, &target_in, &target_out, &price, &m),
      Err(PricingError::InvalidAmount(_))
    ));
  }

  #[test]
  fn inverse_round_trips_with_forward() {
    let a = fp("9500000");
    let b = fp("20500000");
    let target_in = fp("10000000");
    let target_out = fp("20000000");
    let price = fp("2");
    let desired = fp("100");

    let inv = inverse_in(&a, &b, &target_in, &target_out, &price, &desired).unwrap();
    let required_in = inv.into_output().expect("feasible inverse");

    let fwd = forward_out(&a, &b, &target_in, &target_out, &price, &required_in).unwrap();
    let produced_out = fwd.into_output().expect("feasible forward");
    assert!(produced_out >= desired, "produced {produced_out:?} < desired {desired:?}");
  }

  #[test]
  fn infeasible_when_reserve_in_would_go_nonpositive() {
    let a = fp("10");
    let b = fp("1000000");
    let target_in = fp("1000000");
    let target_out = fp("1000000");
    let price = fp("1");
    let m = fp("-20");
    let outcome = forward_raw(&a, &b, &target_in, &target_out, &price, &m).unwrap();
    assert!(matches!(outcome, KernelOutcome::Infeasible));
  }

  #[test]
  fn price_impact_zero_when_input_zero() {
    let a = fp("1000000");
    let b = fp("1000000");
    let target_in = fp("1000000");
    let target_out = fp("1000000");
    let price = fp("1");
    let m = fp("0");
    let out = fp("0");
    let impact = price_impact(&a, &b, &target_in, &target_out, &price, &m, &out).unwrap();
    assert!(impact.is_zero());
  }
}
