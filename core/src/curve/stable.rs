//! Stable-swap (flat invariant) curve kernel. See §4.B.4-4.B.6.
//!
//! Unlike the normal-swap kernel, this curve never reads the oracle price
//! `P` directly; its notion of "price" is the static ratio of target
//! reserves (`p = B/A`). `forward_out`/`inverse_in` follow the same
//! shared-core-plus-negated-input decomposition as `curve::normal`.

use crate::curve::KernelOutcome;
use crate::error::{PricingError, PricingResult};
use crate::fixed_point::{FixedPoint, RoundingMode};

/// §4.B.4: solves `alpha*x^2 + beta*x + gamma = 0` for the positive root
/// and returns `(balanced_a, balanced_b)`.
pub fn balanced_reserves(
  reserve_in: &FixedPoint,
  reserve_out: &FixedPoint,
  target_in: &FixedPoint,
  target_out: &FixedPoint,
  slope: &FixedPoint,
) -> PricingResult<(FixedPoint, FixedPoint)> {
  let p = target_out.div(target_in, RoundingMode::HalfEven)?;
  let one_minus_s = FixedPoint::one().sub(slope);
  let two_minus_s = FixedPoint::from_integer(2).sub(slope);

  let alpha = two_minus_s.mul(&p, RoundingMode::HalfEven);
  let p_a = p.mul(reserve_in, RoundingMode::HalfEven);
  let neg_beta = one_minus_s.mul(&p_a.add(reserve_out), RoundingMode::HalfEven);
  let neg_gamma = slope.mul(reserve_in, RoundingMode::HalfEven).mul(reserve_out, RoundingMode::HalfEven);

  let discriminant = neg_beta
    .mul(&neg_beta, RoundingMode::HalfEven)
    .add(&FixedPoint::from_integer(4).mul(&alpha, RoundingMode::HalfEven).mul(&neg_gamma, RoundingMode::HalfEven));
  if discriminant.is_negative() {
    return Err(PricingError::DomainError(
      "stable-swap balanced-reserve discriminant is negative".to_string(),
    ));
  }
  let sqrt_disc = discriminant.sqrt(RoundingMode::Ceil)?;
  let numerator = neg_beta.add(&sqrt_disc);
  let two_alpha = FixedPoint::from_integer(2).mul(&alpha, RoundingMode::HalfEven);
  let balanced_a = numerator.div(&two_alpha, RoundingMode::Ceil)?;
  let balanced_b = balanced_a.mul(&p, RoundingMode::HalfEven);
  Ok((balanced_a, balanced_b))
}

/// `(1-s) * balanced / s`, floored. Shared by the multiplicand, the
/// implied-price denominator term, and nothing else.
fn slope_adjusted_term(balanced: &FixedPoint, slope: &FixedPoint) -> PricingResult<FixedPoint> {
  let one_minus_s = FixedPoint::one().sub(slope);
  let product = one_minus_s.mul(balanced, RoundingMode::Floor);
  product.div(slope, RoundingMode::Floor)
}

/// Shared kernel for forward and inverse stable-swap quoting. `m` may be
/// negative (the inverse path, mirroring `curve::normal::forward_raw`).
fn forward_raw(
  reserve_in: &FixedPoint,
  reserve_out: &FixedPoint,
  target_in: &FixedPoint,
  target_out: &FixedPoint,
  slope: &FixedPoint,
  m: &FixedPoint,
) -> PricingResult<KernelOutcome> {
  let (balanced_a, balanced_b) = balanced_reserves(reserve_in, reserve_out, target_in, target_out, slope)?;
  let one_minus_s = FixedPoint::one().sub(slope);

  let multiplicand = reserve_out.add(&slope_adjusted_term(&balanced_b, slope)?);

  let num = one_minus_s.mul(&balanced_a, RoundingMode::HalfEven).add(&slope.mul(reserve_in, RoundingMode::HalfEven));
  let in_plus_m = reserve_in.add(m);
  let den = one_minus_s.mul(&balanced_a, RoundingMode::HalfEven).add(&slope.mul(&in_plus_m, RoundingMode::HalfEven));
  if !den.is_positive() {
    return Ok(KernelOutcome::Infeasible);
  }
  let ratio = num.div(&den, RoundingMode::Floor)?;
  let multiplier = FixedPoint::one().sub(&ratio);
  let output_exact = multiplicand.mul(&multiplier, RoundingMode::HalfEven);
  let output_floor = output_exact.round_to_integer(RoundingMode::Floor);
  Ok(KernelOutcome::Output(FixedPoint::from_integer(output_floor)))
}

/// Given `m >= 0` units of the in-side token, returns the raw output.
pub fn forward_out(
  reserve_in: &FixedPoint,
  reserve_out: &FixedPoint,
  target_in: &FixedPoint,
  target_out: &FixedPoint,
  slope: &FixedPoint,
  m: &FixedPoint,
) -> PricingResult<KernelOutcome> {
  if m.is_negative() {
    return Err(PricingError::InvalidAmount("forward_out requires a non-negative input".to_string()));
  }
  forward_raw(reserve_in, reserve_out, target_in, target_out, slope, m)
}

/// Given a desired non-negative output, returns the raw input required to
/// produce it, by calling `forward_raw` with reserves/targets swapped and
/// the output negated.
pub fn inverse_in(
  reserve_in: &FixedPoint,
  reserve_out: &FixedPoint,
  target_in: &FixedPoint,
  target_out: &FixedPoint,
  slope: &FixedPoint,
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
  let negated_out = desired_out.neg();
  let outcome = forward_raw(reserve_out, reserve_in, target_out, target_in, slope, &negated_out)?;
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

/// §4.B.5 tail: `impact = |implied - actual| / actual`.
pub fn price_impact(
  reserve_in: &FixedPoint,
  reserve_out: &FixedPoint,
  target_in: &FixedPoint,
  target_out: &FixedPoint,
  slope: &FixedPoint,
  m: &FixedPoint,
  output: &FixedPoint,
) -> PricingResult<FixedPoint> {
  if m.is_zero() {
    return Ok(FixedPoint::zero());
  }
  let (balanced_a, balanced_b) = balanced_reserves(reserve_in, reserve_out, target_in, target_out, slope)?;
  let implied_num = reserve_out.add(&slope_adjusted_term(&balanced_b, slope)?);
  let implied_den = reserve_in.add(&slope_adjusted_term(&balanced_a, slope)?);
  if !implied_den.is_positive() {
    return Err(PricingError::DomainError(
      "stable-swap implied-price denominator is non-positive".to_string(),
    ));
  }
  let implied = implied_num.div(&implied_den, RoundingMode::HalfEven)?;
  if output.is_zero() {
    return Ok(implied.abs());
  }
  let actual = output.div(m, RoundingMode::HalfEven)?;
  let diff = implied.sub(&actual).abs();
  diff.div(&actual, RoundingMode::HalfEven)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn fp(s: &str) -> FixedPoint {
    FixedPoint::from_decimal_str(s).unwrap()
  }

  #[test]
  fn forward_out_equal_reserves_matches_scenario_1() {
    let a = fp("1000000");
    let b = fp("1000000");
    let target = fp("1000000");
    let slope = fp("0.5");
    let m = fp("100");
    let outcome = forward_out(&a, &b, &target, &target, &slope, &m).unwrap();
    let out = outcome.into_output().expect("feasible trade");
    assert!(out >= fp("99.5") && out <= fp("100.0"), "got {out:?}");
  }

  #[test]
  fn forward_out_is_infeasible_when_input_equals_reserve() {
    let a = fp("1000000");
    let b = fp("1000000");
    let target = fp("1000000");
    let slope = fp("0.5");
    let m = a.clone();
    let outcome = forward_out(&a, &b, &target, &target, &slope, &m).unwrap();
    assert!(matches!(outcome, KernelOutcome::Infeasible));
  }

  #[test]
  fn inverse_round_trips_with_forward() {
    let a = fp("1000000");
    let b = fp("1000000");
    let target = fp("1000000");
    let slope = fp("0.5");
    let desired = fp("100");

    let inv = inverse_in(&a, &b, &target, &target, &slope, &desired).unwrap();
    let required_in = inv.into_output().expect("feasible inverse");

    let fwd = forward_out(&a, &b, &target, &target, &slope, &required_in).unwrap();
    let produced_out = fwd.into_output().expect("feasible forward");
    assert!(produced_out >= desired, "produced {produced_out:?} < desired {desired:?}");
  }

  #[test]
  fn price_impact_is_small_for_balanced_small_trade() {
    let a = fp("1000000");
    let b = fp("1000000");
    let target = fp("1000000");
    let slope = fp("0.5");
    let m = fp("100");
    let outcome = forward_out(&a, &b, &target, &target, &slope, &m).unwrap();
    let out = outcome.into_output().unwrap();
    let impact = price_impact(&a, &b, &target, &target, &slope, &m, &out).unwrap();
    assert!(impact < fp("0.001"), "impact too large: {impact:?}");
  }
}
