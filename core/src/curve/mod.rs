//! Curve kernels: pure mathematical functions implementing the normal-swap
//! and stable-swap output formulas. Neither module touches decimals,
//! fees, or slippage — that composition lives in `quote.rs`.

pub mod normal;
pub mod stable;

use crate::fixed_point::FixedPoint;

/// The result of evaluating a curve kernel for a given input. `Infeasible`
/// replaces the source's `-infinity` sentinel (see design notes on the
/// negative-`m` inverse path): it means "this trade cannot be executed
/// against this reserve state", which the quote engine reports as
/// insufficient liquidity rather than an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KernelOutcome {
  Output(FixedPoint),
  Infeasible,
}

impl KernelOutcome {
  pub fn into_output(self) -> Option<FixedPoint> {
    match self {
      KernelOutcome::Output(v) => Some(v),
      KernelOutcome::Infeasible => None,
    }
  }
}
