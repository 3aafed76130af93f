//! Quote engine: the public entry points that compose fixed-point
//! arithmetic, curve kernels, and reserve analytics. See §4.D and §6.

use num_bigint::BigInt;

use crate::curve::{normal, stable, KernelOutcome};
use crate::error::{PricingError, PricingResult};
use crate::fixed_point::{FixedPoint, RoundingMode};
use crate::reserves::{self, NormalizedReserves, TokenShareInput, VirtualReserves, WithdrawalAmounts};
use crate::types::{MarketPriceTriple, SwapConfig, SwapDirection, SwapInfo, SwapResult, SwapType};

const PRICE_IMPACT_DISPLAY_DIGITS: u32 = 8;

fn pow10(exponent: i32) -> PricingResult<FixedPoint> {
  if exponent >= 0 {
    Ok(FixedPoint::from_integer(BigInt::from(10u32).pow(exponent as u32)))
  } else {
    let denom = FixedPoint::from_integer(BigInt::from(10u32).pow((-exponent) as u32));
    FixedPoint::one().div(&denom, RoundingMode::HalfEven)
  }
}

/// Parse a human-scale amount per §4.D step 1. `Ok(None)` means "return the
/// empty result"; `Ok(Some(zero))` means "return the zero result"; `Err`
/// means a genuinely invalid (negative) amount.
fn parse_amount(raw: &str) -> PricingResult<Option<FixedPoint>> {
  match FixedPoint::from_decimal_str(raw) {
    Err(_) => Ok(None),
    Ok(v) if v.is_negative() => Err(PricingError::InvalidAmount(format!("negative amount: {raw}"))),
    Ok(v) => Ok(Some(v)),
  }
}

struct Decimals {
  from: u8,
  to: u8,
}

fn resolve_decimals(pool: &SwapInfo, direction: SwapDirection) -> Decimals {
  match direction {
    SwapDirection::SellBase => Decimals {
      from: pool.mint_base_decimals,
      to: pool.mint_quote_decimals,
    },
    SwapDirection::SellQuote => Decimals {
      from: pool.mint_quote_decimals,
      to: pool.mint_base_decimals,
    },
  }
}

/// §4.D step 3: pick mid, or the adverse-selected side when confidence
/// intervals are enabled. Returns `None` when the market triple is
/// undefined, signalling the caller to return the empty result.
fn select_market_price(config: &SwapConfig, direction: SwapDirection, market: &MarketPriceTriple) -> Option<(FixedPoint, FixedPoint)> {
  match market {
    MarketPriceTriple::Undefined => None,
    MarketPriceTriple::Defined { mid, low, high } => {
      let selected = if !config.enable_confidence_interval {
        mid.clone()
      } else {
        match direction {
          SwapDirection::SellBase => high.clone(),
          SwapDirection::SellQuote => low.clone(),
        }
      };
      Some((selected, mid.clone()))
    }
  }
}

/// Reserves and targets at pool scale, in base/quote orientation (not yet
/// swapped for direction).
struct PoolReservesFp {
  base: FixedPoint,
  quote: FixedPoint,
  target_base: FixedPoint,
  target_quote: FixedPoint,
}

fn pool_reserves_fp(pool: &SwapInfo) -> PoolReservesFp {
  PoolReservesFp {
    base: FixedPoint::from_integer(pool.pool_state.base_reserve.clone()),
    quote: FixedPoint::from_integer(pool.pool_state.quote_reserve.clone()),
    target_base: FixedPoint::from_integer(pool.pool_state.target_base_reserve.clone()),
    target_quote: FixedPoint::from_integer(pool.pool_state.target_quote_reserve.clone()),
  }
}

/// Reserve/target pair oriented for the curve call (in-side, out-side),
/// with virtual reserves folded in for normal-swap only, per §4.D step 5.
struct CurveReserves {
  reserve_in: FixedPoint,
  reserve_out: FixedPoint,
  target_in: FixedPoint,
  target_out: FixedPoint,
}

fn curve_reserves(
  pool: &SwapInfo,
  direction: SwapDirection,
  reserves_fp: &PoolReservesFp,
  normalized: &NormalizedReserves,
) -> CurveReserves {
  let (base_for_curve, quote_for_curve) = if pool.swap_type == SwapType::Normal {
    let VirtualReserves { base: vb, quote: vq } = reserves::virtual_reserves(normalized, &pool.swap_config.virtual_reserve_percentage);
    (reserves_fp.base.add(&vb), reserves_fp.quote.add(&vq))
  } else {
    (reserves_fp.base.clone(), reserves_fp.quote.clone())
  };
  match direction {
    SwapDirection::SellBase => CurveReserves {
      reserve_in: base_for_curve,
      reserve_out: quote_for_curve,
      target_in: reserves_fp.target_base.clone(),
      target_out: reserves_fp.target_quote.clone(),
    },
    SwapDirection::SellQuote => CurveReserves {
      reserve_in: quote_for_curve,
      reserve_out: base_for_curve,
      target_in: reserves_fp.target_quote.clone(),
      target_out: reserves_fp.target_base.clone(),
    },
  }
}

/// Oracle price normalized to pool-integer scale and, for `SellQuote`,
/// inverted, per §4.B.6. Only meaningful for the normal-swap curve; the
/// stable-swap kernel never consumes it.
fn curve_price_for_normal(direction: SwapDirection, selected_price: &FixedPoint, decimal_scale: &FixedPoint) -> PricingResult<FixedPoint> {
  let normalized = selected_price.mul(decimal_scale, RoundingMode::HalfEven);
  match direction {
    SwapDirection::SellBase => Ok(normalized),
    SwapDirection::SellQuote => FixedPoint::one().div(&normalized, RoundingMode::Ceil),
  }
}

struct KernelQuote {
  outcome: KernelOutcome,
  reserves: CurveReserves,
  normal_price: Option<FixedPoint>,
}

fn run_forward_kernel(
  pool: &SwapInfo,
  direction: SwapDirection,
  reserves_fp: &PoolReservesFp,
  normalized: &NormalizedReserves,
  decimal_scale: &FixedPoint,
  selected_price: &FixedPoint,
  amount_in_scaled: &FixedPoint,
) -> PricingResult<KernelQuote> {
  let curve = curve_reserves(pool, direction, reserves_fp, normalized);
  match pool.swap_type {
    SwapType::Normal => {
      let price = curve_price_for_normal(direction, selected_price, decimal_scale)?;
      let outcome = normal::forward_out(&curve.reserve_in, &curve.reserve_out, &curve.target_in, &curve.target_out, &price, amount_in_scaled)?;
      Ok(KernelQuote {
        outcome,
        reserves: curve,
        normal_price: Some(price),
      })
    }
    SwapType::Stable => {
      let outcome = stable::forward_out(
        &curve.reserve_in,
        &curve.reserve_out,
        &curve.target_in,
        &curve.target_out,
        &pool.swap_config.slope,
        amount_in_scaled,
      )?;
      Ok(KernelQuote {
        outcome,
        reserves: curve,
        normal_price: None,
      })
    }
  }
}

fn run_inverse_kernel(
  pool: &SwapInfo,
  direction: SwapDirection,
  reserves_fp: &PoolReservesFp,
  normalized: &NormalizedReserves,
  decimal_scale: &FixedPoint,
  selected_price: &FixedPoint,
  desired_out_scaled: &FixedPoint,
) -> PricingResult<KernelQuote> {
  let curve = curve_reserves(pool, direction, reserves_fp, normalized);
  match pool.swap_type {
    SwapType::Normal => {
      let price = curve_price_for_normal(direction, selected_price, decimal_scale)?;
      let outcome = normal::inverse_in(&curve.reserve_in, &curve.reserve_out, &curve.target_in, &curve.target_out, &price, desired_out_scaled)?;
      Ok(KernelQuote {
        outcome,
        reserves: curve,
        normal_price: Some(price),
      })
    }
    SwapType::Stable => {
      let outcome = stable::inverse_in(
        &curve.reserve_in,
        &curve.reserve_out,
        &curve.target_in,
        &curve.target_out,
        &pool.swap_config.slope,
        desired_out_scaled,
      )?;
      Ok(KernelQuote {
        outcome,
        reserves: curve,
        normal_price: None,
      })
    }
  }
}

fn kernel_price_impact(pool: &SwapInfo, quote: &KernelQuote, m: &FixedPoint, output: &FixedPoint) -> PricingResult<FixedPoint> {
  let r = &quote.reserves;
  match pool.swap_type {
    SwapType::Normal => {
      let price = quote.normal_price.as_ref().expect("normal curve always sets normal_price");
      normal::price_impact(&r.reserve_in, &r.reserve_out, &r.target_in, &r.target_out, price, m, output)
    }
    SwapType::Stable => stable::price_impact(&r.reserve_in, &r.reserve_out, &r.target_in, &r.target_out, &pool.swap_config.slope, m, output),
  }
}

/// `quote_swap_out(pool, from, to, amount_in, max_slippage_pct, market)`.
pub fn quote_swap_out(
  pool: &SwapInfo,
  from_mint: &str,
  to_mint: &str,
  amount_in: &str,
  max_slippage_pct: &FixedPoint,
  market: &MarketPriceTriple,
) -> PricingResult<SwapResult> {
  pool.validate()?;
  let amount_in_fp = match parse_amount(amount_in)? {
    None => return Ok(SwapResult::empty()),
    Some(v) if v.is_zero() => return Ok(SwapResult::zero()),
    Some(v) => v,
  };

  let direction = pool.resolve_direction(from_mint, to_mint)?;
  let decimals = resolve_decimals(pool, direction);
  let (selected_price, mid) = match select_market_price(&pool.swap_config, direction, market) {
    None => return Ok(SwapResult::empty()),
    Some(pair) => pair,
  };

  let reserves_fp = pool_reserves_fp(pool);
  let decimal_scale = pow10(pool.mint_quote_decimals as i32 - pool.mint_base_decimals as i32)?;
  let mid_normalized = mid.mul(&decimal_scale, RoundingMode::HalfEven);
  let normalized = reserves::normalized_reserves(&reserves_fp.base, &reserves_fp.quote, &reserves_fp.target_base, &reserves_fp.target_quote, &mid_normalized)?;

  let amount_in_scaled = amount_in_fp.mul(&pow10(decimals.from as i32)?, RoundingMode::HalfEven);

  let kernel_quote = run_forward_kernel(pool, direction, &reserves_fp, &normalized, &decimal_scale, &selected_price, &amount_in_scaled)?;

  let raw_out = match kernel_quote.outcome.clone().into_output() {
    None => {
      return Ok(SwapResult {
        amount_in: amount_in_fp.to_decimal_string(decimals.from as u32, RoundingMode::HalfEven),
        amount_out: "0".to_string(),
        amount_out_with_slippage: "0".to_string(),
        fee: "0".to_string(),
        price_impact: "0".to_string(),
        insufficient_liquidity: true,
      });
    }
    Some(v) => v,
  };

  let price_impact = kernel_price_impact(pool, &kernel_quote, &amount_in_scaled, &raw_out)?;

  let gross_out = raw_out.div(&pow10(decimals.to as i32)?, RoundingMode::Floor)?;
  let trade_fee = pool.swap_config.trade_fee.as_fixed_point(RoundingMode::Ceil)?;
  let fee = gross_out.mul(&trade_fee, RoundingMode::Ceil);
  let net_out = gross_out.sub(&fee);

  let hundred = FixedPoint::from_integer(100);
  let slippage_fraction = hundred.sub(max_slippage_pct).div(&hundred, RoundingMode::Floor)?;
  let out_with_slippage = net_out.mul(&slippage_fraction, RoundingMode::Floor);

  let admin_trade_fee = pool.swap_config.admin_trade_fee.as_fixed_point(RoundingMode::Ceil)?;
  let admin_fee = fee.mul(&admin_trade_fee, RoundingMode::Ceil);
  let amount_out_for_check = gross_out.sub(&admin_fee);
  let amount_out_for_check_scaled = amount_out_for_check.mul(&pow10(decimals.to as i32)?, RoundingMode::HalfEven);

  let (base_after, quote_after) = reserves::reserves_after_swap(&reserves_fp.base, &reserves_fp.quote, direction, &amount_in_scaled, &amount_out_for_check_scaled);
  let sufficient = reserves::check_sufficient_reserve(
    &base_after,
    &quote_after,
    &reserves_fp.target_base,
    &reserves_fp.target_quote,
    &mid_normalized,
    &pool.swap_config.min_reserve_limit_percentage,
  )?;

  Ok(SwapResult {
    amount_in: amount_in_fp.to_decimal_string(decimals.from as u32, RoundingMode::HalfEven),
    amount_out: net_out.to_decimal_string(decimals.to as u32, RoundingMode::HalfEven),
    amount_out_with_slippage: out_with_slippage.to_decimal_string(decimals.to as u32, RoundingMode::HalfEven),
    fee: fee.to_decimal_string(decimals.to as u32, RoundingMode::HalfEven),
    price_impact: price_impact.to_decimal_string(PRICE_IMPACT_DISPLAY_DIGITS, RoundingMode::HalfEven),
    insufficient_liquidity: !sufficient,
  })
}

/// `quote_swap_in(pool, from, to, amount_out, max_slippage_pct, market)`.
pub fn quote_swap_in(
  pool: &SwapInfo,
  from_mint: &str,
  to_mint: &str,
  amount_out: &str,
  max_slippage_pct: &FixedPoint,
  market: &MarketPriceTriple,
) -> PricingResult<SwapResult> {
  pool.validate()?;
  let amount_out_fp = match parse_amount(amount_out)? {
    None => return Ok(SwapResult::empty()),
    Some(v) if v.is_zero() => return Ok(SwapResult::zero()),
    Some(v) => v,
  };

  let direction = pool.resolve_direction(from_mint, to_mint)?;
  let decimals = resolve_decimals(pool, direction);
  let (selected_price, mid) = match select_market_price(&pool.swap_config, direction, market) {
    None => return Ok(SwapResult::empty()),
    Some(pair) => pair,
  };

  let reserves_fp = pool_reserves_fp(pool);
  let decimal_scale = pow10(pool.mint_quote_decimals as i32 - pool.mint_base_decimals as i32)?;
  let mid_normalized = mid.mul(&decimal_scale, RoundingMode::HalfEven);
  let normalized = reserves::normalized_reserves(&reserves_fp.base, &reserves_fp.quote, &reserves_fp.target_base, &reserves_fp.target_quote, &mid_normalized)?;

  // Gross the desired output up by the fee denominator: gross_out =
  // amount_out / (1 - trade_fee), rounded Ceil so the pool never hands out
  // less than the caller actually wants net of fees.
  let trade_fee = pool.swap_config.trade_fee.as_fixed_point(RoundingMode::Ceil)?;
  let one_minus_fee = FixedPoint::one().sub(&trade_fee);
  if !one_minus_fee.is_positive() {
    return Err(PricingError::DomainError("trade fee consumes the entire output".to_string()));
  }
  let gross_out = amount_out_fp.div(&one_minus_fee, RoundingMode::Ceil)?;
  let desired_out_scaled = gross_out.mul(&pow10(decimals.to as i32)?, RoundingMode::Ceil);

  let kernel_quote = run_inverse_kernel(pool, direction, &reserves_fp, &normalized, &decimal_scale, &selected_price, &desired_out_scaled)?;

  let required_in_raw = match kernel_quote.outcome.clone().into_output() {
    None => {
      return Ok(SwapResult {
        amount_in: "0".to_string(),
        amount_out: amount_out_fp.to_decimal_string(decimals.to as u32, RoundingMode::HalfEven),
        amount_out_with_slippage: "0".to_string(),
        fee: "0".to_string(),
        price_impact: "0".to_string(),
        insufficient_liquidity: true,
      });
    }
    Some(v) => v,
  };

  let price_impact = kernel_price_impact(pool, &kernel_quote, &required_in_raw, &desired_out_scaled)?;

  let amount_in_gross = required_in_raw.div(&pow10(decimals.from as i32)?, RoundingMode::Ceil)?;
  let fee = gross_out.sub(&amount_out_fp);

  let hundred = FixedPoint::from_integer(100);
  let slippage_fraction = hundred.sub(max_slippage_pct).div(&hundred, RoundingMode::Floor)?;
  let out_with_slippage = amount_out_fp.mul(&slippage_fraction, RoundingMode::Floor);

  let admin_trade_fee = pool.swap_config.admin_trade_fee.as_fixed_point(RoundingMode::Ceil)?;
  let admin_fee = fee.mul(&admin_trade_fee, RoundingMode::Ceil);
  let amount_out_for_check = amount_out_fp.sub(&admin_fee);
  let amount_out_for_check_scaled = amount_out_for_check.mul(&pow10(decimals.to as i32)?, RoundingMode::HalfEven);
  let amount_in_scaled = amount_in_gross.mul(&pow10(decimals.from as i32)?, RoundingMode::HalfEven);

  let (base_after, quote_after) = reserves::reserves_after_swap(&reserves_fp.base, &reserves_fp.quote, direction, &amount_in_scaled, &amount_out_for_check_scaled);
  let sufficient = reserves::check_sufficient_reserve(
    &base_after,
    &quote_after,
    &reserves_fp.target_base,
    &reserves_fp.target_quote,
    &mid_normalized,
    &pool.swap_config.min_reserve_limit_percentage,
  )?;

  Ok(SwapResult {
    amount_in: amount_in_gross.to_decimal_string(decimals.from as u32, RoundingMode::HalfEven),
    amount_out: amount_out_fp.to_decimal_string(decimals.to as u32, RoundingMode::HalfEven),
    amount_out_with_slippage: out_with_slippage.to_decimal_string(decimals.to as u32, RoundingMode::HalfEven),
    fee: fee.to_decimal_string(decimals.to as u32, RoundingMode::HalfEven),
    price_impact: price_impact.to_decimal_string(PRICE_IMPACT_DISPLAY_DIGITS, RoundingMode::HalfEven),
    insufficient_liquidity: !sufficient,
  })
}

/// `check_sufficient_reserve(swap_info, amount_in_scaled, amount_out_scaled, direction, market_price)`.
pub fn check_sufficient_reserve(
  pool: &SwapInfo,
  amount_in_scaled: &FixedPoint,
  amount_out_scaled: &FixedPoint,
  direction: SwapDirection,
  market_price: &FixedPoint,
) -> PricingResult<bool> {
  let reserves_fp = pool_reserves_fp(pool);
  let (base_after, quote_after) = reserves::reserves_after_swap(&reserves_fp.base, &reserves_fp.quote, direction, amount_in_scaled, amount_out_scaled);
  reserves::check_sufficient_reserve(
    &base_after,
    &quote_after,
    &reserves_fp.target_base,
    &reserves_fp.target_quote,
    market_price,
    &pool.swap_config.min_reserve_limit_percentage,
  )
}

/// `calculate_withdrawal_from_shares(base_share, quote_share, base_cfg, quote_cfg, base_price, quote_price, pool_state)`.
pub fn calculate_withdrawal_from_shares(
  pool: &SwapInfo,
  base_share: &FixedPoint,
  quote_share: &FixedPoint,
  base_share_supply: &FixedPoint,
  quote_share_supply: &FixedPoint,
  base_price: &FixedPoint,
  quote_price: &FixedPoint,
) -> PricingResult<WithdrawalAmounts> {
  let reserves_fp = pool_reserves_fp(pool);
  let base_input = TokenShareInput {
    reserve: reserves_fp.base,
    target: reserves_fp.target_base,
    share: base_share.clone(),
    share_supply: base_share_supply.clone(),
    price: base_price.clone(),
  };
  let quote_input = TokenShareInput {
    reserve: reserves_fp.quote,
    target: reserves_fp.target_quote,
    share: quote_share.clone(),
    share_supply: quote_share_supply.clone(),
    price: quote_price.clone(),
  };
  reserves::calculate_withdrawal_from_shares(&base_input, &quote_input)
}

pub struct MinShares {
  pub min_base_share: FixedPoint,
  pub min_quote_share: FixedPoint,
}

/// `calculate_min_shares_for_deposit(swap_info, base_amount, quote_amount, market_price, min_coefficient)`.
///
/// Per the design notes' resolved Open Question: the split divides by
/// `market_price` for normal-swap deposits and by `1` (i.e. not at all) for
/// stable-swap deposits, since a stable pool's two sides are meant to be
/// valued 1:1 regardless of the oracle price.
pub fn calculate_min_shares_for_deposit(
  pool: &SwapInfo,
  base_amount: &FixedPoint,
  quote_amount: &FixedPoint,
  market_price: &FixedPoint,
  min_coefficient: &FixedPoint,
) -> PricingResult<MinShares> {
  let divisor = match pool.swap_type {
    SwapType::Normal => market_price.clone(),
    SwapType::Stable => FixedPoint::one(),
  };
  if !divisor.is_positive() {
    return Err(PricingError::DomainError("deposit-share divisor must be positive".to_string()));
  }
  let min_base_share = base_amount.mul(min_coefficient, RoundingMode::HalfEven).div(&divisor, RoundingMode::Floor)?;
  let min_quote_share = quote_amount.mul(min_coefficient, RoundingMode::HalfEven).div(&divisor, RoundingMode::Floor)?;
  Ok(MinShares { min_base_share, min_quote_share })
}
