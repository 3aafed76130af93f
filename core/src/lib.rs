//! Deterministic pricing core for an oracle-anchored two-sided AMM.
//!
//! This crate is pure and stateless: no I/O, no clocks, no logging (see the
//! workspace-level `common` crate for that). Every entry point is a plain
//! function over immutable inputs. See `quote` for the public surface.

pub mod constants;
pub mod curve;
pub mod error;
pub mod fixed_point;
pub mod quote;
pub mod reserves;
pub mod types;

pub use error::{PricingError, PricingResult};
pub use fixed_point::{FixedPoint, RoundingMode};
pub use quote::{calculate_min_shares_for_deposit, calculate_withdrawal_from_shares, check_sufficient_reserve, quote_swap_in, quote_swap_out, MinShares};
pub use types::{
  FeeRatio, MarketPriceTriple, OraclePrice, PoolState, SwapConfig, SwapDirection, SwapInfo, SwapResult, SwapType, TokenDescriptor,
};

#[cfg(test)]
mod integration_tests {
  use super::*;
  use num_bigint::BigInt;

  fn sample_normal_pool() -> SwapInfo {
    SwapInfo {
      swap_type: SwapType::Normal,
      config_key: "normal-pool".to_string(),
      mint_base: "BASE".to_string(),
      mint_quote: "QUOTE".to_string(),
      mint_base_decimals: 6,
      mint_quote_decimals: 6,
      pool_state: PoolState {
        base_reserve: BigInt::from(9_500_000),
        quote_reserve: BigInt::from(20_500_000),
        target_base_reserve: BigInt::from(10_000_000),
        target_quote_reserve: BigInt::from(20_000_000),
        base_supply: BigInt::from(10_000_000),
        quote_supply: BigInt::from(20_000_000),
      },
      swap_config: SwapConfig {
        slope: FixedPoint::one(),
        trade_fee: FeeRatio::new(30, 10_000).unwrap(),
        admin_trade_fee: FeeRatio::new(1, 10).unwrap(),
        withdraw_fee: FeeRatio::zero(),
        admin_withdraw_fee: FeeRatio::zero(),
        min_reserve_limit_percentage: FixedPoint::from_integer(1),
        virtual_reserve_percentage: FixedPoint::zero(),
        enable_confidence_interval: false,
        max_swap_percentage: FixedPoint::from_integer(100),
      },
    }
  }

  fn sample_stable_pool() -> SwapInfo {
    SwapInfo {
      swap_type: SwapType::Stable,
      config_key: "stable-pool".to_string(),
      mint_base: "BASE".to_string(),
      mint_quote: "QUOTE".to_string(),
      mint_base_decimals: 6,
      mint_quote_decimals: 6,
      pool_state: PoolState {
        base_reserve: BigInt::from(1_000_000),
        quote_reserve: BigInt::from(1_000_000),
        target_base_reserve: BigInt::from(1_000_000),
        target_quote_reserve: BigInt::from(1_000_000),
        base_supply: BigInt::from(1_000_000),
        quote_supply: BigInt::from(1_000_000),
      },
      swap_config: SwapConfig {
        slope: FixedPoint::from_decimal_str("0.5").unwrap(),
        trade_fee: FeeRatio::zero(),
        admin_trade_fee: FeeRatio::zero(),
        withdraw_fee: FeeRatio::zero(),
        admin_withdraw_fee: FeeRatio::zero(),
        min_reserve_limit_percentage: FixedPoint::zero(),
        virtual_reserve_percentage: FixedPoint::zero(),
        enable_confidence_interval: false,
        max_swap_percentage: FixedPoint::from_integer(100),
      },
    }
  }

  fn defined_market(mid: &str) -> MarketPriceTriple {
    let p = FixedPoint::from_decimal_str(mid).unwrap();
    MarketPriceTriple::Defined {
      mid: p.clone(),
      low: p.clone(),
      high: p,
    }
  }

  #[test]
  fn scenario_1_stable_swap_equal_reserves() {
    let pool = sample_stable_pool();
    let market = defined_market("1");
    let result = quote_swap_out(&pool, "BASE", "QUOTE", "100", &FixedPoint::zero(), &market).unwrap();
    let out: f64 = result.amount_out.parse().unwrap();
    assert!((99.5..=100.0).contains(&out), "got {out}");
    assert!(!result.insufficient_liquidity);
  }

  #[test]
  fn scenario_2_normal_swap_small_trade() {
    let pool = sample_normal_pool();
    let market = defined_market("2");
    let result = quote_swap_out(&pool, "BASE", "QUOTE", "1", &FixedPoint::zero(), &market).unwrap();
    let out: f64 = result.amount_out.parse().unwrap();
    assert!(out > 0.0 && out < 2.1, "got {out}");
  }

  #[test]
  fn scenario_3_normal_swap_beyond_liquidity() {
    let pool = sample_normal_pool();
    let market = defined_market("2");
    let result = quote_swap_out(&pool, "BASE", "QUOTE", "9500000", &FixedPoint::zero(), &market).unwrap();
    assert!(result.insufficient_liquidity);
  }

  #[test]
  fn scenario_4_confidence_interval_reduces_output() {
    let mut pool = sample_normal_pool();
    let market = MarketPriceTriple::Defined {
      mid: FixedPoint::from_decimal_str("2.0").unwrap(),
      low: FixedPoint::from_decimal_str("1.98").unwrap(),
      high: FixedPoint::from_decimal_str("2.02").unwrap(),
    };
    let without_confidence = quote_swap_out(&pool, "BASE", "QUOTE", "1", &FixedPoint::zero(), &market).unwrap();
    pool.swap_config.enable_confidence_interval = true;
    let with_confidence = quote_swap_out(&pool, "BASE", "QUOTE", "1", &FixedPoint::zero(), &market).unwrap();
    let a: f64 = without_confidence.amount_out.parse().unwrap();
    let b: f64 = with_confidence.amount_out.parse().unwrap();
    assert!(b < a, "with-confidence output {b} should be smaller than {a}");
  }

  #[test]
  fn scenario_5_inverse_quote_round_trip() {
    let pool = sample_normal_pool();
    let market = defined_market("2");
    let inverse = quote_swap_in(&pool, "BASE", "QUOTE", "100", &FixedPoint::zero(), &market).unwrap();
    let forward = quote_swap_out(&pool, "BASE", "QUOTE", &inverse.amount_in, &FixedPoint::zero(), &market).unwrap();
    let out: f64 = forward.amount_out.parse().unwrap();
    assert!(out >= 100.0, "got {out}");
  }

  #[test]
  fn zero_input_yields_zero_result() {
    let pool = sample_normal_pool();
    let market = defined_market("2");
    let result = quote_swap_out(&pool, "BASE", "QUOTE", "0", &FixedPoint::zero(), &market).unwrap();
    assert_eq!(result.amount_out, "0");
    assert_eq!(result.amount_in, "0");
  }

  #[test]
  fn empty_input_yields_empty_result() {
    let pool = sample_normal_pool();
    let market = defined_market("2");
    let result = quote_swap_out(&pool, "BASE", "QUOTE", "", &FixedPoint::zero(), &market).unwrap();
    assert_eq!(result.amount_out, "");
  }

  #[test]
  fn negative_input_is_rejected() {
    let pool = sample_normal_pool();
    let market = defined_market("2");
    let result = quote_swap_out(&pool, "BASE", "QUOTE", "-1", &FixedPoint::zero(), &market);
    assert!(matches!(result, Err(PricingError::InvalidAmount(_))));
  }

  #[test]
  fn mismatched_token_pair_is_rejected() {
    let pool = sample_normal_pool();
    let market = defined_market("2");
    let result = quote_swap_out(&pool, "BASE", "OTHER", "1", &FixedPoint::zero(), &market);
    assert!(matches!(result, Err(PricingError::InvalidTokenPair(_))));
  }

  #[test]
  fn undefined_market_yields_empty_result() {
    let pool = sample_normal_pool();
    let result = quote_swap_out(&pool, "BASE", "QUOTE", "1", &FixedPoint::zero(), &MarketPriceTriple::Undefined).unwrap();
    assert_eq!(result.amount_out, "");
  }
}
