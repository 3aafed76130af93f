//! Raw, serde-friendly mirror of `pricing_core::SwapInfo`. The TOML file
//! speaks plain strings and integers; this module is the only place that
//! knows how to turn that into the core's typed, validated records.

use anyhow::{anyhow, Result};
use num_bigint::BigInt;
use pricing_core::{FeeRatio, FixedPoint, PoolState, SwapConfig, SwapInfo, SwapType};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
  #[error("unknown swap type: {0}")]
  UnknownSwapType(String),

  #[error("pool '{0}' not found in catalog")]
  PoolNotFound(String),
}

#[derive(Debug, Deserialize)]
pub struct CatalogFile {
  #[serde(rename = "pool")]
  pub pools: Vec<RawPool>,
}

#[derive(Debug, Deserialize)]
pub struct RawPool {
  pub config_key: String,
  pub swap_type: String,
  pub mint_base: String,
  pub mint_quote: String,
  pub mint_base_decimals: u8,
  pub mint_quote_decimals: u8,

  pub base_reserve: String,
  pub quote_reserve: String,
  pub target_base_reserve: String,
  pub target_quote_reserve: String,
  pub base_supply: String,
  pub quote_supply: String,

  pub slope: String,
  pub trade_fee_num: String,
  pub trade_fee_den: String,
  pub admin_trade_fee_num: String,
  pub admin_trade_fee_den: String,
  pub withdraw_fee_num: String,
  pub withdraw_fee_den: String,
  pub admin_withdraw_fee_num: String,
  pub admin_withdraw_fee_den: String,
  pub min_reserve_limit_percentage: String,
  /// Absent in the TOML defaults to `0`, per the resolved Open Question on
  /// `virtualReservePercentage` (see DESIGN.md).
  #[serde(default)]
  pub virtual_reserve_percentage: Option<String>,
  #[serde(default)]
  pub enable_confidence_interval: bool,
  #[serde(default = "default_max_swap_percentage")]
  pub max_swap_percentage: String,
}

fn default_max_swap_percentage() -> String {
  "100".to_string()
}

fn parse_bigint(field: &str, value: &str) -> Result<BigInt> {
  value.parse::<BigInt>().map_err(|_| anyhow!("invalid integer for field '{field}': {value}"))
}

fn parse_fixed(field: &str, value: &str) -> Result<FixedPoint> {
  FixedPoint::from_decimal_str(value).map_err(|e| anyhow!("invalid decimal for field '{field}': {value} ({e})"))
}

impl RawPool {
  pub fn into_swap_info(self) -> Result<SwapInfo> {
    let swap_type = match self.swap_type.as_str() {
      "normal" => SwapType::Normal,
      "stable" => SwapType::Stable,
      other => return Err(anyhow!(CatalogError::UnknownSwapType(other.to_string()))),
    };

    let pool_state = PoolState {
      base_reserve: parse_bigint("base_reserve", &self.base_reserve)?,
      quote_reserve: parse_bigint("quote_reserve", &self.quote_reserve)?,
      target_base_reserve: parse_bigint("target_base_reserve", &self.target_base_reserve)?,
      target_quote_reserve: parse_bigint("target_quote_reserve", &self.target_quote_reserve)?,
      base_supply: parse_bigint("base_supply", &self.base_supply)?,
      quote_supply: parse_bigint("quote_supply", &self.quote_supply)?,
    };

    let virtual_reserve_percentage = match &self.virtual_reserve_percentage {
      Some(raw) => parse_fixed("virtual_reserve_percentage", raw)?,
      None => FixedPoint::zero(),
    };

    let swap_config = SwapConfig {
      slope: parse_fixed("slope", &self.slope)?,
      trade_fee: FeeRatio::new(parse_bigint("trade_fee_num", &self.trade_fee_num)?, parse_bigint("trade_fee_den", &self.trade_fee_den)?)?,
      admin_trade_fee: FeeRatio::new(
        parse_bigint("admin_trade_fee_num", &self.admin_trade_fee_num)?,
        parse_bigint("admin_trade_fee_den", &self.admin_trade_fee_den)?,
      )?,
      withdraw_fee: FeeRatio::new(parse_bigint("withdraw_fee_num", &self.withdraw_fee_num)?, parse_bigint("withdraw_fee_den", &self.withdraw_fee_den)?)?,
      admin_withdraw_fee: FeeRatio::new(
        parse_bigint("admin_withdraw_fee_num", &self.admin_withdraw_fee_num)?,
        parse_bigint("admin_withdraw_fee_den", &self.admin_withdraw_fee_den)?,
      )?,
      min_reserve_limit_percentage: parse_fixed("min_reserve_limit_percentage", &self.min_reserve_limit_percentage)?,
      virtual_reserve_percentage,
      enable_confidence_interval: self.enable_confidence_interval,
      max_swap_percentage: parse_fixed("max_swap_percentage", &self.max_swap_percentage)?,
    };

    let swap_info = SwapInfo {
      swap_type,
      config_key: self.config_key,
      mint_base: self.mint_base,
      mint_quote: self.mint_quote,
      mint_base_decimals: self.mint_base_decimals,
      mint_quote_decimals: self.mint_quote_decimals,
      pool_state,
      swap_config,
    };
    swap_info.validate()?;
    Ok(swap_info)
  }
}
