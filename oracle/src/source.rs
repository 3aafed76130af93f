//! Oracle backend dispatch and a deterministic mock source for tests and
//! CLI demos. Mirrors the multi-backend dispatch in the reference
//! workspace's `get_oracle_price` (`programs/drift/src/utils/oracle.rs`),
//! minus any on-chain account parsing: this crate never reads an
//! `AccountInfo`, only produces `pricing_core::OraclePrice` values.

use std::collections::HashMap;

use anyhow::{anyhow, Result};
use pricing_core::{FixedPoint, OraclePrice, RoundingMode};

use crate::error::OracleError;

/// Which upstream price feed backs a token. `QuoteAsset` is the degenerate
/// case used for stablecoins pegged to the quote currency itself (price
/// always `1`, confidence `0`), matching the reference workspace's
/// `OracleSource::QuoteAsset` arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OracleSource {
  Pyth,
  Pyth1K,
  Pyth1M,
  PythStableCoin,
  Switchboard,
  QuoteAsset,
  Prelaunch,
}

impl OracleSource {
  pub fn parse(raw: &str) -> Result<Self> {
    match raw {
      "pyth" => Ok(OracleSource::Pyth),
      "pyth_1k" => Ok(OracleSource::Pyth1K),
      "pyth_1m" => Ok(OracleSource::Pyth1M),
      "pyth_stable_coin" => Ok(OracleSource::PythStableCoin),
      "switchboard" => Ok(OracleSource::Switchboard),
      "quote_asset" => Ok(OracleSource::QuoteAsset),
      "prelaunch" => Ok(OracleSource::Prelaunch),
      other => Err(anyhow!(OracleError::UnknownSource(other.to_string()))),
    }
  }
}

/// A source of `(price, confidence)` pairs keyed by token symbol. Real
/// deployments would implement this against live Pyth/Switchboard accounts;
/// this crate only ships the deterministic mock used by tests and the CLI,
/// since no chain connection is in scope here.
pub trait OraclePriceSource {
  fn price_for(&self, symbol: &str) -> Result<OraclePrice>;
}

/// A fixed table of prices, set up once and never mutated afterward —
/// deterministic by construction, unlike a live feed.
#[derive(Debug, Clone, Default)]
pub struct StaticOracleSource {
  prices: HashMap<String, OraclePrice>,
}

impl StaticOracleSource {
  pub fn new() -> Self {
    Self { prices: HashMap::new() }
  }

  pub fn with_price(mut self, symbol: impl Into<String>, price: &str, confidence: &str) -> Result<Self> {
    let price_fp = FixedPoint::from_decimal_str(price)?;
    let confidence_fp = FixedPoint::from_decimal_str(confidence)?;
    let oracle_price = OraclePrice::new(price_fp, confidence_fp)?;
    self.prices.insert(symbol.into(), oracle_price);
    Ok(self)
  }

  /// `OracleSource::QuoteAsset`: price pinned at `1`, confidence `0`.
  pub fn with_quote_asset(self, symbol: impl Into<String>) -> Result<Self> {
    self.with_price(symbol, "1", "0")
  }
}

impl OraclePriceSource for StaticOracleSource {
  fn price_for(&self, symbol: &str) -> Result<OraclePrice> {
    self
      .prices
      .get(symbol)
      .cloned()
      .ok_or_else(|| anyhow!(OracleError::MissingPrice(symbol.to_string())))
  }
}

/// `PythStableCoin`-style confidence dampening: the reference workspace's
/// stablecoin oracle variant clamps the price toward `1` when it is within
/// a band of the peg, rather than trusting the raw feed. Exposed here as a
/// pure function so both the mock source and a future live source can
/// share it.
pub fn dampen_stable_coin_price(price: &FixedPoint, peg: &FixedPoint, band: &FixedPoint) -> Result<FixedPoint> {
  let diff = price.sub(peg).abs();
  if diff <= *band {
    Ok(peg.clone())
  } else {
    Ok(price.clone())
  }
}

/// Helper for wiring a `MarketPriceTriple` from two `OraclePriceSource`
/// lookups; returns `MarketPriceTriple::Undefined` if either symbol is
/// unregistered rather than propagating the lookup error, matching the
/// core's "missing oracle data degrades to the empty result" contract.
pub fn market_price_triple(
  source: &dyn OraclePriceSource,
  base_symbol: &str,
  quote_symbol: &str,
) -> pricing_core::MarketPriceTriple {
  let base = source.price_for(base_symbol).ok();
  let quote = source.price_for(quote_symbol).ok();
  pricing_core::MarketPriceTriple::from_oracle_prices(base.as_ref(), quote.as_ref())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn static_source_resolves_registered_symbol() {
    let source = StaticOracleSource::new().with_price("SOL", "150.25", "0.05").unwrap();
    let price = source.price_for("SOL").unwrap();
    assert_eq!(price.price, FixedPoint::from_decimal_str("150.25").unwrap());
  }

  #[test]
  fn static_source_fails_on_unregistered_symbol() {
    let source = StaticOracleSource::new();
    assert!(source.price_for("SOL").is_err());
  }

  #[test]
  fn quote_asset_is_pinned_at_one() {
    let source = StaticOracleSource::new().with_quote_asset("USDC").unwrap();
    let price = source.price_for("USDC").unwrap();
    assert_eq!(price.price, FixedPoint::one());
    assert!(price.confidence.is_zero());
  }

  #[test]
  fn market_price_triple_is_undefined_when_a_side_is_missing() {
    let source = StaticOracleSource::new().with_price("SOL", "150", "0").unwrap();
    let triple = market_price_triple(&source, "SOL", "USDC");
    assert!(!triple.is_defined());
  }

  #[test]
  fn market_price_triple_is_defined_when_both_sides_known() {
    let source = StaticOracleSource::new()
      .with_price("SOL", "150", "0.1")
      .unwrap()
      .with_quote_asset("USDC")
      .unwrap();
    let triple = market_price_triple(&source, "SOL", "USDC");
    assert!(triple.is_defined());
  }

  #[test]
  fn stable_coin_price_is_dampened_within_band() {
    let price = FixedPoint::from_decimal_str("1.001").unwrap();
    let peg = FixedPoint::one();
    let band = FixedPoint::from_decimal_str("0.01").unwrap();
    let dampened = dampen_stable_coin_price(&price, &peg, &band).unwrap();
    assert_eq!(dampened, peg);
  }

  #[test]
  fn oracle_source_parse_rejects_unknown_strings() {
    assert!(OracleSource::parse("not-a-source").is_err());
    assert_eq!(OracleSource::parse("pyth").unwrap(), OracleSource::Pyth);
  }
}
