//! The *deployment catalog* collaborator: loads immutable pool/token
//! metadata from a TOML file into `pricing_core::SwapInfo` records.

pub mod config;

use std::collections::HashMap;
use std::path::Path;

use anyhow::{anyhow, Result};
use pricing_core::SwapInfo;

use crate::config::{CatalogError, CatalogFile};

/// An immutable, loaded-once table of pools keyed by `config_key`. Mirrors
/// `AccountCache`'s "load once, serve from memory" shape in the reference
/// workspace's `arbiter/src/cache.rs`, minus any account-refresh logic —
/// there is nothing here to refresh, since the catalog is static config.
pub struct Catalog {
  pools: HashMap<String, SwapInfo>,
}

impl Catalog {
  pub fn from_toml_str(raw: &str) -> Result<Self> {
    let file: CatalogFile = toml::from_str(raw)?;
    let mut pools = HashMap::with_capacity(file.pools.len());
    for raw_pool in file.pools {
      let config_key = raw_pool.config_key.clone();
      let swap_info = raw_pool.into_swap_info()?;
      log::debug!("loaded pool '{config_key}' ({:?}/{:?})", swap_info.mint_base, swap_info.mint_quote);
      pools.insert(config_key, swap_info);
    }
    log::info!("catalog loaded with {} pools", pools.len());
    Ok(Self { pools })
  }

  pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
    let raw = std::fs::read_to_string(path.as_ref()).map_err(|e| anyhow!("failed to read catalog file {:?}: {e}", path.as_ref()))?;
    Self::from_toml_str(&raw)
  }

  pub fn get(&self, config_key: &str) -> Result<&SwapInfo> {
    self.pools.get(config_key).ok_or_else(|| anyhow!(CatalogError::PoolNotFound(config_key.to_string())))
  }

  pub fn iter(&self) -> impl Iterator<Item = (&String, &SwapInfo)> {
    self.pools.iter()
  }

  pub fn len(&self) -> usize {
    self.pools.len()
  }

  pub fn is_empty(&self) -> bool {
    self.pools.is_empty()
  }
}

/// The sample catalog shipped with this crate, used by tests and the CLI's
/// demo mode.
pub const SAMPLE_CATALOG_TOML: &str = include_str!("fixtures/sample_catalog.toml");

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn sample_catalog_round_trips() {
    let catalog = Catalog::from_toml_str(SAMPLE_CATALOG_TOML).unwrap();
    assert!(!catalog.is_empty());
    let pool = catalog.get("sol-usdc-normal").unwrap();
    assert_eq!(pool.mint_base, "SOL");
    assert_eq!(pool.mint_quote, "USDC");
  }

  #[test]
  fn unknown_pool_key_errors() {
    let catalog = Catalog::from_toml_str(SAMPLE_CATALOG_TOML).unwrap();
    assert!(catalog.get("does-not-exist").is_err());
  }

  #[test]
  fn virtual_reserve_percentage_defaults_to_zero_when_omitted() {
    let toml = r#"
[[pool]]
config_key = "no-virtual"
swap_type = "stable"
mint_base = "A"
mint_quote = "B"
mint_base_decimals = 6
mint_quote_decimals = 6
base_reserve = "1000000"
quote_reserve = "1000000"
target_base_reserve = "1000000"
target_quote_reserve = "1000000"
base_supply = "1000000"
quote_supply = "1000000"
slope = "0.5"
trade_fee_num = "0"
trade_fee_den = "1"
admin_trade_fee_num = "0"
admin_trade_fee_den = "1"
withdraw_fee_num = "0"
withdraw_fee_den = "1"
admin_withdraw_fee_num = "0"
admin_withdraw_fee_den = "1"
min_reserve_limit_percentage = "1"
"#;
    let catalog = Catalog::from_toml_str(toml).unwrap();
    let pool = catalog.get("no-virtual").unwrap();
    assert!(pool.swap_config.virtual_reserve_percentage.is_zero());
  }
}
