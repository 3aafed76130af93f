//! CLI entry point wiring the oracle, catalog, core, and tx-builder crates
//! together for interactive quoting. Mirrors `arbiter/src/main.rs`'s
//! `init_logger()` + `dotenv::dotenv().ok()` startup, minus any chain
//! connection — there is no RPC to dial in this workspace.

use anyhow::Result;
use clap::{Parser, Subcommand};
use common::logger::init_logger;
use pricing_catalog::{Catalog, SAMPLE_CATALOG_TOML};
use pricing_core::FixedPoint;
use pricing_oracle::{market_price_triple, OraclePriceSource, StaticOracleSource};

#[derive(Parser)]
#[command(name = "pricing-cli", about = "Quote swaps against a pool catalog")]
struct Cli {
  /// Path to a TOML pool catalog. Defaults to the crate's bundled sample.
  #[arg(long, env = "CATALOG_PATH")]
  catalog_path: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Quote the output amount for a given input amount.
  QuoteOut {
    pool: String,
    from: String,
    to: String,
    amount_in: String,
    #[arg(long, default_value = "0")]
    max_slippage_pct: String,
  },
  /// Quote the input amount required for a desired output amount.
  QuoteIn {
    pool: String,
    from: String,
    to: String,
    amount_out: String,
    #[arg(long, default_value = "0")]
    max_slippage_pct: String,
  },
  /// Compute the per-token withdrawal for a given LP share pair.
  Withdraw {
    pool: String,
    base_share: String,
    quote_share: String,
    base_share_supply: String,
    quote_share_supply: String,
  },
}

fn load_catalog(path: Option<&str>) -> Result<Catalog> {
  match path {
    Some(p) => Catalog::from_toml_file(p),
    None => Catalog::from_toml_str(SAMPLE_CATALOG_TOML),
  }
}

fn demo_oracle_source() -> Result<StaticOracleSource> {
  let source = StaticOracleSource::new().with_price("SOL", "150.0", "0.05")?;
  let source = source.with_quote_asset("USDC")?;
  let source = source.with_quote_asset("USDT")?;
  Ok(source)
}

fn main() -> Result<()> {
  init_logger();
  dotenv::dotenv().ok();

  let cli = Cli::parse();
  let catalog = load_catalog(cli.catalog_path.as_deref())?;
  let oracle = demo_oracle_source()?;

  match cli.command {
    Command::QuoteOut { pool, from, to, amount_in, max_slippage_pct } => {
      let pool = catalog.get(&pool)?;
      let market = market_price_triple(&oracle, &pool.mint_base, &pool.mint_quote);
      let slippage = FixedPoint::from_decimal_str(&max_slippage_pct)?;
      let result = pricing_core::quote_swap_out(pool, &from, &to, &amount_in, &slippage, &market)?;
      log::info!("{result:#?}");
      println!("{result:#?}");
    }
    Command::QuoteIn { pool, from, to, amount_out, max_slippage_pct } => {
      let pool = catalog.get(&pool)?;
      let market = market_price_triple(&oracle, &pool.mint_base, &pool.mint_quote);
      let slippage = FixedPoint::from_decimal_str(&max_slippage_pct)?;
      let result = pricing_core::quote_swap_in(pool, &from, &to, &amount_out, &slippage, &market)?;
      log::info!("{result:#?}");
      println!("{result:#?}");
    }
    Command::Withdraw {
      pool,
      base_share,
      quote_share,
      base_share_supply,
      quote_share_supply,
    } => {
      let pool = catalog.get(&pool)?;
      let base_price = oracle.price_for(&pool.mint_base)?.price;
      let quote_price = oracle.price_for(&pool.mint_quote)?.price;
      let result = pricing_core::calculate_withdrawal_from_shares(
        pool,
        &FixedPoint::from_decimal_str(&base_share)?,
        &FixedPoint::from_decimal_str(&quote_share)?,
        &FixedPoint::from_decimal_str(&base_share_supply)?,
        &FixedPoint::from_decimal_str(&quote_share_supply)?,
        &base_price,
        &quote_price,
      )?;
      log::info!("base_amount={:?} quote_amount={:?}", result.base_amount, result.quote_amount);
      println!("base_amount={:?} quote_amount={:?}", result.base_amount, result.quote_amount);
    }
  }

  Ok(())
}
