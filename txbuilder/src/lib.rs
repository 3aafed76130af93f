//! The *transaction builder* collaborator: assembles a (mock) on-chain
//! instruction sequence for a swap. It calls `pricing_core::quote_swap_out`
//! only to obtain the `min_output_amount` slippage bound — it performs no
//! pricing of its own, matching `nexus::trx_builder::TrxBuilder`'s role of
//! sequencing instructions rather than computing amounts.

pub mod error;

use anyhow::{anyhow, Result};
use pricing_core::{FixedPoint, MarketPriceTriple, RoundingMode, SwapInfo};
use solana_sdk::compute_budget::ComputeBudgetInstruction;
use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::pubkey::Pubkey;

use crate::error::TxBuilderError;

/// A reasonable default compute unit budget for a single swap instruction,
/// mirroring the flat limit the reference workspace's `TrxBuilder` applies
/// before appending the program instructions (`ComputeBudgetInstruction`).
const DEFAULT_COMPUTE_UNIT_LIMIT: u32 = 200_000;

#[derive(Debug, Clone)]
pub struct SwapInstructionSet {
  /// Ordered: compute-budget instruction first, then the swap instruction.
  pub instructions: Vec<Instruction>,
  pub min_output_amount: u64,
}

fn to_pool_scale_u64(amount: &FixedPoint, decimals: u8) -> Result<u64> {
  let scale = FixedPoint::from_integer(num_bigint::BigInt::from(10u32).pow(decimals as u32));
  let scaled = amount.mul(&scale, RoundingMode::Floor);
  let as_bigint = scaled.round_to_integer(RoundingMode::Floor);
  as_bigint
    .try_into()
    .map_err(|_| anyhow!(TxBuilderError::AmountOverflow(format!("{as_bigint}"))))
}

/// Builds the instruction sequence for a `from -> to` swap, sized to
/// `amount_in` and protected at `max_slippage_pct`. `program_id` is the
/// on-chain program that would receive the swap instruction; `payer` and
/// the mint accounts are passed straight through as account metas since
/// this crate performs no chain I/O and cannot resolve associated token
/// accounts itself.
pub fn build_swap_instructions(
  program_id: &Pubkey,
  payer: &Pubkey,
  from_mint_account: &Pubkey,
  to_mint_account: &Pubkey,
  pool: &SwapInfo,
  from_mint: &str,
  to_mint: &str,
  amount_in: &str,
  max_slippage_pct: &FixedPoint,
  market: &MarketPriceTriple,
) -> Result<SwapInstructionSet> {
  let quote = pricing_core::quote_swap_out(pool, from_mint, to_mint, amount_in, max_slippage_pct, market)?;

  if quote.insufficient_liquidity {
    return Err(anyhow!(TxBuilderError::InsufficientLiquidity));
  }
  if quote.amount_out_with_slippage.is_empty() {
    return Err(anyhow!(TxBuilderError::EmptyQuote));
  }

  let to_decimals = if from_mint == pool.mint_base { pool.mint_quote_decimals } else { pool.mint_base_decimals };
  let min_out = FixedPoint::from_decimal_str(&quote.amount_out_with_slippage)?;
  let min_output_amount = to_pool_scale_u64(&min_out, to_decimals)?;

  let compute_budget_ix = ComputeBudgetInstruction::set_compute_unit_limit(DEFAULT_COMPUTE_UNIT_LIMIT);

  let swap_ix = Instruction {
    program_id: *program_id,
    accounts: vec![
      AccountMeta::new(*payer, true),
      AccountMeta::new(*from_mint_account, false),
      AccountMeta::new(*to_mint_account, false),
    ],
    data: encode_swap_instruction_data(amount_in, min_output_amount),
  };

  log::debug!("assembled swap instruction for pool '{}': min_output_amount={min_output_amount}", pool.config_key);

  Ok(SwapInstructionSet {
    instructions: vec![compute_budget_ix, swap_ix],
    min_output_amount,
  })
}

/// Mock wire encoding: a one-byte discriminant, the human-scale input
/// amount as a length-prefixed UTF-8 string, and the little-endian
/// `min_output_amount`. There is no real on-chain program behind this, so
/// the exact layout only needs to be internally consistent.
fn encode_swap_instruction_data(amount_in: &str, min_output_amount: u64) -> Vec<u8> {
  let mut data = Vec::with_capacity(1 + 4 + amount_in.len() + 8);
  data.push(0u8);
  data.extend_from_slice(&(amount_in.len() as u32).to_le_bytes());
  data.extend_from_slice(amount_in.as_bytes());
  data.extend_from_slice(&min_output_amount.to_le_bytes());
  data
}

#[cfg(test)]
mod tests {
  use super::*;
  use num_bigint::BigInt;
  use pricing_core::{FeeRatio, PoolState, SwapConfig, SwapType};

  fn sample_pool() -> SwapInfo {
    SwapInfo {
      swap_type: SwapType::Normal,
      config_key: "test-pool".to_string(),
      mint_base: "SOL".to_string(),
      mint_quote: "USDC".to_string(),
      mint_base_decimals: 9,
      mint_quote_decimals: 6,
      pool_state: PoolState {
        base_reserve: BigInt::from(9_500_000_000_000u64),
        quote_reserve: BigInt::from(20_500_000_000_000u64),
        target_base_reserve: BigInt::from(10_000_000_000_000u64),
        target_quote_reserve: BigInt::from(20_000_000_000_000u64),
        base_supply: BigInt::from(10_000_000_000_000u64),
        quote_supply: BigInt::from(20_000_000_000_000u64),
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

  fn defined_market(mid: &str) -> MarketPriceTriple {
    let p = FixedPoint::from_decimal_str(mid).unwrap();
    MarketPriceTriple::Defined {
      mid: p.clone(),
      low: p.clone(),
      high: p,
    }
  }

  #[test]
  fn builds_compute_budget_then_swap_instruction_in_order() {
    let pool = sample_pool();
    let market = defined_market("2");
    let program_id = Pubkey::new_unique();
    let payer = Pubkey::new_unique();
    let from_account = Pubkey::new_unique();
    let to_account = Pubkey::new_unique();

    let set = build_swap_instructions(&program_id, &payer, &from_account, &to_account, &pool, "SOL", "USDC", "1", &FixedPoint::zero(), &market).unwrap();

    assert_eq!(set.instructions.len(), 2);
    assert_eq!(set.instructions[0].program_id, solana_sdk::compute_budget::id());
    assert_eq!(set.instructions[1].program_id, program_id);
    assert!(set.min_output_amount > 0);
  }

  #[test]
  fn rejects_insufficient_liquidity() {
    let pool = sample_pool();
    let market = defined_market("2");
    let program_id = Pubkey::new_unique();
    let payer = Pubkey::new_unique();
    let from_account = Pubkey::new_unique();
    let to_account = Pubkey::new_unique();

    let result = build_swap_instructions(&program_id, &payer, &from_account, &to_account, &pool, "SOL", "USDC", "9500000", &FixedPoint::zero(), &market);
    assert!(result.is_err());
  }
}
