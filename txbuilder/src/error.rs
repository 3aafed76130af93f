use thiserror::Error;

/// Mirrors the reference workspace's one-`thiserror`-enum-per-failure-domain
/// convention (compare `nexus::trx_builder::TxError`), scoped to this
/// crate's much smaller job: turning a quote into an instruction list.
#[derive(Debug, Error)]
pub enum TxBuilderError {
  #[error("insufficient liquidity for the requested swap")]
  InsufficientLiquidity,

  #[error("quote returned no result (missing oracle data)")]
  EmptyQuote,

  #[error("quoted amount does not fit in a u64: {0}")]
  AmountOverflow(String),
}
