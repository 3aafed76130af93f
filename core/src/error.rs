use thiserror::Error;

/// Closed error taxonomy for the pricing core. Every fallible entry point in
/// this crate returns one of these variants; none of them are ever logged,
/// retried, or silently coerced away by the core itself.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PricingError {
  #[error("invalid amount: {0}")]
  InvalidAmount(String),

  #[error("invalid token pair: {0}")]
  InvalidTokenPair(String),

  #[error("invalid swap type: {0}")]
  InvalidSwapType(String),

  #[error("invalid swap direction: {0}")]
  InvalidSwapDirection(String),

  #[error("domain error: {0}")]
  DomainError(String),

  #[error("internal invariant violated: {0}")]
  InternalInvariant(String),

  #[error("oracle price unavailable: {0}")]
  OracleUnavailable(String),
}

pub type PricingResult<T> = Result<T, PricingError>;
