use thiserror::Error;

#[derive(Debug, Error)]
pub enum OracleError {
  #[error("unknown oracle source: {0}")]
  UnknownSource(String),

  #[error("no price registered for symbol: {0}")]
  MissingPrice(String),

  #[error(transparent)]
  Pricing(#[from] pricing_core::PricingError),
}
