//! Data model shared across the pricing core: token/pool descriptors, the
//! market-price triple, and the tagged sum types that replace the object
//! flag encoding described in the design notes.

use num_bigint::BigInt;
use num_traits::Zero;

use crate::constants::DEFAULT_TOKEN_DECIMALS;
use crate::error::{PricingError, PricingResult};
use crate::fixed_point::{FixedPoint, RoundingMode};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenDescriptor {
  pub symbol: String,
  pub mint_id: String,
  pub decimals: u8,
  pub oracle_ref: String,
}

impl TokenDescriptor {
  pub fn new(symbol: impl Into<String>, mint_id: impl Into<String>, decimals: u8, oracle_ref: impl Into<String>) -> Self {
    Self {
      symbol: symbol.into(),
      mint_id: mint_id.into(),
      decimals,
      oracle_ref: oracle_ref.into(),
    }
  }
}

impl Default for TokenDescriptor {
  fn default() -> Self {
    Self {
      symbol: String::new(),
      mint_id: String::new(),
      decimals: DEFAULT_TOKEN_DECIMALS,
      oracle_ref: String::new(),
    }
  }
}

/// `{ price, confidence }` for a single token, already divided to a common
/// rational scale. `price > 0` is enforced by [`OraclePrice::new`];
/// `confidence` is typically `0` for mock sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OraclePrice {
  pub price: FixedPoint,
  pub confidence: FixedPoint,
}

impl OraclePrice {
  pub fn new(price: FixedPoint, confidence: FixedPoint) -> PricingResult<Self> {
    if !price.is_positive() {
      return Err(PricingError::OracleUnavailable(
        "oracle price must be positive".to_string(),
      ));
    }
    if confidence.is_negative() {
      return Err(PricingError::OracleUnavailable(
        "oracle confidence must be non-negative".to_string(),
      ));
    }
    Ok(Self { price, confidence })
  }
}

/// `{ mid, low, high }`. An absent side (missing oracle data) is represented
/// by `MarketPriceTriple::Undefined` rather than a NaN sentinel.
#[derive(Debug, Clone)]
pub enum MarketPriceTriple {
  Defined { mid: FixedPoint, low: FixedPoint, high: FixedPoint },
  Undefined,
}

impl MarketPriceTriple {
  pub fn from_oracle_prices(base: Option<&OraclePrice>, quote: Option<&OraclePrice>) -> Self {
    let (base, quote) = match (base, quote) {
      (Some(b), Some(q)) => (b, q),
      _ => return MarketPriceTriple::Undefined,
    };
    let mid = match base.price.div(&quote.price, RoundingMode::HalfEven) {
      Ok(v) => v,
      Err(_) => return MarketPriceTriple::Undefined,
    };
    let high_num = base.price.add(&base.confidence);
    let high_den = quote.price.sub(&quote.confidence);
    let low_num = base.price.sub(&base.confidence);
    let low_den = quote.price.add(&quote.confidence);
    let high = match high_den.is_positive() {
      true => high_num.div(&high_den, RoundingMode::Ceil).unwrap_or_else(|_| mid.clone()),
      false => mid.clone(),
    };
    let low = match low_num.is_negative() {
      true => FixedPoint::zero(),
      false => low_num
        .div(&low_den, RoundingMode::Floor)
        .unwrap_or_else(|_| mid.clone()),
    };
    MarketPriceTriple::Defined { mid, low, high }
  }

  pub fn is_defined(&self) -> bool {
    matches!(self, MarketPriceTriple::Defined { .. })
  }
}

/// Integer reserves and supplies at on-chain scale. All fields non-negative.
#[derive(Debug, Clone)]
pub struct PoolState {
  pub base_reserve: BigInt,
  pub quote_reserve: BigInt,
  pub target_base_reserve: BigInt,
  pub target_quote_reserve: BigInt,
  pub base_supply: BigInt,
  pub quote_supply: BigInt,
}

impl PoolState {
  pub fn validate(&self) -> PricingResult<()> {
    let fields: [(&str, &BigInt); 6] = [
      ("base_reserve", &self.base_reserve),
      ("quote_reserve", &self.quote_reserve),
      ("target_base_reserve", &self.target_base_reserve),
      ("target_quote_reserve", &self.target_quote_reserve),
      ("base_supply", &self.base_supply),
      ("quote_supply", &self.quote_supply),
    ];
    for (name, value) in fields {
      if value.sign() == num_bigint::Sign::Minus {
        return Err(PricingError::DomainError(format!("{name} must be non-negative")));
      }
    }
    if self.target_base_reserve.is_zero() || self.target_quote_reserve.is_zero() {
      return Err(PricingError::DomainError(
        "target reserves must be positive for an operational pool".to_string(),
      ));
    }
    Ok(())
  }
}

/// A fee expressed as `num/den`, `num <= den`, `den != 0`.
#[derive(Debug, Clone)]
pub struct FeeRatio {
  pub num: BigInt,
  pub den: BigInt,
}

impl FeeRatio {
  pub fn new(num: impl Into<BigInt>, den: impl Into<BigInt>) -> PricingResult<Self> {
    let num = num.into();
    let den = den.into();
    if den.is_zero() {
      return Err(PricingError::DomainError("fee denominator must be non-zero".to_string()));
    }
    if num > den {
      return Err(PricingError::DomainError(
        "fee numerator must not exceed denominator".to_string(),
      ));
    }
    if num.sign() == num_bigint::Sign::Minus {
      return Err(PricingError::DomainError("fee numerator must be non-negative".to_string()));
    }
    Ok(Self { num, den })
  }

  pub fn as_fixed_point(&self, mode: RoundingMode) -> PricingResult<FixedPoint> {
    FixedPoint::from_bigint_ratio(&self.num, &self.den, mode)
  }

  pub fn zero() -> Self {
    Self {
      num: BigInt::zero(),
      den: BigInt::from(1),
    }
  }
}

#[derive(Debug, Clone)]
pub struct SwapConfig {
  /// Scaled by `10^18` per the on-chain convention; stored here already
  /// converted to a plain fraction in `(0, 1]`.
  pub slope: FixedPoint,
  pub trade_fee: FeeRatio,
  pub admin_trade_fee: FeeRatio,
  pub withdraw_fee: FeeRatio,
  pub admin_withdraw_fee: FeeRatio,
  /// Percentage, `[0, 100]`.
  pub min_reserve_limit_percentage: FixedPoint,
  /// Percentage, `[0, 100]`. Absent in a catalog entry defaults to `0`.
  pub virtual_reserve_percentage: FixedPoint,
  pub enable_confidence_interval: bool,
  pub max_swap_percentage: FixedPoint,
}

impl SwapConfig {
  pub fn validate(&self, swap_type: SwapType) -> PricingResult<()> {
    if swap_type == SwapType::Stable && (!self.slope.is_positive() || self.slope > FixedPoint::one()) {
      return Err(PricingError::DomainError("slope must be in (0, 1] for stable-swap".to_string()));
    }
    let hundred = FixedPoint::from_integer(100);
    if self.min_reserve_limit_percentage.is_negative() || self.min_reserve_limit_percentage > hundred {
      return Err(PricingError::DomainError(
        "min_reserve_limit_percentage must be in [0, 100]".to_string(),
      ));
    }
    if self.virtual_reserve_percentage.is_negative() || self.virtual_reserve_percentage > hundred {
      return Err(PricingError::DomainError(
        "virtual_reserve_percentage must be in [0, 100]".to_string(),
      ));
    }
    Ok(())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapType {
  Normal,
  Stable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapDirection {
  SellBase,
  SellQuote,
}

impl SwapDirection {
  pub fn opposite(self) -> Self {
    match self {
      SwapDirection::SellBase => SwapDirection::SellQuote,
      SwapDirection::SellQuote => SwapDirection::SellBase,
    }
  }
}

#[derive(Debug, Clone)]
pub struct SwapInfo {
  pub swap_type: SwapType,
  pub config_key: String,
  pub mint_base: String,
  pub mint_quote: String,
  pub mint_base_decimals: u8,
  pub mint_quote_decimals: u8,
  pub pool_state: PoolState,
  pub swap_config: SwapConfig,
}

impl SwapInfo {
  pub fn validate(&self) -> PricingResult<()> {
    self.pool_state.validate()?;
    self.swap_config.validate(self.swap_type)?;
    Ok(())
  }

  /// Resolve a `(from_mint, to_mint)` pair against this pool's `(base,
  /// quote)` mints, failing with `InvalidTokenPair` on any mismatch.
  pub fn resolve_direction(&self, from_mint: &str, to_mint: &str) -> PricingResult<SwapDirection> {
    if from_mint == self.mint_base && to_mint == self.mint_quote {
      Ok(SwapDirection::SellBase)
    } else if from_mint == self.mint_quote && to_mint == self.mint_base {
      Ok(SwapDirection::SellQuote)
    } else {
      Err(PricingError::InvalidTokenPair(format!(
        "({from_mint}, {to_mint}) does not match pool mints ({}, {})",
        self.mint_base, self.mint_quote
      )))
    }
  }
}

/// All numeric fields are decimal strings at human scale, per §6 "Units".
#[derive(Debug, Clone)]
pub struct SwapResult {
  pub amount_in: String,
  pub amount_out: String,
  pub amount_out_with_slippage: String,
  pub fee: String,
  pub price_impact: String,
  pub insufficient_liquidity: bool,
}

impl SwapResult {
  /// The result for `amount_in == "0"`, per §4.D step 1.
  pub fn zero() -> Self {
    Self {
      amount_in: "0".to_string(),
      amount_out: "0".to_string(),
      amount_out_with_slippage: "0".to_string(),
      fee: "0".to_string(),
      price_impact: "0".to_string(),
      insufficient_liquidity: false,
    }
  }

  /// The result when the oracle data needed for this quote is missing;
  /// callers interpret this as "no quote available" rather than an error.
  pub fn empty() -> Self {
    Self {
      amount_in: "".to_string(),
      amount_out: "".to_string(),
      amount_out_with_slippage: "".to_string(),
      fee: "".to_string(),
      price_impact: "".to_string(),
      insufficient_liquidity: false,
    }
  }
}
