//! The *oracle source* collaborator: resolves token symbols to
//! `pricing_core::OraclePrice` values. No network I/O lives here; this
//! crate is the seam a live Pyth/Switchboard client would plug into.

pub mod error;
pub mod source;

pub use error::OracleError;
pub use source::{dampen_stable_coin_price, market_price_triple, OraclePriceSource, OracleSource, StaticOracleSource};
