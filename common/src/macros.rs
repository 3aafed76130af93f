/// Truncate a floating-point display value to `$decimals` fractional digits.
/// Display-only; never used inside the pricing core itself.
#[macro_export]
macro_rules! trunc {
  ($num:expr, $decimals:expr) => {{
    let factor = 10.0_f64.powi($decimals);
    ($num * factor).round() / factor
  }};
}
