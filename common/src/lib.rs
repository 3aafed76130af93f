pub mod logger;
pub mod macros;

pub use logger::*;
