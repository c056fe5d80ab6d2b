pub mod oracle;
pub mod valuation;

pub use oracle::{PriceCache, PriceOracle};
pub use valuation::{compute_apr, estimated_volume_24h, tick_to_price, value_usd, Valuer};
