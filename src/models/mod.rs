pub mod position;
pub mod raw;

pub use position::{amount_from_raw, Position, PriceRange, Protocol, Reward, TokenAmounts, TokenInfo};
pub use raw::{pro_rata, RawPosition, RawReward, RawToken};
