pub mod address;
pub mod clock;

pub use address::{normalize, normalize_or_throw};
pub use clock::{Clock, ManualClock, SystemClock};
