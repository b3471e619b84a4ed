pub mod item_cache;
pub mod snapshot;

pub use item_cache::{AbsorbStats, ItemCache};
