pub mod item;
pub mod source;

pub use item::Item;
pub use source::{ExtractRule, Source};
