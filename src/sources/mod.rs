pub mod traits;
pub mod extract;
pub mod html;
pub mod registry;

pub use traits::ItemFetcher;
pub use html::HtmlFetcher;
pub use registry::SourceRegistry;
