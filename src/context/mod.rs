pub mod annotate;
pub mod builder;
pub mod fetch;

pub use builder::ContextBuilder;
pub use fetch::{FileFetcher, FnFetcher, FsFetcher};
