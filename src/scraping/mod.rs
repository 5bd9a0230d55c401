pub mod fetch;
pub mod reduce;

pub use fetch::{FetchError, HttpPageFetcher, PageSource};
pub use reduce::reduce_to_body;
