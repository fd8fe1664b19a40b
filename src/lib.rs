pub mod cache;
pub mod debug;
pub mod error;
pub mod export;
pub mod fetcher;
pub mod locator;
pub mod mapper;
pub mod models;
pub mod pipeline;
pub mod tui;

pub use error::ScrapeError;
pub use models::{ListingField, ListingPage, ListingRecord, RawListing};
