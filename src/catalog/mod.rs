mod client;
mod types;

pub use client::{CatalogClient, CatalogError, DEFAULT_BASE_URL};
pub use types::{SearchPage, VideoDetail, VideoSummary};
