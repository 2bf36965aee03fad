pub mod api;
pub mod error;
pub mod models;
pub mod pages;
pub mod utils;
pub mod video;
pub mod vtt;

pub use error::{ScrapeError, ScrapeResult};
