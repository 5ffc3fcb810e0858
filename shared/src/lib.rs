pub mod api;
#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;
pub mod models;
pub mod utils;
