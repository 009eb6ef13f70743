//! Vendor implementations of `DataProvider`.

pub mod polygon;

// Re-export for convenience
pub use polygon::{POLYGON_BASE_URL, PolygonProvider, RetryPolicy};
