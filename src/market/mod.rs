//! Market data access for the scanner.
//! The scanner only sees the `DataProvider` trait; vendors live under `providers`.

pub mod provider;
pub mod providers;

// Re-exports for convenience
pub use provider::{DataProvider, ProviderError};
pub use providers::polygon::{PolygonProvider, RetryPolicy};
