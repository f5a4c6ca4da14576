// Library root for the FPL dashboard core: upstream payload models, the
// derived metrics, reshaping helpers, configuration and session persistence.

pub mod config;
pub mod error;
pub mod fixtures;
pub mod leagues;
pub mod metrics;
pub mod models;
pub mod session;
pub mod summary;

pub use error::FplError;
