//! Data models

pub mod dataset;
pub mod transaction;

pub use dataset::*;
pub use transaction::*;
