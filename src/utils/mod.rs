// Utility functions
pub mod error;
pub mod pagination;

pub use error::*;
pub use pagination::*;
