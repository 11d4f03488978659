// src/utils/mod.rs
pub mod error;
pub mod logging;
pub mod markup;
pub mod sanitize;

pub use error::AppError; // Re-export main error type for convenience
