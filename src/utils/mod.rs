pub mod error;
pub mod logger;
pub mod sanitize;
pub mod validation;
