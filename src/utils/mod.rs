pub mod error_page;
pub mod errors;
pub mod jwt;
pub mod validators;
