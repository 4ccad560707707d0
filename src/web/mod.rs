pub mod error;
pub mod middleware;

pub use error::{ApiError, ErrorResponse};
