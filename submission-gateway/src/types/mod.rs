mod error;

pub use error::{ApiErrorResponse, AppError};
