pub mod error;
pub mod lbo;
pub mod time_value;
pub mod types;

pub use error::LboError;
pub use types::*;

/// Standard result type for all engine operations
pub type LboResult<T> = Result<T, LboError>;
