pub mod error;
pub mod time_value;
pub mod types;

#[cfg(feature = "projection")]
pub mod projection;

pub use error::ImmocalcError;
pub use types::*;

/// Standard result type for all immocalc operations
pub type ImmocalcResult<T> = Result<T, ImmocalcError>;
