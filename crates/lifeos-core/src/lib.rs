pub mod canon;
pub mod error;
pub mod hash;
pub mod stamp;
pub mod types;

pub use error::CoreError;
pub use types::*;
