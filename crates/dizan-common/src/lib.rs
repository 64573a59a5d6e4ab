pub mod errors;
pub mod id;

pub use errors::{ConfigError, DizanError};
pub use id::{new_id, SessionId};
