pub mod auth;
pub mod deadline;
pub mod preflight;

pub use auth::{bearer_token, require_user};
pub use deadline::enforce_deadline;
pub use preflight::preflight;
