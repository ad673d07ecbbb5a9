pub mod auth;
pub mod logging;

pub use auth::{Claims, CurrentUser, SessionAuth};
pub use logging::RequestLogging;
