//! Sign-in against the backend and the extractors that guard pages.

pub mod handlers;
pub mod middleware;

pub use handlers::*;
pub use middleware::{AdminContext, AuthContext, OptionalAuth};
