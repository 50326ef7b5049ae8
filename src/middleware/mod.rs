pub mod auth;

pub use auth::{AuthenticatedPrincipal, Role};
