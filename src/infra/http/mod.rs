mod admin;
mod middleware;
mod public;

pub use admin::{AdminState, build_admin_router};
pub use public::build_public_router;
