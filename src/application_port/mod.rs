mod auth_service;
mod reset_service;

pub use auth_service::*;
pub use reset_service::*;
