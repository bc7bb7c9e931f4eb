mod auth_service_fake;
mod auth_service_impl;
mod password_hasher;
mod reset_service_impl;
mod token_codec;

pub use auth_service_fake::*;
pub use auth_service_impl::*;
pub use password_hasher::*;
pub use reset_service_impl::*;
pub use token_codec::*;
