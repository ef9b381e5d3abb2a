pub mod access;
pub mod catalog;
pub(crate) mod http;
pub mod permits;

pub use http::USER_TOKEN_HEADER;
