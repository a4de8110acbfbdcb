//! HTTP types for Fezz handlers providing a fetch-like API.

mod request;
mod response;

pub use request::{FezzRequest, Method};
pub use response::{FezzResponse, StatusCode, TEXT_PLAIN_UTF8};
