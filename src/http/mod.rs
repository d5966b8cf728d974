//! HTTP protocol layer module
//!
//! Response builders, MIME detection and conditional-request helpers,
//! decoupled from the static-file and API business logic.

pub mod cache;
pub mod mime;
pub mod response;

// Re-export commonly used builders
pub use response::{
    build_304_response, build_404_response, build_413_response, build_preflight_response,
};
