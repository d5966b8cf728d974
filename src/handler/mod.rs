// Request handling module entry
// Dispatch plus the static file responder.

pub mod router;
pub mod static_files;

pub use router::handle_request;
