//! Request handler module
//!
//! Entry point for every HTTP request: health checks, body limits,
//! item API dispatch and access logging.

pub mod router;

// Re-export main entry point
pub use router::handle_request;
