//! HTTP protocol layer module
//!
//! Status-code response builders shared by the request pipeline and the
//! item API, decoupled from item semantics.

pub mod response;

pub use response::{
    apply_cors_headers, build_405_response, build_413_response, build_health_response,
    build_options_response, build_redirect_response, build_text_response, set_server_header,
    without_body,
};
