//! Routing module
//!
//! Maps method + path template pairs to handlers:
//! - Path templates with typed `<int>` segments
//! - Query string decoding
//! - Route table resolution with 404/405 distinction

mod pattern;
mod query;
mod table;

pub use pattern::{PathParams, PatternError};
pub use query::QueryParams;
pub use table::{Resolution, RouteTable};
