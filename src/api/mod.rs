// API module entry
// Item resource routes: registration, request parts, dispatch

mod error;
mod handlers;
mod response;
mod types;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Method, Response};

use crate::http;
use crate::logger;
use crate::routing::{PathParams, PatternError, QueryParams, Resolution, RouteTable};

use error::ApiError;
pub use response::not_found;

/// Request parts a handler sees
pub struct ApiRequest<'a> {
    pub params: PathParams,
    pub query: QueryParams,
    pub body: &'a [u8],
}

impl ApiRequest<'_> {
    /// Integer path parameter by position
    pub fn path_int(&self, index: usize) -> Result<i64, ApiError> {
        self.params
            .int(index)
            .ok_or_else(|| ApiError::Internal(format!("missing path parameter #{index}")))
    }

    /// Optional integer query parameter; present but malformed is an error
    pub fn query_int(&self, name: &'static str) -> Result<Option<i64>, ApiError> {
        self.query
            .get(name)
            .map(|raw| {
                raw.trim().parse::<i64>().map_err(|_| ApiError::InvalidQuery {
                    name,
                    value: raw.to_string(),
                })
            })
            .transpose()
    }
}

pub type Handler = fn(&ApiRequest<'_>) -> Result<Response<Full<Bytes>>, ApiError>;

/// Build the item API route table
pub fn route_table() -> Result<RouteTable<Handler>, PatternError> {
    let mut table: RouteTable<Handler> = RouteTable::new();
    table.add(Method::GET, "/", handlers::root)?;
    table.add(Method::GET, "/items/<int>", handlers::read_item)?;
    table.add(Method::GET, "/items/", handlers::list_items)?;
    table.add(Method::POST, "/items/", handlers::create_item)?;
    table.add(Method::PUT, "/items/<int>", handlers::update_item)?;
    table.add(Method::DELETE, "/items/<int>", handlers::delete_item)?;
    table.add(Method::GET, "/users/<int>/items/<int>", handlers::read_user_item)?;
    table.add(Method::POST, "/echo/", handlers::echo)?;
    Ok(table)
}

/// Resolve and run the handler for a request
///
/// HEAD runs the GET route and drops the body. A path that only exists with
/// a trailing slash is redirected there with 307 so POST bodies survive.
pub fn dispatch(
    table: &RouteTable<Handler>,
    method: &Method,
    path: &str,
    query: Option<&str>,
    body: &[u8],
) -> Response<Full<Bytes>> {
    if *method == Method::HEAD {
        return http::without_body(dispatch(table, &Method::GET, path, query, body));
    }

    match table.resolve(method, path) {
        Resolution::Matched(handler, params) => {
            let req = ApiRequest {
                params,
                query: QueryParams::parse(query),
                body,
            };
            handler(&req).unwrap_or_else(|err| {
                logger::log_warning(&format!("{method} {path} rejected: {err}"));
                err.into_response()
            })
        }
        Resolution::MethodNotAllowed(allowed) => {
            logger::log_debug(&format!("Method not allowed: {method} {path}"));
            http::build_405_response(&allowed)
        }
        Resolution::NotFound => {
            slash_redirect(table, method, path, query).unwrap_or_else(|| not_found(path))
        }
    }
}

fn slash_redirect(
    table: &RouteTable<Handler>,
    method: &Method,
    path: &str,
    query: Option<&str>,
) -> Option<Response<Full<Bytes>>> {
    if path.ends_with('/') {
        return None;
    }
    let with_slash = format!("{path}/");
    if matches!(table.resolve(method, &with_slash), Resolution::NotFound) {
        return None;
    }

    let location = match query {
        Some(q) => format!("{with_slash}?{q}"),
        None => with_slash,
    };
    logger::log_debug(&format!("Redirecting {method} {path} to {location}"));
    Some(http::build_redirect_response(&location))
}
