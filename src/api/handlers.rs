// Item API handlers
//
// Each handler is a pure function of the request parts; nothing is stored
// between requests.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use serde_json::{json, Value};

use super::error::ApiError;
use super::response::ok;
use super::types::{Item, Pagination};
use super::ApiRequest;

pub const WELCOME_MESSAGE: &str = "Welcome to my Rust items server!";

type HandlerResult = Result<Response<Full<Bytes>>, ApiError>;

/// GET /
pub fn root(_req: &ApiRequest<'_>) -> HandlerResult {
    Ok(ok(&json!({ "message": WELCOME_MESSAGE })))
}

/// GET /items/<int>
pub fn read_item(req: &ApiRequest<'_>) -> HandlerResult {
    let item_id = req.path_int(0)?;
    Ok(ok(&json!({ "item_id": item_id })))
}

/// GET /items/?skip=&limit=
pub fn list_items(req: &ApiRequest<'_>) -> HandlerResult {
    let defaults = Pagination::default();
    let page = Pagination {
        skip: req.query_int("skip")?.unwrap_or(defaults.skip),
        limit: req.query_int("limit")?.unwrap_or(defaults.limit),
    };
    Ok(ok(&page))
}

/// POST /items/
pub fn create_item(req: &ApiRequest<'_>) -> HandlerResult {
    let item = parse_item(req.body)?;
    Ok(ok(&json!({
        "message": "Item created successfully",
        "item": item,
    })))
}

/// PUT /items/<int>
pub fn update_item(req: &ApiRequest<'_>) -> HandlerResult {
    let item_id = req.path_int(0)?;
    let item = parse_item(req.body)?;
    Ok(ok(&json!({
        "item_id": item_id,
        "updated_item": item,
    })))
}

/// DELETE /items/<int>
pub fn delete_item(req: &ApiRequest<'_>) -> HandlerResult {
    let item_id = req.path_int(0)?;
    Ok(ok(&json!({ "message": format!("Item {item_id} deleted") })))
}

/// GET /users/<int>/items/<int>?q=
pub fn read_user_item(req: &ApiRequest<'_>) -> HandlerResult {
    let mut body = json!({
        "user_id": req.path_int(0)?,
        "item_id": req.path_int(1)?,
    });
    if let Some(q) = req.query.get("q").filter(|q| !q.is_empty()) {
        body["q"] = Value::String(q.to_string());
    }
    Ok(ok(&body))
}

/// POST /echo/
pub fn echo(req: &ApiRequest<'_>) -> HandlerResult {
    let received = parse_json(req.body)?;
    Ok(ok(&json!({ "received": received })))
}

fn parse_json(body: &[u8]) -> Result<Value, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::InvalidJson(e.to_string()))
}

/// Syntax errors and shape errors are reported separately
fn parse_item(body: &[u8]) -> Result<Item, ApiError> {
    let value = parse_json(body)?;
    serde_json::from_value(value).map_err(|e| ApiError::InvalidItem(e.to_string()))
}
