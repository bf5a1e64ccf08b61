// Item API rejection reasons

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use std::fmt;

use crate::http::build_text_response;

/// Why a request was rejected before reaching a successful response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Body is not syntactically valid JSON
    InvalidJson(String),
    /// Body is JSON but does not describe an item
    InvalidItem(String),
    /// Query parameter present but not an integer
    InvalidQuery { name: &'static str, value: String },
    /// Route table and handler disagree (missing path parameter)
    Internal(String),
}

impl ApiError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidJson(_) | Self::InvalidItem(_) | Self::InvalidQuery { .. } => {
                StatusCode::BAD_REQUEST
            }
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Plain-text body sent to the client; details stay in the log
    pub fn public_message(&self) -> String {
        match self {
            Self::InvalidJson(_) => "Invalid JSON".to_string(),
            Self::InvalidItem(_) => "Error parsing item".to_string(),
            Self::InvalidQuery { name, .. } => format!("Invalid query parameter '{name}'"),
            Self::Internal(_) => "Internal server error".to_string(),
        }
    }

    pub fn into_response(self) -> Response<Full<Bytes>> {
        build_text_response(self.status(), &self.public_message())
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidJson(e) => write!(f, "invalid JSON body: {e}"),
            Self::InvalidItem(e) => write!(f, "invalid item: {e}"),
            Self::InvalidQuery { name, value } => {
                write!(f, "query parameter '{name}' is not an integer: '{value}'")
            }
            Self::Internal(e) => write!(f, "internal error: {e}"),
        }
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_and_message() {
        let err = ApiError::InvalidQuery {
            name: "skip",
            value: "abc".to_string(),
        };
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.public_message(), "Invalid query parameter 'skip'");
        assert_eq!(err.to_string(), "query parameter 'skip' is not an integer: 'abc'");

        let err = ApiError::InvalidItem("missing field `price`".to_string());
        assert_eq!(err.public_message(), "Error parsing item");
        assert!(err.to_string().contains("price"));

        let response = ApiError::Internal("no param".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
