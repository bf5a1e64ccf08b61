// Item API types

use serde::{Deserialize, Serialize};

/// An item as sent by clients; never stored
///
/// All fields except `description` are required. A missing field or a value
/// of the wrong type fails deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: f64,
    pub is_available: bool,
}

/// Pagination window for the item listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub skip: i64,
    pub limit: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self { skip: 0, limit: 10 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_item_required_fields() {
        let item: Item =
            serde_json::from_value(json!({"name": "Foo", "price": 2, "is_available": false}))
                .unwrap();
        assert_eq!(item.description, None);
        assert!((item.price - 2.0).abs() < f64::EPSILON);

        for missing in ["name", "price", "is_available"] {
            let mut value = json!({"name": "Foo", "price": 1.5, "is_available": true});
            value.as_object_mut().unwrap().remove(missing);
            assert!(serde_json::from_value::<Item>(value).is_err(), "{missing} should be required");
        }
    }

    #[test]
    fn test_item_wrong_types() {
        assert!(serde_json::from_value::<Item>(
            json!({"name": "Foo", "price": "cheap", "is_available": true})
        )
        .is_err());
        assert!(serde_json::from_value::<Item>(
            json!({"name": 5, "price": 1.0, "is_available": true})
        )
        .is_err());
        assert!(serde_json::from_value::<Item>(
            json!({"name": "Foo", "price": 1.0, "is_available": "yes"})
        )
        .is_err());
    }

    #[test]
    fn test_item_serialization_omits_missing_description() {
        let item = Item {
            name: "Foo".to_string(),
            description: None,
            price: 1.5,
            is_available: true,
        };
        assert_eq!(
            serde_json::to_string(&item).unwrap(),
            r#"{"name":"Foo","price":1.5,"is_available":true}"#
        );
    }
}
