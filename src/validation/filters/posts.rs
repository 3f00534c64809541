//! Post filters and payload normalization
//!
//! Post payloads arrive with loose category and tag shapes; they are
//! normalized before the save filter runs. Categories may be plain id
//! strings, tags may be plain names without ids.

use serde_json::{json, Value};
use uuid::Uuid;

use super::{id_field, InputFilter};
use crate::validation::{Field, Rule};

const PUBLISH_STATUSES: &[&str] = &["published", "pending", "draft"];

/// Filter for post create and update payloads
pub fn save_filter() -> InputFilter {
    InputFilter::new()
        .field(id_field("posts"))
        .object(
            "author_id",
            InputFilter::new().field(Field::required("id").rule(Rule::Uuid)),
        )
        .field(Field::required("title").rule(Rule::StringLength {
            min: Some(2),
            max: Some(220),
        }))
        .field(Field::required("permalink").rule(Rule::StringLength {
            min: Some(2),
            max: Some(255),
        }))
        .field(Field::optional("description").rule(Rule::StringLength {
            min: Some(2),
            max: Some(255),
        }))
        .field(Field::required("content_json"))
        .field(Field::required("content_html"))
        .field(Field::required("publish_status").rule(Rule::InArray(PUBLISH_STATUSES)))
        .field(Field::optional("published_at").rule(Rule::Date("%Y-%m-%d %H:%M:%S")))
        .optional_object(
            "featured_image_id",
            InputFilter::new().field(Field::optional("id").rule(Rule::Uuid)),
        )
        .collection(
            "categories",
            InputFilter::new().field(Field::required("id").rule(Rule::Uuid)),
        )
        .collection(
            "tags",
            InputFilter::new().field(Field::required("id").rule(Rule::Uuid)),
        )
}

/// Filter for post delete payloads
pub fn delete_filter() -> InputFilter {
    super::delete_filter("posts")
}

/// Rewrite a list of category id strings into `{"id": <value>}` objects.
///
/// Elements that are already objects pass through unchanged; order and
/// count are preserved.
pub fn normalize_categories(categories: &[Value]) -> Vec<Value> {
    categories
        .iter()
        .map(|element| match element {
            Value::Object(_) => element.clone(),
            other => json!({ "id": other }),
        })
        .collect()
}

/// Give every tag element without an `id` a freshly generated UUID.
///
/// A bare value becomes `{"id": <new uuid>, "name": <value>}`; an object
/// missing `id` gets one inserted; elements that carry an `id` pass
/// through unchanged. Order and count are preserved.
pub fn normalize_tags(tags: &[Value]) -> Vec<Value> {
    tags.iter()
        .map(|element| match element {
            Value::Object(map) if map.contains_key("id") => element.clone(),
            Value::Object(map) => {
                let mut map = map.clone();
                map.insert(
                    "id".to_string(),
                    Value::String(Uuid::new_v4().to_string()),
                );
                Value::Object(map)
            }
            other => json!({
                "id": Uuid::new_v4().to_string(),
                "name": other,
            }),
        })
        .collect()
}
