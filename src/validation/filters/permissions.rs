//! Permission filters

use super::{id_field, InputFilter};
use crate::validation::{Field, Rule};

const METHODS: &[&str] = &["GET", "POST", "PUT", "DELETE", "PATCH"];

/// Filter for permission create and update payloads
pub fn save_filter() -> InputFilter {
    InputFilter::new()
        .field(id_field("permissions"))
        .field(Field::required("module").rule(Rule::StringLength {
            min: Some(1),
            max: Some(160),
        }))
        .field(Field::required("name").rule(Rule::StringLength {
            min: Some(1),
            max: Some(160),
        }))
        .field(Field::required("action").rule(Rule::StringLength {
            min: Some(1),
            max: Some(160),
        }))
        .field(Field::optional("route").rule(Rule::StringLength {
            min: None,
            max: Some(255),
        }))
        .field(Field::required("method").rule(Rule::InArray(METHODS)))
}

/// Filter for permission delete and copy payloads
pub fn delete_filter() -> InputFilter {
    super::delete_filter("permissions")
}
