//! Tag filters

use super::{id_field, InputFilter};
use crate::validation::{Field, Rule};

/// Filter for tag create and update payloads
pub fn save_filter() -> InputFilter {
    InputFilter::new()
        .field(id_field("tags"))
        .field(Field::required("name").rule(Rule::StringLength {
            min: Some(3),
            max: Some(100),
        }))
}

/// Filter for tag delete payloads
pub fn delete_filter() -> InputFilter {
    super::delete_filter("tags")
}
