//! Role filters

use super::{id_field, InputFilter};
use crate::validation::{Field, Rule};

/// Filter for role create and update payloads
pub fn save_filter() -> InputFilter {
    InputFilter::new()
        .field(id_field("roles"))
        .field(Field::required("name").rule(Rule::StringLength {
            min: Some(2),
            max: Some(100),
        }))
        .field(Field::optional("level").rule(Rule::IntegerRange { min: 1, max: 32 }))
        .collection(
            "permissions",
            InputFilter::new().field(
                Field::required("id")
                    .rule(Rule::Uuid)
                    .rule(Rule::RecordExists {
                        table: "permissions",
                        column: "id",
                    }),
            ),
        )
}

/// Filter for role delete payloads
pub fn delete_filter() -> InputFilter {
    super::delete_filter("roles")
}
