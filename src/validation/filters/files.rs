//! File filters

use super::InputFilter;
use crate::validation::{Field, Rule};

/// Filter for file lookup and raw-read payloads
pub fn read_filter() -> InputFilter {
    InputFilter::new().field(
        Field::required("id")
            .rule(Rule::Uuid)
            .rule(Rule::RecordExists {
                table: "files",
                column: "id",
            }),
    )
}
