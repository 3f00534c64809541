//! Per-endpoint input filters
//!
//! One module per entity, each exposing constructor functions that build
//! the [`InputFilter`](super::InputFilter) for a request payload.

pub mod auth;
pub mod categories;
pub mod failed_logins;
pub mod files;
pub mod permissions;
pub mod posts;
pub mod roles;
pub mod tags;
pub mod users;

use super::{Field, InputFilter, Rule};

/// The shared `id` field: always a UUID, free on create, taken on update.
fn id_field(table: &'static str) -> Field {
    Field::required("id")
        .rule(Rule::Uuid)
        .on_create(Rule::NoRecordExists { table, column: "id" })
        .on_update(Rule::RecordExists { table, column: "id" })
}

/// Delete payloads carry just an existing id.
fn delete_filter(table: &'static str) -> InputFilter {
    InputFilter::new().field(
        Field::required("id")
            .rule(Rule::Uuid)
            .rule(Rule::RecordExists { table, column: "id" }),
    )
}
