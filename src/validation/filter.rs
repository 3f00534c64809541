//! Input filter engine
//!
//! An [`InputFilter`] is an ordered list of field entries. Scalar fields
//! carry rule lists, with extra rule lists that only apply on create or
//! on update. Object fields validate one nested JSON object with an
//! inner filter; collection fields validate every element of a JSON
//! array with an inner filter, keying errors by element index.

use anyhow::Result;
use serde_json::{Map, Value};
use sqlx::SqlitePool;
use std::future::Future;
use std::pin::Pin;

use super::{Method, Rule, ValidationResult};

/// A scalar field with its rule lists.
#[derive(Debug, Clone)]
pub struct Field {
    name: String,
    required: bool,
    rules: Vec<Rule>,
    create_rules: Vec<Rule>,
    update_rules: Vec<Rule>,
}

impl Field {
    /// A field that must be present and non-null
    pub fn required(name: &str) -> Self {
        Self {
            name: name.to_string(),
            required: true,
            rules: Vec::new(),
            create_rules: Vec::new(),
            update_rules: Vec::new(),
        }
    }

    /// A field that may be absent or null; rules run only when present
    pub fn optional(name: &str) -> Self {
        Self {
            name: name.to_string(),
            required: false,
            rules: Vec::new(),
            create_rules: Vec::new(),
            update_rules: Vec::new(),
        }
    }

    /// Add a rule that always applies
    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Add a rule applied only when validating a create payload
    pub fn on_create(mut self, rule: Rule) -> Self {
        self.create_rules.push(rule);
        self
    }

    /// Add a rule applied only when validating an update payload
    pub fn on_update(mut self, rule: Rule) -> Self {
        self.update_rules.push(rule);
        self
    }

    fn rules_for(&self, method: Method) -> impl Iterator<Item = &Rule> {
        let extra = match method {
            Method::Create => &self.create_rules,
            Method::Update => &self.update_rules,
        };
        self.rules.iter().chain(extra.iter())
    }
}

enum Entry {
    Field(Field),
    Object {
        name: String,
        required: bool,
        inner: InputFilter,
    },
    Collection {
        name: String,
        required: bool,
        inner: InputFilter,
    },
}

/// Declarative filter for one request payload.
#[derive(Default)]
pub struct InputFilter {
    entries: Vec<Entry>,
}

impl InputFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a scalar field
    pub fn field(mut self, field: Field) -> Self {
        self.entries.push(Entry::Field(field));
        self
    }

    /// Add a required nested-object field validated by an inner filter
    pub fn object(mut self, name: &str, inner: InputFilter) -> Self {
        self.entries.push(Entry::Object {
            name: name.to_string(),
            required: true,
            inner,
        });
        self
    }

    /// Add an optional nested-object field; absent or null passes
    pub fn optional_object(mut self, name: &str, inner: InputFilter) -> Self {
        self.entries.push(Entry::Object {
            name: name.to_string(),
            required: false,
            inner,
        });
        self
    }

    /// Add an optional array field whose elements are each validated by
    /// the inner filter
    pub fn collection(mut self, name: &str, inner: InputFilter) -> Self {
        self.entries.push(Entry::Collection {
            name: name.to_string(),
            required: false,
            inner,
        });
        self
    }

    /// Add a required array field
    pub fn required_collection(mut self, name: &str, inner: InputFilter) -> Self {
        self.entries.push(Entry::Collection {
            name: name.to_string(),
            required: true,
            inner,
        });
        self
    }

    /// Validate a payload.
    ///
    /// Returns the accumulated error map; database errors from the
    /// existence rules propagate as `Err`. Boxed because collection and
    /// object entries recurse into their inner filters.
    pub fn validate<'a>(
        &'a self,
        payload: &'a Value,
        pool: &'a SqlitePool,
        method: Method,
    ) -> Pin<Box<dyn Future<Output = Result<ValidationResult>> + Send + 'a>> {
        Box::pin(async move {
            let mut result = ValidationResult::new();

            let object = match payload.as_object() {
                Some(object) => object,
                None => {
                    result.add_error("", "object", "The payload must be a JSON object");
                    return Ok(result);
                }
            };

            for entry in &self.entries {
                match entry {
                    Entry::Field(field) => {
                        validate_field(field, object, pool, method, &mut result).await?;
                    }
                    Entry::Object {
                        name,
                        required,
                        inner,
                    } => {
                        let value = object.get(name.as_str());
                        match value {
                            None | Some(Value::Null) => {
                                if *required {
                                    result.add_error(name, "required", "Value is required");
                                }
                            }
                            Some(value) => {
                                let nested = inner.validate(value, pool, method).await?;
                                if !nested.is_valid() {
                                    result.add_nested(name, nested.into_value());
                                }
                            }
                        }
                    }
                    Entry::Collection {
                        name,
                        required,
                        inner,
                    } => {
                        let value = object.get(name.as_str());
                        match value {
                            None | Some(Value::Null) => {
                                if *required {
                                    result.add_error(name, "required", "Value is required");
                                }
                            }
                            Some(Value::Array(elements)) => {
                                let mut indexed = Map::new();
                                for (i, element) in elements.iter().enumerate() {
                                    let nested = inner.validate(element, pool, method).await?;
                                    if !nested.is_valid() {
                                        indexed.insert(i.to_string(), nested.into_value());
                                    }
                                }
                                if !indexed.is_empty() {
                                    result.add_nested(name, Value::Object(indexed));
                                }
                            }
                            Some(_) => {
                                result.add_error(name, "array", "The value must be an array");
                            }
                        }
                    }
                }
            }

            Ok(result)
        })
    }
}

async fn validate_field(
    field: &Field,
    object: &Map<String, Value>,
    pool: &SqlitePool,
    method: Method,
    result: &mut ValidationResult,
) -> Result<()> {
    let value = object.get(field.name.as_str());

    match value {
        None | Some(Value::Null) => {
            if field.required {
                result.add_error(&field.name, "required", "Value is required");
            }
        }
        Some(value) => {
            for rule in field.rules_for(method) {
                if let Some(message) = rule.check(value, pool).await? {
                    result.add_error(&field.name, rule.name(), message);
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use serde_json::json;
    use uuid::Uuid;

    async fn test_pool() -> SqlitePool {
        let pool = create_test_pool().await.expect("Failed to create pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        pool
    }

    fn sample_filter() -> InputFilter {
        InputFilter::new()
            .field(Field::required("id").rule(Rule::Uuid))
            .field(Field::required("name").rule(Rule::StringLength {
                min: Some(2),
                max: Some(10),
            }))
            .field(Field::optional("note").rule(Rule::StringLength {
                min: None,
                max: Some(5),
            }))
    }

    #[tokio::test]
    async fn test_valid_payload_passes() {
        let pool = test_pool().await;
        let payload = json!({
            "id": Uuid::new_v4().to_string(),
            "name": "hello",
        });

        let result = sample_filter()
            .validate(&payload, &pool, Method::Create)
            .await
            .unwrap();
        assert!(result.is_valid());
    }

    #[tokio::test]
    async fn test_missing_required_field() {
        let pool = test_pool().await;
        let payload = json!({ "name": "hello" });

        let result = sample_filter()
            .validate(&payload, &pool, Method::Create)
            .await
            .unwrap();
        assert!(!result.is_valid());
        assert!(result.errors().get("id").unwrap().get("required").is_some());
    }

    #[tokio::test]
    async fn test_null_required_field_fails() {
        let pool = test_pool().await;
        let payload = json!({
            "id": Value::Null,
            "name": "hello",
        });

        let result = sample_filter()
            .validate(&payload, &pool, Method::Create)
            .await
            .unwrap();
        assert!(!result.is_valid());
    }

    #[tokio::test]
    async fn test_absent_optional_field_passes() {
        let pool = test_pool().await;
        let payload = json!({
            "id": Uuid::new_v4().to_string(),
            "name": "hello",
        });

        let result = sample_filter()
            .validate(&payload, &pool, Method::Create)
            .await
            .unwrap();
        assert!(result.is_valid());
    }

    #[tokio::test]
    async fn test_present_optional_field_is_checked() {
        let pool = test_pool().await;
        let payload = json!({
            "id": Uuid::new_v4().to_string(),
            "name": "hello",
            "note": "too long for the rule",
        });

        let result = sample_filter()
            .validate(&payload, &pool, Method::Create)
            .await
            .unwrap();
        assert!(!result.is_valid());
        assert!(result.errors().contains_key("note"));
    }

    #[tokio::test]
    async fn test_non_object_payload() {
        let pool = test_pool().await;
        let payload = json!([1, 2, 3]);

        let result = sample_filter()
            .validate(&payload, &pool, Method::Create)
            .await
            .unwrap();
        assert!(!result.is_valid());
    }

    #[tokio::test]
    async fn test_method_conditional_rules() {
        let pool = test_pool().await;

        let filter = || {
            InputFilter::new().field(
                Field::required("id")
                    .rule(Rule::Uuid)
                    .on_create(Rule::NoRecordExists {
                        table: "roles",
                        column: "id",
                    })
                    .on_update(Rule::RecordExists {
                        table: "roles",
                        column: "id",
                    }),
            )
        };

        // Seeded admin role id exists
        let payload = json!({ "id": "00000000-0000-0000-0000-000000000001" });

        let create = filter()
            .validate(&payload, &pool, Method::Create)
            .await
            .unwrap();
        assert!(!create.is_valid(), "create must reject an existing id");

        let update = filter()
            .validate(&payload, &pool, Method::Update)
            .await
            .unwrap();
        assert!(update.is_valid(), "update must accept an existing id");

        let fresh = json!({ "id": Uuid::new_v4().to_string() });
        let create = filter()
            .validate(&fresh, &pool, Method::Create)
            .await
            .unwrap();
        assert!(create.is_valid(), "create must accept a fresh id");

        let update = filter()
            .validate(&fresh, &pool, Method::Update)
            .await
            .unwrap();
        assert!(!update.is_valid(), "update must reject an unknown id");
    }

    #[tokio::test]
    async fn test_object_field() {
        let pool = test_pool().await;

        let filter = InputFilter::new().object(
            "author_id",
            InputFilter::new().field(Field::required("id").rule(Rule::Uuid)),
        );

        let ok = json!({ "author_id": { "id": Uuid::new_v4().to_string() } });
        let result = filter.validate(&ok, &pool, Method::Create).await.unwrap();
        assert!(result.is_valid());

        let bad = json!({ "author_id": { "id": "nope" } });
        let result = filter.validate(&bad, &pool, Method::Create).await.unwrap();
        assert!(!result.is_valid());
        let nested = result.errors().get("author_id").unwrap();
        assert!(nested.get("id").is_some());

        let missing = json!({});
        let result = filter
            .validate(&missing, &pool, Method::Create)
            .await
            .unwrap();
        assert!(!result.is_valid());
    }

    #[tokio::test]
    async fn test_optional_object_field() {
        let pool = test_pool().await;

        let filter = InputFilter::new().optional_object(
            "featured_image_id",
            InputFilter::new().field(Field::optional("id").rule(Rule::Uuid)),
        );

        let absent = json!({});
        assert!(filter
            .validate(&absent, &pool, Method::Create)
            .await
            .unwrap()
            .is_valid());

        let null = json!({ "featured_image_id": Value::Null });
        assert!(filter
            .validate(&null, &pool, Method::Create)
            .await
            .unwrap()
            .is_valid());
    }

    #[tokio::test]
    async fn test_collection_errors_keyed_by_index() {
        let pool = test_pool().await;

        let filter = InputFilter::new().collection(
            "categories",
            InputFilter::new().field(Field::required("id").rule(Rule::Uuid)),
        );

        let payload = json!({
            "categories": [
                { "id": Uuid::new_v4().to_string() },
                { "id": "broken" },
                { "id": Uuid::new_v4().to_string() },
            ]
        });

        let result = filter
            .validate(&payload, &pool, Method::Create)
            .await
            .unwrap();
        assert!(!result.is_valid());

        let nested = result.errors().get("categories").unwrap();
        assert!(nested.get("1").is_some(), "only index 1 should fail");
        assert!(nested.get("0").is_none());
        assert!(nested.get("2").is_none());
    }

    #[tokio::test]
    async fn test_collection_rejects_non_array() {
        let pool = test_pool().await;

        let filter = InputFilter::new().collection(
            "tags",
            InputFilter::new().field(Field::required("id").rule(Rule::Uuid)),
        );

        let payload = json!({ "tags": "oops" });
        let result = filter
            .validate(&payload, &pool, Method::Create)
            .await
            .unwrap();
        assert!(!result.is_valid());
    }

    #[tokio::test]
    async fn test_empty_collection_passes() {
        let pool = test_pool().await;

        let filter = InputFilter::new().collection(
            "tags",
            InputFilter::new().field(Field::required("id").rule(Rule::Uuid)),
        );

        let payload = json!({ "tags": [] });
        let result = filter
            .validate(&payload, &pool, Method::Create)
            .await
            .unwrap();
        assert!(result.is_valid());
    }
}
