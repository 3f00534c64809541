//! User filters
//!
//! The save filter carries a method-conditional uniqueness rule on the
//! username: creates must not reuse an existing one. The password filter
//! covers the admin password-reset endpoint.

use super::{id_field, InputFilter};
use crate::validation::{Field, Rule};

/// Filter for user create and update payloads
pub fn save_filter() -> InputFilter {
    InputFilter::new()
        .field(id_field("users"))
        .field(
            Field::required("username")
                .rule(Rule::StringLength {
                    min: Some(3),
                    max: Some(60),
                })
                .on_create(Rule::NoRecordExists {
                    table: "users",
                    column: "username",
                }),
        )
        .field(
            Field::required("email")
                .rule(Rule::EmailAddress)
                .rule(Rule::StringLength {
                    min: None,
                    max: Some(255),
                }),
        )
        .field(Field::optional("first_name").rule(Rule::StringLength {
            min: None,
            max: Some(120),
        }))
        .field(Field::optional("last_name").rule(Rule::StringLength {
            min: None,
            max: Some(120),
        }))
        .field(Field::optional("active").rule(Rule::Boolean))
        .collection(
            "roles",
            InputFilter::new().field(
                Field::required("id")
                    .rule(Rule::Uuid)
                    .rule(Rule::RecordExists {
                        table: "roles",
                        column: "id",
                    }),
            ),
        )
}

/// Filter for the admin password-save payload
pub fn password_filter() -> InputFilter {
    InputFilter::new()
        .field(
            Field::required("id").rule(Rule::Uuid).rule(Rule::RecordExists {
                table: "users",
                column: "id",
            }),
        )
        .field(Field::required("password").rule(Rule::StringLength {
            min: Some(8),
            max: Some(64),
        }))
}

/// Filter for user delete payloads
pub fn delete_filter() -> InputFilter {
    super::delete_filter("users")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use crate::validation::Method;
    use serde_json::json;
    use sqlx::SqlitePool;
    use uuid::Uuid;

    async fn test_pool() -> SqlitePool {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        pool
    }

    async fn insert_user(pool: &SqlitePool, username: &str) -> Uuid {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO users (id, username, email, password_hash) VALUES (?, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(username)
        .bind(format!("{}@example.com", username))
        .bind("hash")
        .execute(pool)
        .await
        .unwrap();
        id
    }

    #[tokio::test]
    async fn test_create_rejects_taken_username() {
        let pool = test_pool().await;
        insert_user(&pool, "alice").await;

        let payload = json!({
            "id": Uuid::new_v4().to_string(),
            "username": "alice",
            "email": "new@example.com",
        });

        let result = save_filter()
            .validate(&payload, &pool, Method::Create)
            .await
            .unwrap();
        assert!(!result.is_valid());
        assert!(result
            .errors()
            .get("username")
            .unwrap()
            .get("no_record_exists")
            .is_some());
    }

    #[tokio::test]
    async fn test_update_allows_existing_username() {
        let pool = test_pool().await;
        let id = insert_user(&pool, "alice").await;

        let payload = json!({
            "id": id.to_string(),
            "username": "alice",
            "email": "alice@example.com",
        });

        let result = save_filter()
            .validate(&payload, &pool, Method::Update)
            .await
            .unwrap();
        assert!(result.is_valid(), "errors: {:?}", result.errors());
    }

    #[tokio::test]
    async fn test_roles_collection_requires_known_ids() {
        let pool = test_pool().await;

        let payload = json!({
            "id": Uuid::new_v4().to_string(),
            "username": "carol",
            "email": "carol@example.com",
            "roles": [
                { "id": "00000000-0000-0000-0000-000000000001" },
                { "id": Uuid::new_v4().to_string() },
            ],
        });

        let result = save_filter()
            .validate(&payload, &pool, Method::Create)
            .await
            .unwrap();
        assert!(!result.is_valid());
        let nested = result.errors().get("roles").unwrap();
        assert!(nested.get("0").is_none(), "seeded admin role must pass");
        assert!(nested.get("1").is_some());
    }

    #[tokio::test]
    async fn test_password_filter_bounds() {
        let pool = test_pool().await;
        let id = insert_user(&pool, "dave").await;

        let short = json!({ "id": id.to_string(), "password": "short" });
        let result = password_filter()
            .validate(&short, &pool, Method::Update)
            .await
            .unwrap();
        assert!(!result.is_valid());

        let ok = json!({ "id": id.to_string(), "password": "long enough" });
        let result = password_filter()
            .validate(&ok, &pool, Method::Update)
            .await
            .unwrap();
        assert!(result.is_valid());
    }
}
