//! Category filters

use super::{id_field, InputFilter};
use crate::validation::{Field, Rule};

/// Filter for category create and update payloads
pub fn save_filter() -> InputFilter {
    InputFilter::new()
        .field(id_field("categories"))
        .field(Field::required("name").rule(Rule::StringLength {
            min: Some(2),
            max: Some(100),
        }))
}

/// Filter for category delete payloads
pub fn delete_filter() -> InputFilter {
    super::delete_filter("categories")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use crate::validation::Method;
    use serde_json::json;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_delete_requires_existing_row() {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();

        let payload = json!({ "id": Uuid::new_v4().to_string() });
        let result = delete_filter()
            .validate(&payload, &pool, Method::Update)
            .await
            .unwrap();
        assert!(!result.is_valid());

        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO categories (id, name, created_at) VALUES (?, ?, datetime('now'))")
            .bind(id.to_string())
            .bind("news")
            .execute(&pool)
            .await
            .unwrap();

        let payload = json!({ "id": id.to_string() });
        let result = delete_filter()
            .validate(&payload, &pool, Method::Update)
            .await
            .unwrap();
        assert!(result.is_valid());
    }
}
