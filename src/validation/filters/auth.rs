//! Authentication filters

use super::InputFilter;
use crate::validation::{Field, Rule};

/// Filter for login payloads
pub fn token_filter() -> InputFilter {
    InputFilter::new()
        .field(Field::required("username").rule(Rule::StringLength {
            min: Some(1),
            max: Some(160),
        }))
        .field(Field::required("password").rule(Rule::StringLength {
            min: Some(1),
            max: Some(64),
        }))
}

/// Filter for reset-password request payloads
pub fn reset_password_filter() -> InputFilter {
    InputFilter::new().field(Field::required("email").rule(Rule::EmailAddress))
}

/// Filter for change-password payloads (reset code flow)
pub fn change_password_filter() -> InputFilter {
    InputFilter::new()
        .field(Field::required("reset_code").rule(Rule::StringLength {
            min: Some(6),
            max: Some(64),
        }))
        .field(Field::required("new_password").rule(Rule::StringLength {
            min: Some(8),
            max: Some(64),
        }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use crate::validation::Method;
    use serde_json::json;
    use sqlx::SqlitePool;

    async fn test_pool() -> SqlitePool {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_token_filter_requires_credentials() {
        let pool = test_pool().await;

        let empty = json!({});
        let result = token_filter()
            .validate(&empty, &pool, Method::Create)
            .await
            .unwrap();
        assert!(!result.is_valid());
        assert!(result.errors().contains_key("username"));
        assert!(result.errors().contains_key("password"));

        let ok = json!({ "username": "alice", "password": "secret" });
        let result = token_filter()
            .validate(&ok, &pool, Method::Create)
            .await
            .unwrap();
        assert!(result.is_valid());
    }

    #[tokio::test]
    async fn test_reset_password_needs_email_shape() {
        let pool = test_pool().await;

        let bad = json!({ "email": "not-an-email" });
        let result = reset_password_filter()
            .validate(&bad, &pool, Method::Create)
            .await
            .unwrap();
        assert!(!result.is_valid());
    }

    #[tokio::test]
    async fn test_change_password_bounds() {
        let pool = test_pool().await;

        let bad = json!({ "reset_code": "123", "new_password": "short" });
        let result = change_password_filter()
            .validate(&bad, &pool, Method::Create)
            .await
            .unwrap();
        assert!(!result.is_valid());
        assert!(result.errors().contains_key("reset_code"));
        assert!(result.errors().contains_key("new_password"));

        let ok = json!({ "reset_code": "abc123", "new_password": "new password" });
        let result = change_password_filter()
            .validate(&ok, &pool, Method::Create)
            .await
            .unwrap();
        assert!(result.is_valid());
    }
}
