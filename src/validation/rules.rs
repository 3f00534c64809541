//! Validation rules
//!
//! Scalar and database-backed rules applied to individual JSON values.
//! Each rule reports at most one error, keyed by a stable rule name the
//! client can match on.

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use sqlx::SqlitePool;
use serde_json::Value;
use std::net::IpAddr;
use uuid::Uuid;

// Pragmatic e-mail shape check; full RFC 5321 parsing is not the goal.
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid email regex")
});

/// A single validation rule.
#[derive(Debug, Clone)]
pub enum Rule {
    /// Value must be a string containing a UUID
    Uuid,
    /// Value must be a string within the given length bounds
    StringLength {
        min: Option<usize>,
        max: Option<usize>,
    },
    /// Value must be one of the listed strings
    InArray(&'static [&'static str]),
    /// Value must be a string parsing under the given chrono format
    Date(&'static str),
    /// Value must look like an e-mail address
    EmailAddress,
    /// Value must parse as an IPv4 or IPv6 address
    IpAddress,
    /// Value must be a JSON boolean
    Boolean,
    /// Value must be an integer within the inclusive range
    IntegerRange { min: i64, max: i64 },
    /// A row with this value must exist in table.column
    RecordExists {
        table: &'static str,
        column: &'static str,
    },
    /// No row with this value may exist in table.column
    NoRecordExists {
        table: &'static str,
        column: &'static str,
    },
}

impl Rule {
    /// Stable rule name used as the error key
    pub fn name(&self) -> &'static str {
        match self {
            Rule::Uuid => "uuid",
            Rule::StringLength { .. } => "string_length",
            Rule::InArray(_) => "in_array",
            Rule::Date(_) => "date",
            Rule::EmailAddress => "email_address",
            Rule::IpAddress => "ip_address",
            Rule::Boolean => "boolean",
            Rule::IntegerRange { .. } => "integer_range",
            Rule::RecordExists { .. } => "record_exists",
            Rule::NoRecordExists { .. } => "no_record_exists",
        }
    }

    /// Evaluate the rule against a value.
    ///
    /// Returns `Ok(None)` on pass, `Ok(Some(message))` on failure. The
    /// database rules query the pool; everything else is pure.
    pub async fn check(&self, value: &Value, pool: &SqlitePool) -> Result<Option<String>> {
        let failure = match self {
            Rule::Uuid => match value.as_str() {
                Some(s) if Uuid::parse_str(s).is_ok() => None,
                _ => Some("The value is not a valid UUID".to_string()),
            },
            Rule::StringLength { min, max } => match value.as_str() {
                Some(s) => {
                    let len = s.chars().count();
                    if let Some(min) = min {
                        if len < *min {
                            return Ok(Some(format!(
                                "The value is shorter than {} characters",
                                min
                            )));
                        }
                    }
                    if let Some(max) = max {
                        if len > *max {
                            return Ok(Some(format!(
                                "The value is longer than {} characters",
                                max
                            )));
                        }
                    }
                    None
                }
                None => Some("The value must be a string".to_string()),
            },
            Rule::InArray(allowed) => match value.as_str() {
                Some(s) if allowed.contains(&s) => None,
                _ => Some(format!(
                    "The value must be one of: {}",
                    allowed.join(", ")
                )),
            },
            Rule::Date(format) => match value.as_str() {
                Some(s) if NaiveDateTime::parse_from_str(s, format).is_ok() => None,
                _ => Some(format!("The value does not match the format {}", format)),
            },
            Rule::EmailAddress => match value.as_str() {
                Some(s) if EMAIL_RE.is_match(s) => None,
                _ => Some("The value is not a valid email address".to_string()),
            },
            Rule::IpAddress => match value.as_str() {
                Some(s) if s.parse::<IpAddr>().is_ok() => None,
                _ => Some("The value is not a valid IP address".to_string()),
            },
            Rule::Boolean => {
                if value.is_boolean() {
                    None
                } else {
                    Some("The value must be a boolean".to_string())
                }
            }
            Rule::IntegerRange { min, max } => match value.as_i64() {
                Some(n) if n >= *min && n <= *max => None,
                _ => Some(format!("The value must be an integer between {} and {}", min, max)),
            },
            Rule::RecordExists { table, column } => {
                if record_exists(pool, table, column, value).await? {
                    None
                } else {
                    Some("No record matching the value was found".to_string())
                }
            }
            Rule::NoRecordExists { table, column } => {
                if record_exists(pool, table, column, value).await? {
                    Some("A record matching the value already exists".to_string())
                } else {
                    None
                }
            }
        };

        Ok(failure)
    }
}

/// Check whether a row exists with the given value in table.column.
///
/// Table and column names come from the filter definitions in this
/// crate, never from request input.
async fn record_exists(
    pool: &SqlitePool,
    table: &str,
    column: &str,
    value: &Value,
) -> Result<bool> {
    let text = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };

    let row: (i64,) = sqlx::query_as(&format!(
        "SELECT COUNT(*) FROM {} WHERE {} = ?",
        table, column
    ))
    .bind(text)
    .fetch_one(pool)
    .await
    .with_context(|| format!("Existence check failed for {}.{}", table, column))?;

    Ok(row.0 > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use serde_json::json;

    async fn test_pool() -> SqlitePool {
        let pool = create_test_pool().await.expect("Failed to create pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        pool
    }

    #[tokio::test]
    async fn test_uuid_rule() {
        let pool = test_pool().await;

        let ok = json!(Uuid::new_v4().to_string());
        assert!(Rule::Uuid.check(&ok, &pool).await.unwrap().is_none());

        let bad = json!("not-a-uuid");
        assert!(Rule::Uuid.check(&bad, &pool).await.unwrap().is_some());

        let wrong_type = json!(42);
        assert!(Rule::Uuid.check(&wrong_type, &pool).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_string_length_rule() {
        let pool = test_pool().await;
        let rule = Rule::StringLength {
            min: Some(2),
            max: Some(5),
        };

        assert!(rule.check(&json!("abc"), &pool).await.unwrap().is_none());
        assert!(rule.check(&json!("a"), &pool).await.unwrap().is_some());
        assert!(rule.check(&json!("abcdef"), &pool).await.unwrap().is_some());
        // Bounds are inclusive
        assert!(rule.check(&json!("ab"), &pool).await.unwrap().is_none());
        assert!(rule.check(&json!("abcde"), &pool).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_string_length_counts_chars_not_bytes() {
        let pool = test_pool().await;
        let rule = Rule::StringLength {
            min: None,
            max: Some(3),
        };

        assert!(rule.check(&json!("äöü"), &pool).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_in_array_rule() {
        let pool = test_pool().await;
        let rule = Rule::InArray(&["draft", "published"]);

        assert!(rule.check(&json!("draft"), &pool).await.unwrap().is_none());
        assert!(rule.check(&json!("trash"), &pool).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_date_rule() {
        let pool = test_pool().await;
        let rule = Rule::Date("%Y-%m-%d %H:%M:%S");

        assert!(rule
            .check(&json!("2024-06-01 12:30:00"), &pool)
            .await
            .unwrap()
            .is_none());
        assert!(rule
            .check(&json!("2024-06-01"), &pool)
            .await
            .unwrap()
            .is_some());
        assert!(rule
            .check(&json!("01/06/2024 12:30:00"), &pool)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_email_rule() {
        let pool = test_pool().await;

        assert!(Rule::EmailAddress
            .check(&json!("user@example.com"), &pool)
            .await
            .unwrap()
            .is_none());
        assert!(Rule::EmailAddress
            .check(&json!("not-an-email"), &pool)
            .await
            .unwrap()
            .is_some());
        assert!(Rule::EmailAddress
            .check(&json!("user@nodot"), &pool)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_ip_address_rule() {
        let pool = test_pool().await;

        assert!(Rule::IpAddress
            .check(&json!("192.168.0.1"), &pool)
            .await
            .unwrap()
            .is_none());
        assert!(Rule::IpAddress
            .check(&json!("::1"), &pool)
            .await
            .unwrap()
            .is_none());
        assert!(Rule::IpAddress
            .check(&json!("999.0.0.1"), &pool)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_integer_range_rule() {
        let pool = test_pool().await;
        let rule = Rule::IntegerRange { min: 1, max: 32 };

        assert!(rule.check(&json!(1), &pool).await.unwrap().is_none());
        assert!(rule.check(&json!(32), &pool).await.unwrap().is_none());
        assert!(rule.check(&json!(0), &pool).await.unwrap().is_some());
        assert!(rule.check(&json!(33), &pool).await.unwrap().is_some());
        assert!(rule.check(&json!("5"), &pool).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_record_exists_rules() {
        let pool = test_pool().await;

        // Seeded admin role
        let admin_id = json!("00000000-0000-0000-0000-000000000001");
        let missing_id = json!(Uuid::new_v4().to_string());

        let exists = Rule::RecordExists {
            table: "roles",
            column: "id",
        };
        assert!(exists.check(&admin_id, &pool).await.unwrap().is_none());
        assert!(exists.check(&missing_id, &pool).await.unwrap().is_some());

        let not_exists = Rule::NoRecordExists {
            table: "roles",
            column: "id",
        };
        assert!(not_exists.check(&admin_id, &pool).await.unwrap().is_some());
        assert!(not_exists.check(&missing_id, &pool).await.unwrap().is_none());
    }
}
