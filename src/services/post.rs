//! Post service
//!
//! Save payloads go through three steps: the category and tag arrays
//! are normalized into `{id: ...}` objects, the payload is validated,
//! and tags named in the payload but missing from the database are
//! created before the link tables are rewritten.

use crate::db::repositories::{PostRepository, TagRepository};
use crate::models::{Category, ListParams, Paginated, Post, PublishStatus, Tag};
use crate::validation::filters::posts::{normalize_categories, normalize_tags};
use crate::validation::{filters, Method};
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::SqlitePool;
use std::sync::Arc;
use uuid::Uuid;

/// Error types for post service operations
#[derive(Debug, thiserror::Error)]
pub enum PostServiceError {
    #[error("Post not found: {0}")]
    NotFound(Uuid),

    #[error("Validation failed")]
    Validation(Value),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

#[derive(Deserialize)]
struct IdRef {
    id: Uuid,
}

#[derive(Deserialize)]
struct OptionalIdRef {
    id: Option<Uuid>,
}

#[derive(Deserialize)]
struct TagRef {
    id: Uuid,
    name: Option<String>,
}

#[derive(Deserialize)]
struct SavePost {
    id: Uuid,
    author_id: IdRef,
    title: String,
    permalink: String,
    description: Option<String>,
    content_json: String,
    content_html: String,
    publish_status: PublishStatus,
    published_at: Option<String>,
    featured_image_id: Option<OptionalIdRef>,
    categories: Option<Vec<IdRef>>,
    tags: Option<Vec<TagRef>>,
}

/// A post together with its linked categories and tags.
#[derive(Debug, Clone, Serialize)]
pub struct PostWithLinks {
    #[serde(flatten)]
    pub post: Post,
    pub categories: Vec<Category>,
    pub tags: Vec<Tag>,
}

/// Post service
pub struct PostService {
    repo: Arc<dyn PostRepository>,
    tags: Arc<dyn TagRepository>,
    pool: SqlitePool,
}

impl PostService {
    pub fn new(
        repo: Arc<dyn PostRepository>,
        tags: Arc<dyn TagRepository>,
        pool: SqlitePool,
    ) -> Self {
        Self { repo, tags, pool }
    }

    /// Normalize, validate and persist a post payload.
    pub async fn save(
        &self,
        payload: &Value,
        method: Method,
    ) -> Result<PostWithLinks, PostServiceError> {
        let payload = normalize_payload(payload);

        let result = filters::posts::save_filter()
            .validate(&payload, &self.pool, method)
            .await?;
        if !result.is_valid() {
            return Err(PostServiceError::Validation(result.into_value()));
        }

        let input: SavePost = serde_json::from_value(payload)
            .context("Failed to deserialize post payload")?;

        let published_at = parse_published_at(input.published_at.as_deref())?;
        let featured_image_id = input.featured_image_id.and_then(|f| f.id);

        let post = match method {
            Method::Create => {
                let mut post = Post::new(
                    input.id,
                    input.author_id.id,
                    input.title,
                    input.permalink,
                    input.content_json,
                    input.content_html,
                );
                post.description = input.description;
                post.publish_status = input.publish_status;
                post.featured_image_id = featured_image_id;
                post.published_at = published_at;
                self.repo
                    .create(&post)
                    .await
                    .context("Failed to create post")?
            }
            Method::Update => {
                let mut post = self
                    .repo
                    .get_by_id(input.id)
                    .await
                    .context("Failed to get post")?
                    .ok_or(PostServiceError::NotFound(input.id))?;
                post.title = input.title;
                post.permalink = input.permalink;
                post.description = input.description;
                post.content_json = input.content_json;
                post.content_html = input.content_html;
                post.publish_status = input.publish_status;
                post.featured_image_id = featured_image_id;
                post.published_at = published_at;
                post.updated_at = Utc::now();
                self.repo
                    .update(&post)
                    .await
                    .context("Failed to update post")?
            }
        };

        if let Some(categories) = input.categories {
            let category_ids: Vec<Uuid> = categories.into_iter().map(|c| c.id).collect();
            self.repo
                .set_categories(post.id, &category_ids)
                .await
                .context("Failed to set post categories")?;
        }

        if let Some(tags) = input.tags {
            let tag_ids = self.ensure_tags(tags).await?;
            self.repo
                .set_tags(post.id, &tag_ids)
                .await
                .context("Failed to set post tags")?;
        }

        self.get_with_links(post.id)
            .await?
            .ok_or(PostServiceError::NotFound(post.id))
    }

    /// Create tag rows for payload elements that carry a name but are
    /// not in the database yet (the normalized form of raw tag names).
    async fn ensure_tags(&self, refs: Vec<TagRef>) -> Result<Vec<Uuid>, PostServiceError> {
        let mut ids = Vec::with_capacity(refs.len());

        for tag_ref in refs {
            let existing = self
                .tags
                .get_by_id(tag_ref.id)
                .await
                .context("Failed to look up tag")?;

            if existing.is_none() {
                if let Some(name) = tag_ref.name {
                    // Reuse a tag of the same name rather than violating
                    // the unique constraint
                    match self
                        .tags
                        .get_by_name(&name)
                        .await
                        .context("Failed to look up tag by name")?
                    {
                        Some(tag) => {
                            ids.push(tag.id);
                            continue;
                        }
                        None => {
                            self.tags
                                .create(&Tag::new(tag_ref.id, name))
                                .await
                                .context("Failed to create tag")?;
                        }
                    }
                }
            }

            ids.push(tag_ref.id);
        }

        Ok(ids)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Post>, PostServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get post by ID")
            .map_err(Into::into)
    }

    /// Fetch a post together with its categories and tags.
    pub async fn get_with_links(
        &self,
        id: Uuid,
    ) -> Result<Option<PostWithLinks>, PostServiceError> {
        let post = match self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get post by ID")?
        {
            Some(post) => post,
            None => return Ok(None),
        };

        let categories = self
            .repo
            .get_categories(id)
            .await
            .context("Failed to get post categories")?;
        let tags = self
            .repo
            .get_tags(id)
            .await
            .context("Failed to get post tags")?;

        Ok(Some(PostWithLinks {
            post,
            categories,
            tags,
        }))
    }

    pub async fn list(
        &self,
        params: &ListParams,
        status: Option<PublishStatus>,
    ) -> Result<Paginated<Post>, PostServiceError> {
        self.repo
            .list(params, status)
            .await
            .context("Failed to list posts")
            .map_err(Into::into)
    }

    /// Validate a delete payload and remove the post.
    pub async fn delete(&self, payload: &Value) -> Result<(), PostServiceError> {
        let result = filters::posts::delete_filter()
            .validate(payload, &self.pool, Method::Update)
            .await?;
        if !result.is_valid() {
            return Err(PostServiceError::Validation(result.into_value()));
        }

        let id = super::tag::payload_id(payload)?;
        if !self.repo.delete(id).await.context("Failed to delete post")? {
            return Err(PostServiceError::NotFound(id));
        }

        Ok(())
    }
}

/// Rewrite loose category and tag shapes into `{id: ...}` objects.
fn normalize_payload(payload: &Value) -> Value {
    let mut payload = payload.clone();

    if let Some(object) = payload.as_object_mut() {
        if let Some(Value::Array(categories)) = object.get("categories") {
            let normalized = normalize_categories(categories);
            object.insert("categories".to_string(), Value::Array(normalized));
        }
        if let Some(Value::Array(tags)) = object.get("tags") {
            let normalized = normalize_tags(tags);
            object.insert("tags".to_string(), Value::Array(normalized));
        }
    }

    payload
}

fn parse_published_at(raw: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    match raw {
        Some(s) => {
            let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                .context("Invalid published_at timestamp")?;
            Ok(Some(naive.and_utc()))
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxPostRepository, SqlxTagRepository};
    use crate::db::{create_test_pool, migrations};
    use serde_json::json;

    async fn setup() -> (SqlitePool, PostService, Uuid) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let author_id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO users (id, username, email, password_hash) VALUES (?, ?, ?, ?)",
        )
        .bind(author_id.to_string())
        .bind("author")
        .bind("author@example.com")
        .bind("hash")
        .execute(&pool)
        .await
        .expect("Failed to create author");

        let service = PostService::new(
            SqlxPostRepository::boxed(pool.clone()),
            SqlxTagRepository::boxed(pool.clone()),
            pool.clone(),
        );

        (pool, service, author_id)
    }

    fn base_payload(id: Uuid, author_id: Uuid, permalink: &str) -> Value {
        json!({
            "id": id.to_string(),
            "author_id": { "id": author_id.to_string() },
            "title": "Release notes",
            "permalink": permalink,
            "content_json": "{}",
            "content_html": "<p>notes</p>",
            "publish_status": "draft",
        })
    }

    #[tokio::test]
    async fn test_save_creates_post() {
        let (_pool, service, author_id) = setup().await;
        let id = Uuid::new_v4();

        let saved = service
            .save(&base_payload(id, author_id, "release-notes"), Method::Create)
            .await
            .expect("Failed to create post");

        assert_eq!(saved.post.id, id);
        assert_eq!(saved.post.publish_status, PublishStatus::Draft);
        assert!(saved.categories.is_empty());
        assert!(saved.tags.is_empty());
    }

    #[tokio::test]
    async fn test_save_auto_creates_named_tags() {
        let (_pool, service, author_id) = setup().await;

        let mut payload = base_payload(Uuid::new_v4(), author_id, "tagged");
        // Raw tag names, no ids: normalization assigns fresh UUIDs and
        // the service creates the rows
        payload["tags"] = json!(["rust", "async"]);

        let saved = service
            .save(&payload, Method::Create)
            .await
            .expect("Failed to create post");

        let mut names: Vec<&str> = saved.tags.iter().map(|t| t.name.as_str()).collect();
        names.sort_unstable();
        assert_eq!(names, vec!["async", "rust"]);
    }

    #[tokio::test]
    async fn test_save_reuses_existing_tag_by_name() {
        let (pool, service, author_id) = setup().await;

        let existing = Tag::new(Uuid::new_v4(), "rust".to_string());
        SqlxTagRepository::new(pool)
            .create(&existing)
            .await
            .unwrap();

        let mut payload = base_payload(Uuid::new_v4(), author_id, "reuse");
        payload["tags"] = json!(["rust"]);

        let saved = service.save(&payload, Method::Create).await.unwrap();

        assert_eq!(saved.tags.len(), 1);
        assert_eq!(saved.tags[0].id, existing.id);
    }

    #[tokio::test]
    async fn test_save_normalizes_category_id_strings() {
        let (pool, service, author_id) = setup().await;

        let category_id = Uuid::new_v4();
        sqlx::query("INSERT INTO categories (id, name) VALUES (?, ?)")
            .bind(category_id.to_string())
            .bind("news")
            .execute(&pool)
            .await
            .unwrap();

        let mut payload = base_payload(Uuid::new_v4(), author_id, "categorized");
        payload["categories"] = json!([category_id.to_string()]);

        let saved = service.save(&payload, Method::Create).await.unwrap();

        assert_eq!(saved.categories.len(), 1);
        assert_eq!(saved.categories[0].id, category_id);
    }

    #[tokio::test]
    async fn test_update_replaces_links() {
        let (_pool, service, author_id) = setup().await;
        let id = Uuid::new_v4();

        let mut payload = base_payload(id, author_id, "evolving");
        payload["tags"] = json!(["first"]);
        service.save(&payload, Method::Create).await.unwrap();

        payload["tags"] = json!(["second"]);
        payload["title"] = json!("Updated title");
        let saved = service.save(&payload, Method::Update).await.unwrap();

        assert_eq!(saved.post.title, "Updated title");
        assert_eq!(saved.tags.len(), 1);
        assert_eq!(saved.tags[0].name, "second");
    }

    #[tokio::test]
    async fn test_save_with_published_at() {
        let (_pool, service, author_id) = setup().await;

        let mut payload = base_payload(Uuid::new_v4(), author_id, "scheduled");
        payload["publish_status"] = json!("published");
        payload["published_at"] = json!("2024-06-01 09:15:00");

        let saved = service.save(&payload, Method::Create).await.unwrap();

        assert_eq!(saved.post.publish_status, PublishStatus::Published);
        let published_at = saved.post.published_at.unwrap();
        assert_eq!(published_at.to_rfc3339(), "2024-06-01T09:15:00+00:00");
    }

    #[tokio::test]
    async fn test_save_rejects_missing_author() {
        let (_pool, service, _author_id) = setup().await;

        let payload = json!({
            "id": Uuid::new_v4().to_string(),
            "title": "No author",
            "permalink": "no-author",
            "content_json": "{}",
            "content_html": "<p></p>",
            "publish_status": "draft",
        });

        let result = service.save(&payload, Method::Create).await;
        match result {
            Err(PostServiceError::Validation(errors)) => {
                assert!(errors.get("author_id").is_some());
            }
            other => panic!("Expected validation error, got {:?}", other.is_ok()),
        }
    }

    #[tokio::test]
    async fn test_delete_post() {
        let (_pool, service, author_id) = setup().await;
        let id = Uuid::new_v4();

        service
            .save(&base_payload(id, author_id, "doomed"), Method::Create)
            .await
            .unwrap();
        service
            .delete(&json!({ "id": id.to_string() }))
            .await
            .expect("Failed to delete post");

        assert!(service.get_by_id(id).await.unwrap().is_none());
    }
}
