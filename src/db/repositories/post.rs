//! Post repository
//!
//! Database operations for posts and their category/tag links.

use crate::models::{Category, ListParams, Paginated, Post, PublishStatus, Tag};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;
use uuid::Uuid;

/// Post repository trait
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Create a new post
    async fn create(&self, post: &Post) -> Result<Post>;

    /// Get post by ID
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Post>>;

    /// Get post by permalink
    async fn get_by_permalink(&self, permalink: &str) -> Result<Option<Post>>;

    /// List posts, newest first, optionally filtered by status
    async fn list(
        &self,
        params: &ListParams,
        status: Option<PublishStatus>,
    ) -> Result<Paginated<Post>>;

    /// Update a post
    async fn update(&self, post: &Post) -> Result<Post>;

    /// Delete a post
    async fn delete(&self, id: Uuid) -> Result<bool>;

    /// Replace a post's category links
    async fn set_categories(&self, post_id: Uuid, category_ids: &[Uuid]) -> Result<()>;

    /// Replace a post's tag links
    async fn set_tags(&self, post_id: Uuid, tag_ids: &[Uuid]) -> Result<()>;

    /// Get the categories linked to a post
    async fn get_categories(&self, post_id: Uuid) -> Result<Vec<Category>>;

    /// Get the tags linked to a post
    async fn get_tags(&self, post_id: Uuid) -> Result<Vec<Tag>>;
}

/// SQLx-based post repository implementation
pub struct SqlxPostRepository {
    pool: SqlitePool,
}

impl SqlxPostRepository {
    /// Create a new SQLx post repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: SqlitePool) -> Arc<dyn PostRepository> {
        Arc::new(Self::new(pool))
    }
}

const POST_COLUMNS: &str = "id, author_id, title, permalink, description, content_json, content_html, publish_status, featured_image_id, created_at, updated_at, published_at";

#[async_trait]
impl PostRepository for SqlxPostRepository {
    async fn create(&self, post: &Post) -> Result<Post> {
        sqlx::query(
            r#"
            INSERT INTO posts (id, author_id, title, permalink, description, content_json, content_html, publish_status, featured_image_id, created_at, updated_at, published_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(post.id.to_string())
        .bind(post.author_id.to_string())
        .bind(&post.title)
        .bind(&post.permalink)
        .bind(&post.description)
        .bind(&post.content_json)
        .bind(&post.content_html)
        .bind(post.publish_status.to_string())
        .bind(post.featured_image_id.map(|id| id.to_string()))
        .bind(post.created_at)
        .bind(post.updated_at)
        .bind(post.published_at)
        .execute(&self.pool)
        .await
        .context("Failed to create post")?;

        Ok(post.clone())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Post>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM posts WHERE id = ?",
            POST_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get post by ID")?;

        match row {
            Some(row) => Ok(Some(row_to_post(&row)?)),
            None => Ok(None),
        }
    }

    async fn get_by_permalink(&self, permalink: &str) -> Result<Option<Post>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM posts WHERE permalink = ?",
            POST_COLUMNS
        ))
        .bind(permalink)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get post by permalink")?;

        match row {
            Some(row) => Ok(Some(row_to_post(&row)?)),
            None => Ok(None),
        }
    }

    async fn list(
        &self,
        params: &ListParams,
        status: Option<PublishStatus>,
    ) -> Result<Paginated<Post>> {
        let (total, rows) = match status {
            Some(status) => {
                let total: (i64,) =
                    sqlx::query_as("SELECT COUNT(*) FROM posts WHERE publish_status = ?")
                        .bind(status.to_string())
                        .fetch_one(&self.pool)
                        .await
                        .context("Failed to count posts")?;

                let rows = sqlx::query(&format!(
                    "SELECT {} FROM posts WHERE publish_status = ? ORDER BY created_at DESC LIMIT ? OFFSET ?",
                    POST_COLUMNS
                ))
                .bind(status.to_string())
                .bind(params.limit())
                .bind(params.offset())
                .fetch_all(&self.pool)
                .await
                .context("Failed to list posts")?;

                (total, rows)
            }
            None => {
                let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM posts")
                    .fetch_one(&self.pool)
                    .await
                    .context("Failed to count posts")?;

                let rows = sqlx::query(&format!(
                    "SELECT {} FROM posts ORDER BY created_at DESC LIMIT ? OFFSET ?",
                    POST_COLUMNS
                ))
                .bind(params.limit())
                .bind(params.offset())
                .fetch_all(&self.pool)
                .await
                .context("Failed to list posts")?;

                (total, rows)
            }
        };

        let mut posts = Vec::new();
        for row in rows {
            posts.push(row_to_post(&row)?);
        }

        Ok(Paginated::new(posts, total.0, params))
    }

    async fn update(&self, post: &Post) -> Result<Post> {
        sqlx::query(
            r#"
            UPDATE posts
            SET title = ?, permalink = ?, description = ?, content_json = ?, content_html = ?,
                publish_status = ?, featured_image_id = ?, updated_at = ?, published_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&post.title)
        .bind(&post.permalink)
        .bind(&post.description)
        .bind(&post.content_json)
        .bind(&post.content_html)
        .bind(post.publish_status.to_string())
        .bind(post.featured_image_id.map(|id| id.to_string()))
        .bind(Utc::now())
        .bind(post.published_at)
        .bind(post.id.to_string())
        .execute(&self.pool)
        .await
        .context("Failed to update post")?;

        Ok(post.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        // post_categories and post_tags rows cascade
        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to delete post")?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_categories(&self, post_id: Uuid, category_ids: &[Uuid]) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        sqlx::query("DELETE FROM post_categories WHERE post_id = ?")
            .bind(post_id.to_string())
            .execute(&mut *tx)
            .await
            .context("Failed to clear post categories")?;

        for category_id in category_ids {
            sqlx::query(
                "INSERT OR IGNORE INTO post_categories (post_id, category_id) VALUES (?, ?)",
            )
            .bind(post_id.to_string())
            .bind(category_id.to_string())
            .execute(&mut *tx)
            .await
            .context("Failed to link category")?;
        }

        tx.commit()
            .await
            .context("Failed to commit category links")?;
        Ok(())
    }

    async fn set_tags(&self, post_id: Uuid, tag_ids: &[Uuid]) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        sqlx::query("DELETE FROM post_tags WHERE post_id = ?")
            .bind(post_id.to_string())
            .execute(&mut *tx)
            .await
            .context("Failed to clear post tags")?;

        for tag_id in tag_ids {
            sqlx::query("INSERT OR IGNORE INTO post_tags (post_id, tag_id) VALUES (?, ?)")
                .bind(post_id.to_string())
                .bind(tag_id.to_string())
                .execute(&mut *tx)
                .await
                .context("Failed to link tag")?;
        }

        tx.commit().await.context("Failed to commit tag links")?;
        Ok(())
    }

    async fn get_categories(&self, post_id: Uuid) -> Result<Vec<Category>> {
        let rows = sqlx::query(
            r#"
            SELECT c.id, c.name, c.created_at
            FROM categories c
            INNER JOIN post_categories pc ON c.id = pc.category_id
            WHERE pc.post_id = ?
            ORDER BY c.name
            "#,
        )
        .bind(post_id.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to get post categories")?;

        let mut categories = Vec::new();
        for row in rows {
            let id: String = row.get("id");
            categories.push(Category {
                id: Uuid::parse_str(&id).context("Invalid category id in database")?,
                name: row.get("name"),
                created_at: row.get("created_at"),
            });
        }

        Ok(categories)
    }

    async fn get_tags(&self, post_id: Uuid) -> Result<Vec<Tag>> {
        let rows = sqlx::query(
            r#"
            SELECT t.id, t.name, t.created_at
            FROM tags t
            INNER JOIN post_tags pt ON t.id = pt.tag_id
            WHERE pt.post_id = ?
            ORDER BY t.name
            "#,
        )
        .bind(post_id.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to get post tags")?;

        let mut tags = Vec::new();
        for row in rows {
            let id: String = row.get("id");
            tags.push(Tag {
                id: Uuid::parse_str(&id).context("Invalid tag id in database")?,
                name: row.get("name"),
                created_at: row.get("created_at"),
            });
        }

        Ok(tags)
    }
}

fn row_to_post(row: &sqlx::sqlite::SqliteRow) -> Result<Post> {
    let id: String = row.get("id");
    let author_id: String = row.get("author_id");
    let publish_status: String = row.get("publish_status");
    let featured_image_id: Option<String> = row.get("featured_image_id");

    Ok(Post {
        id: Uuid::parse_str(&id).context("Invalid post id in database")?,
        author_id: Uuid::parse_str(&author_id).context("Invalid author id in database")?,
        title: row.get("title"),
        permalink: row.get("permalink"),
        description: row.get("description"),
        content_json: row.get("content_json"),
        content_html: row.get("content_html"),
        publish_status: publish_status
            .parse()
            .map_err(|e: String| anyhow::anyhow!(e))
            .context("Invalid publish status in database")?,
        featured_image_id: featured_image_id
            .map(|id| Uuid::parse_str(&id).context("Invalid featured image id in database"))
            .transpose()?,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        published_at: row.get("published_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use crate::models::User;

    async fn setup() -> (SqlitePool, SqlxPostRepository, Uuid) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let author = User::new(
            Uuid::new_v4(),
            "author".to_string(),
            "author@example.com".to_string(),
            "hash".to_string(),
        );
        sqlx::query(
            "INSERT INTO users (id, username, email, password_hash, active, created_at, updated_at) VALUES (?, ?, ?, ?, 1, ?, ?)",
        )
        .bind(author.id.to_string())
        .bind(&author.username)
        .bind(&author.email)
        .bind(&author.password_hash)
        .bind(author.created_at)
        .bind(author.updated_at)
        .execute(&pool)
        .await
        .expect("Failed to create author");

        let repo = SqlxPostRepository::new(pool.clone());
        (pool, repo, author.id)
    }

    fn test_post(author_id: Uuid, permalink: &str) -> Post {
        Post::new(
            Uuid::new_v4(),
            author_id,
            format!("Title {}", permalink),
            permalink.to_string(),
            "{}".to_string(),
            "<p></p>".to_string(),
        )
    }

    #[tokio::test]
    async fn test_create_and_get_post() {
        let (_pool, repo, author_id) = setup().await;
        let post = test_post(author_id, "hello");

        repo.create(&post).await.expect("Failed to create post");

        let found = repo.get_by_id(post.id).await.unwrap().unwrap();
        assert_eq!(found.permalink, "hello");
        assert_eq!(found.author_id, author_id);
        assert_eq!(found.publish_status, PublishStatus::Draft);
    }

    #[tokio::test]
    async fn test_get_by_permalink() {
        let (_pool, repo, author_id) = setup().await;
        repo.create(&test_post(author_id, "by-permalink"))
            .await
            .unwrap();

        let found = repo.get_by_permalink("by-permalink").await.unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn test_list_filtered_by_status() {
        let (_pool, repo, author_id) = setup().await;

        let mut published = test_post(author_id, "published");
        published.publish_status = PublishStatus::Published;
        published.published_at = Some(Utc::now());
        repo.create(&published).await.unwrap();
        repo.create(&test_post(author_id, "draft")).await.unwrap();

        let all = repo.list(&ListParams::new(1, 10), None).await.unwrap();
        assert_eq!(all.total, 2);

        let drafts = repo
            .list(&ListParams::new(1, 10), Some(PublishStatus::Draft))
            .await
            .unwrap();
        assert_eq!(drafts.total, 1);
        assert_eq!(drafts.items[0].permalink, "draft");
    }

    #[tokio::test]
    async fn test_update_post() {
        let (_pool, repo, author_id) = setup().await;
        let mut post = test_post(author_id, "update-me");
        repo.create(&post).await.unwrap();

        post.title = "Updated".to_string();
        post.publish_status = PublishStatus::Published;
        post.published_at = Some(Utc::now());
        repo.update(&post).await.unwrap();

        let found = repo.get_by_id(post.id).await.unwrap().unwrap();
        assert_eq!(found.title, "Updated");
        assert_eq!(found.publish_status, PublishStatus::Published);
        assert!(found.published_at.is_some());
    }

    #[tokio::test]
    async fn test_set_and_get_categories_and_tags() {
        let (pool, repo, author_id) = setup().await;
        let post = test_post(author_id, "linked");
        repo.create(&post).await.unwrap();

        let category = Category::new(Uuid::new_v4(), "News".to_string());
        sqlx::query("INSERT INTO categories (id, name, created_at) VALUES (?, ?, ?)")
            .bind(category.id.to_string())
            .bind(&category.name)
            .bind(category.created_at)
            .execute(&pool)
            .await
            .unwrap();

        let tag = Tag::new(Uuid::new_v4(), "rust".to_string());
        sqlx::query("INSERT INTO tags (id, name, created_at) VALUES (?, ?, ?)")
            .bind(tag.id.to_string())
            .bind(&tag.name)
            .bind(tag.created_at)
            .execute(&pool)
            .await
            .unwrap();

        repo.set_categories(post.id, &[category.id]).await.unwrap();
        repo.set_tags(post.id, &[tag.id]).await.unwrap();

        let categories = repo.get_categories(post.id).await.unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].name, "News");

        let tags = repo.get_tags(post.id).await.unwrap();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].name, "rust");

        // Replacing links removes old ones
        repo.set_tags(post.id, &[]).await.unwrap();
        assert!(repo.get_tags(post.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_post_cascades_links() {
        let (pool, repo, author_id) = setup().await;
        let post = test_post(author_id, "cascade");
        repo.create(&post).await.unwrap();

        let tag = Tag::new(Uuid::new_v4(), "temp".to_string());
        sqlx::query("INSERT INTO tags (id, name, created_at) VALUES (?, ?, ?)")
            .bind(tag.id.to_string())
            .bind(&tag.name)
            .bind(tag.created_at)
            .execute(&pool)
            .await
            .unwrap();
        repo.set_tags(post.id, &[tag.id]).await.unwrap();

        assert!(repo.delete(post.id).await.unwrap());

        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM post_tags WHERE post_id = ?")
            .bind(post.id.to_string())
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(row.0, 0);
    }

    #[tokio::test]
    async fn test_duplicate_permalink_rejected() {
        let (_pool, repo, author_id) = setup().await;
        repo.create(&test_post(author_id, "dup")).await.unwrap();

        assert!(repo.create(&test_post(author_id, "dup")).await.is_err());
    }
}
