//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles CRUD operations for a specific entity.

pub mod category;
pub mod failed_login;
pub mod file;
pub mod permission;
pub mod post;
pub mod role;
pub mod session;
pub mod tag;
pub mod user;

pub use category::{CategoryRepository, SqlxCategoryRepository};
pub use failed_login::{FailedLoginRepository, SqlxFailedLoginRepository};
pub use file::{FileMetadata, FileRepository, SqlxFileRepository};
pub use permission::{PermissionRepository, SqlxPermissionRepository};
pub use post::{PostRepository, SqlxPostRepository};
pub use role::{RoleRepository, SqlxRoleRepository};
pub use session::{SessionRepository, SqlxSessionRepository};
pub use tag::{SqlxTagRepository, TagRepository};
pub use user::{SqlxUserRepository, UserRepository};
