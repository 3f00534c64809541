//! Services layer - business logic
//!
//! Services validate incoming payloads with the input filters, map them
//! onto models and coordinate repositories and the cache. Handlers talk
//! to services only.

pub mod auth;
pub mod category;
pub mod failed_login;
pub mod file;
pub mod password;
pub mod permission;
pub mod post;
pub mod rate_limiter;
pub mod role;
pub mod tag;
pub mod user;

pub use auth::{AuthService, AuthServiceError};
pub use category::{CategoryService, CategoryServiceError};
pub use failed_login::{FailedLoginService, FailedLoginServiceError};
pub use file::{FileService, FileServiceError};
pub use password::{hash_password, verify_password};
pub use permission::{PermissionService, PermissionServiceError};
pub use post::{PostService, PostServiceError, PostWithLinks};
pub use rate_limiter::LoginRateLimiter;
pub use role::{RoleService, RoleServiceError};
pub use tag::{TagService, TagServiceError};
pub use user::{UserService, UserServiceError};
