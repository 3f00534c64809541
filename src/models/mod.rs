//! Data models
//!
//! This module defines the entities of the Atrium admin backend and the
//! shared pagination types used by the list endpoints.

pub mod category;
pub mod failed_login;
pub mod file;
pub mod paging;
pub mod permission;
pub mod post;
pub mod role;
pub mod session;
pub mod tag;
pub mod user;

pub use category::Category;
pub use failed_login::FailedLogin;
pub use file::StoredFile;
pub use paging::{ListParams, Paginated};
pub use permission::Permission;
pub use post::{Post, PublishStatus};
pub use role::Role;
pub use session::{PasswordReset, Session};
pub use tag::Tag;
pub use user::User;
