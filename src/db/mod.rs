//! Database layer
//!
//! Connection pool setup, embedded migrations and the repository
//! implementations live here.

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{create_pool, create_test_pool};
