//! Atrium - A modular admin backend
//!
//! This library provides the core functionality for the Atrium admin
//! service: entity CRUD modules, session authentication and the
//! input-filter validation subsystem.

pub mod api;
pub mod cache;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
pub mod validation;
