//! # Task Pixie Shared Library
//!
//! Domain types, persistence and business logic behind the Task Pixie API.
//!
//! ## Module Organization
//!
//! - `models`: entities, previews and input payloads
//! - `repository`: repository traits and their PostgreSQL adapters
//! - `use_case`: user, project and task operations
//! - `preview`: merging owned and assigned/member previews
//! - `auth`: password hashing, JWTs and request auth context
//! - `cache`: key/value cache trait and Redis adapter
//! - `storage`: avatar object storage
//! - `db`: connection pool and migrations
//! - `memory`: in-memory adapters for tests and local runs
//! - `error`: domain error taxonomy

pub mod auth;
pub mod cache;
pub mod db;
pub mod error;
pub mod memory;
pub mod models;
pub mod preview;
pub mod repository;
pub mod storage;
pub mod use_case;
pub mod validation;

pub use error::{DomainError, DomainResult, FieldError};

/// Current version of the Task Pixie shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
