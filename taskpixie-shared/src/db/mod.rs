/// Database layer: connection pool and embedded migrations
///
/// Repository adapters live in [`crate::repository`].

pub mod migrations;
pub mod pool;
