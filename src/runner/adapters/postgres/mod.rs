//! `PostgreSQL` adapter for runner persistence.

mod models;
mod repository;
mod schema;

pub use repository::{PostgresRunnerRepository, RunnerPgPool};
