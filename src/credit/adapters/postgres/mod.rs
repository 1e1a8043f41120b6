//! `PostgreSQL` adapter for credit alert persistence.

mod models;
mod repository;
mod schema;

pub use repository::{CreditPgPool, PostgresCreditAlertRepository};
