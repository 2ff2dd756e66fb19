/// Field validation shared by all stores
pub mod validation_tests;

/// CRUD round trips against Postgres (skipped without a database)
pub mod crud_tests;
