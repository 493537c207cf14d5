//! SeaORM entities backing the Postgres stores.

pub mod post;
pub mod user;
