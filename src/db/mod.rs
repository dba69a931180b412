//! Database layer: pool, migrations and user queries for PostgreSQL.

mod pool;
mod users;

pub use pool::{create_pool, run_migrations, DbPool};
pub use users::*;
