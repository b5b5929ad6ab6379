use sqlx::migrate::Migrator;

pub mod client;
mod query;
mod record;

/// Schema migrations for the `authors`, `tags` and `contents` schemas.
pub static MIGRATOR: Migrator = sqlx::migrate!();
