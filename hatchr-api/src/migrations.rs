use diesel::pg::PgConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

use hatchr_shared::clients::db::DbPool;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Applies pending embedded migrations on one pooled connection.
pub fn run_pending(pool: &DbPool) -> anyhow::Result<()> {
    let mut pooled = pool.get()?;
    let conn: &mut PgConnection = &mut pooled;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| anyhow::anyhow!("migration failed: {e}"))?;

    tracing::info!(applied = applied.len(), "database migrations up to date");
    Ok(())
}
