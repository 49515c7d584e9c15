// src/db.rs
// Pool construction, migrations and start-up seeding

use std::str::FromStr;

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use tracing::info;

use crate::auth::hash_password;
use crate::config::auth::AuthConfig;
use crate::config::server::DatabaseConfig;
use crate::users::{RoleName, RoleStore, UserStore};

pub async fn connect(config: &DatabaseConfig) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&config.url)
        .with_context(|| format!("Invalid DATABASE_URL: {}", config.url))?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal);

    let mut pool_options = SqlitePoolOptions::new().max_connections(config.max_connections);
    if config.url.contains(":memory:") {
        // Every connection to an in-memory database is its own database
        pool_options = pool_options
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None);
    }

    let pool = pool_options.connect_with(options).await?;
    info!(url = %config.url, max_connections = config.max_connections, "database connected");
    Ok(pool)
}

pub async fn migrate(pool: &SqlitePool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("Failed to run database migrations")?;
    Ok(())
}

/// Ensure the default roles exist and create the bootstrap admin if it is
/// configured and missing
pub async fn seed(pool: &SqlitePool, auth: &AuthConfig) -> Result<()> {
    let roles = RoleStore::new(pool.clone());
    let created = roles.ensure_defaults().await?;
    if created > 0 {
        info!(created, "default roles seeded");
    }

    let Some(admin) = auth.bootstrap_admin.as_ref() else {
        return Ok(());
    };

    let users = UserStore::new(pool.clone());
    if users.email_exists(&admin.email).await? {
        return Ok(());
    }

    let admin_role = roles
        .get_by_name(RoleName::Admin)
        .await?
        .context("ADMIN role missing after seeding")?;
    let hash = hash_password(&admin.password, auth.bcrypt_cost)?;
    let user = users
        .create(&admin.email, &hash, &admin.name, &[admin_role.id])
        .await?;

    info!(target: "audit", user_id = user.id, email = %user.email, "bootstrap admin created");
    Ok(())
}

/// Connect, migrate and seed
pub async fn init(database: &DatabaseConfig, auth: &AuthConfig) -> Result<SqlitePool> {
    let pool = connect(database).await?;
    migrate(&pool).await?;
    seed(&pool, auth).await?;
    Ok(pool)
}
