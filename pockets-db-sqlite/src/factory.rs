use async_trait::async_trait;
use pockets_core::db::{DbConfig, RepositoryFactory};
use pockets_core::{PocketsRepository, RepositoryError};
use tracing::info;

use crate::repository::SqliteRepository;

/// [`RepositoryFactory`] for SQLite.
///
/// Register this with a [`pockets_core::db::RepositoryRegistry`] to make the
/// `"sqlite"` backend available:
///
/// ```rust,no_run
/// use pockets_core::db::RepositoryRegistry;
/// use pockets_db_sqlite::SqliteRepositoryFactory;
///
/// let mut registry = RepositoryRegistry::new();
/// registry.register(Box::new(SqliteRepositoryFactory));
/// ```
pub struct SqliteRepositoryFactory;

#[async_trait]
impl RepositoryFactory for SqliteRepositoryFactory {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    /// Open the database described by `config.connection_string` and apply
    /// migrations.
    ///
    /// Accepted connection-string values:
    /// * A bare file path, e.g. `"pockets.db"`. Created if missing.
    /// * A sqlx URL, e.g. `"sqlite:pockets.db"`.
    /// * `":memory:"` for an ephemeral database.
    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn PocketsRepository>, RepositoryError> {
        let repo = SqliteRepository::new(&config.connection_string).await?;
        repo.run_migrations().await?;
        info!(connection = %config.connection_string, "sqlite repository ready");
        Ok(Box::new(repo))
    }
}

#[cfg(test)]
mod tests {
    use pockets_core::UserId;
    use pockets_core::db::{DbConfig, RepositoryFactory};

    use super::SqliteRepositoryFactory;

    #[test]
    fn backend_name_is_sqlite() {
        assert_eq!(SqliteRepositoryFactory.backend_name(), "sqlite");
    }

    #[tokio::test]
    async fn creates_migrated_in_memory_repository() {
        let config = DbConfig {
            backend: "sqlite".to_string(),
            connection_string: ":memory:".to_string(),
        };

        let repo = SqliteRepositoryFactory
            .create(&config)
            .await
            .expect("failed to create in-memory repository");

        // schema is in place
        let listed = repo.list_transactions(UserId::new()).await;
        assert!(listed.is_ok(), "{:#?}", listed.err());
    }

    #[tokio::test]
    async fn invalid_connection_string_is_reported() {
        let config = DbConfig {
            backend: "sqlite".to_string(),
            connection_string: "/nonexistent-dir/deeper/pockets.db".to_string(),
        };

        assert!(SqliteRepositoryFactory.create(&config).await.is_err());
    }
}
