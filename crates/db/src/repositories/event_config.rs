//! Event configuration repository.

use std::sync::Arc;

use crate::entities::{EventConfig, event_config};
use crate::map_db_err;
use interactions_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QuerySelect,
};

/// Event configuration repository for database operations.
#[derive(Clone)]
pub struct EventConfigRepository {
    db: Arc<DatabaseConnection>,
}

impl EventConfigRepository {
    /// Create a new event configuration repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find the configuration row of an event.
    pub async fn find_by_event(&self, event_id: &str) -> AppResult<Option<event_config::Model>> {
        Self::find_by_event_in(self.db.as_ref(), event_id).await
    }

    /// Find the configuration row of an event, returning an error if not found.
    pub async fn get_by_event(&self, event_id: &str) -> AppResult<event_config::Model> {
        self.find_by_event(event_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Event not configured: {event_id}")))
    }

    /// Find the configuration row of an event on `conn`.
    pub async fn find_by_event_in<C: ConnectionTrait>(
        conn: &C,
        event_id: &str,
    ) -> AppResult<Option<event_config::Model>> {
        EventConfig::find_by_id(event_id)
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find and row-lock the configuration of an event (`SELECT ... FOR UPDATE`).
    ///
    /// Must run inside a transaction; concurrent writers of the same event
    /// queue behind the lock.
    pub async fn find_for_update<C: ConnectionTrait>(
        conn: &C,
        event_id: &str,
    ) -> AppResult<Option<event_config::Model>> {
        EventConfig::find_by_id(event_id)
            .lock_exclusive()
            .one(conn)
            .await
            .map_err(map_db_err)
    }

    /// Find the configuration of an event under a shared row lock
    /// (`SELECT ... FOR SHARE`).
    ///
    /// Must run inside a transaction. Readers wait for an in-flight
    /// [`Self::find_for_update`] holder to commit and then see its row, so a
    /// default id read here stays loadable until the transaction ends.
    pub async fn find_for_share<C: ConnectionTrait>(
        conn: &C,
        event_id: &str,
    ) -> AppResult<Option<event_config::Model>> {
        EventConfig::find_by_id(event_id)
            .lock_shared()
            .one(conn)
            .await
            .map_err(map_db_err)
    }

    /// Create the configuration row of an event.
    ///
    /// Two first writes racing for the same event surface as [`AppError::Conflict`].
    pub async fn create<C: ConnectionTrait>(
        conn: &C,
        model: event_config::ActiveModel,
    ) -> AppResult<event_config::Model> {
        model.insert(conn).await.map_err(map_db_err)
    }

    /// Update the configuration row of an event.
    pub async fn update<C: ConnectionTrait>(
        conn: &C,
        model: event_config::ActiveModel,
    ) -> AppResult<event_config::Model> {
        model.update(conn).await.map_err(map_db_err)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_event_config(event_id: &str, poll_config: Option<&str>) -> event_config::Model {
        event_config::Model {
            event_id: event_id.to_string(),
            default_poll_config_id: poll_config.map(ToString::to_string),
            default_question_config_id: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_by_event() {
        let cfg = create_test_event_config("event1", Some("pc1"));

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[cfg.clone()]])
                .into_connection(),
        );

        let repo = EventConfigRepository::new(db);
        let result = repo.find_by_event("event1").await.unwrap().unwrap();

        assert_eq!(result.default_poll_config_id.as_deref(), Some("pc1"));
    }

    #[tokio::test]
    async fn test_get_by_event_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<event_config::Model>::new()])
                .into_connection(),
        );

        let repo = EventConfigRepository::new(db);
        let result = repo.get_by_event("event1").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_find_for_update_locks_row() {
        let cfg = create_test_event_config("event1", None);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[cfg]])
            .into_connection();

        EventConfigRepository::find_for_update(&db, "event1")
            .await
            .unwrap();

        let log = db.into_transaction_log();
        let sql = format!("{log:?}");
        assert!(sql.contains("FOR UPDATE"));
    }

    #[tokio::test]
    async fn test_find_for_share_takes_shared_lock() {
        let cfg = create_test_event_config("event1", Some("pc1"));

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[cfg]])
            .into_connection();

        let found = EventConfigRepository::find_for_share(&db, "event1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.default_poll_config_id.as_deref(), Some("pc1"));

        let log = db.into_transaction_log();
        let sql = format!("{log:?}");
        assert!(sql.contains("FOR SHARE"));
        assert!(!sql.contains("FOR UPDATE"));
    }
}
