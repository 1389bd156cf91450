//! Poll and question configuration repository.

use std::sync::Arc;

use crate::entities::{PollConfig, QuestionConfig, poll_config, question_config};
use crate::map_db_err;
use interactions_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
};

/// Configuration repository for database operations.
///
/// Rows are immutable by replacement: callers insert a new record and
/// repoint the owner rather than editing values in place (the `enabled`
/// flag of an event default is the one exception).
#[derive(Clone)]
pub struct ConfigRepository {
    db: Arc<DatabaseConnection>,
}

impl ConfigRepository {
    /// Create a new configuration repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    // === Poll configurations ===

    /// Find a poll configuration by ID.
    pub async fn find_poll_config(&self, id: &str) -> AppResult<Option<poll_config::Model>> {
        Self::find_poll_config_in(self.db.as_ref(), id).await
    }

    /// Find a poll configuration by ID on `conn`.
    pub async fn find_poll_config_in<C: ConnectionTrait>(
        conn: &C,
        id: &str,
    ) -> AppResult<Option<poll_config::Model>> {
        PollConfig::find_by_id(id)
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a poll configuration by ID on `conn`, returning an error if not found.
    pub async fn get_poll_config_in<C: ConnectionTrait>(
        conn: &C,
        id: &str,
    ) -> AppResult<poll_config::Model> {
        Self::find_poll_config_in(conn, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Poll configuration not found: {id}")))
    }

    /// Get the poll configurations with the given IDs.
    pub async fn find_poll_configs(&self, ids: &[String]) -> AppResult<Vec<poll_config::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        PollConfig::find()
            .filter(poll_config::Column::Id.is_in(ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a poll configuration.
    pub async fn create_poll_config<C: ConnectionTrait>(
        conn: &C,
        model: poll_config::ActiveModel,
    ) -> AppResult<poll_config::Model> {
        model.insert(conn).await.map_err(map_db_err)
    }

    /// Update a poll configuration.
    pub async fn update_poll_config<C: ConnectionTrait>(
        conn: &C,
        model: poll_config::ActiveModel,
    ) -> AppResult<poll_config::Model> {
        model.update(conn).await.map_err(map_db_err)
    }

    /// Delete a poll configuration, returning the number of rows removed.
    pub async fn delete_poll_config<C: ConnectionTrait>(conn: &C, id: &str) -> AppResult<u64> {
        let result = PollConfig::delete_by_id(id)
            .exec(conn)
            .await
            .map_err(map_db_err)?;
        Ok(result.rows_affected)
    }

    // === Question configurations ===

    /// Find a question configuration by ID.
    pub async fn find_question_config(
        &self,
        id: &str,
    ) -> AppResult<Option<question_config::Model>> {
        Self::find_question_config_in(self.db.as_ref(), id).await
    }

    /// Find a question configuration by ID on `conn`.
    pub async fn find_question_config_in<C: ConnectionTrait>(
        conn: &C,
        id: &str,
    ) -> AppResult<Option<question_config::Model>> {
        QuestionConfig::find_by_id(id)
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a question configuration by ID on `conn`, returning an error if not found.
    pub async fn get_question_config_in<C: ConnectionTrait>(
        conn: &C,
        id: &str,
    ) -> AppResult<question_config::Model> {
        Self::find_question_config_in(conn, id).await?.ok_or_else(|| {
            AppError::NotFound(format!("Question configuration not found: {id}"))
        })
    }

    /// Get the question configurations with the given IDs.
    pub async fn find_question_configs(
        &self,
        ids: &[String],
    ) -> AppResult<Vec<question_config::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        QuestionConfig::find()
            .filter(question_config::Column::Id.is_in(ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a question configuration.
    pub async fn create_question_config<C: ConnectionTrait>(
        conn: &C,
        model: question_config::ActiveModel,
    ) -> AppResult<question_config::Model> {
        model.insert(conn).await.map_err(map_db_err)
    }

    /// Update a question configuration.
    pub async fn update_question_config<C: ConnectionTrait>(
        conn: &C,
        model: question_config::ActiveModel,
    ) -> AppResult<question_config::Model> {
        model.update(conn).await.map_err(map_db_err)
    }

    /// Delete a question configuration, returning the number of rows removed.
    pub async fn delete_question_config<C: ConnectionTrait>(
        conn: &C,
        id: &str,
    ) -> AppResult<u64> {
        let result = QuestionConfig::delete_by_id(id)
            .exec(conn)
            .await
            .map_err(map_db_err)?;
        Ok(result.rows_affected)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entities::poll_config::AnswersPrivacy;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_poll_config(id: &str) -> poll_config::Model {
        poll_config::Model {
            id: id.to_string(),
            answers_privacy: AnswersPrivacy::Everyone,
            present_to_audience: true,
            enabled: true,
            multiple_answers: false,
            allow_no_limited_answering: true,
            answering_time_limit: 30,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_poll_config() {
        let cfg = create_test_poll_config("pc1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[cfg.clone()]])
                .into_connection(),
        );

        let repo = ConfigRepository::new(db);
        let result = repo.find_poll_config("pc1").await.unwrap().unwrap();

        assert_eq!(result.answering_time_limit, 30);
        assert_eq!(result.answers_privacy, AnswersPrivacy::Everyone);
    }

    #[tokio::test]
    async fn test_get_question_config_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<question_config::Model>::new()])
            .into_connection();

        let result = ConfigRepository::get_question_config_in(&db, "qc1").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_poll_config_reports_rows() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                },
            ])
            .into_connection();

        assert_eq!(ConfigRepository::delete_poll_config(&db, "pc1").await.unwrap(), 1);
        assert_eq!(ConfigRepository::delete_poll_config(&db, "pc1").await.unwrap(), 0);
    }
}
