//! Question repository.

use std::sync::Arc;

use crate::entities::{Question, question};
use crate::map_db_err;
use interactions_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder,
};

/// Question repository for database operations.
#[derive(Clone)]
pub struct QuestionRepository {
    db: Arc<DatabaseConnection>,
}

impl QuestionRepository {
    /// Create a new question repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a question by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<question::Model>> {
        Self::find_by_id_in(self.db.as_ref(), id).await
    }

    /// Find a question by ID on `conn`.
    pub async fn find_by_id_in<C: ConnectionTrait>(
        conn: &C,
        id: &str,
    ) -> AppResult<Option<question::Model>> {
        Question::find_by_id(id)
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a question that belongs to `event_id`, returning an error otherwise.
    pub async fn get_in_event<C: ConnectionTrait>(
        conn: &C,
        event_id: &str,
        id: &str,
    ) -> AppResult<question::Model> {
        Question::find_by_id(id)
            .filter(question::Column::EventId.eq(event_id))
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or_else(|| AppError::NotFound(format!("Question not found: {id}")))
    }

    /// Get questions of an event (newest first).
    pub async fn find_by_event(&self, event_id: &str) -> AppResult<Vec<question::Model>> {
        Question::find()
            .filter(question::Column::EventId.eq(event_id))
            .order_by_desc(question::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new question.
    pub async fn create<C: ConnectionTrait>(
        conn: &C,
        model: question::ActiveModel,
    ) -> AppResult<question::Model> {
        model.insert(conn).await.map_err(map_db_err)
    }

    /// Update a question.
    pub async fn update<C: ConnectionTrait>(
        conn: &C,
        model: question::ActiveModel,
    ) -> AppResult<question::Model> {
        model.update(conn).await.map_err(map_db_err)
    }

    /// Delete a question (answers and votes cascade), returning rows removed.
    pub async fn delete<C: ConnectionTrait>(conn: &C, id: &str) -> AppResult<u64> {
        let result = Question::delete_by_id(id)
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
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_question(id: &str, event_id: &str) -> question::Model {
        question::Model {
            id: id.to_string(),
            event_id: event_id.to_string(),
            creator_id: "creator1".to_string(),
            question: "When does the stream end?".to_string(),
            config_id: format!("{id}-config"),
            published: true,
            streaming: false,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_by_id() {
        let q = create_test_question("q1", "event1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[q.clone()]])
                .into_connection(),
        );

        let repo = QuestionRepository::new(db);
        let result = repo.find_by_id("q1").await.unwrap();
        assert_eq!(result.unwrap().event_id, "event1");
    }

    #[tokio::test]
    async fn test_get_in_event_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<question::Model>::new()])
            .into_connection();

        let result = QuestionRepository::get_in_event(&db, "event1", "q1").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        let removed = QuestionRepository::delete(&db, "q1").await.unwrap();
        assert_eq!(removed, 1);
    }
}
