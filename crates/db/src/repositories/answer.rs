//! Poll and question answer repository.

use std::sync::Arc;

use crate::entities::{
    PollAnswer, PollAnswerChoice, QuestionAnswer, poll_answer, poll_answer_choice,
    question_answer,
};
use crate::map_db_err;
use interactions_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};

/// Answer repository for database operations.
#[derive(Clone)]
pub struct AnswerRepository {
    db: Arc<DatabaseConnection>,
}

impl AnswerRepository {
    /// Create a new answer repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    // ==================== Poll answers ====================

    /// Find a poll answer by ID.
    pub async fn find_poll_answer(&self, id: &str) -> AppResult<Option<poll_answer::Model>> {
        PollAnswer::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get the answers of a poll (oldest first).
    pub async fn find_poll_answers(&self, poll_id: &str) -> AppResult<Vec<poll_answer::Model>> {
        PollAnswer::find()
            .filter(poll_answer::Column::PollId.eq(poll_id))
            .order_by_asc(poll_answer::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get the selections of the given poll answers.
    pub async fn find_selections(
        &self,
        answer_ids: &[String],
    ) -> AppResult<Vec<poll_answer_choice::Model>> {
        if answer_ids.is_empty() {
            return Ok(vec![]);
        }

        PollAnswerChoice::find()
            .filter(poll_answer_choice::Column::AnswerId.is_in(answer_ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a poll answer.
    pub async fn create_poll_answer<C: ConnectionTrait>(
        conn: &C,
        model: poll_answer::ActiveModel,
    ) -> AppResult<poll_answer::Model> {
        model.insert(conn).await.map_err(map_db_err)
    }

    /// Record the choices selected by a poll answer.
    pub async fn create_selections<C: ConnectionTrait>(
        conn: &C,
        answer_id: &str,
        choice_ids: &[String],
    ) -> AppResult<()> {
        for choice_id in choice_ids {
            poll_answer_choice::ActiveModel {
                answer_id: Set(answer_id.to_string()),
                choice_id: Set(choice_id.clone()),
            }
            .insert(conn)
            .await
            .map_err(map_db_err)?;
        }
        Ok(())
    }

    /// Delete a poll answer (selections cascade), returning rows removed.
    pub async fn delete_poll_answer<C: ConnectionTrait>(conn: &C, id: &str) -> AppResult<u64> {
        let result = PollAnswer::delete_by_id(id)
            .exec(conn)
            .await
            .map_err(map_db_err)?;
        Ok(result.rows_affected)
    }

    // ==================== Question answers ====================

    /// Find a question answer by ID.
    pub async fn find_question_answer(
        &self,
        id: &str,
    ) -> AppResult<Option<question_answer::Model>> {
        Self::find_question_answer_in(self.db.as_ref(), id).await
    }

    /// Find a question answer by ID on `conn`.
    pub async fn find_question_answer_in<C: ConnectionTrait>(
        conn: &C,
        id: &str,
    ) -> AppResult<Option<question_answer::Model>> {
        QuestionAnswer::find_by_id(id)
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get the answers of a question (oldest first).
    pub async fn find_question_answers(
        &self,
        question_id: &str,
    ) -> AppResult<Vec<question_answer::Model>> {
        QuestionAnswer::find()
            .filter(question_answer::Column::QuestionId.eq(question_id))
            .order_by_asc(question_answer::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a question answer.
    pub async fn create_question_answer<C: ConnectionTrait>(
        conn: &C,
        model: question_answer::ActiveModel,
    ) -> AppResult<question_answer::Model> {
        model.insert(conn).await.map_err(map_db_err)
    }

    /// Delete a question answer (votes cascade), returning rows removed.
    pub async fn delete_question_answer<C: ConnectionTrait>(
        conn: &C,
        id: &str,
    ) -> AppResult<u64> {
        let result = QuestionAnswer::delete_by_id(id)
            .exec(conn)
            .await
            .map_err(map_db_err)?;
        Ok(result.rows_affected)
    }
}
