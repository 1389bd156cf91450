//! Poll and choice repositories.

use std::sync::Arc;

use crate::entities::{Choice, Poll, choice, poll};
use crate::map_db_err;
use interactions_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder,
};

/// Poll repository for database operations.
#[derive(Clone)]
pub struct PollRepository {
    db: Arc<DatabaseConnection>,
}

impl PollRepository {
    /// Create a new poll repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a poll by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<poll::Model>> {
        Self::find_by_id_in(self.db.as_ref(), id).await
    }

    /// Find a poll by ID on `conn`.
    pub async fn find_by_id_in<C: ConnectionTrait>(
        conn: &C,
        id: &str,
    ) -> AppResult<Option<poll::Model>> {
        Poll::find_by_id(id)
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a poll that belongs to `event_id`, returning an error otherwise.
    pub async fn get_in_event<C: ConnectionTrait>(
        conn: &C,
        event_id: &str,
        id: &str,
    ) -> AppResult<poll::Model> {
        Poll::find_by_id(id)
            .filter(poll::Column::EventId.eq(event_id))
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or_else(|| AppError::NotFound(format!("Poll not found: {id}")))
    }

    /// Get polls of an event (newest first).
    pub async fn find_by_event(&self, event_id: &str) -> AppResult<Vec<poll::Model>> {
        Poll::find()
            .filter(poll::Column::EventId.eq(event_id))
            .order_by_desc(poll::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new poll.
    pub async fn create<C: ConnectionTrait>(
        conn: &C,
        model: poll::ActiveModel,
    ) -> AppResult<poll::Model> {
        model.insert(conn).await.map_err(map_db_err)
    }

    /// Update a poll.
    pub async fn update<C: ConnectionTrait>(
        conn: &C,
        model: poll::ActiveModel,
    ) -> AppResult<poll::Model> {
        model.update(conn).await.map_err(map_db_err)
    }

    /// Delete a poll (choices and answers cascade), returning rows removed.
    pub async fn delete<C: ConnectionTrait>(conn: &C, id: &str) -> AppResult<u64> {
        let result = Poll::delete_by_id(id)
            .exec(conn)
            .await
            .map_err(map_db_err)?;
        Ok(result.rows_affected)
    }
}

/// Choice repository for database operations.
#[derive(Clone)]
pub struct ChoiceRepository {
    db: Arc<DatabaseConnection>,
}

impl ChoiceRepository {
    /// Create a new choice repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Get the choices of a poll in order.
    pub async fn find_by_poll(&self, poll_id: &str) -> AppResult<Vec<choice::Model>> {
        Self::find_by_poll_in(self.db.as_ref(), poll_id).await
    }

    /// Get the choices of a poll in order on `conn`.
    pub async fn find_by_poll_in<C: ConnectionTrait>(
        conn: &C,
        poll_id: &str,
    ) -> AppResult<Vec<choice::Model>> {
        Choice::find()
            .filter(choice::Column::PollId.eq(poll_id))
            .order_by_asc(choice::Column::Position)
            .all(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get the choices of several polls, ordered by poll then position.
    pub async fn find_by_polls(&self, poll_ids: &[String]) -> AppResult<Vec<choice::Model>> {
        if poll_ids.is_empty() {
            return Ok(vec![]);
        }

        Choice::find()
            .filter(choice::Column::PollId.is_in(poll_ids.to_vec()))
            .order_by_asc(choice::Column::PollId)
            .order_by_asc(choice::Column::Position)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new choice.
    pub async fn create<C: ConnectionTrait>(
        conn: &C,
        model: choice::ActiveModel,
    ) -> AppResult<choice::Model> {
        model.insert(conn).await.map_err(map_db_err)
    }

    /// Update a choice.
    pub async fn update<C: ConnectionTrait>(
        conn: &C,
        model: choice::ActiveModel,
    ) -> AppResult<choice::Model> {
        model.update(conn).await.map_err(map_db_err)
    }

    /// Delete choices of a poll by ID, returning rows removed.
    pub async fn delete_many<C: ConnectionTrait>(
        conn: &C,
        poll_id: &str,
        ids: &[String],
    ) -> AppResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let result = Choice::delete_many()
            .filter(choice::Column::PollId.eq(poll_id))
            .filter(choice::Column::Id.is_in(ids.to_vec()))
            .exec(conn)
            .await
            .map_err(map_db_err)?;
        Ok(result.rows_affected)
    }
}
