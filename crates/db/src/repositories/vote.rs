//! Vote repository.

use std::sync::Arc;

use crate::entities::{Vote, vote, vote::TargetKind};
use crate::map_db_err;
use interactions_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter,
};

/// Vote repository for database operations.
#[derive(Clone)]
pub struct VoteRepository {
    db: Arc<DatabaseConnection>,
}

impl VoteRepository {
    /// Create a new vote repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a participant's vote on a target.
    pub async fn find(
        &self,
        participant_id: &str,
        kind: TargetKind,
        target_id: &str,
    ) -> AppResult<Option<vote::Model>> {
        Self::find_in(self.db.as_ref(), participant_id, kind, target_id).await
    }

    /// Find a participant's vote on a target on `conn`.
    pub async fn find_in<C: ConnectionTrait>(
        conn: &C,
        participant_id: &str,
        kind: TargetKind,
        target_id: &str,
    ) -> AppResult<Option<vote::Model>> {
        Vote::find()
            .filter(vote::Column::ParticipantId.eq(participant_id))
            .filter(kind.column().eq(target_id))
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count the votes on a target.
    pub async fn count(&self, kind: TargetKind, target_id: &str) -> AppResult<u64> {
        Vote::find()
            .filter(kind.column().eq(target_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a vote.
    ///
    /// A second vote by the same participant on the same target surfaces as
    /// [`AppError::Conflict`].
    pub async fn create<C: ConnectionTrait>(
        conn: &C,
        model: vote::ActiveModel,
    ) -> AppResult<vote::Model> {
        model.insert(conn).await.map_err(map_db_err)
    }

    /// Delete a vote by ID, returning rows removed.
    pub async fn delete<C: ConnectionTrait>(conn: &C, id: &str) -> AppResult<u64> {
        let result = Vote::delete_by_id(id)
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
    use sea_orm::{DatabaseBackend, DbErr, MockDatabase, Set};

    fn create_test_vote(id: &str, question_id: &str) -> vote::Model {
        vote::Model {
            id: id.to_string(),
            participant_id: "participant1".to_string(),
            question_id: Some(question_id.to_string()),
            answer_id: None,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_vote() {
        let v = create_test_vote("v1", "q1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[v.clone()]])
                .into_connection(),
        );

        let repo = VoteRepository::new(db);
        let result = repo
            .find("participant1", TargetKind::Question, "q1")
            .await
            .unwrap();
        assert_eq!(result.unwrap().id, "v1");
    }

    #[tokio::test]
    async fn test_count() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(3)),
                }]])
                .into_connection(),
        );

        let repo = VoteRepository::new(db);
        let count = repo.count(TargetKind::Answer, "qa1").await.unwrap();
        assert_eq!(count, 3);
    }

    #[tokio::test]
    async fn test_duplicate_vote_is_conflict() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_errors([DbErr::Custom(
                "duplicate key value violates unique constraint \"idx_vote_participant_question_unique\""
                    .to_string(),
            )])
            .into_connection();

        let model = vote::ActiveModel {
            id: Set("v2".to_string()),
            participant_id: Set("participant1".to_string()),
            question_id: Set(Some("q1".to_string())),
            answer_id: Set(None),
            created_at: Set(Utc::now().into()),
        };

        let result = VoteRepository::create(&db, model).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }
}
