//! Participant repository.

use std::sync::Arc;

use crate::entities::{Participant, participant};
use crate::map_db_err;
use interactions_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
    sea_query::{Expr, OnConflict},
};

/// Participant repository for database operations.
#[derive(Clone)]
pub struct ParticipantRepository {
    db: Arc<DatabaseConnection>,
}

impl ParticipantRepository {
    /// Create a new participant repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a participant by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<participant::Model>> {
        Participant::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a participant by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<participant::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Participant not found: {id}")))
    }

    /// Find a participant by remote account username.
    pub async fn find_by_username(&self, username: &str) -> AppResult<Option<participant::Model>> {
        Participant::find()
            .filter(participant::Column::Username.eq(username))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new participant.
    ///
    /// A concurrent insert of the same username surfaces as [`AppError::Conflict`].
    pub async fn create(&self, model: participant::ActiveModel) -> AppResult<participant::Model> {
        model.insert(self.db.as_ref()).await.map_err(map_db_err)
    }

    /// Insert a participant, or refresh `email` / `screen_name` of the row
    /// already holding the same username.
    ///
    /// `kind` and `created_at` of an existing row are left untouched.
    pub async fn upsert_refresh(
        &self,
        model: participant::ActiveModel,
    ) -> AppResult<participant::Model> {
        Participant::insert(model)
            .on_conflict(
                OnConflict::column(participant::Column::Username)
                    .update_columns([participant::Column::Email, participant::Column::ScreenName])
                    .value(participant::Column::UpdatedAt, Expr::current_timestamp())
                    .to_owned(),
            )
            .exec_with_returning(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    /// List participants (paginated, newest first).
    pub async fn find_all(
        &self,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<participant::Model>> {
        let mut query = Participant::find()
            .order_by_desc(participant::Column::Id)
            .limit(limit);

        if let Some(until) = until_id {
            query = query.filter(participant::Column::Id.lt(until));
        }

        query
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entities::participant::ParticipantKind;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, DbErr, MockDatabase, Set};

    fn create_test_participant(id: &str, username: &str, screen_name: &str) -> participant::Model {
        participant::Model {
            id: id.to_string(),
            username: username.to_string(),
            email: format!("{username}@example.com"),
            screen_name: screen_name.to_string(),
            kind: ParticipantKind::System,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_by_username() {
        let p = create_test_participant("p1", "alice", "Alice");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[p.clone()]])
                .into_connection(),
        );

        let repo = ParticipantRepository::new(db);
        let result = repo.find_by_username("alice").await.unwrap();

        assert_eq!(result.unwrap().id, "p1");
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<participant::Model>::new()])
                .into_connection(),
        );

        let repo = ParticipantRepository::new(db);
        let result = repo.get_by_id("missing").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_upsert_refresh_returns_row() {
        let refreshed = create_test_participant("p1", "alice", "Alice Cooper");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[refreshed.clone()]])
                .into_connection(),
        );

        let repo = ParticipantRepository::new(db);
        let model = participant::ActiveModel {
            id: Set("p2".to_string()),
            username: Set("alice".to_string()),
            email: Set("alice@example.com".to_string()),
            screen_name: Set("Alice Cooper".to_string()),
            kind: Set(ParticipantKind::System),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };
        let result = repo.upsert_refresh(model).await.unwrap();

        // The existing row wins the conflict and keeps its id
        assert_eq!(result.id, "p1");
        assert_eq!(result.screen_name, "Alice Cooper");
    }

    #[tokio::test]
    async fn test_create_duplicate_is_conflict() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_errors([DbErr::Custom(
                    "duplicate key value violates unique constraint \"participant_username_key\""
                        .to_string(),
                )])
                .into_connection(),
        );

        let repo = ParticipantRepository::new(db);
        let model = participant::ActiveModel {
            id: Set("p2".to_string()),
            username: Set("bob@example.com".to_string()),
            email: Set("bob@example.com".to_string()),
            screen_name: Set("Bob".to_string()),
            kind: Set(ParticipantKind::Participant),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };
        let result = repo.create(model).await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }
}
