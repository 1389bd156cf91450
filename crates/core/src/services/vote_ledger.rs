//! Vote ledger service.

use std::sync::Arc;

use chrono::Utc;
use interactions_common::{AppError, AppResult, IdGenerator};
use interactions_db::{
    entities::{vote, vote::TargetKind},
    map_db_err,
    repositories::{AnswerRepository, QuestionRepository, VoteRepository},
};
use sea_orm::{ConnectionTrait, DatabaseConnection, Set, TransactionTrait};
use serde::Serialize;

use super::retry::retry_on_conflict;

/// Result of a toggle: whether the participant endorses the target afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VoteOutcome {
    pub voted: bool,
}

/// Records and removes votes on questions and question answers.
///
/// Permission checks belong to the caller; the ledger only keeps at most
/// one vote per participant and target.
#[derive(Clone)]
pub struct VoteLedger {
    db: Arc<DatabaseConnection>,
    vote_repo: VoteRepository,
    id_gen: IdGenerator,
}

impl VoteLedger {
    /// Create a new vote ledger.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            vote_repo: VoteRepository::new(Arc::clone(&db)),
            db,
            id_gen: IdGenerator::new(),
        }
    }

    /// Add the participant's vote if absent, remove it if present.
    ///
    /// Two concurrent toggles of the same pair are linearized by the unique
    /// index; the loser re-reads and re-runs once.
    pub async fn toggle(
        &self,
        event_id: &str,
        participant_id: &str,
        kind: TargetKind,
        target_id: &str,
    ) -> AppResult<VoteOutcome> {
        let outcome = retry_on_conflict("toggle_vote", move || {
            self.toggle_once(event_id, participant_id, kind, target_id)
        })
        .await?;

        tracing::debug!(
            participant_id = %participant_id,
            target = %kind,
            target_id = %target_id,
            voted = outcome.voted,
            "Vote toggled"
        );

        Ok(outcome)
    }

    async fn toggle_once(
        &self,
        event_id: &str,
        participant_id: &str,
        kind: TargetKind,
        target_id: &str,
    ) -> AppResult<VoteOutcome> {
        let txn = self.db.begin().await.map_err(map_db_err)?;

        ensure_target_in_event(&txn, event_id, kind, target_id).await?;

        let outcome = match VoteRepository::find_in(&txn, participant_id, kind, target_id).await? {
            Some(existing) => {
                if VoteRepository::delete(&txn, &existing.id).await? == 0 {
                    return Err(AppError::Conflict(format!(
                        "vote {} was removed concurrently",
                        existing.id
                    )));
                }
                VoteOutcome { voted: false }
            }
            None => {
                let (question_id, answer_id) = match kind {
                    TargetKind::Question => (Some(target_id.to_string()), None),
                    TargetKind::Answer => (None, Some(target_id.to_string())),
                };
                VoteRepository::create(
                    &txn,
                    vote::ActiveModel {
                        id: Set(self.id_gen.generate()),
                        participant_id: Set(participant_id.to_string()),
                        question_id: Set(question_id),
                        answer_id: Set(answer_id),
                        created_at: Set(Utc::now().into()),
                    },
                )
                .await?;
                VoteOutcome { voted: true }
            }
        };

        txn.commit().await.map_err(map_db_err)?;
        Ok(outcome)
    }

    /// Number of committed votes on a target.
    pub async fn count(&self, kind: TargetKind, target_id: &str) -> AppResult<u64> {
        self.vote_repo.count(kind, target_id).await
    }

    /// Whether the participant currently votes for the target.
    pub async fn has_voted(
        &self,
        participant_id: &str,
        kind: TargetKind,
        target_id: &str,
    ) -> AppResult<bool> {
        Ok(self
            .vote_repo
            .find(participant_id, kind, target_id)
            .await?
            .is_some())
    }
}

/// Fail with `NotFound` unless the target exists and belongs to `event_id`.
async fn ensure_target_in_event<C: ConnectionTrait>(
    conn: &C,
    event_id: &str,
    kind: TargetKind,
    target_id: &str,
) -> AppResult<()> {
    let question_id = match kind {
        TargetKind::Question => target_id.to_string(),
        TargetKind::Answer => {
            AnswerRepository::find_question_answer_in(conn, target_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Answer not found: {target_id}")))?
                .question_id
        }
    };

    QuestionRepository::get_in_event(conn, event_id, &question_id)
        .await
        .map_err(|e| match e {
            AppError::NotFound(_) => AppError::NotFound(format!("{kind} not found: {target_id}")),
            other => other,
        })?;
    Ok(())
}
