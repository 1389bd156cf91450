//! Configuration resolver service.
//!
//! Every poll and question owns exactly one configuration record. New
//! interactions either bring custom values or receive a fresh copy of the
//! event default, so later changes to the default never reach interactions
//! that already exist.

use std::sync::Arc;

use chrono::Utc;
use interactions_common::{AppError, AppResult, IdGenerator};
use interactions_db::{
    entities::{
        event_config, poll, poll_config, poll_config::AnswersPrivacy,
        poll_config::ANSWERING_TIME_LIMITS, question, question_config,
    },
    map_db_err,
    repositories::{ConfigRepository, EventConfigRepository, PollRepository, QuestionRepository},
};
use sea_orm::{ActiveEnum, ConnectionTrait, DatabaseConnection, Set, TransactionTrait};
use serde::{Deserialize, Serialize};

use super::retry::retry_on_conflict;

/// The two kinds of audience interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    Poll,
    Question,
}

impl std::fmt::Display for InteractionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Poll => f.write_str("poll"),
            Self::Question => f.write_str("question"),
        }
    }
}

/// Raw poll configuration values as submitted by a client.
#[derive(Debug, Clone, Deserialize)]
pub struct PollConfigInput {
    pub answers_privacy: String,
    pub present_to_audience: bool,
    pub enabled: bool,
    pub multiple_answers: bool,
    pub allow_no_limited_answering: bool,
    /// Seconds; must be one of [`ANSWERING_TIME_LIMITS`].
    pub answering_time_limit: i32,
}

/// Raw question configuration values as submitted by a client.
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionConfigInput {
    pub answers_privacy: String,
    pub present_to_audience: bool,
    pub enabled: bool,
    pub allow_audience_answer: bool,
    pub allow_audience_create_questions: bool,
    pub auto_publish: bool,
    pub allow_audience_vote_questions: bool,
    pub allow_audience_vote_answers: bool,
}

/// Configuration values for either kind of interaction.
#[derive(Debug, Clone)]
pub enum ConfigInput {
    Poll(PollConfigInput),
    Question(QuestionConfigInput),
}

impl ConfigInput {
    /// Kind of interaction these values configure.
    #[must_use]
    pub const fn kind(&self) -> InteractionKind {
        match self {
            Self::Poll(_) => InteractionKind::Poll,
            Self::Question(_) => InteractionKind::Question,
        }
    }

    /// Convert into a row with a fresh id, rejecting values outside their closed sets.
    fn into_record(self, id: String) -> AppResult<ConfigRecord> {
        let now = Utc::now().into();

        match self {
            Self::Poll(input) => {
                let answers_privacy = parse_answers_privacy(&input.answers_privacy)?;
                if !ANSWERING_TIME_LIMITS.contains(&input.answering_time_limit) {
                    return Err(AppError::InvalidConfigValue(format!(
                        "answering_time_limit must be one of {ANSWERING_TIME_LIMITS:?}, got {}",
                        input.answering_time_limit
                    )));
                }

                Ok(ConfigRecord::Poll(poll_config::ActiveModel {
                    id: Set(id),
                    answers_privacy: Set(answers_privacy),
                    present_to_audience: Set(input.present_to_audience),
                    enabled: Set(input.enabled),
                    multiple_answers: Set(input.multiple_answers),
                    allow_no_limited_answering: Set(input.allow_no_limited_answering),
                    answering_time_limit: Set(input.answering_time_limit),
                    created_at: Set(now),
                }))
            }
            Self::Question(input) => {
                let answers_privacy = parse_answers_privacy(&input.answers_privacy)?;

                Ok(ConfigRecord::Question(question_config::ActiveModel {
                    id: Set(id),
                    answers_privacy: Set(answers_privacy),
                    present_to_audience: Set(input.present_to_audience),
                    enabled: Set(input.enabled),
                    allow_audience_answer: Set(input.allow_audience_answer),
                    allow_audience_create_questions: Set(input.allow_audience_create_questions),
                    auto_publish: Set(input.auto_publish),
                    allow_audience_vote_questions: Set(input.allow_audience_vote_questions),
                    allow_audience_vote_answers: Set(input.allow_audience_vote_answers),
                    created_at: Set(now),
                }))
            }
        }
    }
}

fn parse_answers_privacy(value: &str) -> AppResult<AnswersPrivacy> {
    AnswersPrivacy::try_from_value(&value.to_string()).map_err(|_| {
        AppError::InvalidConfigValue(format!(
            "answers_privacy must be EVERYONE, CREATOR_AND_SPEAKERS or CREATOR, got {value:?}"
        ))
    })
}

/// A validated row waiting to be inserted.
enum ConfigRecord {
    Poll(poll_config::ActiveModel),
    Question(question_config::ActiveModel),
}

/// A stored configuration of either kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum InteractionConfig {
    Poll(poll_config::Model),
    Question(question_config::Model),
}

impl InteractionConfig {
    /// Row id of the configuration.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Poll(config) => &config.id,
            Self::Question(config) => &config.id,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> InteractionKind {
        match self {
            Self::Poll(_) => InteractionKind::Poll,
            Self::Question(_) => InteractionKind::Question,
        }
    }

    #[must_use]
    pub const fn enabled(&self) -> bool {
        match self {
            Self::Poll(config) => config.enabled,
            Self::Question(config) => config.enabled,
        }
    }

    /// Unwrap a poll configuration.
    pub fn into_poll(self) -> AppResult<poll_config::Model> {
        match self {
            Self::Poll(config) => Ok(config),
            Self::Question(config) => Err(AppError::Internal(format!(
                "expected a poll configuration, found question configuration {}",
                config.id
            ))),
        }
    }

    /// Unwrap a question configuration.
    pub fn into_question(self) -> AppResult<question_config::Model> {
        match self {
            Self::Question(config) => Ok(config),
            Self::Poll(config) => Err(AppError::Internal(format!(
                "expected a question configuration, found poll configuration {}",
                config.id
            ))),
        }
    }
}

/// Default configuration id of `kind` held by an event.
fn default_id(event: &event_config::Model, kind: InteractionKind) -> Option<&String> {
    match kind {
        InteractionKind::Poll => event.default_poll_config_id.as_ref(),
        InteractionKind::Question => event.default_question_config_id.as_ref(),
    }
}

/// Resolves and maintains the effective configuration of polls and questions.
#[derive(Clone)]
pub struct ConfigResolver {
    db: Arc<DatabaseConnection>,
    event_config_repo: EventConfigRepository,
    id_gen: IdGenerator,
}

impl ConfigResolver {
    /// Create a new configuration resolver.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            event_config_repo: EventConfigRepository::new(Arc::clone(&db)),
            db,
            id_gen: IdGenerator::new(),
        }
    }

    // ==================== Event defaults ====================

    /// Get the configuration row of an event.
    pub async fn get_event_config(&self, event_id: &str) -> AppResult<event_config::Model> {
        self.event_config_repo.get_by_event(event_id).await
    }

    /// Get the default configuration of `kind` for an event.
    ///
    /// The event row is read under a shared lock, so a concurrent
    /// [`Self::set_default`] is observed either fully before or fully after.
    pub async fn get_default(
        &self,
        event_id: &str,
        kind: InteractionKind,
    ) -> AppResult<InteractionConfig> {
        let txn = self.db.begin().await.map_err(map_db_err)?;

        let event = EventConfigRepository::find_for_share(&txn, event_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Event not configured: {event_id}")))?;
        let config_id = default_id(&event, kind).ok_or_else(|| {
            AppError::NotFound(format!("No default {kind} configuration for event {event_id}"))
        })?;
        let config = load_config_in(&txn, kind, config_id).await?;

        txn.commit().await.map_err(map_db_err)?;
        Ok(config)
    }

    /// Replace (or first define) the default configuration of an event.
    ///
    /// The kind is taken from `input`. The new record is attached before the
    /// previous one is deleted, inside one transaction holding the event row
    /// lock, so readers see either the old default or the new one.
    pub async fn set_default(
        &self,
        event_id: &str,
        input: ConfigInput,
    ) -> AppResult<InteractionConfig> {
        // Reject bad values before opening a transaction
        input.clone().into_record(String::new())?;

        let input = &input;
        let config = retry_on_conflict("set_default_config", move || {
            self.set_default_once(event_id, input)
        })
        .await?;

        tracing::info!(
            event_id = %event_id,
            kind = %config.kind(),
            config_id = %config.id(),
            "Default configuration replaced"
        );

        Ok(config)
    }

    async fn set_default_once(
        &self,
        event_id: &str,
        input: &ConfigInput,
    ) -> AppResult<InteractionConfig> {
        let kind = input.kind();
        let txn = self.db.begin().await.map_err(map_db_err)?;

        let existing = EventConfigRepository::find_for_update(&txn, event_id).await?;
        let config = insert_record_in(&txn, input.clone().into_record(self.id_gen.generate())?)
            .await?;
        let new_id = Some(config.id().to_string());

        let previous = match existing {
            Some(event) => {
                let previous = default_id(&event, kind).cloned();

                let mut active: event_config::ActiveModel = event.into();
                match kind {
                    InteractionKind::Poll => active.default_poll_config_id = Set(new_id),
                    InteractionKind::Question => active.default_question_config_id = Set(new_id),
                }
                active.updated_at = Set(Some(Utc::now().into()));
                EventConfigRepository::update(&txn, active).await?;

                previous
            }
            None => {
                let (default_poll_config_id, default_question_config_id) = match kind {
                    InteractionKind::Poll => (new_id, None),
                    InteractionKind::Question => (None, new_id),
                };
                EventConfigRepository::create(
                    &txn,
                    event_config::ActiveModel {
                        event_id: Set(event_id.to_string()),
                        default_poll_config_id: Set(default_poll_config_id),
                        default_question_config_id: Set(default_question_config_id),
                        created_at: Set(Utc::now().into()),
                        updated_at: Set(None),
                    },
                )
                .await?;

                None
            }
        };

        if let Some(previous_id) = previous {
            let removed = delete_config_in(&txn, kind, &previous_id).await?;
            if removed == 0 {
                return Err(AppError::Conflict(format!(
                    "default {kind} configuration {previous_id} was replaced concurrently"
                )));
            }
        }

        txn.commit().await.map_err(map_db_err)?;
        Ok(config)
    }

    /// Flip the `enabled` flag of an event default in place, returning the new value.
    pub async fn toggle_default_enabled(
        &self,
        event_id: &str,
        kind: InteractionKind,
    ) -> AppResult<bool> {
        let txn = self.db.begin().await.map_err(map_db_err)?;

        let event = EventConfigRepository::find_for_update(&txn, event_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Event not configured: {event_id}")))?;
        let config_id = default_id(&event, kind).ok_or_else(|| {
            AppError::NotFound(format!("No default {kind} configuration for event {event_id}"))
        })?;

        let enabled = match load_config_in(&txn, kind, config_id).await? {
            InteractionConfig::Poll(config) => {
                let enabled = !config.enabled;
                let mut active: poll_config::ActiveModel = config.into();
                active.enabled = Set(enabled);
                ConfigRepository::update_poll_config(&txn, active).await?;
                enabled
            }
            InteractionConfig::Question(config) => {
                let enabled = !config.enabled;
                let mut active: question_config::ActiveModel = config.into();
                active.enabled = Set(enabled);
                ConfigRepository::update_question_config(&txn, active).await?;
                enabled
            }
        };

        txn.commit().await.map_err(map_db_err)?;

        tracing::debug!(event_id = %event_id, kind = %kind, enabled, "Default configuration toggled");
        Ok(enabled)
    }

    // ==================== Interaction configs ====================

    /// Configuration for a new interaction: custom values, or a copy of the
    /// event default when none are given.
    pub async fn resolve_for_create(
        &self,
        event_id: &str,
        kind: InteractionKind,
        custom: Option<ConfigInput>,
    ) -> AppResult<InteractionConfig> {
        let txn = self.db.begin().await.map_err(map_db_err)?;
        let config = self
            .resolve_for_create_in(&txn, event_id, kind, custom)
            .await?;
        txn.commit().await.map_err(map_db_err)?;
        Ok(config)
    }

    /// [`Self::resolve_for_create`] on `conn`.
    ///
    /// `conn` must be a transaction: the shared lock on the event row keeps
    /// the default being copied from disappearing until it commits.
    pub async fn resolve_for_create_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        event_id: &str,
        kind: InteractionKind,
        custom: Option<ConfigInput>,
    ) -> AppResult<InteractionConfig> {
        if let Some(input) = custom {
            if input.kind() != kind {
                return Err(AppError::InvalidConfigValue(format!(
                    "expected {kind} configuration, got {} configuration",
                    input.kind()
                )));
            }
            return insert_record_in(conn, input.into_record(self.id_gen.generate())?).await;
        }

        let default = match EventConfigRepository::find_for_share(conn, event_id).await? {
            Some(event) => default_id(&event, kind).cloned(),
            None => None,
        };
        let Some(default_id) = default else {
            return Err(AppError::ConfigurationRequired(kind.to_string()));
        };

        let id = self.id_gen.generate();
        let now = Utc::now().into();
        let record = match load_config_in(conn, kind, &default_id).await? {
            InteractionConfig::Poll(default) => ConfigRecord::Poll(poll_config::ActiveModel {
                id: Set(id),
                answers_privacy: Set(default.answers_privacy),
                present_to_audience: Set(default.present_to_audience),
                enabled: Set(default.enabled),
                multiple_answers: Set(default.multiple_answers),
                allow_no_limited_answering: Set(default.allow_no_limited_answering),
                answering_time_limit: Set(default.answering_time_limit),
                created_at: Set(now),
            }),
            InteractionConfig::Question(default) => {
                ConfigRecord::Question(question_config::ActiveModel {
                    id: Set(id),
                    answers_privacy: Set(default.answers_privacy),
                    present_to_audience: Set(default.present_to_audience),
                    enabled: Set(default.enabled),
                    allow_audience_answer: Set(default.allow_audience_answer),
                    allow_audience_create_questions: Set(default.allow_audience_create_questions),
                    auto_publish: Set(default.auto_publish),
                    allow_audience_vote_questions: Set(default.allow_audience_vote_questions),
                    allow_audience_vote_answers: Set(default.allow_audience_vote_answers),
                    created_at: Set(now),
                })
            }
        };

        let config = insert_record_in(conn, record).await?;
        tracing::debug!(
            event_id = %event_id,
            default_id = %default_id,
            config_id = %config.id(),
            "Cloned event default"
        );
        Ok(config)
    }

    /// Effective configuration of a poll or question.
    pub async fn get_for_interaction(
        &self,
        kind: InteractionKind,
        interaction_id: &str,
    ) -> AppResult<InteractionConfig> {
        let config_id = owned_config_id_in(self.db.as_ref(), kind, interaction_id).await?;
        load_config_in(self.db.as_ref(), kind, &config_id).await
    }

    /// Swap the owned configuration of an interaction for one built from `input`.
    pub async fn replace_custom(
        &self,
        kind: InteractionKind,
        interaction_id: &str,
        input: ConfigInput,
    ) -> AppResult<InteractionConfig> {
        let txn = self.db.begin().await.map_err(map_db_err)?;
        let config = self
            .replace_custom_in(&txn, kind, interaction_id, input)
            .await?;
        txn.commit().await.map_err(map_db_err)?;
        Ok(config)
    }

    /// [`Self::replace_custom`] on `conn`, typically an open transaction.
    ///
    /// The interaction is repointed before its previous record is deleted.
    pub async fn replace_custom_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        kind: InteractionKind,
        interaction_id: &str,
        input: ConfigInput,
    ) -> AppResult<InteractionConfig> {
        if input.kind() != kind {
            return Err(AppError::InvalidConfigValue(format!(
                "expected {kind} configuration, got {} configuration",
                input.kind()
            )));
        }
        let record = input.into_record(self.id_gen.generate())?;

        let previous_id = owned_config_id_in(conn, kind, interaction_id).await?;
        let config = insert_record_in(conn, record).await?;

        match kind {
            InteractionKind::Poll => {
                PollRepository::update(
                    conn,
                    poll::ActiveModel {
                        id: Set(interaction_id.to_string()),
                        config_id: Set(config.id().to_string()),
                        updated_at: Set(Some(Utc::now().into())),
                        ..Default::default()
                    },
                )
                .await?;
            }
            InteractionKind::Question => {
                QuestionRepository::update(
                    conn,
                    question::ActiveModel {
                        id: Set(interaction_id.to_string()),
                        config_id: Set(config.id().to_string()),
                        updated_at: Set(Some(Utc::now().into())),
                        ..Default::default()
                    },
                )
                .await?;
            }
        }

        if delete_config_in(conn, kind, &previous_id).await? == 0 {
            return Err(AppError::Conflict(format!(
                "{kind} configuration {previous_id} was replaced concurrently"
            )));
        }

        tracing::debug!(
            interaction_id = %interaction_id,
            kind = %kind,
            config_id = %config.id(),
            "Custom configuration replaced"
        );
        Ok(config)
    }
}

async fn owned_config_id_in<C: ConnectionTrait>(
    conn: &C,
    kind: InteractionKind,
    interaction_id: &str,
) -> AppResult<String> {
    match kind {
        InteractionKind::Poll => PollRepository::find_by_id_in(conn, interaction_id)
            .await?
            .map(|poll| poll.config_id)
            .ok_or_else(|| AppError::NotFound(format!("Poll not found: {interaction_id}"))),
        InteractionKind::Question => QuestionRepository::find_by_id_in(conn, interaction_id)
            .await?
            .map(|question| question.config_id)
            .ok_or_else(|| AppError::NotFound(format!("Question not found: {interaction_id}"))),
    }
}

pub(crate) async fn load_config_in<C: ConnectionTrait>(
    conn: &C,
    kind: InteractionKind,
    config_id: &str,
) -> AppResult<InteractionConfig> {
    match kind {
        InteractionKind::Poll => ConfigRepository::get_poll_config_in(conn, config_id)
            .await
            .map(InteractionConfig::Poll),
        InteractionKind::Question => ConfigRepository::get_question_config_in(conn, config_id)
            .await
            .map(InteractionConfig::Question),
    }
}

async fn insert_record_in<C: ConnectionTrait>(
    conn: &C,
    record: ConfigRecord,
) -> AppResult<InteractionConfig> {
    match record {
        ConfigRecord::Poll(model) => ConfigRepository::create_poll_config(conn, model)
            .await
            .map(InteractionConfig::Poll),
        ConfigRecord::Question(model) => ConfigRepository::create_question_config(conn, model)
            .await
            .map(InteractionConfig::Question),
    }
}

pub(crate) async fn delete_config_in<C: ConnectionTrait>(
    conn: &C,
    kind: InteractionKind,
    config_id: &str,
) -> AppResult<u64> {
    match kind {
        InteractionKind::Poll => ConfigRepository::delete_poll_config(conn, config_id).await,
        InteractionKind::Question => {
            ConfigRepository::delete_question_config(conn, config_id).await
        }
    }
}
