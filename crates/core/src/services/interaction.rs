//! Interaction store: polls, questions, choices and answers.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use interactions_common::{AppError, AppResult, IdGenerator};
use interactions_db::{
    entities::{
        choice, participant, poll, poll_answer, poll_config, question, question_answer,
        question_config,
    },
    map_db_err,
    repositories::{
        AnswerRepository, ChoiceRepository, ConfigRepository, PollRepository, QuestionRepository,
    },
};
use sea_orm::{
    DatabaseConnection, DatabaseTransaction, Set, TransactionTrait,
    prelude::DateTimeWithTimeZone,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::config_resolver::{
    ConfigInput, ConfigResolver, InteractionKind, PollConfigInput, QuestionConfigInput,
    delete_config_in, load_config_in,
};

/// Maximum length of question, choice and answer texts.
const MAX_TEXT_LENGTH: usize = 256;

/// Fields shared by polls and questions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InteractionFields {
    pub id: String,
    pub event_id: String,
    pub creator_id: String,
    pub question: String,
    pub published: bool,
    pub streaming: bool,
    pub created_at: DateTimeWithTimeZone,
}

impl From<&poll::Model> for InteractionFields {
    fn from(poll: &poll::Model) -> Self {
        Self {
            id: poll.id.clone(),
            event_id: poll.event_id.clone(),
            creator_id: poll.creator_id.clone(),
            question: poll.question.clone(),
            published: poll.published,
            streaming: poll.streaming,
            created_at: poll.created_at,
        }
    }
}

impl From<&question::Model> for InteractionFields {
    fn from(question: &question::Model) -> Self {
        Self {
            id: question.id.clone(),
            event_id: question.event_id.clone(),
            creator_id: question.creator_id.clone(),
            question: question.question.clone(),
            published: question.published,
            streaming: question.streaming,
            created_at: question.created_at,
        }
    }
}

/// A poll with its configuration and ordered choices.
#[derive(Debug, Clone, Serialize)]
pub struct Poll {
    #[serde(flatten)]
    pub fields: InteractionFields,
    pub config: poll_config::Model,
    pub choices: Vec<choice::Model>,
}

/// A question with its configuration.
#[derive(Debug, Clone, Serialize)]
pub struct Question {
    #[serde(flatten)]
    pub fields: InteractionFields,
    pub config: question_config::Model,
}

/// An answer to a poll with the choices it selected.
#[derive(Debug, Clone, Serialize)]
pub struct PollAnswer {
    #[serde(flatten)]
    pub answer: poll_answer::Model,
    pub selected_choice_ids: Vec<String>,
}

/// An answer to either kind of interaction.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Answer {
    Poll(PollAnswer),
    Question(question_answer::Model),
}

/// What a participant submits as an answer.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnswerPayload {
    Poll {
        poll_id: String,
        selected_choice_ids: Vec<String>,
    },
    Question {
        question_id: String,
        text: String,
    },
}

/// Input for creating a poll.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePollInput {
    #[validate(length(min = 1, max = 256))]
    pub question: String,
    #[validate(length(min = 1))]
    pub choices: Vec<String>,
    pub configuration: Option<PollConfigInput>,
}

/// Input for creating a question.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateQuestionInput {
    #[validate(length(min = 1, max = 256))]
    pub question: String,
    pub configuration: Option<QuestionConfigInput>,
}

/// Edit of an existing choice.
#[derive(Debug, Clone, Deserialize)]
pub struct ChoiceEdit {
    pub id: String,
    pub text: Option<String>,
    #[serde(default)]
    pub delete: bool,
}

/// Input for updating a poll.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdatePollInput {
    #[validate(length(min = 1, max = 256))]
    pub question: Option<String>,
    pub published: Option<bool>,
    pub streaming: Option<bool>,
    pub choices: Option<Vec<ChoiceEdit>>,
    pub configuration: Option<PollConfigInput>,
}

/// Input for updating a question.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateQuestionInput {
    #[validate(length(min = 1, max = 256))]
    pub question: Option<String>,
    pub published: Option<bool>,
    pub streaming: Option<bool>,
    pub configuration: Option<QuestionConfigInput>,
}

fn check_text(what: &str, text: &str) -> AppResult<()> {
    if text.trim().is_empty() {
        return Err(AppError::BadRequest(format!("{what} cannot be empty")));
    }
    if text.chars().count() > MAX_TEXT_LENGTH {
        return Err(AppError::BadRequest(format!(
            "{what} is too long (max {MAX_TEXT_LENGTH} characters)"
        )));
    }
    Ok(())
}

/// Owns the lifecycle of polls, questions, choices and answers.
#[derive(Clone)]
pub struct InteractionStore {
    db: Arc<DatabaseConnection>,
    resolver: ConfigResolver,
    poll_repo: PollRepository,
    choice_repo: ChoiceRepository,
    question_repo: QuestionRepository,
    answer_repo: AnswerRepository,
    config_repo: ConfigRepository,
    id_gen: IdGenerator,
}

impl InteractionStore {
    /// Create a new interaction store.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>, resolver: ConfigResolver) -> Self {
        Self {
            poll_repo: PollRepository::new(Arc::clone(&db)),
            choice_repo: ChoiceRepository::new(Arc::clone(&db)),
            question_repo: QuestionRepository::new(Arc::clone(&db)),
            answer_repo: AnswerRepository::new(Arc::clone(&db)),
            config_repo: ConfigRepository::new(Arc::clone(&db)),
            db,
            resolver,
            id_gen: IdGenerator::new(),
        }
    }

    async fn begin(&self) -> AppResult<DatabaseTransaction> {
        self.db.begin().await.map_err(map_db_err)
    }

    // ==================== Polls ====================

    /// Create a poll and its choices in one transaction.
    pub async fn create_poll(
        &self,
        event_id: &str,
        creator: &participant::Model,
        input: CreatePollInput,
    ) -> AppResult<Poll> {
        check_text("Question", &input.question)?;
        input.validate()?;
        for text in &input.choices {
            check_text("Choice", text)?;
        }

        let txn = self.begin().await?;

        let config = self
            .resolver
            .resolve_for_create_in(
                &txn,
                event_id,
                InteractionKind::Poll,
                input.configuration.map(ConfigInput::Poll),
            )
            .await?
            .into_poll()?;

        let now = Utc::now();
        let poll = PollRepository::create(
            &txn,
            poll::ActiveModel {
                id: Set(self.id_gen.generate()),
                event_id: Set(event_id.to_string()),
                creator_id: Set(creator.id.clone()),
                question: Set(input.question),
                config_id: Set(config.id.clone()),
                published: Set(false),
                streaming: Set(false),
                created_at: Set(now.into()),
                updated_at: Set(None),
            },
        )
        .await?;

        let mut choices = Vec::with_capacity(input.choices.len());
        for (position, text) in input.choices.into_iter().enumerate() {
            let created = ChoiceRepository::create(
                &txn,
                choice::ActiveModel {
                    id: Set(self.id_gen.generate()),
                    poll_id: Set(poll.id.clone()),
                    text: Set(text),
                    position: Set(position as i32),
                },
            )
            .await?;
            choices.push(created);
        }

        txn.commit().await.map_err(map_db_err)?;

        tracing::info!(
            event_id = %event_id,
            poll_id = %poll.id,
            choices = choices.len(),
            "Poll created"
        );

        Ok(Poll {
            fields: InteractionFields::from(&poll),
            config,
            choices,
        })
    }

    /// Get a poll of an event.
    pub async fn get_poll(&self, event_id: &str, poll_id: &str) -> AppResult<Poll> {
        let poll = PollRepository::get_in_event(self.db.as_ref(), event_id, poll_id).await?;
        let config =
            load_config_in(self.db.as_ref(), InteractionKind::Poll, &poll.config_id).await?;
        let choices = self.choice_repo.find_by_poll(&poll.id).await?;

        Ok(Poll {
            fields: InteractionFields::from(&poll),
            config: config.into_poll()?,
            choices,
        })
    }

    /// List the polls of an event (newest first).
    pub async fn list_polls(&self, event_id: &str) -> AppResult<Vec<Poll>> {
        let polls = self.poll_repo.find_by_event(event_id).await?;

        let poll_ids: Vec<String> = polls.iter().map(|p| p.id.clone()).collect();
        let config_ids: Vec<String> = polls.iter().map(|p| p.config_id.clone()).collect();

        let mut choices_by_poll: HashMap<String, Vec<choice::Model>> = HashMap::new();
        for choice in self.choice_repo.find_by_polls(&poll_ids).await? {
            choices_by_poll
                .entry(choice.poll_id.clone())
                .or_default()
                .push(choice);
        }
        let mut configs: HashMap<String, poll_config::Model> = self
            .config_repo
            .find_poll_configs(&config_ids)
            .await?
            .into_iter()
            .map(|c| (c.id.clone(), c))
            .collect();

        polls
            .into_iter()
            .map(|poll| -> AppResult<Poll> {
                let config = configs.remove(&poll.config_id).ok_or_else(|| {
                    AppError::Internal(format!("Poll {} has no configuration", poll.id))
                })?;
                Ok(Poll {
                    fields: InteractionFields::from(&poll),
                    config,
                    choices: choices_by_poll.remove(&poll.id).unwrap_or_default(),
                })
            })
            .collect()
    }

    /// Update a poll's fields, choices and (optionally) its configuration.
    pub async fn update_poll(
        &self,
        event_id: &str,
        poll_id: &str,
        input: UpdatePollInput,
    ) -> AppResult<Poll> {
        if let Some(question) = &input.question {
            check_text("Question", question)?;
        }
        input.validate()?;

        let txn = self.begin().await?;
        let mut poll = PollRepository::get_in_event(&txn, event_id, poll_id).await?;

        if input.question.is_some() || input.published.is_some() || input.streaming.is_some() {
            let mut active: poll::ActiveModel = poll.into();
            if let Some(question) = input.question {
                active.question = Set(question);
            }
            if let Some(published) = input.published {
                active.published = Set(published);
            }
            if let Some(streaming) = input.streaming {
                active.streaming = Set(streaming);
            }
            active.updated_at = Set(Some(Utc::now().into()));
            poll = PollRepository::update(&txn, active).await?;
        }

        if let Some(edits) = input.choices {
            Self::apply_choice_edits(&txn, &poll.id, edits).await?;
        }

        let config = match input.configuration {
            Some(values) => {
                self.resolver
                    .replace_custom_in(
                        &txn,
                        InteractionKind::Poll,
                        &poll.id,
                        ConfigInput::Poll(values),
                    )
                    .await?
            }
            None => load_config_in(&txn, InteractionKind::Poll, &poll.config_id).await?,
        };
        let choices = ChoiceRepository::find_by_poll_in(&txn, &poll.id).await?;

        txn.commit().await.map_err(map_db_err)?;

        tracing::debug!(event_id = %event_id, poll_id = %poll.id, "Poll updated");

        Ok(Poll {
            fields: InteractionFields::from(&poll),
            config: config.into_poll()?,
            choices,
        })
    }

    async fn apply_choice_edits(
        txn: &DatabaseTransaction,
        poll_id: &str,
        edits: Vec<ChoiceEdit>,
    ) -> AppResult<()> {
        let existing = ChoiceRepository::find_by_poll_in(txn, poll_id).await?;
        let existing_count = existing.len();
        let mut by_id: HashMap<String, choice::Model> =
            existing.into_iter().map(|c| (c.id.clone(), c)).collect();

        let mut to_delete = Vec::new();
        for edit in edits {
            let Some(current) = by_id.remove(&edit.id) else {
                return Err(AppError::BadRequest(format!(
                    "Choice {} does not belong to poll {poll_id}",
                    edit.id
                )));
            };

            if edit.delete {
                to_delete.push(edit.id);
            } else if let Some(text) = edit.text {
                check_text("Choice", &text)?;
                let mut active: choice::ActiveModel = current.into();
                active.text = Set(text);
                ChoiceRepository::update(txn, active).await?;
            }
        }

        if !to_delete.is_empty() && to_delete.len() == existing_count {
            return Err(AppError::BadRequest(format!(
                "Poll {poll_id} must keep at least one choice"
            )));
        }

        ChoiceRepository::delete_many(txn, poll_id, &to_delete).await?;
        Ok(())
    }

    /// Delete a poll together with its choices, answers and configuration.
    pub async fn delete_poll(&self, event_id: &str, poll_id: &str) -> AppResult<()> {
        let txn = self.begin().await?;
        let poll = PollRepository::get_in_event(&txn, event_id, poll_id).await?;

        PollRepository::delete(&txn, &poll.id).await?;
        delete_config_in(&txn, InteractionKind::Poll, &poll.config_id).await?;

        txn.commit().await.map_err(map_db_err)?;

        tracing::info!(event_id = %event_id, poll_id = %poll_id, "Poll deleted");
        Ok(())
    }

    // ==================== Questions ====================

    /// Create a question; it is published when its configuration auto-publishes.
    pub async fn create_question(
        &self,
        event_id: &str,
        creator: &participant::Model,
        input: CreateQuestionInput,
    ) -> AppResult<Question> {
        check_text("Question", &input.question)?;
        input.validate()?;

        let txn = self.begin().await?;

        let config = self
            .resolver
            .resolve_for_create_in(
                &txn,
                event_id,
                InteractionKind::Question,
                input.configuration.map(ConfigInput::Question),
            )
            .await?
            .into_question()?;

        let question = QuestionRepository::create(
            &txn,
            question::ActiveModel {
                id: Set(self.id_gen.generate()),
                event_id: Set(event_id.to_string()),
                creator_id: Set(creator.id.clone()),
                question: Set(input.question),
                config_id: Set(config.id.clone()),
                published: Set(config.auto_publish),
                streaming: Set(false),
                created_at: Set(Utc::now().into()),
                updated_at: Set(None),
            },
        )
        .await?;

        txn.commit().await.map_err(map_db_err)?;

        tracing::info!(
            event_id = %event_id,
            question_id = %question.id,
            published = question.published,
            "Question created"
        );

        Ok(Question {
            fields: InteractionFields::from(&question),
            config,
        })
    }

    /// Get a question of an event.
    pub async fn get_question(&self, event_id: &str, question_id: &str) -> AppResult<Question> {
        let question =
            QuestionRepository::get_in_event(self.db.as_ref(), event_id, question_id).await?;
        let config =
            load_config_in(self.db.as_ref(), InteractionKind::Question, &question.config_id)
                .await?;

        Ok(Question {
            fields: InteractionFields::from(&question),
            config: config.into_question()?,
        })
    }

    /// List the questions of an event (newest first).
    pub async fn list_questions(&self, event_id: &str) -> AppResult<Vec<Question>> {
        let questions = self.question_repo.find_by_event(event_id).await?;

        let config_ids: Vec<String> = questions.iter().map(|q| q.config_id.clone()).collect();
        let mut configs: HashMap<String, question_config::Model> = self
            .config_repo
            .find_question_configs(&config_ids)
            .await?
            .into_iter()
            .map(|c| (c.id.clone(), c))
            .collect();

        questions
            .into_iter()
            .map(|question| -> AppResult<Question> {
                let config = configs.remove(&question.config_id).ok_or_else(|| {
                    AppError::Internal(format!("Question {} has no configuration", question.id))
                })?;
                Ok(Question {
                    fields: InteractionFields::from(&question),
                    config,
                })
            })
            .collect()
    }

    /// Update a question's fields and (optionally) its configuration.
    pub async fn update_question(
        &self,
        event_id: &str,
        question_id: &str,
        input: UpdateQuestionInput,
    ) -> AppResult<Question> {
        if let Some(question) = &input.question {
            check_text("Question", question)?;
        }
        input.validate()?;

        let txn = self.begin().await?;
        let mut question = QuestionRepository::get_in_event(&txn, event_id, question_id).await?;

        if input.question.is_some() || input.published.is_some() || input.streaming.is_some() {
            let mut active: question::ActiveModel = question.into();
            if let Some(text) = input.question {
                active.question = Set(text);
            }
            if let Some(published) = input.published {
                active.published = Set(published);
            }
            if let Some(streaming) = input.streaming {
                active.streaming = Set(streaming);
            }
            active.updated_at = Set(Some(Utc::now().into()));
            question = QuestionRepository::update(&txn, active).await?;
        }

        let config = match input.configuration {
            Some(values) => {
                self.resolver
                    .replace_custom_in(
                        &txn,
                        InteractionKind::Question,
                        &question.id,
                        ConfigInput::Question(values),
                    )
                    .await?
            }
            None => load_config_in(&txn, InteractionKind::Question, &question.config_id).await?,
        };

        txn.commit().await.map_err(map_db_err)?;

        tracing::debug!(event_id = %event_id, question_id = %question.id, "Question updated");

        Ok(Question {
            fields: InteractionFields::from(&question),
            config: config.into_question()?,
        })
    }

    /// Delete a question together with its answers, votes and configuration.
    pub async fn delete_question(&self, event_id: &str, question_id: &str) -> AppResult<()> {
        let txn = self.begin().await?;
        let question = QuestionRepository::get_in_event(&txn, event_id, question_id).await?;

        QuestionRepository::delete(&txn, &question.id).await?;
        delete_config_in(&txn, InteractionKind::Question, &question.config_id).await?;

        txn.commit().await.map_err(map_db_err)?;

        tracing::info!(event_id = %event_id, question_id = %question_id, "Question deleted");
        Ok(())
    }

    // ==================== Answers ====================

    /// Record a participant's answer to a poll or question of an event.
    pub async fn create_answer(
        &self,
        event_id: &str,
        participant: &participant::Model,
        payload: AnswerPayload,
    ) -> AppResult<Answer> {
        match payload {
            AnswerPayload::Poll {
                poll_id,
                selected_choice_ids,
            } => self
                .create_poll_answer(event_id, participant, &poll_id, selected_choice_ids)
                .await
                .map(Answer::Poll),
            AnswerPayload::Question { question_id, text } => self
                .create_question_answer(event_id, participant, &question_id, text)
                .await
                .map(Answer::Question),
        }
    }

    async fn create_poll_answer(
        &self,
        event_id: &str,
        participant: &participant::Model,
        poll_id: &str,
        selected_choice_ids: Vec<String>,
    ) -> AppResult<PollAnswer> {
        let poll = PollRepository::get_in_event(self.db.as_ref(), event_id, poll_id).await?;
        let config = load_config_in(self.db.as_ref(), InteractionKind::Poll, &poll.config_id)
            .await?
            .into_poll()?;

        // Collapse duplicates, keeping the submitted order
        let mut seen = HashSet::new();
        let selected: Vec<String> = selected_choice_ids
            .into_iter()
            .filter(|id| seen.insert(id.clone()))
            .collect();

        if selected.is_empty() {
            return Err(AppError::BadRequest(
                "An answer must select at least one choice".to_string(),
            ));
        }

        let valid: HashSet<String> = self
            .choice_repo
            .find_by_poll(&poll.id)
            .await?
            .into_iter()
            .map(|c| c.id)
            .collect();
        if let Some(unknown) = selected.iter().find(|id| !valid.contains(*id)) {
            return Err(AppError::BadRequest(format!(
                "Choice {unknown} does not belong to poll {}",
                poll.id
            )));
        }

        if !config.multiple_answers && selected.len() > 1 {
            return Err(AppError::TooManyChoices {
                selected: selected.len(),
                allowed: 1,
            });
        }

        let txn = self.begin().await?;
        let answer = AnswerRepository::create_poll_answer(
            &txn,
            poll_answer::ActiveModel {
                id: Set(self.id_gen.generate()),
                poll_id: Set(poll.id.clone()),
                participant_id: Set(participant.id.clone()),
                created_at: Set(Utc::now().into()),
            },
        )
        .await?;
        AnswerRepository::create_selections(&txn, &answer.id, &selected).await?;
        txn.commit().await.map_err(map_db_err)?;

        tracing::debug!(
            poll_id = %poll.id,
            participant_id = %participant.id,
            selected = selected.len(),
            "Poll answered"
        );

        Ok(PollAnswer {
            answer,
            selected_choice_ids: selected,
        })
    }

    async fn create_question_answer(
        &self,
        event_id: &str,
        participant: &participant::Model,
        question_id: &str,
        text: String,
    ) -> AppResult<question_answer::Model> {
        check_text("Answer", &text)?;
        let question =
            QuestionRepository::get_in_event(self.db.as_ref(), event_id, question_id).await?;

        let answer = AnswerRepository::create_question_answer(
            self.db.as_ref(),
            question_answer::ActiveModel {
                id: Set(self.id_gen.generate()),
                question_id: Set(question.id.clone()),
                participant_id: Set(participant.id.clone()),
                text: Set(text),
                created_at: Set(Utc::now().into()),
            },
        )
        .await?;

        tracing::debug!(
            question_id = %question.id,
            participant_id = %participant.id,
            "Question answered"
        );
        Ok(answer)
    }

    /// List the answers of a poll or question (oldest first).
    pub async fn list_answers(
        &self,
        kind: InteractionKind,
        interaction_id: &str,
    ) -> AppResult<Vec<Answer>> {
        match kind {
            InteractionKind::Poll => {
                let answers = self.answer_repo.find_poll_answers(interaction_id).await?;
                let answer_ids: Vec<String> = answers.iter().map(|a| a.id.clone()).collect();

                let mut selections: HashMap<String, Vec<String>> = HashMap::new();
                for selection in self.answer_repo.find_selections(&answer_ids).await? {
                    selections
                        .entry(selection.answer_id)
                        .or_default()
                        .push(selection.choice_id);
                }

                Ok(answers
                    .into_iter()
                    .map(|answer| {
                        let selected_choice_ids =
                            selections.remove(&answer.id).unwrap_or_default();
                        Answer::Poll(PollAnswer {
                            answer,
                            selected_choice_ids,
                        })
                    })
                    .collect())
            }
            InteractionKind::Question => Ok(self
                .answer_repo
                .find_question_answers(interaction_id)
                .await?
                .into_iter()
                .map(Answer::Question)
                .collect()),
        }
    }

    /// Delete an answer (selections and votes cascade).
    pub async fn delete_answer(&self, kind: InteractionKind, answer_id: &str) -> AppResult<()> {
        let removed = match kind {
            InteractionKind::Poll => {
                AnswerRepository::delete_poll_answer(self.db.as_ref(), answer_id).await?
            }
            InteractionKind::Question => {
                AnswerRepository::delete_question_answer(self.db.as_ref(), answer_id).await?
            }
        };

        if removed == 0 {
            return Err(AppError::NotFound(format!("Answer not found: {answer_id}")));
        }
        Ok(())
    }
}
