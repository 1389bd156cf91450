//! Service integration tests against a live database.
//!
//! These tests require a running `PostgreSQL` instance whose user may
//! create databases; each test creates and drops its own.
//! Run with: `cargo test -p interactions-core --test interactions_integration -- --ignored`
//!
//! Environment variables:
//!   `TEST_DB_HOST` (default: localhost)
//!   `TEST_DB_PORT` (default: 5432)
//!   `TEST_DB_USER` (default: `interactions_test`)
//!   `TEST_DB_PASSWORD` (default: `interactions_test`)

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use interactions_common::{AppError, IdentityConfig};
use interactions_core::{
    ConfigInput, ConfigResolver, CreatePollInput, IdentityProvisioner, InteractionKind,
    InteractionStore, PollConfigInput, TargetKind, VoteLedger,
};
use interactions_db::{
    entities::{poll_config::AnswersPrivacy, question},
    repositories::{ConfigRepository, ParticipantRepository, QuestionRepository},
    test_utils::TestDatabase,
};
use sea_orm::{DatabaseConnection, Set};
use serde_json::json;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

fn poll_values(multiple_answers: bool, answering_time_limit: i32) -> PollConfigInput {
    PollConfigInput {
        answers_privacy: "EVERYONE".to_string(),
        present_to_audience: true,
        enabled: true,
        multiple_answers,
        allow_no_limited_answering: false,
        answering_time_limit,
    }
}

async fn identity(db: &Arc<DatabaseConnection>, endpoint: &str) -> IdentityProvisioner {
    IdentityProvisioner::new(
        ParticipantRepository::new(Arc::clone(db)),
        &IdentityConfig {
            user_endpoint: endpoint.to_string(),
            timeout_secs: 5,
        },
    )
    .unwrap()
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_default_change_does_not_reach_existing_poll() {
    let test_db = TestDatabase::create_migrated().await.unwrap();
    let db = test_db.shared_connection().await.unwrap();

    let resolver = ConfigResolver::new(Arc::clone(&db));
    let store = InteractionStore::new(Arc::clone(&db), resolver.clone());
    let session = json!({"form_data": {"Email": "host@example.com", "Name": "Host"}});
    let creator = identity(&db, "http://127.0.0.1:9/")
        .await
        .resolve_session(&base64_encode(&session.to_string()))
        .await
        .unwrap();

    let missing = resolver
        .resolve_for_create("E1", InteractionKind::Poll, None)
        .await;
    assert!(matches!(missing, Err(AppError::ConfigurationRequired(_))));

    let first_default = resolver
        .set_default("E1", ConfigInput::Poll(poll_values(true, 30)))
        .await
        .unwrap();

    let poll = store
        .create_poll(
            "E1",
            &creator,
            CreatePollInput {
                question: "Encore?".to_string(),
                choices: vec!["Yes".to_string(), "No".to_string()],
                configuration: None,
            },
        )
        .await
        .unwrap();
    assert_ne!(poll.config.id, first_default.id());
    assert!(poll.config.multiple_answers);
    assert_eq!(poll.config.answers_privacy, AnswersPrivacy::Everyone);
    assert_eq!(poll.config.answering_time_limit, 30);

    let second_default = resolver
        .set_default("E1", ConfigInput::Poll(poll_values(false, 60)))
        .await
        .unwrap();

    let current = resolver
        .get_default("E1", InteractionKind::Poll)
        .await
        .unwrap();
    assert_eq!(current, second_default);

    // The replaced default record is gone
    assert!(
        ConfigRepository::new(Arc::clone(&db))
            .find_poll_config(first_default.id())
            .await
            .unwrap()
            .is_none()
    );

    // The existing poll kept its copy
    let reloaded = store.get_poll("E1", &poll.fields.id).await.unwrap();
    assert!(reloaded.config.multiple_answers);
    assert_eq!(reloaded.config.answering_time_limit, 30);

    test_db.drop_database().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "requires running PostgreSQL instance"]
async fn test_default_reads_never_miss_during_replacement() {
    const ROUNDS: usize = 200;
    const READERS: usize = 3;

    let test_db = TestDatabase::create_migrated().await.unwrap();
    let db = test_db.shared_connection().await.unwrap();
    let resolver = ConfigResolver::new(Arc::clone(&db));

    resolver
        .set_default("E1", ConfigInput::Poll(poll_values(true, 30)))
        .await
        .unwrap();

    let writer = {
        let resolver = resolver.clone();
        tokio::spawn(async move {
            for round in 0..ROUNDS {
                let limit = if round % 2 == 0 { 60 } else { 30 };
                resolver
                    .set_default("E1", ConfigInput::Poll(poll_values(round % 2 == 0, limit)))
                    .await
                    .unwrap();
            }
        })
    };

    let readers: Vec<_> = (0..READERS)
        .map(|_| {
            let resolver = resolver.clone();
            tokio::spawn(async move {
                let mut missing = 0usize;
                for _ in 0..ROUNDS {
                    match resolver.get_default("E1", InteractionKind::Poll).await {
                        Ok(_) => {}
                        Err(AppError::NotFound(_)) => missing += 1,
                        Err(other) => panic!("get_default failed: {other}"),
                    }
                    match resolver
                        .resolve_for_create("E1", InteractionKind::Poll, None)
                        .await
                    {
                        Ok(_) => {}
                        Err(AppError::NotFound(_)) => missing += 1,
                        Err(other) => panic!("resolve_for_create failed: {other}"),
                    }
                }
                missing
            })
        })
        .collect();

    writer.await.unwrap();
    let mut missing = 0;
    for reader in readers {
        missing += reader.await.unwrap();
    }
    assert_eq!(missing, 0, "a read observed neither the old nor the new default");

    test_db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_concurrent_toggles_converge() {
    let test_db = TestDatabase::create_migrated().await.unwrap();
    let db = test_db.shared_connection().await.unwrap();

    let session = json!({"form_data": {"Email": "viewer@example.com", "Name": "Viewer"}});
    let voter = identity(&db, "http://127.0.0.1:9/")
        .await
        .resolve_session(&base64_encode(&session.to_string()))
        .await
        .unwrap();

    ConfigRepository::create_question_config(
        db.as_ref(),
        interactions_db::entities::question_config::ActiveModel {
            id: Set("qc1".to_string()),
            answers_privacy: Set(AnswersPrivacy::Everyone),
            present_to_audience: Set(true),
            enabled: Set(true),
            allow_audience_answer: Set(true),
            allow_audience_create_questions: Set(true),
            auto_publish: Set(true),
            allow_audience_vote_questions: Set(true),
            allow_audience_vote_answers: Set(true),
            created_at: Set(chrono::Utc::now().into()),
        },
    )
    .await
    .unwrap();
    QuestionRepository::create(
        db.as_ref(),
        question::ActiveModel {
            id: Set("q1".to_string()),
            event_id: Set("E1".to_string()),
            creator_id: Set(voter.id.clone()),
            question: Set("Replay?".to_string()),
            config_id: Set("qc1".to_string()),
            published: Set(true),
            streaming: Set(false),
            created_at: Set(chrono::Utc::now().into()),
            updated_at: Set(None),
        },
    )
    .await
    .unwrap();

    let ledger = VoteLedger::new(Arc::clone(&db));

    // Sequential toggles are an involution
    assert!(ledger.toggle("E1", &voter.id, TargetKind::Question, "q1").await.unwrap().voted);
    assert_eq!(ledger.count(TargetKind::Question, "q1").await.unwrap(), 1);
    assert!(!ledger.toggle("E1", &voter.id, TargetKind::Question, "q1").await.unwrap().voted);
    assert_eq!(ledger.count(TargetKind::Question, "q1").await.unwrap(), 0);

    // Three racing toggles flip membership exactly once
    let (a, b, c) = tokio::join!(
        ledger.toggle("E1", &voter.id, TargetKind::Question, "q1"),
        ledger.toggle("E1", &voter.id, TargetKind::Question, "q1"),
        ledger.toggle("E1", &voter.id, TargetKind::Question, "q1"),
    );
    let succeeded = [a, b, c].into_iter().filter(Result::is_ok).count();
    let expected = u64::from(succeeded % 2 == 1);
    assert_eq!(ledger.count(TargetKind::Question, "q1").await.unwrap(), expected);

    test_db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_same_remote_username_same_participant() {
    let test_db = TestDatabase::create_migrated().await.unwrap();
    let db = test_db.shared_connection().await.unwrap();

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!({"username": "alice", "email": "alice@example.com", "screen_name": "Alice"}),
        ))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!({"username": "alice", "email": "alice@example.com", "screen_name": "Alice B."}),
        ))
        .mount(&server)
        .await;

    let provisioner = identity(&db, &server.uri()).await;
    let first = provisioner.resolve_token("Token one").await.unwrap();
    let second = provisioner.resolve_token("Token two").await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.screen_name, "Alice B.");

    test_db.drop_database().await.unwrap();
}

fn base64_encode(raw: &str) -> String {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD.encode(raw)
}
