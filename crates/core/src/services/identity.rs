//! Identity provisioning service.
//!
//! Maps inbound credentials to local participant records. Bearer tokens are
//! checked against the remote identity service; viewer sessions carry their
//! identity in an encoded form payload and need no remote call.

use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::Utc;
use interactions_common::{AppError, AppResult, AuthFailure, IdGenerator, IdentityConfig};
use interactions_db::{
    entities::{participant, participant::ParticipantKind},
    repositories::ParticipantRepository,
};
use reqwest::{
    StatusCode,
    header::{ACCEPT, AUTHORIZATION, HeaderValue},
};
use sea_orm::Set;
use serde::Deserialize;
use url::Url;

use super::retry::retry_on_conflict;

/// Default page size for participant listings.
const DEFAULT_LIST_LIMIT: u64 = 100;

/// Account returned by the remote identity service.
#[derive(Debug, Deserialize)]
struct RemoteAccount {
    username: String,
    email: String,
    screen_name: String,
}

/// Decoded viewer session payload.
#[derive(Debug, Deserialize)]
struct SessionPayload {
    form_data: SessionForm,
}

#[derive(Debug, Deserialize)]
struct SessionForm {
    #[serde(rename = "Email")]
    email: String,
    #[serde(rename = "Name")]
    name: String,
}

/// Resolves credentials to participants, creating or refreshing the local record.
#[derive(Clone)]
pub struct IdentityProvisioner {
    participant_repo: ParticipantRepository,
    http_client: reqwest::Client,
    user_endpoint: Url,
    id_gen: IdGenerator,
}

impl IdentityProvisioner {
    /// Create a new identity provisioner.
    pub fn new(
        participant_repo: ParticipantRepository,
        config: &IdentityConfig,
    ) -> AppResult<Self> {
        let user_endpoint = Url::parse(&config.user_endpoint)?;
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| AppError::Config(e.to_string()))?;

        Ok(Self {
            participant_repo,
            http_client,
            user_endpoint,
            id_gen: IdGenerator::new(),
        })
    }

    /// Authenticate an `Authorization` header value.
    ///
    /// `Token <key>` is checked remotely (the whole header is forwarded);
    /// `ViewerSession <payload>` is decoded locally.
    pub async fn authenticate(&self, header: &str) -> AppResult<participant::Model> {
        match header.trim().split_once(' ') {
            Some(("Token", key)) if !key.trim().is_empty() => {
                self.resolve_token(header.trim()).await
            }
            Some(("ViewerSession", payload)) => self.resolve_session(payload.trim()).await,
            _ => Err(AuthFailure::Malformed("unsupported authorization scheme".to_string()).into()),
        }
    }

    /// Resolve a bearer token through the remote identity service.
    ///
    /// The participant is created as `SYSTEM` on first sight; later calls
    /// refresh its email and screen name.
    pub async fn resolve_token(&self, token: &str) -> AppResult<participant::Model> {
        let authorization = HeaderValue::from_str(token)
            .map_err(|_| AuthFailure::Malformed("token is not a valid header value".to_string()))?;

        let response = self
            .http_client
            .get(self.user_endpoint.clone())
            .header(AUTHORIZATION, authorization)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Identity service unreachable");
                AuthFailure::Unavailable(e.to_string())
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            tracing::debug!(status = status.as_u16(), "Identity service rejected token");
            return Err(AuthFailure::Rejected(status.as_u16()).into());
        }

        let account: RemoteAccount = response
            .json()
            .await
            .map_err(|e| AuthFailure::Malformed(format!("unexpected identity payload: {e}")))?;

        let account = &account;
        let participant = retry_on_conflict("provision_token_participant", move || {
            self.participant_repo.upsert_refresh(participant::ActiveModel {
                id: Set(self.id_gen.generate()),
                username: Set(account.username.clone()),
                email: Set(account.email.clone()),
                screen_name: Set(account.screen_name.clone()),
                kind: Set(ParticipantKind::System),
                created_at: Set(Utc::now().into()),
                updated_at: Set(None),
            })
        })
        .await?;

        tracing::debug!(
            participant_id = %participant.id,
            username = %participant.username,
            "Token resolved"
        );
        Ok(participant)
    }

    /// Resolve a base64-encoded viewer session payload.
    ///
    /// The email doubles as the account username.
    pub async fn resolve_session(&self, encoded: &str) -> AppResult<participant::Model> {
        let raw = STANDARD
            .decode(encoded)
            .map_err(|e| AuthFailure::Malformed(format!("session is not base64: {e}")))?;
        let payload: SessionPayload = serde_json::from_slice(&raw)
            .map_err(|e| AuthFailure::Malformed(format!("unexpected session payload: {e}")))?;

        let form = &payload.form_data;
        if form.email.trim().is_empty() {
            return Err(AuthFailure::Malformed("session has no email".to_string()).into());
        }

        retry_on_conflict("provision_session_participant", move || {
            self.get_or_create_session_participant(form)
        })
        .await
    }

    async fn get_or_create_session_participant(
        &self,
        form: &SessionForm,
    ) -> AppResult<participant::Model> {
        if let Some(existing) = self.participant_repo.find_by_username(&form.email).await? {
            return Ok(existing);
        }

        let participant = self
            .participant_repo
            .create(participant::ActiveModel {
                id: Set(self.id_gen.generate()),
                username: Set(form.email.clone()),
                email: Set(form.email.clone()),
                screen_name: Set(form.name.clone()),
                kind: Set(ParticipantKind::Participant),
                created_at: Set(Utc::now().into()),
                updated_at: Set(None),
            })
            .await?;

        tracing::info!(participant_id = %participant.id, "Session participant created");
        Ok(participant)
    }

    /// Get a participant by ID.
    pub async fn find_participant(&self, id: &str) -> AppResult<participant::Model> {
        self.participant_repo.get_by_id(id).await
    }

    /// List participants (paginated, newest first).
    pub async fn list_participants(
        &self,
        limit: Option<u64>,
        until_id: Option<&str>,
    ) -> AppResult<Vec<participant::Model>> {
        self.participant_repo
            .find_all(limit.unwrap_or(DEFAULT_LIST_LIMIT), until_id)
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn create_test_participant(
        id: &str,
        username: &str,
        screen_name: &str,
        kind: ParticipantKind,
    ) -> participant::Model {
        participant::Model {
            id: id.to_string(),
            username: username.to_string(),
            email: format!("{username}@example.com"),
            screen_name: screen_name.to_string(),
            kind,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn provisioner(db: MockDatabase, endpoint: &str, timeout_secs: u64) -> IdentityProvisioner {
        let repo = ParticipantRepository::new(Arc::new(db.into_connection()));
        IdentityProvisioner::new(
            repo,
            &IdentityConfig {
                user_endpoint: endpoint.to_string(),
                timeout_secs,
            },
        )
        .unwrap()
    }

    async fn identity_server(status: u16, body: serde_json::Value) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest-auth/user/"))
            .and(header("Authorization", "Token abc123"))
            .and(header("Accept", "application/json"))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_resolve_token_provisions_participant() {
        let server = identity_server(
            200,
            json!({"username": "alice", "email": "alice@example.com", "screen_name": "Alice"}),
        )
        .await;
        let db = MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[
            create_test_participant("p1", "alice", "Alice", ParticipantKind::System),
        ]]);

        let service = provisioner(db, &format!("{}/rest-auth/user/", server.uri()), 5);
        let participant = service.resolve_token("Token abc123").await.unwrap();

        assert_eq!(participant.id, "p1");
        assert_eq!(participant.kind, ParticipantKind::System);
    }

    #[tokio::test]
    async fn test_resolve_token_same_username_same_participant() {
        let server = identity_server(
            200,
            json!({"username": "alice", "email": "alice@example.com", "screen_name": "Alice B."}),
        )
        .await;
        let db = MockDatabase::new(DatabaseBackend::Postgres).append_query_results([
            [create_test_participant("p1", "alice", "Alice", ParticipantKind::System)],
            [create_test_participant("p1", "alice", "Alice B.", ParticipantKind::System)],
        ]);

        let service = provisioner(db, &format!("{}/rest-auth/user/", server.uri()), 5);
        let first = service.resolve_token("Token abc123").await.unwrap();
        let second = service.resolve_token("Token abc123").await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.screen_name, "Alice B.");
    }

    #[tokio::test]
    async fn test_resolve_token_rejected() {
        let server = identity_server(401, json!({"detail": "Invalid token."})).await;
        let db = MockDatabase::new(DatabaseBackend::Postgres);

        let service = provisioner(db, &format!("{}/rest-auth/user/", server.uri()), 5);
        let result = service.resolve_token("Token abc123").await;

        assert!(matches!(
            result,
            Err(AppError::Auth(AuthFailure::Rejected(401)))
        ));
    }

    #[tokio::test]
    async fn test_resolve_token_missing_field_is_malformed() {
        let server =
            identity_server(200, json!({"username": "alice", "email": "alice@example.com"})).await;
        let db = MockDatabase::new(DatabaseBackend::Postgres);

        let service = provisioner(db, &format!("{}/rest-auth/user/", server.uri()), 5);
        let result = service.resolve_token("Token abc123").await;

        assert!(matches!(
            result,
            Err(AppError::Auth(AuthFailure::Malformed(_)))
        ));
    }

    #[tokio::test]
    async fn test_resolve_token_timeout_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;
        let db = MockDatabase::new(DatabaseBackend::Postgres);

        let service = provisioner(db, &server.uri(), 1);
        let result = service.resolve_token("Token abc123").await;

        assert!(matches!(
            result,
            Err(AppError::Auth(AuthFailure::Unavailable(_)))
        ));
    }

    #[tokio::test]
    async fn test_invalid_endpoint_is_config_error() {
        let repo = ParticipantRepository::new(Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
        ));
        let result = IdentityProvisioner::new(
            repo,
            &IdentityConfig {
                user_endpoint: "not a url".to_string(),
                timeout_secs: 5,
            },
        );
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[tokio::test]
    async fn test_resolve_session_creates_participant() {
        let encoded = STANDARD.encode(
            json!({"form_data": {"Email": "bob@example.com", "Name": "Bob"}}).to_string(),
        );
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<participant::Model>::new()])
            .append_query_results([[create_test_participant(
                "p2",
                "bob@example.com",
                "Bob",
                ParticipantKind::Participant,
            )]]);

        let service = provisioner(db, "http://127.0.0.1:9/", 5);
        let participant = service.resolve_session(&encoded).await.unwrap();

        assert_eq!(participant.username, "bob@example.com");
        assert_eq!(participant.kind, ParticipantKind::Participant);
    }

    #[tokio::test]
    async fn test_resolve_session_retries_lost_create_race() {
        let encoded = STANDARD.encode(
            json!({"form_data": {"Email": "bob@example.com", "Name": "Bob"}}).to_string(),
        );
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<participant::Model>::new()])
            .append_query_errors([sea_orm::DbErr::Custom(
                "duplicate key value violates unique constraint \"idx_participant_username\""
                    .to_string(),
            )])
            .append_query_results([[create_test_participant(
                "p2",
                "bob@example.com",
                "Bob",
                ParticipantKind::Participant,
            )]]);

        let service = provisioner(db, "http://127.0.0.1:9/", 5);
        let participant = service.resolve_session(&encoded).await.unwrap();
        assert_eq!(participant.id, "p2");
    }

    #[tokio::test]
    async fn test_resolve_session_bad_payload() {
        let db = MockDatabase::new(DatabaseBackend::Postgres);
        let service = provisioner(db, "http://127.0.0.1:9/", 5);

        let not_base64 = service.resolve_session("%%%").await;
        assert!(matches!(
            not_base64,
            Err(AppError::Auth(AuthFailure::Malformed(_)))
        ));

        let no_form = service
            .resolve_session(&STANDARD.encode(r#"{"email":"x@example.com"}"#))
            .await;
        assert!(matches!(
            no_form,
            Err(AppError::Auth(AuthFailure::Malformed(_)))
        ));
    }

    #[tokio::test]
    async fn test_authenticate_dispatches_on_scheme() {
        let server = identity_server(
            200,
            json!({"username": "alice", "email": "alice@example.com", "screen_name": "Alice"}),
        )
        .await;
        let db = MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[
            create_test_participant("p1", "alice", "Alice", ParticipantKind::System),
        ]]);

        let service = provisioner(db, &format!("{}/rest-auth/user/", server.uri()), 5);
        let participant = service.authenticate("Token abc123").await.unwrap();
        assert_eq!(participant.id, "p1");

        let unknown = service.authenticate("Bearer abc123").await;
        assert!(matches!(
            unknown,
            Err(AppError::Auth(AuthFailure::Malformed(_)))
        ));

        let empty = service.authenticate("").await;
        assert!(matches!(empty, Err(AppError::Auth(AuthFailure::Malformed(_)))));
    }
}
