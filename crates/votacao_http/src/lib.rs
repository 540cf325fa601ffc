//! REST surface for the voting service.
//!
//! # Responsibility
//! - Translate JSON requests into core use-case calls.
//! - Map core errors to HTTP statuses (see [`error`]).
//!
//! # Invariants
//! - Each request opens its own SQLite connection on a blocking worker;
//!   no store state is shared in memory between requests.
//! - `db_path` must name a file; an in-memory database would not be shared
//!   across requests.

#![deny(unsafe_code)]

pub mod error;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use log::info;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use votacao_core::db::open_db;
use votacao_core::{
    core_version, AgendaService, Choice, Clock, FixedIdentityValidator, IdentityValidator,
    RandomIdentityValidator, SessionService, SqliteAgendaRepository, SqliteVoteRepository,
    SystemClock, TallyOutcome, TallyService, VoteService, VotingError,
};

pub use error::{ApiError, ServiceError};

/// Which identity validator answers eligibility checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EligibilityMode {
    /// 50/50 `ABLE_TO_VOTE`/`UNABLE_TO_VOTE`.
    Random,
    /// Every voter is eligible.
    Always,
    /// No voter is eligible.
    Never,
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub db_path: PathBuf,
    pub eligibility: EligibilityMode,
    /// Seed for `EligibilityMode::Random`; entropy when absent.
    pub eligibility_seed: Option<u64>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("votacao.sqlite3"),
            eligibility: EligibilityMode::Random,
            eligibility_seed: None,
        }
    }
}

impl ServiceConfig {
    fn identity_validator(&self) -> Arc<dyn IdentityValidator> {
        match (self.eligibility, self.eligibility_seed) {
            (EligibilityMode::Random, Some(seed)) => {
                Arc::new(RandomIdentityValidator::with_seed(seed))
            }
            (EligibilityMode::Random, None) => Arc::new(RandomIdentityValidator::new()),
            (EligibilityMode::Always, _) => Arc::new(FixedIdentityValidator::eligible()),
            (EligibilityMode::Never, _) => Arc::new(FixedIdentityValidator::ineligible()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServiceState {
    db_path: Arc<PathBuf>,
    validator: Arc<dyn IdentityValidator>,
    clock: Arc<dyn Clock>,
}

impl ServiceState {
    /// Opens the database once so migrations run before the first request.
    pub fn bootstrap(config: ServiceConfig) -> Result<Self, ServiceError> {
        open_db(&config.db_path)?;
        info!(
            "event=service_bootstrap module=http status=ok eligibility={:?}",
            config.eligibility
        );

        Ok(Self {
            validator: config.identity_validator(),
            db_path: Arc::new(config.db_path),
            clock: Arc::new(SystemClock),
        })
    }

    /// Replaces the wall clock, e.g. with a `ManualClock` in tests.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replaces the validator chosen by `ServiceConfig::eligibility`.
    pub fn with_validator(mut self, validator: Arc<dyn IdentityValidator>) -> Self {
        self.validator = validator;
        self
    }

    /// Runs `operation` on a fresh connection off the async runtime.
    async fn run<T, F>(&self, operation: F) -> Result<T, ApiError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection, &ServiceState) -> Result<T, VotingError> + Send + 'static,
    {
        let state = self.clone();
        tokio::task::spawn_blocking(move || -> Result<T, ApiError> {
            let conn = open_db(state.db_path.as_path())?;
            Ok(operation(&conn, &state)?)
        })
        .await?
    }
}

pub fn build_router(state: ServiceState) -> Router {
    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/votacoes", post(create_agenda))
        .route("/api/v1/votacoes/abrir", post(open_session))
        .route("/api/v1/votacoes/votos", post(register_vote))
        .route("/api/v1/votacoes/resultado", get(tally))
        .with_state(state)
}

#[derive(Debug, Clone, Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: "votacao",
        version: core_version(),
    })
}

// Missing text fields deserialize as empty so value-object validation
// reports them per field.
#[derive(Debug, Clone, Deserialize)]
struct CreateAgendaRequest {
    #[serde(default)]
    titulo: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgendaResponse {
    pub id: i64,
    pub titulo: String,
}

async fn create_agenda(
    State(state): State<ServiceState>,
    payload: Result<Json<CreateAgendaRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AgendaResponse>), ApiError> {
    let Json(request) = payload?;
    let item = state
        .run(move |conn, _| {
            AgendaService::new(SqliteAgendaRepository::try_new(conn)?)
                .create_agenda(&request.titulo)
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AgendaResponse {
            id: item.id(),
            titulo: item.title().to_string(),
        }),
    ))
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OpenSessionRequest {
    #[serde(default)]
    titulo: String,
    duracao_minutos: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenSessionResponse {
    pub mensagem: String,
    pub duracao_minutos: u32,
    pub abertura: DateTime<Utc>,
    pub fechamento: DateTime<Utc>,
}

async fn open_session(
    State(state): State<ServiceState>,
    payload: Result<Json<OpenSessionRequest>, JsonRejection>,
) -> Result<Json<OpenSessionResponse>, ApiError> {
    let Json(request) = payload?;
    let item = state
        .run(move |conn, state| {
            SessionService::new(SqliteAgendaRepository::try_new(conn)?, state.clock.clone())
                .open_session(&request.titulo, request.duracao_minutos)
        })
        .await?;
    let window = item
        .window()
        .copied()
        .ok_or(ApiError::Internal("session opened without a window"))?;

    Ok(Json(OpenSessionResponse {
        mensagem: format!(
            "Sessão de votação aberta por {} minuto(s) para a pauta: '{}'",
            window.duration_minutes(),
            item.title()
        ),
        duracao_minutos: window.duration_minutes(),
        abertura: window.opens_at(),
        fechamento: window.closes_at(),
    }))
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VoteRequest {
    #[serde(default)]
    titulo: String,
    #[serde(default)]
    associado_id: String,
    #[serde(default)]
    escolha: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteResponse {
    pub id: i64,
    pub titulo: String,
    pub associado_id: String,
    pub escolha: Choice,
    pub registrado_em: DateTime<Utc>,
}

async fn register_vote(
    State(state): State<ServiceState>,
    payload: Result<Json<VoteRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<VoteResponse>), ApiError> {
    let Json(request) = payload?;
    let titulo = request.titulo.clone();
    let vote = state
        .run(move |conn, state| {
            VoteService::new(
                SqliteAgendaRepository::try_new(conn)?,
                SqliteVoteRepository::try_new(conn)?,
                state.validator.clone(),
                state.clock.clone(),
            )
            .register_vote(&request.titulo, &request.associado_id, &request.escolha)
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(VoteResponse {
            id: vote.id(),
            titulo,
            associado_id: vote.voter_id().to_string(),
            escolha: vote.choice(),
            registrado_em: vote.cast_at(),
        }),
    ))
}

#[derive(Debug, Clone, Deserialize)]
struct TallyQuery {
    #[serde(default)]
    titulo: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TallyResponse {
    pub titulo: String,
    /// Absent when no votes were cast.
    pub percentual_sim: Option<u64>,
    pub percentual_nao: Option<u64>,
    pub resultado: TallyOutcome,
    pub votos_sim: u64,
    pub votos_nao: u64,
    pub total_votos: u64,
}

async fn tally(
    State(state): State<ServiceState>,
    query: Result<Query<TallyQuery>, QueryRejection>,
) -> Result<Json<TallyResponse>, ApiError> {
    let Query(query) = query?;
    let result = state
        .run(move |conn, _| {
            TallyService::new(
                SqliteAgendaRepository::try_new(conn)?,
                SqliteVoteRepository::try_new(conn)?,
            )
            .tally(&query.titulo)
        })
        .await?;

    Ok(Json(TallyResponse {
        titulo: result.title.to_string(),
        percentual_sim: result.percent_yes,
        percentual_nao: result.percent_no,
        resultado: result.outcome,
        votos_sim: result.yes_votes,
        votos_nao: result.no_votes,
        total_votos: result.total_votes,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use chrono::{Duration, TimeZone};
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use votacao_core::ManualClock;

    struct TestApp {
        router: Router,
        clock: Arc<ManualClock>,
        _dir: tempfile::TempDir,
    }

    fn test_app(eligibility: EligibilityMode) -> TestApp {
        test_app_with(eligibility, |state| state)
    }

    fn test_app_with(
        eligibility: EligibilityMode,
        configure: impl FnOnce(ServiceState) -> ServiceState,
    ) -> TestApp {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 5, 20, 14, 0, 0).unwrap(),
        ));
        let state = ServiceState::bootstrap(ServiceConfig {
            db_path: dir.path().join("votacao.sqlite3"),
            eligibility,
            eligibility_seed: None,
        })
        .unwrap()
        .with_clock(clock.clone());

        TestApp {
            router: build_router(configure(state)),
            clock,
            _dir: dir,
        }
    }

    async fn send(
        app: &TestApp,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        let body = body.map_or_else(Body::empty, |value| Body::from(value.to_string()));
        let response = app
            .router
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn create(app: &TestApp, titulo: &str) -> (StatusCode, Value) {
        send(app, "POST", "/api/v1/votacoes", Some(json!({ "titulo": titulo }))).await
    }

    async fn open(app: &TestApp, titulo: &str, minutes: Option<i32>) -> (StatusCode, Value) {
        send(
            app,
            "POST",
            "/api/v1/votacoes/abrir",
            Some(json!({ "titulo": titulo, "duracaoMinutos": minutes })),
        )
        .await
    }

    async fn vote(
        app: &TestApp,
        titulo: &str,
        voter: &str,
        escolha: &str,
    ) -> (StatusCode, Value) {
        send(
            app,
            "POST",
            "/api/v1/votacoes/votos",
            Some(json!({ "titulo": titulo, "associadoId": voter, "escolha": escolha })),
        )
        .await
    }

    #[tokio::test]
    async fn health_reports_service_and_version() {
        let app = test_app(EligibilityMode::Always);

        let (status, body) = send(&app, "GET", "/api/v1/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "votacao");
        assert_eq!(body["version"], core_version());
    }

    #[tokio::test]
    async fn full_voting_flow_returns_approved_result() {
        let app = test_app(EligibilityMode::Always);

        let (status, body) = create(&app, "Orcamento").await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["titulo"], "Orcamento");
        assert!(body["id"].as_i64().unwrap() > 0);

        let (status, body) = open(&app, "Orcamento", Some(3)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["duracaoMinutos"], 3);
        assert_eq!(
            body["mensagem"],
            "Sessão de votação aberta por 3 minuto(s) para a pauta: 'Orcamento'"
        );
        let response: OpenSessionResponse = serde_json::from_value(body).unwrap();
        assert_eq!(response.fechamento - response.abertura, Duration::minutes(3));

        let (status, body) = vote(&app, "Orcamento", "12345678901", "sim").await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["escolha"], "SIM");
        assert_eq!(body["associadoId"], "12345678901");
        let (status, _) = vote(&app, "Orcamento", "10987654321", "Sim").await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, _) = vote(&app, "Orcamento", "11111111111", "NAO").await;
        assert_eq!(status, StatusCode::CREATED);

        let uri = "/api/v1/votacoes/resultado?titulo=Orcamento";
        let (status, body) = send(&app, "GET", uri, None).await;
        assert_eq!(status, StatusCode::OK);
        let result: TallyResponse = serde_json::from_value(body).unwrap();
        assert_eq!(result.titulo, "Orcamento");
        assert_eq!(result.percentual_sim, Some(66));
        assert_eq!(result.percentual_nao, Some(33));
        assert_eq!(result.resultado, TallyOutcome::Approved);
        assert_eq!(result.total_votos, 3);
    }

    #[tokio::test]
    async fn duplicate_agenda_is_conflict_and_blank_title_is_field_error() {
        let app = test_app(EligibilityMode::Always);

        assert_eq!(create(&app, "Pauta").await.0, StatusCode::CREATED);
        let (status, body) = create(&app, "Pauta").await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["error"].as_str().unwrap().contains("Pauta"));

        let (status, body) = create(&app, "  ").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["titulo"].is_string());
    }

    #[tokio::test]
    async fn open_unknown_is_not_found_and_second_open_is_bad_request() {
        let app = test_app(EligibilityMode::Always);

        let (status, _) = open(&app, "Fantasma", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        create(&app, "Pauta").await;
        let (status, body) = open(&app, "Pauta", Some(0)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["duracaoMinutos"], 1);

        let (status, body) = open(&app, "Pauta", Some(5)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn vote_errors_map_to_distinct_statuses() {
        let app = test_app(EligibilityMode::Always);
        create(&app, "Pauta").await;

        let (status, _) = vote(&app, "Fantasma", "12345678901", "SIM").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = vote(&app, "Pauta", "12345678901", "SIM").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        open(&app, "Pauta", Some(1)).await;
        let (status, body) = vote(&app, "Pauta", "12345678901", "talvez").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["escolha"].is_string());

        let (status, body) = vote(&app, "Pauta", "123", "SIM").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["associadoId"].is_string());

        let (status, _) = vote(&app, "Pauta", "12345678901", "SIM").await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, _) = vote(&app, "Pauta", "12345678901", "NAO").await;
        assert_eq!(status, StatusCode::CONFLICT);

        app.clock.advance(Duration::minutes(2));
        let (status, _) = vote(&app, "Pauta", "10987654321", "NAO").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn ineligible_voter_is_unauthorized() {
        let app = test_app(EligibilityMode::Never);
        create(&app, "Pauta").await;
        open(&app, "Pauta", None).await;

        let (status, body) = vote(&app, "Pauta", "12345678901", "SIM").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["error"].is_string());

        let (_, body) = send(&app, "GET", "/api/v1/votacoes/resultado?titulo=Pauta", None).await;
        assert_eq!(body["totalVotos"], 0);
        assert_eq!(body["resultado"], "NO_VOTES");
        assert!(body["percentualSim"].is_null());
    }

    #[tokio::test]
    async fn malformed_requests_are_bad_request() {
        let app = test_app(EligibilityMode::Always);

        let response = app
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/votacoes")
                    .header("content-type", "application/json")
                    .body(Body::from("{\"titulo\":"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let (status, body) = send(&app, "GET", "/api/v1/votacoes/resultado", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["titulo"].is_string());

        let uri = "/api/v1/votacoes/resultado?titulo=Fantasma";
        let (status, _) = send(&app, "GET", uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn missing_fields_are_reported_per_field() {
        let app = test_app(EligibilityMode::Always);

        let (status, body) = send(&app, "POST", "/api/v1/votacoes", Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["titulo"].is_string());

        create(&app, "Pauta").await;
        open(&app, "Pauta", None).await;

        let payload = json!({ "titulo": "Pauta", "escolha": "SIM" });
        let (status, body) = send(&app, "POST", "/api/v1/votacoes/votos", Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["associadoId"].is_string());

        let payload = json!({ "titulo": "Pauta", "associadoId": "12345678901" });
        let (status, body) = send(&app, "POST", "/api/v1/votacoes/votos", Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["escolha"].is_string());
    }

    #[derive(Debug)]
    struct UnreachableValidator;

    impl IdentityValidator for UnreachableValidator {
        fn check_eligibility(
            &self,
            _voter_id: &votacao_core::VoterId,
        ) -> Result<votacao_core::EligibilityStatus, votacao_core::EligibilityError> {
            Err(votacao_core::EligibilityError::new(
                "upstream host 10.0.0.7 refused connection",
            ))
        }
    }

    #[tokio::test]
    async fn oracle_failure_is_generic_server_error() {
        let app = test_app_with(EligibilityMode::Always, |state| {
            state.with_validator(Arc::new(UnreachableValidator))
        });
        create(&app, "Pauta").await;
        open(&app, "Pauta", None).await;

        let (status, body) = vote(&app, "Pauta", "12345678901", "SIM").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body,
            json!({ "error": "unexpected error, please try again later" })
        );
        assert!(!body.to_string().contains("10.0.0.7"));

        let uri = "/api/v1/votacoes/resultado?titulo=Pauta";
        let (_, body) = send(&app, "GET", uri, None).await;
        assert_eq!(body["totalVotos"], 0);
    }
}
