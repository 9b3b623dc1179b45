use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use lifeos_core::{CommitResult, TodoCandidate, TodoRecord, TranscriptDetail, TranscriptRecord};
use lifeos_ledger::{commit_derived_from_transcript, CommitRequest, PersistenceBackend};
use lifeos_transcript::{parse_draft, ParsedDraft};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

mod context;
mod error;
pub mod planning;

pub use context::WORKSPACE_HEADER;
use context::Workspace;
use error::AppError;

const TRANSCRIPT_LIMIT_DEFAULT: usize = 20;
const TRANSCRIPT_LIMIT_MAX: usize = 100;
const TODO_LIMIT_DEFAULT: usize = 100;
const TODO_LIMIT_MAX: usize = 500;

// ── Config ──

pub struct ServeConfig {
    pub bind: String,
    pub port: u16,
}

// ── App State ──

pub struct AppState {
    pub backend: Arc<dyn PersistenceBackend>,
    pub default_workspace: String,
}

// ── Entrypoint ──

pub async fn serve(state: AppState, config: ServeConfig) -> anyhow::Result<()> {
    let app = router(state);
    let addr = format!("{}:{}", config.bind, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "lifeos HTTP server listening");
    axum::serve(listener, app).await?;
    Ok(())
}

/// Build the router (for testing without binding to a port).
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/transcripts", get(list_transcripts))
        .route("/api/transcripts/parse", post(post_parse))
        .route("/api/transcripts/create", post(post_create))
        .route("/api/transcripts/commit-derived", post(post_commit_derived))
        .route("/api/transcripts/{id}", get(get_transcript))
        .route("/api/todos", get(list_todos))
        .route("/api/weekly-plan", get(planning::get_weekly_plan))
        .route("/api/operational/summary", get(planning::get_summary))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

fn bounded_limit(limit: Option<usize>, default: usize, max: usize) -> Result<usize, AppError> {
    let limit = limit.unwrap_or(default);
    if !(1..=max).contains(&limit) {
        return Err(AppError::bad_request(format!(
            "limit must be between 1 and {max}"
        )));
    }
    Ok(limit)
}

/// Body workspace wins over the request context.
fn pick_workspace(body: Option<String>, ctx: String) -> String {
    body.map(|w| w.trim().to_string())
        .filter(|w| !w.is_empty())
        .unwrap_or(ctx)
}

// ── Health ──

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "ok": true }))
}

// ── POST /api/transcripts/parse ──

#[derive(Deserialize)]
struct ParseBody {
    draft: String,
}

async fn post_parse(
    body: Result<Json<ParseBody>, JsonRejection>,
) -> Result<Json<ParsedDraft>, AppError> {
    let Json(body) = body?;
    if body.draft.is_empty() {
        return Err(AppError::bad_request("draft must not be empty"));
    }
    Ok(Json(parse_draft(&body.draft)))
}

// ── POST /api/transcripts/create ──

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateBody {
    raw_text: String,
    workspace_id: Option<String>,
}

async fn post_create(
    State(state): State<Arc<AppState>>,
    Workspace(ctx): Workspace,
    body: Result<Json<CreateBody>, JsonRejection>,
) -> Result<Json<TranscriptRecord>, AppError> {
    let Json(body) = body?;
    if body.raw_text.is_empty() {
        return Err(AppError::bad_request("rawText must not be empty"));
    }
    let workspace_id = pick_workspace(body.workspace_id, ctx);
    let transcript = state.backend.create_transcript(&workspace_id, &body.raw_text)?;
    tracing::debug!(workspace = %workspace_id, id = %transcript.id, "transcript created");
    Ok(Json(transcript))
}

// ── POST /api/transcripts/commit-derived ──

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommitBody {
    transcript_id: String,
    todos: Vec<TodoCandidate>,
    idempotency_key: Option<String>,
    workspace_id: Option<String>,
}

async fn post_commit_derived(
    State(state): State<Arc<AppState>>,
    Workspace(ctx): Workspace,
    body: Result<Json<CommitBody>, JsonRejection>,
) -> Result<Json<CommitResult>, AppError> {
    let Json(body) = body?;
    let req = CommitRequest {
        workspace_id: pick_workspace(body.workspace_id, ctx),
        transcript_id: body.transcript_id,
        todos: body.todos,
        idempotency_key: body.idempotency_key,
    };
    let result = commit_derived_from_transcript(state.backend.as_ref(), &req)?;
    Ok(Json(result))
}

// ── GET /api/transcripts ──

#[derive(Deserialize)]
struct LimitQuery {
    limit: Option<usize>,
}

#[derive(Serialize)]
struct TranscriptsResponse {
    transcripts: Vec<TranscriptRecord>,
}

async fn list_transcripts(
    State(state): State<Arc<AppState>>,
    Workspace(workspace_id): Workspace,
    query: Result<Query<LimitQuery>, QueryRejection>,
) -> Result<Json<TranscriptsResponse>, AppError> {
    let Query(q) = query?;
    let limit = bounded_limit(q.limit, TRANSCRIPT_LIMIT_DEFAULT, TRANSCRIPT_LIMIT_MAX)?;
    let transcripts = state.backend.list_transcripts(&workspace_id, limit)?;
    Ok(Json(TranscriptsResponse { transcripts }))
}

// ── GET /api/transcripts/{id} ──

async fn get_transcript(
    State(state): State<Arc<AppState>>,
    Workspace(workspace_id): Workspace,
    Path(id): Path<String>,
) -> Result<Json<TranscriptDetail>, AppError> {
    state
        .backend
        .get_transcript_detail(&workspace_id, &id)?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Transcript not found".to_string()))
}

// ── GET /api/todos ──

#[derive(Serialize)]
struct TodosResponse {
    todos: Vec<TodoRecord>,
}

async fn list_todos(
    State(state): State<Arc<AppState>>,
    Workspace(workspace_id): Workspace,
    query: Result<Query<LimitQuery>, QueryRejection>,
) -> Result<Json<TodosResponse>, AppError> {
    let Query(q) = query?;
    let limit = bounded_limit(q.limit, TODO_LIMIT_DEFAULT, TODO_LIMIT_MAX)?;
    let todos = state.backend.list_todos(&workspace_id, limit)?;
    Ok(Json(TodosResponse { todos }))
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use lifeos_ledger::{open_backend, BackendKind, StorageConfig};
    use tower::ServiceExt;

    const DRAFT: &str = "[SUMMARY]\nA\n[TIMELINE]\nB\n[TODOS]\nTask|later|low|online|none|ops|Owner|2026-02-20|note\nPlan week|now|high|home|none|life|Me|2026-02-10|\n[DECISIONS]\nC\n[MONEY]\nD\n[IDEAS]\nE\n[QUESTIONS]\nF";

    fn setup(kind: BackendKind) -> (tempfile::TempDir, Router) {
        let tmp = tempfile::tempdir().unwrap();
        let config =
            StorageConfig::resolve(Some(kind.as_str()), None, Some(tmp.path().into())).unwrap();
        let state = AppState {
            backend: open_backend(&config).unwrap(),
            default_workspace: "ws-demo".into(),
        };
        (tmp, router(state))
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header(WORKSPACE_HEADER, "ws-test")
            .body(Body::empty())
            .unwrap()
    }

    fn post_req(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .header(WORKSPACE_HEADER, "ws-test")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn health_returns_ok() {
        let (_tmp, app) = setup(BackendKind::File);
        let (status, json) = send(&app, get_req("/api/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["ok"], true);
    }

    #[tokio::test]
    async fn parse_reports_todos_and_confidence() {
        let (_tmp, app) = setup(BackendKind::File);
        let (status, json) = send(
            &app,
            post_req("/api/transcripts/parse", serde_json::json!({ "draft": DRAFT })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["todos"].as_array().unwrap().len(), 2);
        assert_eq!(json["todos"][0]["fields"]["moneyCost"], "none");
        assert_eq!(json["confidence"]["score"], 100);
        assert_eq!(json["confidence"]["globalCritical"], false);
        assert_eq!(json["sections"]["SUMMARY"][0], "A");
    }

    #[tokio::test]
    async fn parse_flags_missing_sections() {
        let (_tmp, app) = setup(BackendKind::File);
        let (status, json) = send(
            &app,
            post_req("/api/transcripts/parse", serde_json::json!({ "draft": "[SUMMARY]\nonly" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["confidence"]["globalCritical"], true);
        assert_eq!(json["issues"][0]["code"], "MISSING_REQUIRED_SECTION");
    }

    #[tokio::test]
    async fn parse_rejects_empty_draft() {
        let (_tmp, app) = setup(BackendKind::File);
        let (status, json) = send(
            &app,
            post_req("/api/transcripts/parse", serde_json::json!({ "draft": "" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].is_string());
    }

    async fn create_and_commit(app: &Router) -> (String, serde_json::Value) {
        let (status, created) = send(
            app,
            post_req("/api/transcripts/create", serde_json::json!({ "rawText": DRAFT })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(created["workspaceId"], "ws-test");
        let id = created["id"].as_str().unwrap().to_string();

        let (_, parsed) = send(
            app,
            post_req("/api/transcripts/parse", serde_json::json!({ "draft": DRAFT })),
        )
        .await;
        let (status, committed) = send(
            app,
            post_req(
                "/api/transcripts/commit-derived",
                serde_json::json!({ "transcriptId": id, "todos": parsed["todos"] }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        (id, committed)
    }

    #[tokio::test]
    async fn commit_is_idempotent_over_http() {
        for kind in [BackendKind::File, BackendKind::Sqlite] {
            let (_tmp, app) = setup(kind);
            let (id, first) = create_and_commit(&app).await;
            assert_eq!(first["committedTodos"], 2);
            assert_eq!(first["skippedTodos"], 0);

            let (_, parsed) = send(
                &app,
                post_req("/api/transcripts/parse", serde_json::json!({ "draft": DRAFT })),
            )
            .await;
            let (_, again) = send(
                &app,
                post_req(
                    "/api/transcripts/commit-derived",
                    serde_json::json!({ "transcriptId": id, "todos": parsed["todos"] }),
                ),
            )
            .await;
            assert_eq!(again["auditEventId"], first["auditEventId"]);
            assert_eq!(again["idempotencyKey"], first["idempotencyKey"]);

            let (_, todos) = send(&app, get_req("/api/todos")).await;
            assert_eq!(todos["todos"].as_array().unwrap().len(), 2);
        }
    }

    #[tokio::test]
    async fn commit_rejects_malformed_candidate() {
        let (_tmp, app) = setup(BackendKind::File);
        let todo = serde_json::json!({
            "raw": "x",
            "fields": {
                "title": "x", "horizon": "", "energy": "low", "context": "home",
                "moneyCost": "none", "domain": "", "responsible": "", "dueDate": "", "notes": ""
            }
        });
        let (status, json) = send(
            &app,
            post_req(
                "/api/transcripts/commit-derived",
                serde_json::json!({ "transcriptId": "tr_x", "todos": [todo] }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(json["error"].as_str().unwrap().contains("horizon"));
    }

    #[tokio::test]
    async fn commit_rejects_empty_key() {
        let (_tmp, app) = setup(BackendKind::File);
        let (status, _) = send(
            &app,
            post_req(
                "/api/transcripts/commit-derived",
                serde_json::json!({ "transcriptId": "tr_x", "todos": [], "idempotencyKey": "" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_bodies_are_json_bad_requests() {
        let (_tmp, app) = setup(BackendKind::File);

        let (status, json) = send(
            &app,
            post_req("/api/transcripts/commit-derived", serde_json::json!({ "todos": [] })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().starts_with("Invalid payload"));

        let (status, json) =
            send(&app, post_req("/api/transcripts/parse", serde_json::json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("draft"));

        let (status, json) =
            send(&app, post_req("/api/transcripts/create", serde_json::json!({ "rawText": 7 }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].is_string());
    }

    #[tokio::test]
    async fn candidate_missing_field_is_a_bad_request() {
        let (_tmp, app) = setup(BackendKind::File);
        let todo = serde_json::json!({
            "raw": "x",
            "fields": {
                "title": "x", "horizon": "now", "energy": "low", "context": "home",
                "moneyCost": "none", "domain": "", "responsible": "", "dueDate": ""
            }
        });
        let (status, json) = send(
            &app,
            post_req(
                "/api/transcripts/commit-derived",
                serde_json::json!({ "transcriptId": "tr_x", "todos": [todo] }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("notes"));

        let (_, todos) = send(&app, get_req("/api/todos")).await;
        assert!(todos["todos"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_queries_are_json_bad_requests() {
        let (_tmp, app) = setup(BackendKind::File);
        for uri in [
            "/api/todos?limit=abc",
            "/api/transcripts?limit=-1",
            "/api/weekly-plan?limit=abc",
        ] {
            let (status, json) = send(&app, get_req(uri)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert!(
                json["error"].as_str().unwrap().starts_with("Invalid query"),
                "{uri}"
            );
        }
    }

    #[tokio::test]
    async fn transcript_listing_and_detail() {
        let (_tmp, app) = setup(BackendKind::Sqlite);
        let (id, _) = create_and_commit(&app).await;

        let (status, list) = send(&app, get_req("/api/transcripts?limit=5")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list["transcripts"][0]["id"], id.as_str());

        let (status, detail) = send(&app, get_req(&format!("/api/transcripts/{id}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(detail["transcript"]["rawText"], DRAFT);
        assert_eq!(detail["todos"][0]["title"], "Task");

        let (status, missing) = send(&app, get_req("/api/transcripts/tr_missing")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(missing["error"], "Transcript not found");
    }

    #[tokio::test]
    async fn workspace_header_scopes_reads() {
        let (_tmp, app) = setup(BackendKind::File);
        create_and_commit(&app).await;

        let req = Request::builder()
            .uri("/api/todos")
            .body(Body::empty())
            .unwrap();
        let (status, json) = send(&app, req).await;
        assert_eq!(status, StatusCode::OK);
        assert!(json["todos"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn limits_are_bounded() {
        let (_tmp, app) = setup(BackendKind::File);
        let (status, _) = send(&app, get_req("/api/transcripts?limit=0")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = send(&app, get_req("/api/todos?limit=501")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn weekly_plan_filters_by_week() {
        let (_tmp, app) = setup(BackendKind::File);
        create_and_commit(&app).await;

        let (status, ok) = send(&app, get_req("/api/weekly-plan?weekStart=2026-02-09")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ok["weekStart"], "2026-02-09");
        assert_eq!(ok["weekEndExclusive"], "2026-02-16");
        let titles: Vec<&str> = ok["todos"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles, ["Plan week"]);

        let (status, bad) = send(&app, get_req("/api/weekly-plan?weekStart=2026-02-10")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(bad["error"].as_str().unwrap().contains("Monday"));

        let (status, _) = send(&app, get_req("/api/weekly-plan?limit=1001")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn summary_counts_workspace_records() {
        let (_tmp, app) = setup(BackendKind::File);
        create_and_commit(&app).await;

        let (status, json) = send(&app, get_req("/api/operational/summary")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["workspaceId"], "ws-test");
        assert_eq!(json["openTodos"], 2);
        assert_eq!(json["transcriptsProcessed"], 1);
        assert_eq!(json["createdLast7d"], 2);
    }
}
