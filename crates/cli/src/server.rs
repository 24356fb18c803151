//! HTTP surface over the reconcile workflows.
//!
//! Routes:
//! - `GET /` welcome message.
//! - `POST /upload-pdf` multipart `file` (+ optional `company_name`) -> comparison summary.
//! - `POST /update-db` with `company_name`, `field`, `new_value` and optional
//!   `source=pdf|database`, as a query string or a urlencoded form body
//!   -> re-computed comparison summary.
//!
//! Every failure, including malformed requests, answers with the
//! `{"error": <code>, "detail": <message>}` body.
//!
//! Store access is serialized through a mutex and runs on the blocking pool.
//! Extraction runs before the lock is taken.

use std::str::FromStr;
use std::sync::{Arc, Mutex};

use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::{FormRejection, QueryRejection};
use axum::extract::{Multipart, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use discrepancy_core::compare::CompareOptions;
use discrepancy_core::db::RecordStore;
use discrepancy_core::model::{ComparisonSummary, Source};
use discrepancy_core::services::{
    sha256_hex, EngineError, ErrorKind, Extractor, Reconciler, ResolveRequest,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    store: Arc<Mutex<RecordStore>>,
    extractor: Arc<dyn Extractor>,
    options: CompareOptions,
}

impl AppState {
    pub fn new(store: RecordStore, extractor: Arc<dyn Extractor>, options: CompareOptions) -> Self {
        Self { store: Arc::new(Mutex::new(store)), extractor, options }
    }

    /// Run `f` against the store on the blocking pool.
    async fn with_store<T, F>(&self, f: F) -> Result<T, ApiError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Reconciler<'_>) -> Result<T, EngineError> + Send + 'static,
    {
        let state = self.clone();
        tokio::task::spawn_blocking(move || {
            let mut store = state
                .store
                .lock()
                .map_err(|_| ApiError::Internal("record store lock poisoned".into()))?;
            let mut reconciler = Reconciler::new(&mut store, state.extractor.as_ref())
                .with_options(state.options.clone());
            f(&mut reconciler).map_err(ApiError::from)
        })
        .await
        .map_err(|err| ApiError::Internal(format!("worker task failed: {err}")))?
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(welcome))
        .route("/upload-pdf", post(upload_pdf))
        .route("/update-db", post(update_db))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Error body: `{"error": <stable code>, "detail": <message>}`.
#[derive(Debug)]
pub enum ApiError {
    Engine(EngineError),
    BadRequest(String),
    Internal(String),
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        ApiError::Engine(err)
    }
}

/// HTTP status for each error kind.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Normalization => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::CompanyNotFound => StatusCode::NOT_FOUND,
        ErrorKind::UnknownField | ErrorKind::MissingCompanyName => StatusCode::BAD_REQUEST,
        ErrorKind::IdentityChange | ErrorKind::DuplicateCompany => StatusCode::CONFLICT,
        ErrorKind::Extraction => StatusCode::BAD_GATEWAY,
        ErrorKind::StoreIntegrity | ErrorKind::Storage => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, detail) = match self {
            ApiError::Engine(err) => {
                let kind = err.kind();
                (status_for(kind), kind.code(), err.to_string())
            }
            ApiError::BadRequest(detail) => (StatusCode::BAD_REQUEST, "bad_request", detail),
            ApiError::Internal(detail) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", detail)
            }
        };
        if status.is_server_error() {
            error!(code, %detail, "request failed");
        } else {
            info!(code, %detail, "request rejected");
        }
        (status, Json(json!({ "error": code, "detail": detail }))).into_response()
    }
}

async fn welcome() -> Json<Value> {
    Json(json!({ "message": "Welcome to the Data Discrepancy Checker API" }))
}

async fn upload_pdf(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ComparisonSummary>, ApiError> {
    let mut multipart = multipart.map_err(|err| ApiError::BadRequest(err.body_text()))?;
    let mut document = None;
    let mut company_name = None;
    while let Some(field) =
        multipart.next_field().await.map_err(|err| ApiError::BadRequest(err.to_string()))?
    {
        match field.name() {
            Some("file") => {
                let bytes =
                    field.bytes().await.map_err(|err| ApiError::BadRequest(err.to_string()))?;
                document = Some(bytes);
            }
            Some("company_name") => {
                let text = field.text().await.map_err(|err| ApiError::BadRequest(err.to_string()))?;
                company_name = Some(text);
            }
            _ => {}
        }
    }
    let document =
        document.ok_or_else(|| ApiError::BadRequest("missing multipart field 'file'".into()))?;

    let extractor = Arc::clone(&state.extractor);
    let raw = tokio::task::spawn_blocking(move || {
        let raw = extractor.extract(&document)?;
        Ok::<_, EngineError>((raw, sha256_hex(&document)))
    })
    .await
    .map_err(|err| ApiError::Internal(format!("extraction task failed: {err}")))??;

    let (raw, sha256) = raw;
    let summary = state
        .with_store(move |reconciler| {
            reconciler.compare_fields(&raw, company_name.as_deref(), Some(sha256))
        })
        .await?;
    Ok(Json(summary))
}

#[derive(Debug, Deserialize)]
pub struct UpdateParams {
    pub company_name: String,
    pub field: String,
    pub new_value: String,
    #[serde(default)]
    pub source: Option<String>,
}

/// Parameters come from the query string when it is complete, otherwise from
/// a urlencoded form body.
fn update_params(
    query: Result<Query<UpdateParams>, QueryRejection>,
    form: Result<Form<UpdateParams>, FormRejection>,
) -> Result<UpdateParams, ApiError> {
    match (query, form) {
        (Ok(Query(params)), _) | (Err(_), Ok(Form(params))) => Ok(params),
        (Err(query), Err(FormRejection::InvalidFormContentType(_))) => {
            Err(ApiError::BadRequest(query.body_text()))
        }
        (Err(_), Err(form)) => Err(ApiError::BadRequest(form.body_text())),
    }
}

async fn update_db(
    State(state): State<AppState>,
    query: Result<Query<UpdateParams>, QueryRejection>,
    form: Result<Form<UpdateParams>, FormRejection>,
) -> Result<Json<ComparisonSummary>, ApiError> {
    let params = update_params(query, form)?;
    let source = match params.source.as_deref() {
        Some(raw) => Source::from_str(raw).map_err(ApiError::BadRequest)?,
        None => Source::Pdf,
    };
    let request = ResolveRequest::new(params.company_name, params.field, params.new_value)
        .with_source(source);

    let summary = state.with_store(move |reconciler| reconciler.resolve(&request)).await?;
    Ok(Json(summary))
}
