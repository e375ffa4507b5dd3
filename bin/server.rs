// Receipt Ledger - Web Server
// REST API with Axum

use axum::{
    extract::{Multipart, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use receipt_ledger::{
    auth, db, export, import, AppConfig, AuthError, ReceiptNormalizer, SystemClock, TesseractOcr,
    TextRecognizer,
};

/// Shared application state
#[derive(Clone)]
struct AppState {
    db: Arc<Mutex<Connection>>,
    normalizer: Arc<ReceiptNormalizer>,
    ocr: Arc<dyn TextRecognizer>,
    config: Arc<AppConfig>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }
}

fn api_error(status: StatusCode, message: impl Into<String>) -> Response {
    let body = ApiResponse {
        success: false,
        data: serde_json::Value::Null,
        error: Some(message.into()),
    };
    (status, Json(body)).into_response()
}

fn auth_failure(err: AuthError) -> Response {
    let status = match &err {
        AuthError::EmailTaken => StatusCode::BAD_REQUEST,
        AuthError::InvalidCredentials | AuthError::InvalidToken => StatusCode::UNAUTHORIZED,
        AuthError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if let AuthError::Storage(inner) = &err {
        error!("auth storage failure: {:#}", inner);
    }

    api_error(status, err.to_string())
}

/// Pull the bearer token out of the Authorization header.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Resolve the calling user or produce the failure response.
fn require_user(conn: &Connection, headers: &HeaderMap) -> Result<i64, Response> {
    let token = bearer_token(headers)
        .ok_or_else(|| api_error(StatusCode::UNAUTHORIZED, "Missing bearer token"))?;

    auth::authenticate(conn, token).map_err(auth_failure)
}

/// Read the "file" field of a multipart upload into memory.
async fn read_upload(multipart: &mut Multipart) -> Result<Vec<u8>, Response> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| api_error(StatusCode::BAD_REQUEST, "Malformed multipart body"))?
    {
        if field.name() == Some("file") {
            let bytes = field
                .bytes()
                .await
                .map_err(|_| api_error(StatusCode::BAD_REQUEST, "Failed to read upload"))?;
            return Ok(bytes.to_vec());
        }
    }

    Err(api_error(StatusCode::BAD_REQUEST, "Missing 'file' field"))
}

// ============================================================================
// Request/response types
// ============================================================================

#[derive(Deserialize)]
struct Credentials {
    email: String,
    password: String,
}

#[derive(Serialize)]
struct TokenResponse {
    access_token: String,
    token_type: String,
    expires_at: DateTime<Utc>,
}

impl From<auth::SessionToken> for TokenResponse {
    fn from(session: auth::SessionToken) -> Self {
        Self {
            access_token: session.token,
            token_type: "bearer".to_string(),
            expires_at: session.expires_at,
        }
    }
}

#[derive(Serialize)]
struct ImportSummary {
    status: String,
    imported: usize,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// POST /api/auth/register - Create an account, returns a bearer token
async fn register(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Response {
    let conn = state.db.lock().unwrap();

    match auth::register(
        &conn,
        &credentials.email,
        &credentials.password,
        state.config.session_ttl_minutes,
    ) {
        Ok(session) => Json(ApiResponse::ok(TokenResponse::from(session))).into_response(),
        Err(err) => auth_failure(err),
    }
}

/// POST /api/auth/login - Exchange credentials for a bearer token
async fn login(State(state): State<AppState>, Json(credentials): Json<Credentials>) -> Response {
    let conn = state.db.lock().unwrap();

    match auth::login(
        &conn,
        &credentials.email,
        &credentials.password,
        state.config.session_ttl_minutes,
    ) {
        Ok(session) => Json(ApiResponse::ok(TokenResponse::from(session))).into_response(),
        Err(err) => auth_failure(err),
    }
}

/// POST /api/upload - Receipt image in, normalized record out
async fn upload_receipt(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    let image = match read_upload(&mut multipart).await {
        Ok(bytes) => bytes,
        Err(response) => return response,
    };

    let user_id = {
        let conn = state.db.lock().unwrap();
        match require_user(&conn, &headers) {
            Ok(user_id) => user_id,
            Err(response) => return response,
        }
    };

    let text = match state.ocr.recognize(&image) {
        Ok(text) => text,
        Err(err) => {
            error!("text recognition failed: {:#}", err);
            return api_error(StatusCode::UNPROCESSABLE_ENTITY, "Text recognition failed");
        }
    };

    let record = state.normalizer.normalize(&text);

    let conn = state.db.lock().unwrap();
    match db::insert_receipt(&conn, user_id, &record) {
        Ok(_) => Json(ApiResponse::ok(record)).into_response(),
        Err(err) => {
            error!("failed to store receipt: {:#}", err);
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to store receipt")
        }
    }
}

/// POST /api/import - Bank CSV in, one record per row
async fn import_bank_csv(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    let data = match read_upload(&mut multipart).await {
        Ok(bytes) => bytes,
        Err(response) => return response,
    };

    let conn = state.db.lock().unwrap();
    let user_id = match require_user(&conn, &headers) {
        Ok(user_id) => user_id,
        Err(response) => return response,
    };

    match import::import_csv(&conn, user_id, &data, &state.normalizer) {
        Ok(imported) => Json(ApiResponse::ok(ImportSummary {
            status: "Bank CSV imported successfully".to_string(),
            imported,
        }))
        .into_response(),
        Err(err) => {
            error!("CSV import failed: {:#}", err);
            api_error(StatusCode::BAD_REQUEST, "CSV import failed")
        }
    }
}

/// GET /api/receipts - List the authenticated user's records
async fn list_receipts(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let conn = state.db.lock().unwrap();
    let user_id = match require_user(&conn, &headers) {
        Ok(user_id) => user_id,
        Err(response) => return response,
    };

    match db::get_receipts_for_user(&conn, user_id) {
        Ok(receipts) => Json(ApiResponse::ok(receipts)).into_response(),
        Err(err) => {
            error!("failed to list receipts: {:#}", err);
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to list receipts")
        }
    }
}

/// GET /api/export - CSV download of the authenticated user's records
async fn export_receipts(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let conn = state.db.lock().unwrap();
    let user_id = match require_user(&conn, &headers) {
        Ok(user_id) => user_id,
        Err(response) => return response,
    };

    let receipts = match db::get_receipts_for_user(&conn, user_id) {
        Ok(receipts) => receipts,
        Err(err) => {
            error!("failed to load receipts for export: {:#}", err);
            return api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to export");
        }
    };

    match export::to_csv_string(&receipts) {
        Ok(csv) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/csv"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"export.csv\"",
                ),
            ],
            csv,
        )
            .into_response(),
        Err(err) => {
            error!("failed to render CSV export: {:#}", err);
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to export")
        }
    }
}

/// GET / - Serve index.html
async fn serve_index() -> impl IntoResponse {
    Html(include_str!("../web/index.html"))
}

/// GET /dashboard - Serve dashboard page
async fn serve_dashboard() -> impl IntoResponse {
    Html(include_str!("../web/dashboard.html"))
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env();

    config
        .ensure_db_dir()
        .expect("Failed to create database directory");
    let conn = Connection::open(&config.db_path).expect("Failed to open database");
    receipt_ledger::setup_database(&conn).expect("Failed to initialize database schema");
    db::purge_expired_sessions(&conn, Utc::now()).expect("Failed to purge stale sessions");
    info!("database ready at {:?}", config.db_path);

    let ocr = TesseractOcr::new(config.tesseract_cmd.clone());
    if !ocr.is_available() {
        warn!(
            "'{}' not found; receipt image uploads will fail until it is installed",
            config.tesseract_cmd
        );
    }

    let state = AppState {
        db: Arc::new(Mutex::new(conn)),
        normalizer: Arc::new(ReceiptNormalizer::new(Arc::new(SystemClock))),
        ocr: Arc::new(ocr),
        config: Arc::new(config.clone()),
    };

    // Build API routes
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/upload", post(upload_receipt))
        .route("/import", post(import_bank_csv))
        .route("/receipts", get(list_receipts))
        .route("/export", get(export_receipts))
        .with_state(state);

    // Build main router
    let app = Router::new()
        .route("/", get(serve_index))
        .route("/dashboard", get(serve_dashboard))
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind to address");

    info!("listening on http://{}", config.bind_addr);

    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
