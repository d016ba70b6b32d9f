// UPI Summary - Web Server
// REST API with Axum: submit extracted statement tables, get the UPI summary back

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use upi_summary::extract::row_to_json;
use upi_summary::{
    parse_with, Config, InstitutionVariant, ParseLimits, ParserRegistry, ServerSection,
    StatementError, StatementInput, StatementSummary,
};

/// Shared application state
#[derive(Clone)]
struct AppState {
    registry: Arc<ParserRegistry>,
    limits: Arc<ServerSection>,
}

#[derive(Serialize)]
struct BankInfo {
    code: &'static str,
    name: &'static str,
    totals: String,
}

// ============================================================================
// Cancellation
// ============================================================================

/// Cancels the parse when dropped. The handler future holds it, so a
/// dropped connection or an elapsed timeout stops the blocking parse.
struct CancelOnDrop(ParseLimits);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

// ============================================================================
// Error mapping
// ============================================================================

fn status_for(err: &StatementError) -> StatusCode {
    match err {
        StatementError::EmptyDocument
        | StatementError::Schema { .. }
        | StatementError::AmountOverflow { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        StatementError::UnknownVariant(_) => StatusCode::NOT_FOUND,
        StatementError::TooManyRows { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        StatementError::TimedOut => StatusCode::GATEWAY_TIMEOUT,
        StatementError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
        StatementError::TotalsExtraction { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(err: &StatementError) -> Response {
    (status_for(err), Json(json!({ "error": err.to_string() }))).into_response()
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET / - Welcome message
async fn read_root() -> impl IntoResponse {
    Json(json!({ "message": "Welcome to the UPI Summary API!" }))
}

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(json!({ "status": "OK", "version": upi_summary::VERSION }))
}

/// GET /api/banks - Registered banks
async fn list_banks(State(state): State<AppState>) -> impl IntoResponse {
    let banks: Vec<BankInfo> = state
        .registry
        .variants()
        .into_iter()
        .filter_map(|variant| {
            let parser = state.registry.resolve(variant).ok()?;
            Some(BankInfo {
                code: variant.code(),
                name: variant.name(),
                totals: parser.totals_strategy().name().to_string(),
            })
        })
        .collect();

    Json(banks)
}

/// POST /pdf/extract_tables - Extracted pages flattened into labelled rows
async fn extract_tables(Json(input): Json<StatementInput>) -> impl IntoResponse {
    let rows: Vec<_> = input.into_rows().iter().map(row_to_json).collect();
    Json(json!({ "rows": rows }))
}

/// POST /api/banks/:bank/upi_summary - Summary for any registered bank
async fn bank_summary(
    State(state): State<AppState>,
    Path(bank): Path<String>,
    Json(input): Json<StatementInput>,
) -> Response {
    let decoded_bank = urlencoding::decode(&bank)
        .unwrap_or_else(|_| bank.clone().into())
        .into_owned();

    match decoded_bank.parse::<InstitutionVariant>() {
        Ok(variant) => summarize(state, variant, input).await,
        Err(e) => {
            warn!("Rejected summary request: {}", e);
            error_response(&e)
        }
    }
}

/// POST /pdf/extract_upi_summary - Union Bank summary (legacy route)
async fn union_summary(State(state): State<AppState>, Json(input): Json<StatementInput>) -> Response {
    summarize(state, InstitutionVariant::UnionBank, input).await
}

/// POST /pdf/extract_sbi_summary - SBI summary
async fn sbi_summary(State(state): State<AppState>, Json(input): Json<StatementInput>) -> Response {
    summarize(state, InstitutionVariant::Sbi, input).await
}

/// Run one parse off the async workers, bounded by the configured limits.
async fn summarize(state: AppState, variant: InstitutionVariant, input: StatementInput) -> Response {
    let request_id = uuid::Uuid::new_v4();
    let timeout = state.limits.parse_timeout();
    let started = Instant::now();

    let limits = ParseLimits::unlimited()
        .with_max_rows(state.limits.max_rows)
        .with_deadline(started + timeout);
    let _cancel = CancelOnDrop(limits.clone());

    let registry = Arc::clone(&state.registry);
    let task = tokio::task::spawn_blocking(move || -> Result<StatementSummary, StatementError> {
        let rows = input.into_rows();
        let parser = registry.resolve(variant)?;
        parse_with(&rows, parser, &limits)
    });

    let result = match tokio::time::timeout(timeout, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_err)) => {
            error!(%request_id, bank = %variant, "Parse task failed: {}", join_err);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "internal error" })),
            )
                .into_response();
        }
        Err(_) => Err(StatementError::TimedOut),
    };

    match result {
        Ok(summary) => {
            info!(
                %request_id,
                bank = %variant,
                groups = summary.upi_summary.len(),
                transactions = summary.transaction_count(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Statement summarized"
            );
            (StatusCode::OK, Json(summary)).into_response()
        }
        Err(e) if e.is_recoverable() => {
            info!(%request_id, bank = %variant, "Statement rejected: {}", e);
            error_response(&e)
        }
        Err(e) => {
            error!(%request_id, bank = %variant, "Statement parse failed: {}", e);
            error_response(&e)
        }
    }
}

fn app(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/banks", get(list_banks))
        .route("/banks/:bank/upi_summary", post(bank_summary));

    let pdf_routes = Router::new()
        .route("/extract_tables", post(extract_tables))
        .route("/extract_upi_summary", post(union_summary))
        .route("/extract_sbi_summary", post(sbi_summary));

    Router::new()
        .route("/", get(read_root))
        .nest("/api", api_routes)
        .nest("/pdf", pdf_routes)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::load(None)?;
    let state = AppState {
        registry: Arc::new(ParserRegistry::builtin()),
        limits: Arc::new(config.server.clone()),
    };

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr).await?;
    info!(
        addr = %config.server.bind_addr,
        parse_timeout_secs = config.server.parse_timeout_secs,
        max_rows = config.server.max_rows,
        "UPI summary server listening"
    );

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
