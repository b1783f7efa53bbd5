//! HTTP boundary: quotes, symbol search and XML materialization.
//!
//! Routes:
//! - `GET /api/stocks?symbol=..&apiKey=..`: single quote.
//! - `GET /api/stocks?query=..&apiKey=..`: symbol search.
//! - `POST /api/xml`: render the posted stocks and write the document into
//!   the public directory.
//! - everything else: static files from the public directory, so the path
//!   returned by `POST /api/xml` can be fetched.
//!
//! The fetcher does blocking I/O, so handlers run it on the blocking pool.
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::Router;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use log::{error, info};
use stock_common::net::{STOCKS_ROUTE, XML_ROUTE, addr};
use stock_common::{QuoteFetcher, StockError, XmlFormat};
use tokio::task::{JoinError, spawn_blocking};
use tower_http::services::ServeDir;

use crate::model::{ErrorBody, StocksParams, XmlRequest, XmlResponse};

/// Shared application state for axum handlers.
#[derive(Clone)]
pub struct AppState {
    fetcher: Arc<QuoteFetcher>,
    public_dir: PathBuf,
}

impl AppState {
    /// State over a shared fetcher, writing documents into `public_dir`.
    pub fn new(fetcher: Arc<QuoteFetcher>, public_dir: PathBuf) -> Self {
        Self {
            fetcher,
            public_dir,
        }
    }
}

/// Error reply carrying a status and a message.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<StockError> for ApiError {
    fn from(err: StockError) -> Self {
        let status = if err.is_validation() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<JoinError> for ApiError {
    fn from(err: JoinError) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: format!("Request task failed: {}", err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!("API error: {}", self.message);
        }
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}

/// Create the axum router.
pub fn create_router(state: AppState) -> Router {
    let static_files = ServeDir::new(&state.public_dir);
    Router::new()
        .route(STOCKS_ROUTE, get(get_stocks))
        .route(XML_ROUTE, post(post_xml))
        .fallback_service(static_files)
        .with_state(state)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// `GET /api/stocks`: quote when `symbol` is given, search when `query` is.
async fn get_stocks(
    State(state): State<AppState>,
    Query(params): Query<StocksParams>,
) -> Result<Response, ApiError> {
    let api_key = non_empty(params.api_key)
        .ok_or_else(|| ApiError::bad_request("API key is required"))?;
    let fetcher = Arc::clone(&state.fetcher);

    if let Some(symbol) = non_empty(params.symbol) {
        let quote = spawn_blocking(move || fetcher.get_quote(&symbol, &api_key)).await?;
        return Ok(Json(quote).into_response());
    }

    if let Some(query) = non_empty(params.query) {
        let results =
            spawn_blocking(move || fetcher.search_symbols(&query, &api_key)).await??;
        return Ok(Json(results).into_response());
    }

    Err(ApiError::bad_request(
        "Either symbol or query parameter is required",
    ))
}

/// `POST /api/xml`: render and write the document, reply with its public path.
async fn post_xml(
    State(state): State<AppState>,
    payload: Result<Json<XmlRequest>, JsonRejection>,
) -> Result<Json<XmlResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let stocks = request.stocks.unwrap_or_default();
    if stocks.is_empty() {
        return Err(StockError::Validation("No stocks provided".to_string()).into());
    }

    let format = request.format.unwrap_or_default();
    let xml = format.render(&stocks);
    let path = write_document(&state.public_dir, format, &xml).await?;
    info!("{} document with {} stocks written to {}", format, stocks.len(), path);

    Ok(Json(XmlResponse {
        success: true,
        path,
    }))
}

/// Write `xml` to the fixed file of `format`; returns the public path.
async fn write_document(public_dir: &Path, format: XmlFormat, xml: &str) -> Result<String, StockError> {
    tokio::fs::create_dir_all(public_dir).await?;
    let file_name = format.file_name();
    tokio::fs::write(public_dir.join(file_name), xml).await?;
    Ok(format!("/{}", file_name))
}

/// Run the HTTP server until Ctrl+C.
pub async fn run_server(state: AppState, bind: &str, port: u16) -> Result<(), StockError> {
    let socket_addr: SocketAddr = addr(bind, port)
        .parse()
        .map_err(|e| StockError::Validation(format!("Invalid bind address: {}", e)))?;

    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(socket_addr).await?;
    info!("HTTP server listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl+C: {}", e);
            }
            info!("Ctrl+C received. Shutting down server...");
        })
        .await?;
    Ok(())
}
