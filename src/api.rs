//! REST API for the pack calculator.
//!
//! Provides HTTP endpoints for the calculator UI and other clients.
//! Uses Axum as the web framework and supports CORS.

use std::collections::BTreeMap;
use std::sync::OnceLock;
use std::time::Duration;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::middleware::map_response;
use axum::{
    Router,
    http::{StatusCode, Uri, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use rust_embed::RustEmbed;
use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use utoipa::{OpenApi, ToSchema};

use crate::config::ApiConfig;
use crate::error::PackError;
use crate::model::Combination;
use crate::service::{PackService, ServiceError};

#[derive(Clone)]
pub struct ApiState {
    service: PackService,
}

impl ApiState {
    pub fn new(service: PackService) -> Self {
        Self { service }
    }
}

static OPENAPI_DOC: OnceLock<utoipa::openapi::OpenApi> = OnceLock::new();

const SWAGGER_UI_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
    <head>
        <meta charset="utf-8" />
        <title>packwise API Docs</title>
        <link
            rel="stylesheet"
            href="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui.css"
            integrity="sha384-wxLW6kwyHktdDGr6Pv1zgm/VGJh99lfUbzSn6HNHBENZlCN7W602k9VkGdxuFvPn"
            crossorigin="anonymous"
        />
    </head>
    <body>
        <div id="swagger-ui"></div>
        <script
            src="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui-bundle.js"
            integrity="sha384-wmyclcVGX/WhUkdkATwhaK1X1JtiNrr2EoYJ+diV3vj4v6OC5yCeSu+yW13SYJep"
            crossorigin="anonymous"
        ></script>
        <script>
            window.onload = function () {
                window.ui = SwaggerUIBundle({
                    url: "/docs/openapi.json",
                    dom_id: "#swagger-ui",
                });
            };
        </script>
    </body>
    </html>"##;

fn openapi_doc() -> &'static utoipa::openapi::OpenApi {
    OPENAPI_DOC.get_or_init(ApiDoc::openapi)
}

/// Embedded calculator UI (HTML, CSS, JS)
#[derive(RustEmbed)]
#[folder = "web/"]
struct WebAssets;

/// Request body for the calculate endpoint.
///
/// `packsOverride` replaces the configured pack sizes for this request only.
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({ "quantity": 12001, "packsOverride": [250, 500, 1000, 2000, 5000] }))]
pub struct CalculateRequest {
    pub quantity: i64,
    #[serde(default)]
    #[schema(nullable = true)]
    pub packs_override: Option<Vec<i64>>,
}

/// Chosen packs and derived totals.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CalculateResponse {
    #[schema(value_type = Object, example = json!({ "250": 1, "2000": 1, "5000": 2 }))]
    pub items_by_pack: BTreeMap<u64, u64>,
    pub total_items: u64,
    pub total_packs: u64,
    pub leftover: u64,
}

impl From<Combination> for CalculateResponse {
    fn from(combination: Combination) -> Self {
        let Combination {
            items_by_pack,
            total_items,
            total_packs,
            leftover,
        } = combination;
        Self {
            items_by_pack,
            total_items,
            total_packs,
            leftover,
        }
    }
}

/// Currently configured pack sizes.
#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct PackSizesResponse {
    pub sizes: Vec<u64>,
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

fn error_response(
    status: StatusCode,
    code: impl Into<String>,
    message: impl Into<String>,
) -> Response {
    let body = ErrorBody {
        code: code.into(),
        message: message.into(),
    };
    (status, Json(body)).into_response()
}

fn internal_error() -> Response {
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal_error",
        "unexpected error",
    )
}

fn json_rejection(err: JsonRejection) -> Response {
    error_response(
        StatusCode::BAD_REQUEST,
        "invalid_request",
        format!("invalid JSON payload: {}", err.body_text()),
    )
}

/// Gives timed-out requests the same JSON error shape as other failures.
async fn timeout_body(response: Response) -> Response {
    if response.status() == StatusCode::REQUEST_TIMEOUT {
        return error_response(
            StatusCode::REQUEST_TIMEOUT,
            "request_timeout",
            "request took too long",
        );
    }
    response
}

/// Bounds each request by `request_timeout`, answering 408 with an
/// `ErrorBody` when it elapses.
fn with_request_timeout<S>(router: Router<S>, request_timeout: Duration) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(map_response(timeout_body))
}

fn service_error(err: ServiceError) -> Response {
    if err.is_internal() {
        error!("❌ Request failed with an internal error: {err}");
        return internal_error();
    }

    let status = match &err {
        ServiceError::Pack(PackError::InvalidQuantity(_) | PackError::InvalidPackSize(_)) => {
            StatusCode::BAD_REQUEST
        }
        _ => StatusCode::UNPROCESSABLE_ENTITY,
    };
    error_response(status, err.code(), err.to_string())
}

#[derive(OpenApi)]
#[openapi(
    paths(handle_calculate, handle_pack_sizes),
    components(schemas(CalculateRequest, CalculateResponse, PackSizesResponse, ErrorBody)),
    tags((name = "packs", description = "Pack combination calculator"))
)]
struct ApiDoc;

/// Builds the application router with all layers.
pub fn build_router(state: ApiState, request_timeout: Duration) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let router = Router::new()
        // API endpoints
        .route("/v1/packsizes", get(handle_pack_sizes))
        .route("/v1/calculate", post(handle_calculate))
        // Probes
        .route("/healthz", get(|| async { "ok" }))
        .route("/readyz", get(|| async { "ready" }))
        // API documentation
        .route("/docs/openapi.json", get(serve_openapi_json))
        .route("/docs", get(serve_openapi_ui))
        // Web-UI (embedded)
        .route("/", get(serve_index))
        .route("/{*path}", get(serve_static))
        .layer(TraceLayer::new_for_http());

    with_request_timeout(router, request_timeout)
        .layer(cors)
        .with_state(state)
}

/// Starts the API server and runs until Ctrl-C or SIGTERM.
pub async fn start_api_server(config: ApiConfig, service: PackService) -> std::io::Result<()> {
    let source_name = service.source_name().to_string();
    let solver = *service.config();
    let app = build_router(ApiState::new(service), config.request_timeout());

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;

    let display_host = config.display_host();
    info!("🚀 Server running on http://{}:{}", display_host, config.port());
    if config.binds_to_all_interfaces() {
        info!("💡 Local access: http://localhost:{}", config.port());
    }
    info!("📦 Pack sizes from {} source", source_name);
    info!(
        "🧮 Solver: GCD scaling {}, search window up to {} cells",
        if solver.gcd_scaling { "on" } else { "off" },
        solver.max_search_span
    );
    info!("⏱️ Request timeout: {:?}", config.request_timeout());
    info!("📦 API endpoints: GET /v1/packsizes, POST /v1/calculate");
    info!("📑 Documentation: GET /docs, GET /docs/openapi.json");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!("Could not listen for Ctrl-C: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!("Could not listen for SIGTERM: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutting down...");
}

/// Handler for GET /v1/packsizes.
#[utoipa::path(
    get,
    path = "/v1/packsizes",
    responses(
        (status = 200, description = "Configured pack sizes", body = PackSizesResponse),
        (status = INTERNAL_SERVER_ERROR, description = "Size source failed", body = ErrorBody)
    ),
    tag = "packs"
)]
async fn handle_pack_sizes(State(state): State<ApiState>) -> Response {
    match state.service.pack_sizes() {
        Ok(sizes) => (StatusCode::OK, Json(PackSizesResponse { sizes })).into_response(),
        Err(err) => service_error(err),
    }
}

/// Handler for POST /v1/calculate.
///
/// Solves on the blocking pool; the timeout layer bounds the wait.
#[utoipa::path(
    post,
    path = "/v1/calculate",
    request_body = CalculateRequest,
    responses(
        (status = 200, description = "Best pack combination", body = CalculateResponse),
        (status = BAD_REQUEST, description = "Invalid JSON, quantity or pack size", body = ErrorBody),
        (status = REQUEST_TIMEOUT, description = "Request exceeded the configured timeout", body = ErrorBody),
        (status = UNPROCESSABLE_ENTITY, description = "No pack sizes or quantity too large", body = ErrorBody),
        (status = INTERNAL_SERVER_ERROR, description = "Unexpected failure", body = ErrorBody)
    ),
    tag = "packs"
)]
async fn handle_calculate(
    State(state): State<ApiState>,
    payload: Result<Json<CalculateRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(err) => return json_rejection(err),
    };

    let quantity = request.quantity;
    let packs_override = request.packs_override.unwrap_or_default();
    info!(
        "📥 New calculate request: quantity {}, {} override sizes",
        quantity,
        packs_override.len()
    );

    let service = state.service.clone();
    let result =
        tokio::task::spawn_blocking(move || service.calculate(quantity, &packs_override)).await;

    match result {
        Ok(Ok(combination)) => {
            info!(
                "📦 Result for {}: {} items in {} packs, {} left over",
                combination.requested(),
                combination.total_items,
                combination.total_packs,
                combination.leftover
            );
            (StatusCode::OK, Json(CalculateResponse::from(combination))).into_response()
        }
        Ok(Err(err)) => service_error(err),
        Err(err) => {
            error!("❌ Solver task failed: {err}");
            internal_error()
        }
    }
}

/// Serves the index.html main page
async fn serve_index() -> Response {
    match WebAssets::get("index.html") {
        Some(content) => Html(content.data).into_response(),
        None => (StatusCode::NOT_FOUND, "404 Not Found").into_response(),
    }
}

/// Serves static assets (JS, CSS, etc.)
async fn serve_static(uri: Uri) -> Response {
    let path = uri.path().trim_start_matches('/');

    match WebAssets::get(path) {
        Some(content) => {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            ([(header::CONTENT_TYPE, mime.as_ref())], content.data).into_response()
        }
        None => (StatusCode::NOT_FOUND, "404 Not Found").into_response(),
    }
}

async fn serve_openapi_json() -> impl IntoResponse {
    Json(openapi_doc())
}

async fn serve_openapi_ui() -> impl IntoResponse {
    Html(SWAGGER_UI_HTML)
}
