// Inventory Counts - Web Server
// REST API with Axum over the shared list store

use anyhow::Context;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use inventory_counts::{
    adjust_line, all_lists_csv_string, create_list, delete_all_lists, delete_list,
    export::export_file_name, list_csv_string, list_summaries, load_all_lists, load_list,
    logging, lookup_for_list, open_database, record_scan, Catalogue, Config, InventoryError,
    InventoryList, ItemLookup, ListSummary, ManualDetails, Price, ResolvedItem, ScanOutcome,
    StoreError,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::cors::CorsLayer;

const ACTOR: &str = "api";

/// Shared application state
#[derive(Clone)]
struct AppState {
    db: Arc<Mutex<Connection>>,
    catalogue: Arc<Catalogue>,
}

impl AppState {
    fn db(&self) -> Result<MutexGuard<'_, Connection>, ApiError> {
        self.db
            .lock()
            .map_err(|_| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "database lock poisoned"))
    }
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

impl ApiResponse<()> {
    fn error(message: String) -> Self {
        Self {
            success: false,
            data: (),
            error: Some(message),
        }
    }
}

/// Handler failure rendered as the error envelope
#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        let status = match &e {
            StoreError::ListNotFound(_) | StoreError::Inventory(InventoryError::LineNotFound(_)) => {
                StatusCode::NOT_FOUND
            }
            StoreError::ListExists(_) => StatusCode::CONFLICT,
            e if e.is_user_error() => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %e, "request failed");
        }
        ApiError::new(status, e.to_string())
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        tracing::error!(error = ?e, "request failed");
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::new(StatusCode::BAD_REQUEST, rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ApiResponse::error(self.message))).into_response()
    }
}

type ApiResult = Result<Response, ApiError>;

// ============================================================================
// Request / Response bodies
// ============================================================================

#[derive(Deserialize)]
struct CreateListRequest {
    name: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScanRequest {
    #[serde(default)]
    item_code: String,
    brand: Option<String>,
    description: Option<String>,
    price: Option<Price>,
    delta: i64,
}

#[derive(Deserialize)]
struct AdjustRequest {
    delta: i64,
}

/// One line as the client renders it
#[derive(Serialize)]
struct LineResponse {
    key: String,
    code: String,
    brand: String,
    description: String,
    price: Price,
    qty: i64,
    scale: bool,
    total: f64,
}

/// List with computed totals
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    name: String,
    created: String,
    lines: Vec<LineResponse>,
    total_qty: i64,
    grand_total: f64,
}

impl From<InventoryList> for ListResponse {
    fn from(list: InventoryList) -> Self {
        Self {
            total_qty: list.total_qty(),
            grand_total: cents_to_f64(list.grand_total_cents()),
            created: list.created.to_rfc3339(),
            lines: list
                .lines()
                .map(|(key, item)| LineResponse {
                    key: key.clone(),
                    code: item.code.to_string(),
                    brand: item.brand.clone(),
                    description: item.description.clone(),
                    price: item.price,
                    qty: item.qty,
                    scale: item.scale,
                    total: cents_to_f64(item.total_cents()),
                })
                .collect(),
            name: list.name,
        }
    }
}

#[derive(Serialize)]
struct ScanResponse {
    resolved: ResolvedItem,
    outcome: ScanOutcome,
    list: ListResponse,
}

fn cents_to_f64(cents: i64) -> f64 {
    cents as f64 / 100.0
}

fn find_list(conn: &Connection, name: &str) -> Result<InventoryList, ApiError> {
    load_list(conn, name)?.ok_or_else(|| StoreError::ListNotFound(name.to_string()).into())
}

fn csv_attachment(file_name: &str, body: String) -> Response {
    let disposition = format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        file_name.replace('"', "_"),
        urlencoding::encode(file_name)
    );
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response()
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/items - Catalogue feed for autocomplete
async fn get_items(State(state): State<AppState>) -> impl IntoResponse {
    let items: Vec<_> = state.catalogue.iter().collect();
    Json(ApiResponse::ok(items)).into_response()
}

/// GET /api/lists - All lists with totals
async fn get_lists(State(state): State<AppState>) -> ApiResult {
    let conn = state.db()?;
    let summaries: Vec<ListSummary> = list_summaries(&conn)?;
    Ok(Json(ApiResponse::ok(summaries)).into_response())
}

/// POST /api/lists - Create an empty list
async fn post_list(
    State(state): State<AppState>,
    body: Result<Json<CreateListRequest>, JsonRejection>,
) -> ApiResult {
    let Json(body) = body?;
    let name = body
        .name
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| ApiError::new(StatusCode::BAD_REQUEST, "list name is required"))?;

    let conn = state.db()?;
    let list = create_list(&conn, &name)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(ListResponse::from(list)))).into_response())
}

/// DELETE /api/lists - Delete every list
async fn delete_lists(State(state): State<AppState>) -> ApiResult {
    let mut conn = state.db()?;
    let deleted = delete_all_lists(&mut conn, ACTOR)?;
    Ok(Json(ApiResponse::ok(serde_json::json!({ "deleted": deleted }))).into_response())
}

/// GET /api/lists/:name - One list with lines and totals
async fn get_list(State(state): State<AppState>, Path(name): Path<String>) -> ApiResult {
    let conn = state.db()?;
    let list = find_list(&conn, &name)?;
    Ok(Json(ApiResponse::ok(ListResponse::from(list))).into_response())
}

/// DELETE /api/lists/:name
async fn remove_list(State(state): State<AppState>, Path(name): Path<String>) -> ApiResult {
    let mut conn = state.db()?;
    let lines = delete_list(&mut conn, &name, ACTOR)?;
    Ok(Json(ApiResponse::ok(serde_json::json!({ "name": name, "lines": lines }))).into_response())
}

/// POST /api/lists/:name/items - Count a scan into a list
async fn post_item(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Result<Json<ScanRequest>, JsonRejection>,
) -> ApiResult {
    let Json(body) = body?;
    let manual = ManualDetails::new(body.brand, body.description, body.price);

    let mut conn = state.db()?;
    let (resolved, outcome) = record_scan(
        &mut conn,
        state.catalogue.as_ref(),
        &name,
        &body.item_code,
        &manual,
        body.delta,
        ACTOR,
    )?;
    let list = find_list(&conn, &name)?;

    Ok(Json(ApiResponse::ok(ScanResponse {
        resolved,
        outcome,
        list: list.into(),
    }))
    .into_response())
}

/// POST /api/lists/:name/lines/:key - Change one line's quantity
async fn post_line(
    State(state): State<AppState>,
    Path((name, key)): Path<(String, String)>,
    body: Result<Json<AdjustRequest>, JsonRejection>,
) -> ApiResult {
    let Json(body) = body?;
    let mut conn = state.db()?;
    let outcome = adjust_line(&mut conn, &name, &key, body.delta, ACTOR)?;
    Ok(Json(ApiResponse::ok(outcome)).into_response())
}

/// GET /api/lists/:name/lookup/:code - Resolve before counting
async fn get_lookup(
    State(state): State<AppState>,
    Path((name, code)): Path<(String, String)>,
) -> ApiResult {
    let conn = state.db()?;
    let lookup: ItemLookup = lookup_for_list(&conn, state.catalogue.as_ref(), &name, &code)?;
    Ok(Json(ApiResponse::ok(lookup)).into_response())
}

/// GET /api/export/:name - One list as CSV
async fn export_list(State(state): State<AppState>, Path(name): Path<String>) -> ApiResult {
    let conn = state.db()?;
    let list = find_list(&conn, &name)?;
    let body = list_csv_string(&list)?;
    Ok(csv_attachment(&export_file_name(&list.name), body))
}

/// GET /api/exportall - Every list in one CSV
async fn export_all(State(state): State<AppState>) -> ApiResult {
    let conn = state.db()?;
    let lists = load_all_lists(&conn)?;
    let body = all_lists_csv_string(&lists)?;
    Ok(csv_attachment("all_lists.csv", body))
}

/// GET / - Serve index.html
async fn serve_index() -> impl IntoResponse {
    Html(include_str!("../web/index.html"))
}

// ============================================================================
// Main Server
// ============================================================================

fn app(state: AppState) -> Router {
    // Build API routes
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/items", get(get_items))
        .route("/lists", get(get_lists).post(post_list).delete(delete_lists))
        .route("/lists/:name", get(get_list).delete(remove_list))
        .route("/lists/:name/items", post(post_item))
        .route("/lists/:name/lines/:key", post(post_line))
        .route("/lists/:name/lookup/:code", get(get_lookup))
        .route("/export/:name", get(export_list))
        .route("/exportall", get(export_all))
        .with_state(state);

    // Build main router
    Router::new()
        .route("/", get(serve_index))
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Invalid configuration")?;
    logging::init_tracing(&config)?;

    let catalogue = match Catalogue::from_path(&config.item_csv) {
        Ok((catalogue, _report)) => catalogue,
        Err(e) => {
            tracing::error!(path = ?config.item_csv, error = ?e, "failed to load item list, starting with an empty catalogue");
            Catalogue::new()
        }
    };

    let conn = open_database(&config.database)
        .with_context(|| format!("Failed to open list database {:?}", config.database))?;
    tracing::info!(database = ?config.database, items = catalogue.len(), "store ready");

    // Create shared state
    let state = AppState {
        db: Arc::new(Mutex::new(conn)),
        catalogue: Arc::new(catalogue),
    };

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!(%addr, "server running");
    println!("🚀 Server running on http://localhost:{}", config.port);

    axum::serve(listener, app(state))
        .await
        .context("Server stopped with an error")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use inventory_counts::{setup_database, CanonicalCode, CatalogueEntry};
    use serde_json::Value;
    use tower::ServiceExt;

    fn test_state() -> AppState {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        let catalogue = Catalogue::from_entries(vec![CatalogueEntry {
            code: CanonicalCode::new("0061414100003").unwrap(),
            brand: "Acme".to_string(),
            description: "Peanut Butter".to_string(),
            price: Price::from_cents(499),
            subdept: "Grocery".to_string(),
        }]);
        AppState {
            db: Arc::new(Mutex::new(conn)),
            catalogue: Arc::new(catalogue),
        }
    }

    async fn send(state: &AppState, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
        let mut req = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                req = req.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = app(state.clone()).oneshot(req.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    async fn send_json(state: &AppState, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let (status, bytes) = send(state, method, uri, body).await;
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let state = test_state();
        let (status, body) = send_json(&state, "GET", "/api/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"], "OK");
    }

    #[tokio::test]
    async fn test_create_list_statuses() {
        let state = test_state();

        let (status, _) = send_json(&state, "POST", "/api/lists", Some(serde_json::json!({ "name": "aisle4" }))).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = send_json(&state, "POST", "/api/lists", Some(serde_json::json!({ "name": "aisle4" }))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["success"], false);

        let (status, _) = send_json(&state, "POST", "/api/lists", Some(serde_json::json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send_json(&state, "GET", "/api/lists", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_scan_merges_catalogue_item() {
        let state = test_state();
        send_json(&state, "POST", "/api/lists", Some(serde_json::json!({ "name": "aisle4" }))).await;

        for _ in 0..2 {
            let (status, _) = send_json(
                &state,
                "POST",
                "/api/lists/aisle4/items",
                Some(serde_json::json!({ "itemCode": "614141000036", "brand": "Ignored", "delta": 3 })),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
        }

        let (_, body) = send_json(&state, "GET", "/api/lists/aisle4", None).await;
        let lines = body["data"]["lines"].as_array().unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["key"], "0061414100003");
        assert_eq!(lines[0]["brand"], "Acme");
        assert_eq!(lines[0]["qty"], 6);
        assert_eq!(body["data"]["grandTotal"], 29.94);
    }

    #[tokio::test]
    async fn test_scale_labels_stay_separate() {
        let state = test_state();
        send_json(&state, "POST", "/api/lists", Some(serde_json::json!({ "name": "deli" }))).await;

        for code in ["27088050707", "27088050412"] {
            send_json(
                &state,
                "POST",
                "/api/lists/deli/items",
                Some(serde_json::json!({ "itemCode": code, "delta": 1 })),
            )
            .await;
        }

        let (_, body) = send_json(&state, "GET", "/api/lists/deli", None).await;
        let keys: Vec<&str> = body["data"]["lines"]
            .as_array()
            .unwrap()
            .iter()
            .map(|l| l["key"].as_str().unwrap())
            .collect();
        assert_eq!(keys, vec!["2708805000000-0412-2", "2708805000000-0707-1"]);
    }

    #[tokio::test]
    async fn test_scan_errors() {
        let state = test_state();
        send_json(&state, "POST", "/api/lists", Some(serde_json::json!({ "name": "aisle4" }))).await;

        let (status, _) = send_json(
            &state,
            "POST",
            "/api/lists/aisle4/items",
            Some(serde_json::json!({ "itemCode": "", "delta": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send_json(
            &state,
            "POST",
            "/api/lists/aisle4/items",
            Some(serde_json::json!({ "itemCode": "614141000036", "delta": 0 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send_json(
            &state,
            "POST",
            "/api/lists/missing/items",
            Some(serde_json::json!({ "itemCode": "614141000036", "delta": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_oversized_price_or_delta_is_bad_request() {
        let state = test_state();
        send_json(&state, "POST", "/api/lists", Some(serde_json::json!({ "name": "aisle4" }))).await;

        for body in [
            serde_json::json!({ "itemCode": "4006381333931", "price": 1e30, "delta": 1 }),
            serde_json::json!({ "itemCode": "4006381333931", "price": "100000000000000000", "delta": 1 }),
            serde_json::json!({ "itemCode": "614141000036", "delta": 100_000_000_000_000_000i64 }),
            serde_json::json!({ "itemCode": "614141000036", "delta": "many" }),
        ] {
            let (status, body) = send_json(&state, "POST", "/api/lists/aisle4/items", Some(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["success"], false);
        }

        let (status, body) = send_json(
            &state,
            "POST",
            "/api/lists/aisle4/items",
            Some(serde_json::json!({ "itemCode": "614141000036", "delta": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["outcome"]["item"]["qty"], 1);

        let (status, body) = send_json(
            &state,
            "POST",
            "/api/lists/aisle4/lines/0061414100003",
            Some(serde_json::json!({ "delta": i64::MAX })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);

        let (status, body) = send_json(&state, "GET", "/api/lists", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"][0]["total_qty"], 1);
    }

    #[tokio::test]
    async fn test_adjust_line_removes_at_zero() {
        let state = test_state();
        send_json(&state, "POST", "/api/lists", Some(serde_json::json!({ "name": "aisle4" }))).await;
        send_json(
            &state,
            "POST",
            "/api/lists/aisle4/items",
            Some(serde_json::json!({ "itemCode": "614141000036", "delta": 1 })),
        )
        .await;

        let (status, body) = send_json(
            &state,
            "POST",
            "/api/lists/aisle4/lines/0061414100003",
            Some(serde_json::json!({ "delta": -1 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["removed"], true);

        let (status, _) = send_json(
            &state,
            "POST",
            "/api/lists/aisle4/lines/0061414100003",
            Some(serde_json::json!({ "delta": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_lookup_prefills_manual_details() {
        let state = test_state();
        send_json(&state, "POST", "/api/lists", Some(serde_json::json!({ "name": "backroom" }))).await;
        send_json(
            &state,
            "POST",
            "/api/lists/backroom/items",
            Some(serde_json::json!({
                "itemCode": "4006381333931",
                "brand": "Stabilo",
                "description": "Highlighter",
                "price": "1.25",
                "delta": 1
            })),
        )
        .await;

        let (status, body) = send_json(&state, "GET", "/api/lists/backroom/lookup/4006381333931", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["data"]["resolved"]["entry"].is_null());
        assert_eq!(body["data"]["previous"]["brand"], "Stabilo");
    }

    #[tokio::test]
    async fn test_export_is_csv_attachment() {
        let state = test_state();
        send_json(&state, "POST", "/api/lists", Some(serde_json::json!({ "name": "aisle4" }))).await;
        send_json(
            &state,
            "POST",
            "/api/lists/aisle4/items",
            Some(serde_json::json!({ "itemCode": "614141000036", "delta": 2 })),
        )
        .await;

        let response = app(state.clone())
            .oneshot(Request::builder().uri("/api/export/aisle4").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let disposition = response.headers()[header::CONTENT_DISPOSITION].to_str().unwrap().to_string();
        assert!(disposition.starts_with("attachment;"));
        assert!(disposition.contains("aisle4.csv"));

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let csv = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(csv.starts_with("Item Code,Brand,Description,Price,Quantity,Total"));
        assert!(csv.contains(",,,,Grand Total,9.98"));

        let (status, bytes) = send(&state, "GET", "/api/exportall", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(String::from_utf8(bytes).unwrap().starts_with("List,"));

        let (status, _) = send(&state, "GET", "/api/export/missing", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_lists() {
        let state = test_state();
        send_json(&state, "POST", "/api/lists", Some(serde_json::json!({ "name": "a" }))).await;
        send_json(&state, "POST", "/api/lists", Some(serde_json::json!({ "name": "b" }))).await;

        let (status, _) = send_json(&state, "DELETE", "/api/lists/a", None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send_json(&state, "DELETE", "/api/lists/a", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send_json(&state, "DELETE", "/api/lists", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["deleted"], 1);
    }
}
