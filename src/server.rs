// Coffee Payer - Web Server
// Order form + JSON API on top of the SQLite ledger

use crate::config::Config;
use crate::db::{LedgerEntry, LedgerStore, SqliteLedger};
use crate::error::Result as LedgerResult;
use crate::parser::{field_names, slots_from_form, MAX_PARTICIPANTS};
use crate::trip::{process_trip, TripOutcome};
use anyhow::Context;
use axum::{
    extract::{Form, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json},
    routing::get,
    Router,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

const PAGE_TEMPLATE: &str = include_str!("../web/index.html");

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    ledger: Arc<Mutex<SqliteLedger>>,
}

impl AppState {
    pub fn new(ledger: SqliteLedger) -> Self {
        Self {
            ledger: Arc::new(Mutex::new(ledger)),
        }
    }

    // One submission at a time; every upsert is already atomic, so a poisoned lock is still usable
    fn with_ledger<T>(&self, f: impl FnOnce(&mut SqliteLedger) -> LedgerResult<T>) -> LedgerResult<T> {
        let mut ledger = self.ledger.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut ledger)
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

    fn err(data: T, error: String) -> Self {
        Self {
            success: false,
            data,
            error: Some(error),
        }
    }
}

// ============================================================================
// Page rendering
// ============================================================================

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn render_rows() -> String {
    (1..=MAX_PARTICIPANTS)
        .map(|i| {
            let (name_key, price_key) = field_names(i);
            format!(
                "        <div class=\"row\">\
                 <input name=\"{name_key}\" placeholder=\"Person {i} name\">\
                 <input name=\"{price_key}\" placeholder=\"Price\" inputmode=\"decimal\">\
                 </div>\n"
            )
        })
        .collect()
}

fn render_result(outcome: &TripOutcome) -> String {
    let mut html = format!(
        "    <div class=\"payer\">\n        <h2>{} pays!</h2>\n        <p>Drawn at {}</p>\n",
        escape_html(outcome.payer.display_name()),
        outcome.drawn_at_display()
    );

    if !outcome.lines.is_empty() {
        html.push_str(&format!(
            "        <p>Trip total: {:.2}</p>\n        <table>\n            <tr><th>Name</th><th>Coffee</th><th>Lifetime</th></tr>\n",
            outcome.trip_total()
        ));
        for line in &outcome.lines {
            html.push_str(&format!(
                "            <tr><td>{}</td><td>{:.2}</td><td>{:.2}</td></tr>\n",
                escape_html(&line.participant.display_name),
                line.price,
                line.lifetime_spend
            ));
        }
        html.push_str("        </table>\n");
    }

    html.push_str("    </div>");
    html
}

pub fn render_page(outcome: Option<&TripOutcome>) -> String {
    PAGE_TEMPLATE
        .replace("{{rows}}", &render_rows())
        .replace("{{result}}", &outcome.map(render_result).unwrap_or_default())
}

// ============================================================================
// Handlers
// ============================================================================

/// GET / - Empty order form
async fn serve_index() -> impl IntoResponse {
    Html(render_page(None))
}

/// POST / - Record the orders and pick a payer
async fn submit_orders(
    State(state): State<AppState>,
    Form(form): Form<HashMap<String, String>>,
) -> impl IntoResponse {
    let slots = slots_from_form(&form);
    let result = state.with_ledger(|ledger| process_trip(ledger, &slots, &mut rand::thread_rng()));

    match result {
        Ok(outcome) => (StatusCode::OK, Html(render_page(Some(&outcome)))).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to process coffee trip");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(render_page(None)),
            )
                .into_response()
        }
    }
}

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/ledger - Everyone's lifetime spending
async fn get_ledger(State(state): State<AppState>) -> impl IntoResponse {
    match state.with_ledger(|ledger| ledger.entries()) {
        Ok(entries) => (StatusCode::OK, Json(ApiResponse::ok(entries))).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to read ledger");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::err(Vec::<LedgerEntry>::new(), e.to_string())),
            )
                .into_response()
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/ledger", get(get_ledger))
        .with_state(state.clone());

    Router::new()
        .route("/", get(serve_index).post(submit_orders))
        .with_state(state)
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Opens the ledger and serves until the process is stopped.
pub async fn serve(config: &Config) -> anyhow::Result<()> {
    let ledger = SqliteLedger::open(&config.database_path)
        .with_context(|| format!("Failed to open ledger at {:?}", config.database_path))?;
    tracing::info!(path = ?config.database_path, "ledger opened");

    let app = build_router(AppState::new(ledger));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;
    tracing::info!(addr = %config.bind_addr, "coffee server listening");

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    fn test_app() -> Router {
        build_router(AppState::new(SqliteLedger::open_in_memory().unwrap()))
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn form_post(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = test_app()
            .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("\"OK\""));
    }

    #[tokio::test]
    async fn test_index_has_seven_rows() {
        let response = test_app()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let html = body_text(response).await;
        assert!(html.contains("person7Price"));
        assert!(!html.contains("person8Name"));
        assert!(!html.contains("{{rows}}"));
    }

    #[tokio::test]
    async fn test_submit_picks_only_valid_participant() {
        let app = test_app();

        let response = app
            .clone()
            .oneshot(form_post(
                "person1Name=Miles+Yang&person1Price=4.5&person2Name=Bad&person2Price=abc",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("Miles Yang pays!"));
        assert!(html.contains("Drawn at "));

        let ledger = app
            .oneshot(Request::builder().uri("/api/ledger").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let json = body_text(ledger).await;
        assert!(json.contains("\"worker_name\":\"milesyang\""));
        assert!(!json.contains("bad"));
    }

    #[tokio::test]
    async fn test_empty_submit_is_no_one() {
        let response = test_app()
            .oneshot(form_post("person1Name=&person1Price="))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("No one pays!"));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("<b>Tom & \"Jerry\"</b>"),
            "&lt;b&gt;Tom &amp; &quot;Jerry&quot;&lt;/b&gt;"
        );
    }
}
