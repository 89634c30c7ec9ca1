use axum::{
    Router,
    extract::{Json, Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::core::{DebtId, EngineError, NewDebt, PaymentInstruction};
use crate::ledger::{DebtEngine, InMemoryDebtStore};

type AppEngine = DebtEngine<InMemoryDebtStore>;

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ExtraQuery {
    extra: Option<i64>,
}

/// Body for `POST /api/debts/:id/payments`; the debt id comes from the path.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PaymentPayload {
    amount: i64,
    payment_date: chrono::NaiveDate,
    #[serde(default)]
    external_ref: Option<String>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

struct ApiError(EngineError);

impl From<EngineError> for ApiError {
    fn from(value: EngineError) -> Self {
        Self(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            EngineError::NotFound { .. } => StatusCode::NOT_FOUND,
            EngineError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            EngineError::Store(err) => {
                error!(error = %err, "store failure");
                StatusCode::SERVICE_UNAVAILABLE
            }
        };
        error_response(status, &self.0.to_string())
    }
}

pub fn router(engine: AppEngine) -> Router {
    Router::new()
        .route("/healthz", get(health_handler))
        .route("/api/debts", get(list_debts_handler).post(create_debt_handler))
        .route("/api/debts/:id", get(debt_handler))
        .route(
            "/api/debts/:id/payments",
            get(list_payments_handler).post(record_payment_handler),
        )
        .route("/api/debts/:id/what-if", get(what_if_handler))
        .route("/api/strategies", get(strategies_handler))
        .route("/api/summary", get(summary_handler))
        .fallback(not_found_handler)
        .with_state(engine)
}

pub async fn run_http_server(addr: SocketAddr) -> std::io::Result<()> {
    let engine = DebtEngine::new(Arc::new(InMemoryDebtStore::new()));
    let app = router(engine);

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "debt payoff API listening");

    axum::serve(listener, app).await
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, serde_json::json!({ "status": "ok" }))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn list_debts_handler(State(engine): State<AppEngine>) -> Result<Response, ApiError> {
    let debts = engine
        .store()
        .list_debts()
        .map_err(EngineError::from)?;
    Ok(json_response(StatusCode::OK, debts))
}

async fn create_debt_handler(
    State(engine): State<AppEngine>,
    Json(payload): Json<NewDebt>,
) -> Result<Response, ApiError> {
    let debt = engine.register_debt(payload)?;
    Ok(json_response(StatusCode::CREATED, debt))
}

async fn debt_handler(
    State(engine): State<AppEngine>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let debt = engine.debt(&DebtId(id))?;
    Ok(json_response(StatusCode::OK, debt))
}

async fn list_payments_handler(
    State(engine): State<AppEngine>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let payments = engine.payments(&DebtId(id))?;
    Ok(json_response(StatusCode::OK, payments))
}

async fn record_payment_handler(
    State(engine): State<AppEngine>,
    Path(id): Path<String>,
    Json(payload): Json<PaymentPayload>,
) -> Result<Response, ApiError> {
    let recorded = engine.record_payment(PaymentInstruction {
        debt_id: DebtId(id),
        amount: payload.amount,
        payment_date: payload.payment_date,
        external_ref: payload.external_ref,
    })?;
    Ok(json_response(StatusCode::CREATED, recorded))
}

async fn what_if_handler(
    State(engine): State<AppEngine>,
    Path(id): Path<String>,
    Query(query): Query<ExtraQuery>,
) -> Result<Response, ApiError> {
    let result = engine.what_if(&DebtId(id), query.extra.unwrap_or(0))?;
    Ok(json_response(StatusCode::OK, result))
}

async fn strategies_handler(
    State(engine): State<AppEngine>,
    Query(query): Query<ExtraQuery>,
) -> Result<Response, ApiError> {
    let comparison = engine.compare_strategies(query.extra.unwrap_or(0))?;
    Ok(json_response(StatusCode::OK, comparison))
}

async fn summary_handler(State(engine): State<AppEngine>) -> Result<Response, ApiError> {
    let summary = engine.summary()?;
    Ok(json_response(StatusCode::OK, summary))
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::FixedClock;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn test_router() -> Router {
        let today = chrono::NaiveDate::from_ymd_opt(2026, 5, 1).expect("valid date");
        let engine =
            DebtEngine::with_clock(Arc::new(InMemoryDebtStore::new()), Arc::new(FixedClock(today)));
        router(engine)
    }

    async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.clone().oneshot(request).await.expect("route executes");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body reads");
        let value = serde_json::from_slice(&bytes).expect("json body");
        (status, value)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request builds")
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).expect("request builds")
    }

    #[tokio::test]
    async fn debt_lifecycle_over_http() {
        let router = test_router();

        let (status, debt) = send(
            &router,
            post_json(
                "/api/debts",
                json!({
                    "id": "visa",
                    "name": "Visa",
                    "category": "credit_card",
                    "balance": 100_000,
                    "apr": 12.0,
                    "minimumPayment": 5_000
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(debt["status"], "active");
        assert_eq!(debt["originalBalance"], 100_000);

        let (status, recorded) = send(
            &router,
            post_json(
                "/api/debts/visa/payments",
                json!({ "amount": 6_000, "paymentDate": "2026-05-01" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(recorded["payment"]["interestPortion"], 1_000);
        assert_eq!(recorded["payment"]["principalPortion"], 5_000);
        assert_eq!(recorded["debt"]["currentBalance"], 95_000);

        let (status, payments) = send(&router, get("/api/debts/visa/payments")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(payments.as_array().map(Vec::len), Some(1));

        let (status, what_if) = send(&router, get("/api/debts/visa/what-if?extra=5000")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(what_if["monthsSaved"].as_u64().unwrap_or(0) > 0);

        let (status, strategies) = send(&router, get("/api/strategies?extra=2000")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(strategies["strategies"].as_array().map(Vec::len), Some(3));

        let (status, summary) = send(&router, get("/api/summary")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(summary["totalBalance"], 95_000);
    }

    #[tokio::test]
    async fn maps_engine_errors_to_status_codes() {
        let router = test_router();

        let (status, body) = send(&router, get("/api/debts/ghost")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap_or_default().contains("ghost"));

        let (status, _) = send(
            &router,
            post_json(
                "/api/debts",
                json!({ "name": "Bad", "balance": -5, "apr": 10.0 }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&router, get("/api/strategies?extra=-1")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn empty_summary_is_zeroed() {
        let router = test_router();
        let (status, summary) = send(&router, get("/api/summary")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(summary["debtCount"], 0);
        assert_eq!(summary["earliestPayoffDate"], Value::Null);
    }
}
