//! End-to-end route tests against fixture chain and provider implementations.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use snowball_agent::{
    build_router,
    config::Settings,
    error::AppError,
    models::{MarketData, TrovePosition},
    services::{AgentRegistry, CdpProvider, ChainReader, EventHub},
    AppState,
};

const USER: &str = "0xf00f00f00f00f00f00f00f00f00f00f00f00f00f";
const TX_TO: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";

struct FixtureProvider;

#[async_trait]
impl CdpProvider for FixtureProvider {
    async fn call(&self, method: &str, _params: Value) -> Result<Value, AppError> {
        match method {
            "query.price" => Ok(json!({
                "price": "5000000000000000000000",
                "formatted": "5000.00",
            })),
            m if m.starts_with("cdp.") => Ok(json!({
                "to": TX_TO,
                "data": "0xdeadbeef",
                "value": "0",
                "chainId": 102031,
            })),
            other => Err(AppError::Upstream(format!("unexpected method: {other}"))),
        }
    }
}

struct FixtureChain;

fn market(branch: u8, symbol: &str, avg_rate: &str) -> MarketData {
    MarketData {
        branch,
        collateral_symbol: symbol.to_string(),
        collateral_address: "0x7777777777777777777777777777777777777777".to_string(),
        total_collateral: "1000000000000000000000".to_string(),
        total_collateral_usd: "5000000.00".to_string(),
        current_cr: "180.00".to_string(),
        mcr: "110.00".to_string(),
        ccr: "150.00".to_string(),
        ltv: "55.56".to_string(),
        total_borrow: "2777778000000000000000000".to_string(),
        avg_interest_rate: avg_rate.to_string(),
        sp_deposits: "1000000000000000000000000".to_string(),
        sp_apy: "2.78".to_string(),
    }
}

#[async_trait]
impl ChainReader for FixtureChain {
    async fn get_markets(&self) -> Result<Vec<MarketData>, AppError> {
        Ok(vec![market(0, "wCTC", "5.00"), market(1, "lstCTC", "4.50")])
    }

    async fn get_user_positions(&self, _address: &str) -> Result<Vec<TrovePosition>, AppError> {
        Ok(Vec::new())
    }
}

fn test_app_with(settings: Settings) -> Router {
    let state = AppState {
        settings: Arc::new(settings),
        provider: Arc::new(FixtureProvider),
        chain: Arc::new(FixtureChain),
        registry: Arc::new(AgentRegistry::new()),
        events: Arc::new(EventHub::new()),
    };
    build_router(state)
}

fn test_app() -> Router {
    let mut settings = Settings::default();
    settings.auth.disabled = true;
    test_app_with(settings)
}

async fn send(app: Router, method: &str, path: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(path);
    let request = match body {
        Some(body) => {
            builder = builder.header("content-type", "application/json");
            builder.body(Body::from(body.to_string())).unwrap()
        }
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn post(path: &str, body: Value) -> (StatusCode, Value) {
    send(test_app(), "POST", path, Some(body)).await
}

fn rate_pct(body: &Value) -> f64 {
    body["recommendedInterestRate"]
        .as_str()
        .unwrap()
        .parse::<f64>()
        .unwrap()
        / 1e16
}

fn recommend_body(risk_level: &str) -> Value {
    json!({
        "userAddress": USER,
        "collateralType": "wCTC",
        "amount": "10000000000000000000",
        "riskLevel": risk_level,
    })
}

#[tokio::test]
async fn recommend_conservative_prices_above_market() {
    let (status, body) = post("/api/agent/recommend", recommend_body("conservative")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["strategy"], "conservative");
    assert_eq!(body["recommendedCR"], 200);
    assert!((rate_pct(&body) - 6.0).abs() < 0.01);
    assert!(body["reasoning"]
        .as_str()
        .unwrap()
        .contains("Market avg interest rate"));
}

#[tokio::test]
async fn recommend_moderate_matches_market() {
    let (status, body) = post("/api/agent/recommend", recommend_body("moderate")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["recommendedCR"], 160);
    assert!((rate_pct(&body) - 5.0).abs() < 0.01);
}

#[tokio::test]
async fn recommend_aggressive_prices_below_market() {
    let (status, body) = post("/api/agent/recommend", recommend_body("aggressive")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["recommendedCR"], 130);
    assert!((rate_pct(&body) - 4.0).abs() < 0.01);
}

#[tokio::test]
async fn recommend_lst_branch_uses_its_own_average() {
    let mut body = recommend_body("conservative");
    body["collateralType"] = json!("lstCTC");
    let (status, body) = post("/api/agent/recommend", body).await;
    assert_eq!(status, StatusCode::OK);
    // lstCTC market average is 4.50, conservative adds one point.
    assert!((rate_pct(&body) - 5.5).abs() < 0.01);
}

#[tokio::test]
async fn recommend_missing_risk_level_defaults_to_conservative() {
    let (status, body) = post(
        "/api/agent/recommend",
        json!({
            "userAddress": USER,
            "collateralType": "wCTC",
            "amount": "10000000000000000000",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["strategy"], "conservative");
}

#[tokio::test]
async fn recommend_rejects_bad_address() {
    let mut body = recommend_body("conservative");
    body["userAddress"] = json!("bad-addr");
    let (status, body) = post("/api/agent/recommend", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(body["error"]["statusCode"], 400);
}

#[tokio::test]
async fn recommend_rejects_missing_amount() {
    let (status, body) = post(
        "/api/agent/recommend",
        json!({ "userAddress": USER, "riskLevel": "moderate" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn recommend_rejects_unknown_risk_level() {
    let (status, body) = post("/api/agent/recommend", recommend_body("yolo")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn execute_open_trove_returns_unsigned_tx() {
    let (status, body) = post(
        "/api/agent/execute",
        json!({
            "userAddress": USER,
            "action": "openTrove",
            "params": {
                "branch": 0,
                "collateralAmount": "10000000000000000000",
                "debtAmount": "25000000000000000000000",
                "interestRate": "60000000000000000",
            },
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "pending");
    assert_eq!(body["txHash"], format!("0x{}", "0".repeat(64)));
    assert_eq!(body["unsignedTx"]["to"], TX_TO);
    assert_eq!(body["unsignedTx"]["chainId"], 102031);
}

#[tokio::test]
async fn execute_rejects_unknown_action() {
    let (status, body) = post(
        "/api/agent/execute",
        json!({
            "userAddress": USER,
            "action": "unknownAction",
            "params": { "branch": 0 },
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn execute_rejects_out_of_range_branch() {
    let (status, body) = post(
        "/api/agent/execute",
        json!({
            "userAddress": USER,
            "action": "openTrove",
            "params": {
                "branch": 5,
                "collateralAmount": "1000",
                "debtAmount": "1000",
            },
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn adjust_route_behaves_like_adjust_trove_execute() {
    let (status, body) = post(
        "/api/agent/adjust",
        json!({
            "userAddress": USER,
            "params": {
                "branch": 0,
                "troveId": "42",
                "collChange": "1000000000000000000",
                "isCollIncrease": true,
            },
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["troveId"], "42");
    assert_eq!(body["unsignedTx"]["to"], TX_TO);
}

#[tokio::test]
async fn adjust_rate_returns_unsigned_tx() {
    let (status, body) = post(
        "/api/agent/adjust-rate",
        json!({
            "userAddress": USER,
            "params": {
                "branch": 0,
                "troveId": 7,
                "newInterestRate": "50000000000000000",
            },
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["unsignedTx"]["to"], TX_TO);
    assert_eq!(body["unsignedTx"]["chainId"], 102031);
}

#[tokio::test]
async fn adjust_rate_requires_trove_id() {
    let (status, body) = post(
        "/api/agent/adjust-rate",
        json!({
            "userAddress": USER,
            "params": {
                "branch": 0,
                "newInterestRate": "50000000000000000",
            },
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert!(body["error"]["message"].as_str().unwrap().contains("troveId"));
}

#[tokio::test]
async fn close_returns_pending_unsigned_tx() {
    let (status, body) = post(
        "/api/agent/close",
        json!({
            "userAddress": USER,
            "params": { "branch": 1, "troveId": "9" },
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "pending");
    assert_eq!(body["unsignedTx"]["to"], TX_TO);
}

#[tokio::test]
async fn automation_lifecycle_round_trip() {
    let app = test_app();

    let (status, body) = send(
        app.clone(),
        "POST",
        "/api/agent/automation",
        Some(json!({
            "userAddress": USER,
            "strategy": "moderate",
            "autoRebalance": true,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["strategy"], "moderate");
    assert_eq!(body["minCR"], 160);
    assert_eq!(body["active"], true);

    let (status, body) = send(
        app.clone(),
        "GET",
        &format!("/api/agent/automation?userAddress={USER}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["userAddress"], USER.to_lowercase());

    let (status, body) = send(
        app.clone(),
        "DELETE",
        "/api/agent/automation",
        Some(json!({ "userAddress": USER })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "deactivated");
}

#[tokio::test]
async fn automation_status_unknown_user_is_404_null() {
    let (status, body) = send(
        test_app(),
        "GET",
        &format!("/api/agent/automation?userAddress={USER}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, Value::Null);
}

#[tokio::test]
async fn settings_registers_agent() {
    let app = test_app();
    let (status, body) = send(
        app.clone(),
        "POST",
        "/api/agent/settings",
        Some(json!({
            "userAddress": USER,
            "strategy": "aggressive",
            "minCR": 140,
            "autoRateAdjust": false,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "saved");
    assert_eq!(body["minCR"], 140);
    assert_eq!(body["autoRateAdjust"], false);
    assert!(body["agentId"].as_str().unwrap().starts_with("agent-"));
}

#[tokio::test]
async fn events_endpoint_returns_empty_list() {
    let (status, body) = send(test_app(), "GET", "/api/agent/events", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 0);
    assert!(body["events"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn health_is_public_even_with_auth_enabled() {
    let mut settings = Settings::default();
    settings.auth.api_keys = vec!["test-key".to_string()];
    let app = test_app_with(settings);

    let (status, body) = send(app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn protected_route_requires_credentials() {
    let mut settings = Settings::default();
    settings.auth.api_keys = vec!["test-key".to_string()];
    let app = test_app_with(settings);

    let (status, body) = send(
        app,
        "POST",
        "/api/agent/recommend",
        Some(recommend_body("moderate")),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn api_key_grants_access() {
    let mut settings = Settings::default();
    settings.auth.api_keys = vec!["test-key".to_string()];
    let app = test_app_with(settings);

    let request = Request::builder()
        .method("POST")
        .uri("/api/agent/recommend")
        .header("content-type", "application/json")
        .header("x-api-key", "test-key")
        .body(Body::from(recommend_body("moderate").to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn sse_stream_rejects_bad_address() {
    let (status, body) = send(test_app(), "GET", "/api/events/positions/not-an-address", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn sse_stream_opens_for_valid_address() {
    let app = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(format!("/api/events/positions/{USER}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"],
        "text/event-stream"
    );
}
