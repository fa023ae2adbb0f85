//! Agent endpoints: recommendation, unsigned transaction assembly, and the
//! automation lifecycle backed by the in-memory registry.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::AppError;
use crate::models::{
    AdjustRateRequest, AgentRecommendation, AgentSettingsRequest, AutomationRequest, Branch,
    ExecuteRequest, ExecuteResponse, RecommendRequest, RiskLevel, UnsignedTx,
};
use crate::risk::recommendation::{build_recommendation, RecommendationInputs};
use crate::risk::strategy::strategy_for;
use crate::utils::validation::{
    validate_address, validate_branch_index, validate_positive_amount, validate_required,
    validate_trove_id,
};
use crate::AppState;

pub fn create_agent_routes() -> Router<AppState> {
    Router::new()
        .route("/agent/recommend", post(recommend))
        .route("/agent/execute", post(execute))
        .route("/agent/adjust-rate", post(adjust_rate))
        .route("/agent/adjust", post(adjust))
        .route("/agent/close", post(close_trove))
        .route("/agent/settings", post(save_settings))
        .route(
            "/agent/automation",
            get(automation_status)
                .post(activate_automation)
                .delete(deactivate_automation),
        )
        .route("/agent/events", get(recent_events))
}

/// Deserialize a JSON body into a typed request, reporting type mismatches
/// through the standard validation envelope instead of the framework default.
fn parse_body<T: DeserializeOwned>(body: Value) -> Result<T, AppError> {
    serde_json::from_value(body)
        .map_err(|e| AppError::Validation(format!("Invalid request body: {e}")))
}

fn parse_unsigned_tx(tx: Value) -> Result<UnsignedTx, AppError> {
    serde_json::from_value(tx)
        .map_err(|e| AppError::Upstream(format!("malformed unsigned tx from provider: {e}")))
}

async fn recommend(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<AgentRecommendation>, AppError> {
    let req: RecommendRequest = parse_body(body)?;
    validate_address(req.user_address.as_deref(), "userAddress")?;
    let amount = validate_positive_amount(req.amount.as_deref(), "amount")?;

    let risk_level = match req.risk_level.as_deref() {
        None | Some("") => RiskLevel::Conservative,
        Some(s) => s.parse()?,
    };
    let branch = Branch::from_collateral_symbol(req.collateral_type.as_deref().unwrap_or("wCTC"));

    let price_data = state
        .provider
        .call("query.price", json!({ "branchIndex": branch.index() }))
        .await?;
    let price_usd: f64 = price_data
        .get("formatted")
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| AppError::Upstream("price query returned no usable price".to_string()))?;

    let markets = state.chain.get_markets().await?;
    let market_avg_rate_pct = markets
        .iter()
        .find(|m| m.branch == branch.index())
        .and_then(|m| m.avg_interest_rate_pct())
        .unwrap_or(5.0);

    let recommendation = build_recommendation(&RecommendationInputs {
        risk_level,
        branch,
        collateral_amount_wei: amount,
        price_usd,
        market_avg_rate_pct,
    });
    Ok(Json(recommendation))
}

async fn execute(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, AppError> {
    let req: ExecuteRequest = parse_body(body)?;
    execute_inner(&state, req).await.map(Json)
}

/// Sugar route: an adjust request is an execute with the action pinned.
async fn adjust(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, AppError> {
    let mut req: ExecuteRequest = parse_body(body)?;
    req.action = Some("adjustTrove".to_string());
    execute_inner(&state, req).await.map(Json)
}

async fn execute_inner(state: &AppState, req: ExecuteRequest) -> Result<Value, AppError> {
    let user = validate_address(req.user_address.as_deref(), "userAddress")?;
    let action = validate_required(req.action.as_deref(), "action")?;
    let params = req.params;

    let (method, a2a_params, trove_id) = match action.as_str() {
        "openTrove" => {
            let branch = validate_branch_index(params.branch)?;
            let coll = validate_positive_amount(params.collateral_amount.as_deref(), "collateralAmount")?;
            let debt = validate_positive_amount(params.debt_amount.as_deref(), "debtAmount")?;
            (
                "cdp.openTrove",
                json!({
                    "branchIndex": branch,
                    "owner": user,
                    "collAmount": coll.to_string(),
                    "debtAmount": debt.to_string(),
                    "interestRate": params.interest_rate,
                    "maxUpfrontFee": debt.to_string(),
                }),
                None,
            )
        }
        "adjustTrove" => {
            let branch = validate_branch_index(params.branch)?;
            let trove_id = validate_trove_id(params.trove_id.as_ref())?;
            (
                "cdp.adjustTrove",
                json!({
                    "branchIndex": branch,
                    "troveId": trove_id,
                    "collChange": params.coll_change.as_deref().unwrap_or("0"),
                    "isCollIncrease": params.is_coll_increase.unwrap_or(false),
                    "debtChange": params.debt_change.as_deref().unwrap_or("0"),
                    "isDebtIncrease": params.is_debt_increase.unwrap_or(false),
                }),
                Some(trove_id),
            )
        }
        "closeTrove" => {
            let branch = validate_branch_index(params.branch)?;
            let trove_id = validate_trove_id(params.trove_id.as_ref())?;
            (
                "cdp.closeTrove",
                json!({
                    "branchIndex": branch,
                    "troveId": trove_id,
                }),
                Some(trove_id),
            )
        }
        other => {
            return Err(AppError::Validation(format!("Unknown action: {other}")));
        }
    };

    let tx = state.provider.call(method, a2a_params).await?;
    let unsigned = parse_unsigned_tx(tx)?;
    let response = ExecuteResponse::pending(trove_id, unsigned);
    Ok(serde_json::to_value(response)?)
}

async fn adjust_rate(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, AppError> {
    let req: AdjustRateRequest = parse_body(body)?;
    validate_address(req.user_address.as_deref(), "userAddress")?;
    let branch = validate_branch_index(req.params.branch)?;
    let trove_id = validate_trove_id(req.params.trove_id.as_ref())?;
    let new_rate = validate_required(req.params.new_interest_rate.as_deref(), "newInterestRate")?;

    let tx = state
        .provider
        .call(
            "cdp.adjustTroveInterestRate",
            json!({
                "branchIndex": branch,
                "troveId": trove_id,
                "newInterestRate": new_rate,
                "maxUpfrontFee": req.params.max_upfront_fee.as_deref().unwrap_or("0"),
            }),
        )
        .await?;
    let unsigned = parse_unsigned_tx(tx)?;
    Ok(Json(json!({ "unsignedTx": unsigned })))
}

async fn close_trove(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, AppError> {
    let req: AdjustRateRequest = parse_body(body)?;
    validate_address(req.user_address.as_deref(), "userAddress")?;
    let branch = validate_branch_index(req.params.branch)?;
    let trove_id = validate_trove_id(req.params.trove_id.as_ref())?;

    let tx = state
        .provider
        .call(
            "cdp.closeTrove",
            json!({ "branchIndex": branch, "troveId": trove_id }),
        )
        .await?;
    let unsigned = parse_unsigned_tx(tx)?;
    let response = ExecuteResponse::pending(Some(trove_id), unsigned);
    Ok(Json(serde_json::to_value(response)?))
}

async fn save_settings(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, AppError> {
    let req: AgentSettingsRequest = parse_body(body)?;
    let user = validate_address(req.user_address.as_deref(), "userAddress")?;

    let strategy: RiskLevel = req
        .strategy
        .as_deref()
        .unwrap_or("conservative")
        .parse()?;
    let min_cr = req.min_cr.unwrap_or(strategy_for(strategy).min_cr);

    let record = state
        .registry
        .register(
            &user,
            strategy,
            min_cr,
            req.auto_rebalance.unwrap_or(true),
            req.auto_rate_adjust.unwrap_or(true),
        )
        .await;

    Ok(Json(json!({
        "status": "saved",
        "userAddress": record.user_address,
        "strategy": record.strategy,
        "minCR": record.min_cr,
        "autoRebalance": record.auto_rebalance,
        "autoRateAdjust": record.auto_rate_adjust,
        "branch": req.branch,
        "agentId": record.agent_id,
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AutomationQuery {
    user_address: Option<String>,
}

async fn automation_status(
    State(state): State<AppState>,
    Query(query): Query<AutomationQuery>,
) -> Result<Response, AppError> {
    let user = validate_address(query.user_address.as_deref(), "userAddress")?;
    match state.registry.get(&user).await {
        Some(record) => Ok(Json(serde_json::to_value(record)?).into_response()),
        // No agent for this address: a bare 404 null, not an error envelope.
        None => Ok((StatusCode::NOT_FOUND, Json(Value::Null)).into_response()),
    }
}

async fn activate_automation(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, AppError> {
    let req: AutomationRequest = parse_body(body)?;
    let user = validate_address(req.user_address.as_deref(), "userAddress")?;
    let strategy: RiskLevel = req
        .strategy
        .as_deref()
        .unwrap_or("conservative")
        .parse()?;
    let min_cr = req.min_cr.unwrap_or(strategy_for(strategy).min_cr);

    let record = state
        .registry
        .register(
            &user,
            strategy,
            min_cr,
            req.auto_rebalance.unwrap_or(true),
            req.auto_rate_adjust.unwrap_or(true),
        )
        .await;
    Ok(Json(serde_json::to_value(record)?))
}

async fn deactivate_automation(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, AppError> {
    let req: AutomationRequest = parse_body(body)?;
    let user = validate_address(req.user_address.as_deref(), "userAddress")?;
    let status = if state.registry.deactivate(&user).await {
        "deactivated"
    } else {
        "not_found"
    };
    Ok(Json(json!({ "status": status, "userAddress": user })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventsQuery {
    agent_id: Option<String>,
    limit: Option<usize>,
}

async fn recent_events(
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
) -> Result<Json<Value>, AppError> {
    let events = state
        .events
        .recent(query.agent_id.as_deref(), query.limit.unwrap_or(50));
    Ok(Json(json!({ "count": events.len(), "events": events })))
}
