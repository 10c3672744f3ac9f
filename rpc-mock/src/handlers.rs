/// Axum HTTP handlers for the JSON-RPC endpoint and helpers

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use crate::script::Script;
use crate::types::*;

/// Shared application state
pub type AppState = Arc<Script>;

/// JSON-RPC error codes
const INVALID_REQUEST: i64 = -32600;
const METHOD_NOT_FOUND: i64 = -32601;

/// POST /
/// Answers a JSON-RPC 2.0 request from the script
pub async fn handle_rpc(State(script): State<AppState>, Json(request): Json<JsonRpcRequest>) -> Response {
    if request.jsonrpc != "2.0" {
        log::warn!("⚠️  Rejecting request with jsonrpc={}", request.jsonrpc);
        return Json(JsonRpcResponse::error(
            request.id,
            INVALID_REQUEST,
            "jsonrpc must be \"2.0\"",
        ))
        .into_response();
    }

    log::debug!("➡️  {} (id {})", request.method, request.id);
    let reply = script
        .next_reply(&request.method, request.params.clone())
        .await;

    match reply {
        Some(Reply::Result(result)) => Json(JsonRpcResponse::result(request.id, result)).into_response(),
        Some(Reply::Error { code, message }) => {
            Json(JsonRpcResponse::error(request.id, code, message)).into_response()
        }
        Some(Reply::HttpStatus(status)) => StatusCode::from_u16(status)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            .into_response(),
        None => {
            log::warn!("⚠️  No scripted reply for {}", request.method);
            Json(JsonRpcResponse::error(
                request.id,
                METHOD_NOT_FOUND,
                format!("no scripted reply for {}", request.method),
            ))
            .into_response()
        }
    }
}

/// GET /friendbot?addr=G...
/// Answers from the script when a `friendbot` reply is queued, otherwise
/// accepts any well-formed account id
pub async fn friendbot(
    State(script): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let addr = query.get("addr").cloned().unwrap_or_default();
    let reply = script
        .next_reply("friendbot", Some(json!({ "addr": addr })))
        .await;

    match reply {
        Some(Reply::Result(body)) => Json(body).into_response(),
        Some(Reply::Error { code, message }) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "code": code, "detail": message })),
        )
            .into_response(),
        Some(Reply::HttpStatus(status)) => StatusCode::from_u16(status)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            .into_response(),
        None if addr.len() == 56 && addr.starts_with('G') => {
            log::info!("💰 Funded {}", addr);
            Json(json!({ "successful": true })).into_response()
        }
        None => (StatusCode::BAD_REQUEST, format!("invalid address: {}", addr)).into_response(),
    }
}

/// GET /health
pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
