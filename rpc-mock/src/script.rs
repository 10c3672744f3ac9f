/// Per-method reply queues shared by the handlers

use std::collections::{HashMap, VecDeque};
use std::path::Path;

use serde_json::Value;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::types::{RecordedCall, Reply};

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Failed to read script file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid script file: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Default)]
struct ScriptState {
    queues: HashMap<String, VecDeque<Reply>>,
    fallbacks: HashMap<String, Reply>,
    calls: Vec<RecordedCall>,
}

/// Scripted JSON-RPC backend
///
/// Queued replies are served first, in order. Once a method's queue is
/// empty its fallback reply (if any) is served on every call.
#[derive(Debug, Default)]
pub struct Script {
    state: Mutex<ScriptState>,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load fallback replies from a JSON file of `{ "method": reply }`
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ScriptError> {
        let content = std::fs::read_to_string(path)?;
        let fallbacks: HashMap<String, Reply> = serde_json::from_str(&content)?;
        Ok(Self {
            state: Mutex::new(ScriptState {
                fallbacks,
                ..Default::default()
            }),
        })
    }

    pub async fn push(&self, method: &str, reply: Reply) {
        self.state
            .lock()
            .await
            .queues
            .entry(method.to_string())
            .or_default()
            .push_back(reply);
    }

    pub async fn push_result(&self, method: &str, result: Value) {
        self.push(method, Reply::Result(result)).await;
    }

    pub async fn push_error(&self, method: &str, code: i64, message: &str) {
        self.push(
            method,
            Reply::Error {
                code,
                message: message.to_string(),
            },
        )
        .await;
    }

    /// Reply served whenever `method` has nothing queued
    pub async fn set_fallback(&self, method: &str, reply: Reply) {
        self.state
            .lock()
            .await
            .fallbacks
            .insert(method.to_string(), reply);
    }

    /// Record the call and pick its reply
    pub async fn next_reply(&self, method: &str, params: Option<Value>) -> Option<Reply> {
        let mut state = self.state.lock().await;
        state.calls.push(RecordedCall {
            method: method.to_string(),
            params,
        });

        if let Some(reply) = state.queues.get_mut(method).and_then(VecDeque::pop_front) {
            return Some(reply);
        }
        state.fallbacks.get(method).cloned()
    }

    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.state.lock().await.calls.clone()
    }

    pub async fn call_count(&self, method: &str) -> usize {
        self.state
            .lock()
            .await
            .calls
            .iter()
            .filter(|call| call.method == method)
            .count()
    }
}
