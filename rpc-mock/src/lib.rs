/// Soroban RPC Mock Server Library
///
/// A JSON-RPC 2.0 server that answers from per-method scripted replies and
/// records every call it receives. Used to exercise RPC clients end to end
/// over real HTTP.

pub mod handlers;
pub mod script;
pub mod server;
pub mod types;

// Re-export commonly used types
pub use script::{Script, ScriptError};
pub use server::{create_router, run_server, spawn};
pub use types::*;
