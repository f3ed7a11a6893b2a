//! Hosts [`RunbookServer`] over stdio (the bare-invocation MCP
//! entrypoint) or HTTP (nested at `/mcp`, for a shared `-serve`
//! instance other invocations proxy to).

mod error;
mod oneshot;
mod server;
mod tools;

pub use error::RunbookMcpError;
pub use oneshot::{run_oneshot, OneshotOutcome};
pub use server::RunbookServer;

use axum::Router;
use rmcp::transport::io::stdio;
use rmcp::transport::streamable_http_server::session::local::LocalSessionManager;
use rmcp::transport::streamable_http_server::StreamableHttpService;
use rmcp::ServiceExt;

/// Serve `server` over stdio until the peer disconnects. Used for the
/// bare `runbook` (no subcommand) stdio-MCP entrypoint, and the
/// `--local` fallback when no HTTP server is reachable.
pub async fn serve_stdio(server: RunbookServer) -> Result<(), RunbookMcpError> {
    let running = server
        .serve(stdio())
        .await
        .map_err(|err| RunbookMcpError::Io(std::io::Error::other(err.to_string())))?;
    running
        .waiting()
        .await
        .map_err(|err| RunbookMcpError::Io(std::io::Error::other(err.to_string())))?;
    Ok(())
}

/// Build the axum router nesting the MCP streamable-HTTP service at
/// `/mcp`, for `-serve` mode. `server` is cloned per session (cheap —
/// every field is an `Arc`).
pub fn http_router(server: RunbookServer) -> Router {
    let service = StreamableHttpService::new(
        move || Ok(server.clone()),
        LocalSessionManager::default().into(),
        Default::default(),
    );
    Router::new().nest_service("/mcp", service)
}
