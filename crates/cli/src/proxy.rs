//! Stdio-to-HTTP relay for the "proxy to an existing `-serve` instance"
//! invocation mode. One JSON-RPC message per stdin line goes out as a
//! POST to the shared server's `/mcp` endpoint; the response body comes
//! back on stdout, one line per reply. The `Mcp-Session-Id` response
//! header (set on the first exchange) is threaded back into every
//! subsequent request so the remote session stays addressable.

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

const SESSION_HEADER: &str = "Mcp-Session-Id";
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("failed to reach proxied server at {addr}: {source}")]
    Unreachable {
        addr: String,
        #[source]
        source: reqwest::Error,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// 5s HTTP liveness probe against the server's `/mcp` endpoint. Any
/// response at all — whatever the status code — means a process is
/// listening and answering HTTP, which is all this check claims; the
/// caller decides what a given status implies about the registry record.
pub async fn is_reachable(addr: &str) -> bool {
    let client = match reqwest::Client::builder().timeout(PROBE_TIMEOUT).build() {
        Ok(c) => c,
        Err(_) => return false,
    };
    client.head(format!("{addr}/mcp")).send().await.is_ok()
}

/// Relay stdin/stdout to the remote server until stdin closes.
pub async fn relay(addr: &str) -> Result<(), ProxyError> {
    let client = reqwest::Client::new();
    let endpoint = format!("{addr}/mcp");
    let mut session_id: Option<String> = None;

    let stdin = tokio::io::stdin();
    let mut lines = BufReader::new(stdin).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let mut request = client
            .post(&endpoint)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json, text/event-stream")
            .body(line);
        if let Some(id) = &session_id {
            request = request.header(SESSION_HEADER, id.clone());
        }

        let response = request
            .send()
            .await
            .map_err(|source| ProxyError::Unreachable {
                addr: addr.to_string(),
                source,
            })?;

        if session_id.is_none() {
            if let Some(value) = response.headers().get(SESSION_HEADER) {
                if let Ok(text) = value.to_str() {
                    session_id = Some(text.to_string());
                }
            }
        }

        let body = response
            .text()
            .await
            .map_err(|source| ProxyError::Unreachable {
                addr: addr.to_string(),
                source,
            })?;

        stdout.write_all(body.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
    }

    Ok(())
}
