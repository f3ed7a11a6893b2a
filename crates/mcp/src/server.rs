use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use rmcp::model::{
    CallToolRequestParam, CallToolResult, Content, ErrorData as McpError, Implementation,
    ListToolsResult, PaginatedRequestParam, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::service::{RequestContext, RoleServer};
use rmcp::ServerHandler;
use runbook_core::{Clock, TaskType};
use runbook_manifest::{substitute, Manifest, TaskDef, TaskKind};
use runbook_storage::{LogSelector, ReadLogOptions, SessionStore};
use runbook_supervisor::ProcessSupervisor;
use serde_json::Value;

use crate::oneshot::run_oneshot;
use crate::tools::build_tools;

const INSTRUCTIONS: &str = "Runbook exposes manifest tasks as MCP tools. Oneshot tasks run to \
completion and return captured output. Daemon tasks take an `action` argument \
(start|stop|status|logs) instead of being split across separate tools.";

/// Exposes every manifest task as one MCP tool. Because the tool set
/// is determined by the manifest at runtime, this hand-writes
/// `list_tools`/`call_tool` rather than using the `#[tool_router]`
/// macro, which assumes a statically enumerable method set.
#[derive(Clone)]
pub struct RunbookServer {
    manifest: Arc<Manifest>,
    project_root: PathBuf,
    session_store: Arc<SessionStore>,
    supervisor: Arc<ProcessSupervisor>,
    clock: Arc<dyn Clock>,
}

impl RunbookServer {
    pub fn new(
        manifest: Arc<Manifest>,
        project_root: PathBuf,
        session_store: Arc<SessionStore>,
        supervisor: Arc<ProcessSupervisor>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            manifest,
            project_root,
            session_store,
            supervisor,
            clock,
        }
    }

    fn task(&self, name: &str) -> Result<&TaskDef, McpError> {
        self.manifest
            .get(name)
            .ok_or_else(|| McpError::invalid_params(format!("unknown task {name:?}"), None))
    }

    fn task_cwd(&self, task: &TaskDef) -> PathBuf {
        task.cwd
            .as_ref()
            .map(|c| self.project_root.join(c))
            .unwrap_or_else(|| self.project_root.clone())
    }

    async fn call_oneshot(
        &self,
        name: &str,
        task: &TaskDef,
        args: &BTreeMap<String, String>,
    ) -> Result<CallToolResult, McpError> {
        let command =
            substitute(name, task, args).map_err(|err| McpError::invalid_params(err.to_string(), None))?;

        let outcome = run_oneshot(
            &self.session_store,
            self.clock.as_ref(),
            name,
            task,
            &command,
            &self.project_root,
            Some(args.clone()),
        )
        .await
        .map_err(McpError::from)?;

        let body = serde_json::json!({
            "session_id": outcome.session_id,
            "exit_code": outcome.exit_code,
            "output": outcome.output,
        });
        let text = serde_json::to_string_pretty(&body).unwrap_or(outcome.output);
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    async fn call_daemon(
        &self,
        name: &str,
        task: &TaskDef,
        action: &str,
        args: &BTreeMap<String, String>,
    ) -> Result<CallToolResult, McpError> {
        match action {
            "start" => self.daemon_start(name, task, args).await,
            "stop" => {
                self.supervisor
                    .stop(name)
                    .await
                    .map_err(|err| McpError::internal_error(err.to_string(), None))?;
                Ok(CallToolResult::success(vec![Content::text(format!(
                    "stopped {name}"
                ))]))
            }
            "status" => {
                let status = self.supervisor.status(name).await;
                let body = serde_json::json!({"running": status.running, "pid": status.pid});
                Ok(CallToolResult::success(vec![Content::text(
                    body.to_string(),
                )]))
            }
            "logs" => self.daemon_logs(name, args),
            other => Err(McpError::invalid_params(
                format!("unknown action {other:?}, expected start|stop|status|logs"),
                None,
            )),
        }
    }

    async fn daemon_start(
        &self,
        name: &str,
        task: &TaskDef,
        args: &BTreeMap<String, String>,
    ) -> Result<CallToolResult, McpError> {
        let command =
            substitute(name, task, args).map_err(|err| McpError::invalid_params(err.to_string(), None))?;
        let cwd = self.task_cwd(task);

        let session_id = self
            .session_store
            .new_session(
                self.clock.as_ref(),
                name,
                TaskType::Daemon,
                &command,
                &cwd.display().to_string(),
                Some(args.clone()),
            )
            .map_err(|err| McpError::internal_error(err.to_string(), None))?;
        let log_path = self.session_store.log_path(session_id);

        let pid = self
            .supervisor
            .start(
                name,
                session_id,
                &command,
                &task.env,
                &cwd,
                &log_path,
                task.shell_or_default(),
            )
            .await
            .map_err(|err| McpError::internal_error(err.to_string(), None))?;

        Ok(CallToolResult::success(vec![Content::text(format!(
            "started {name} (pid {pid}, session {session_id})"
        ))]))
    }

    fn daemon_logs(
        &self,
        name: &str,
        args: &BTreeMap<String, String>,
    ) -> Result<CallToolResult, McpError> {
        let tail_lines = args.get("lines").and_then(|v| v.parse().ok());
        let filter_regex = match args.get("filter") {
            Some(pattern) => Some(
                regex::Regex::new(pattern)
                    .map_err(|err| McpError::invalid_params(err.to_string(), None))?,
            ),
            None => None,
        };
        let selector = match args.get("session") {
            Some(raw) => {
                let id = uuid::Uuid::parse_str(raw)
                    .map_err(|err| McpError::invalid_params(err.to_string(), None))?;
                LogSelector::Session(id)
            }
            None => LogSelector::Task(name.to_string()),
        };

        let lines = self
            .session_store
            .read_log(
                selector,
                &ReadLogOptions {
                    tail_lines,
                    filter_regex,
                },
            )
            .map_err(|err| McpError::internal_error(err.to_string(), None))?;

        Ok(CallToolResult::success(vec![Content::text(
            lines.join("\n"),
        )]))
    }
}

impl ServerHandler for RunbookServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "runbook".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            instructions: Some(INSTRUCTIONS.to_string()),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult {
            tools: build_tools(&self.manifest),
            next_cursor: None,
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let name = request.name.to_string();
        let task = self.task(&name)?;

        let mut args: BTreeMap<String, String> = BTreeMap::new();
        if let Some(map) = &request.arguments {
            for (key, value) in map {
                let as_string = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                args.insert(key.clone(), as_string);
            }
        }

        match task.kind {
            TaskKind::Oneshot => self.call_oneshot(&name, task, &args).await,
            TaskKind::Daemon => {
                let action = args.remove("action").unwrap_or_else(|| "status".to_string());
                self.call_daemon(&name, task, &action, &args).await
            }
        }
    }
}
