//! `InvocationRouter`: the bare `runbook` binary's decision tree.
//!
//! The binary serves four distinct callers out of one entrypoint: a
//! human running `runbook run build`, a shell completion request, an
//! MCP client launching `runbook` directly over stdio, and an MCP
//! client that should instead be proxied to a shared `-serve` process.
//! Which one applies is decided from argv shape alone, before clap
//! ever sees it, because the server-mode flags (`-serve`, `-addr ...`)
//! use a single-dash style clap cannot mix with the subcommand grammar
//! below.
//!
//! 1. Strip the global flags (`--config`, `--working-dir`, `--local`/
//!    `-local`) wherever they appear — they apply to every mode.
//! 2. Peek the first remaining token. If it names a subcommand, hand
//!    the rest to clap and dispatch into `commands::*`.
//! 3. Otherwise parse the legacy single-dash server-mode flags by hand
//!    and branch into `-init`, `-serve`, or the bare stdio/proxy
//!    entrypoint.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use runbook_core::ServerRecord;
use runbook_storage::ServerRegistryReader;
use tracing::{info, warn};

use crate::commands;
use crate::context::{parse_params, Context};
use crate::error::CliError;
use crate::proxy;
use crate::{logging, signal};

const SUBCOMMANDS: &[&str] = &[
    "list",
    "run",
    "start",
    "stop",
    "status",
    "logs",
    "completions",
];

#[derive(Parser)]
#[command(name = "runbook", about = "Run manifest tasks as MCP tools or CLI subcommands")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List every task the manifest defines.
    List,
    /// Run a oneshot task to completion.
    Run {
        task: String,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        params: Vec<String>,
    },
    /// Start a daemon task in the background.
    Start {
        task: String,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        params: Vec<String>,
    },
    /// Stop a running daemon task.
    Stop { task: String },
    /// Report whether a daemon task is running.
    Status { task: String },
    /// Print a task's captured log output.
    Logs {
        task: String,
        #[arg(long)]
        lines: Option<usize>,
        #[arg(long)]
        filter: Option<String>,
        #[arg(long)]
        session: Option<String>,
    },
    /// Emit a shell completion script.
    Completions {
        shell: clap_complete::Shell,
    },
}

struct GlobalFlags {
    config: Option<PathBuf>,
    working_dir: Option<PathBuf>,
    local: bool,
    remaining: Vec<String>,
}

/// Strip `--config[=<path>]`, `--working-dir[=<path>]`, and
/// `--local`/`-local` from `args` wherever they occur, recording their
/// values.
fn strip_global_flags(args: &[String]) -> Result<GlobalFlags, CliError> {
    let mut config = None;
    let mut working_dir = None;
    let mut local = false;
    let mut remaining = Vec::new();

    let mut iter = args.iter().cloned();
    while let Some(arg) = iter.next() {
        if let Some(value) = arg.strip_prefix("--config=") {
            config = Some(PathBuf::from(value));
        } else if arg == "--config" {
            let value = iter
                .next()
                .ok_or_else(|| CliError::User("--config requires a path argument".to_string()))?;
            config = Some(PathBuf::from(value));
        } else if let Some(value) = arg.strip_prefix("--working-dir=") {
            working_dir = Some(PathBuf::from(value));
        } else if arg == "--working-dir" {
            let value = iter.next().ok_or_else(|| {
                CliError::User("--working-dir requires a path argument".to_string())
            })?;
            working_dir = Some(PathBuf::from(value));
        } else if arg == "--local" || arg == "-local" {
            local = true;
        } else {
            remaining.push(arg);
        }
    }

    Ok(GlobalFlags {
        config,
        working_dir,
        local,
        remaining,
    })
}

/// Parse `runbook`'s full argv (excluding argv[0]) and run it to
/// completion. The returned `i32` is the process exit code: every
/// branch except `run` uses it purely to signal 0/1/2 dispatch
/// success/failure; `run` overrides it with the child task's own exit
/// code on success, per commands::run's documented exit-code policy.
pub async fn route(args: Vec<String>) -> Result<i32, CliError> {
    let flags = strip_global_flags(&args)?;

    let project_root = match &flags.working_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir()?,
    };
    let ctx = Context::new(project_root, flags.config.clone());

    if flags
        .remaining
        .first()
        .is_some_and(|tok| SUBCOMMANDS.contains(&tok.as_str()))
    {
        return dispatch_subcommand(&ctx, &flags.remaining).await;
    }

    dispatch_server_mode(&ctx, &flags.remaining, flags.local).await
}

async fn dispatch_subcommand(ctx: &Context, remaining: &[String]) -> Result<i32, CliError> {
    let mut argv = vec!["runbook".to_string()];
    argv.extend_from_slice(remaining);
    let cli = Cli::try_parse_from(argv).map_err(|err| CliError::User(err.to_string()))?;
    let subcommand = subcommand_name(&cli.command);

    run_subcommand(ctx, cli.command)
        .await
        .map_err(|err| err.with_subcommand(subcommand))
}

/// Name used to prefix this subcommand's own errors per spec §7 ("CLI
/// subcommands print a single-line error to stderr prefixed by the
/// subcommand name").
fn subcommand_name(command: &Command) -> &'static str {
    match command {
        Command::List => "list",
        Command::Run { .. } => "run",
        Command::Start { .. } => "start",
        Command::Stop { .. } => "stop",
        Command::Status { .. } => "status",
        Command::Logs { .. } => "logs",
        Command::Completions { .. } => "completions",
    }
}

async fn run_subcommand(ctx: &Context, command: Command) -> Result<i32, CliError> {
    match command {
        Command::List => {
            let manifest = ctx.load_manifest()?;
            commands::list::execute(&manifest);
            Ok(0)
        }
        Command::Run { task, params } => {
            let manifest = ctx.load_manifest()?;
            let params = parse_params(&params)?;
            let code =
                commands::run::execute(&manifest, &ctx.project_root, &task, &params).await?;
            Ok(code)
        }
        Command::Start { task, params } => {
            let manifest = ctx.load_manifest()?;
            let params = parse_params(&params)?;
            let (session_store, supervisor) = commands::open_supervisor(&ctx.state_dir).await?;
            commands::start::execute(
                &manifest,
                &session_store,
                &supervisor,
                &ctx.project_root,
                &task,
                &params,
            )
            .await?;
            Ok(0)
        }
        Command::Stop { task } => {
            let manifest = ctx.load_manifest()?;
            let (_session_store, supervisor) = commands::open_supervisor(&ctx.state_dir).await?;
            commands::stop::execute(&manifest, &supervisor, &task).await?;
            Ok(0)
        }
        Command::Status { task } => {
            let manifest = ctx.load_manifest()?;
            let (_session_store, supervisor) = commands::open_supervisor(&ctx.state_dir).await?;
            commands::status::execute(&manifest, &supervisor, &task).await?;
            Ok(0)
        }
        Command::Logs {
            task,
            lines,
            filter,
            session,
        } => {
            let manifest = ctx.load_manifest()?;
            let (session_store, _supervisor) = commands::open_supervisor(&ctx.state_dir).await?;
            commands::logs::execute(
                &manifest,
                &session_store,
                &task,
                lines,
                filter.as_deref(),
                session.as_deref(),
            )?;
            Ok(0)
        }
        Command::Completions { shell } => {
            crate::completions::generate_completions::<Cli>(shell);
            Ok(0)
        }
    }
}

struct ServerModeFlags {
    config: Option<PathBuf>,
    init: bool,
    serve: bool,
    addr: Option<String>,
}

/// Parse the legacy single-dash server-mode flags by hand: clap can't
/// mix single-dash long options with the subcommand grammar above.
fn parse_server_flags(remaining: &[String]) -> Result<ServerModeFlags, CliError> {
    let mut config = None;
    let mut init = false;
    let mut serve = false;
    let mut addr = None;

    let mut iter = remaining.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| CliError::User("-config requires a path argument".to_string()))?;
                config = Some(PathBuf::from(value));
            }
            "-init" => init = true,
            "-serve" => serve = true,
            "-addr" => {
                let value = iter
                    .next()
                    .ok_or_else(|| CliError::User("-addr requires an address argument".to_string()))?;
                addr = Some(value.clone());
            }
            other => {
                return Err(CliError::User(format!("unrecognized argument {other:?}")));
            }
        }
    }

    Ok(ServerModeFlags {
        config,
        init,
        serve,
        addr,
    })
}

async fn dispatch_server_mode(
    ctx: &Context,
    remaining: &[String],
    local_forced: bool,
) -> Result<i32, CliError> {
    let flags = parse_server_flags(remaining)?;
    let config_root = flags.config.unwrap_or_else(|| ctx.config_root.clone());
    let ctx = Context::new(ctx.project_root.clone(), Some(config_root));

    if flags.init {
        write_init_template(&ctx)?;
        return Ok(0);
    }

    if flags.serve {
        run_serve(&ctx, flags.addr.as_deref()).await?;
        return Ok(0);
    }

    run_stdio_entrypoint(&ctx, local_forced).await?;
    Ok(0)
}

const INIT_TEMPLATE: &str = "\
# Runbook task manifest. See `runbook list` to confirm tasks load, and
# `runbook run <task>`/`runbook start <task>` to exercise them.
build:
  type: oneshot
  description: Build the project
  command: echo \"replace me with a real build command\"

watch:
  type: daemon
  description: Run a long-lived background watcher
  command: echo \"replace me with a real daemon command\"
";

fn write_init_template(ctx: &Context) -> Result<(), CliError> {
    let path = ctx.config_root.join("runbook.yaml");
    if path.exists() {
        return Err(CliError::User(format!(
            "refusing to overwrite existing manifest at {}",
            path.display()
        )));
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, INIT_TEMPLATE)?;
    eprintln!("wrote {}", path.display());
    Ok(())
}

fn process_is_alive(pid: u32) -> bool {
    nix::sys::signal::kill(nix::unistd::Pid::from_raw(pid as i32), None).is_ok()
}

async fn run_serve(ctx: &Context, addr_flag: Option<&str>) -> Result<(), CliError> {
    let _guard = logging::init_file(&ctx.state_dir)?;
    let manifest = ctx.load_manifest()?;
    let (session_store, supervisor) = commands::open_supervisor(&ctx.state_dir).await?;

    let bind_addr = addr_flag.unwrap_or("127.0.0.1:0");
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .map_err(|err| CliError::Internal(format!("failed to bind {bind_addr}: {err}")))?;
    let local_addr = listener
        .local_addr()
        .map_err(|err| CliError::Internal(err.to_string()))?;
    let base_url = format!("http://{local_addr}");

    let registry = ServerRegistryReader::new(&ctx.state_dir);
    registry.write(&ServerRecord {
        addr: base_url.clone(),
        pid: std::process::id(),
    })?;
    info!(addr = %base_url, "serving MCP over HTTP");

    let server = runbook_mcp::RunbookServer::new(
        Arc::new(manifest),
        ctx.project_root.clone(),
        session_store,
        Arc::clone(&supervisor),
        Arc::new(runbook_core::SystemClock),
    );
    let app = runbook_mcp::http_router(server);

    tokio::select! {
        result = axum::serve(listener, app) => {
            if let Err(err) = result {
                warn!(error = %err, "axum server exited with an error");
            }
        }
        _ = signal::wait_and_stop_all(Arc::clone(&supervisor)) => {}
    }

    registry.delete()?;
    Ok(())
}

async fn run_stdio_entrypoint(ctx: &Context, local_forced: bool) -> Result<(), CliError> {
    if !local_forced {
        let registry = ServerRegistryReader::new(&ctx.state_dir);
        if let Some(record) = registry.read_checked(process_is_alive)? {
            if proxy::is_reachable(&record.addr).await {
                eprintln!("Proxying stdio to server at {}", record.addr);
                proxy::relay(&record.addr).await?;
                return Ok(());
            }
            // The owning pid is alive but not answering HTTP, which means
            // the registry record is stale (crashed mid-request, wedged,
            // or pointing at a port something else now holds). Starting a
            // second local server here would leave two processes claiming
            // the same task set, so surface the mismatch instead.
            return Err(CliError::from(runbook_storage::ServerRegistryError::Unreachable {
                path: registry.path().to_path_buf(),
                addr: record.addr.clone(),
            }));
        }
    }

    let _guard = logging::init_file(&ctx.state_dir)?;
    let manifest = ctx.load_manifest()?;
    let (session_store, supervisor) = commands::open_supervisor(&ctx.state_dir).await?;

    let server = runbook_mcp::RunbookServer::new(
        Arc::new(manifest),
        ctx.project_root.clone(),
        session_store,
        Arc::clone(&supervisor),
        Arc::new(runbook_core::SystemClock),
    );

    tokio::select! {
        result = runbook_mcp::serve_stdio(server) => result.map_err(CliError::from)?,
        _ = signal::wait_and_stop_all(Arc::clone(&supervisor)) => {}
    }
    Ok(())
}
