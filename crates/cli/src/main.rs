mod commands;
mod completions;
mod context;
mod error;
mod logging;
mod proxy;
mod router;
mod signal;

#[tokio::main]
async fn main() {
    logging::init_stderr();
    let args: Vec<String> = std::env::args().skip(1).collect();

    let code = match router::route(args).await {
        Ok(code) => code,
        Err(err) => {
            // Subcommand errors already carry their subcommand prefix
            // (see `CliError::with_subcommand`); server-mode errors have
            // no subcommand to prefix with.
            eprintln!("{}", err.message());
            err.exit_code()
        }
    };
    std::process::exit(code);
}
