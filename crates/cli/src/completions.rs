//! Shell completion generation for the clap-derived CLI surface. Cheap
//! to keep wired up since clap_complete derives it straight from the
//! `Cli` command tree with no extra bookkeeping.

use clap::CommandFactory;
use clap_complete::{generate, Shell};

pub fn generate_completions<C: CommandFactory>(shell: Shell) {
    let mut cmd = C::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut std::io::stdout());
}
