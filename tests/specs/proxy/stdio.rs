//! Stdio-proxy test: a bare `runbook` invocation (no subcommand)
//! discovers a live `-serve` process through `ServerRegistry` and
//! relays stdin/stdout to it instead of starting a second, redundant
//! local server.

use std::process::{Child, Command, Stdio};

use crate::prelude::*;

struct ServeGuard {
    child: Child,
}

impl Drop for ServeGuard {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

fn spawn_serve(temp: &Project) -> ServeGuard {
    let bin = assert_cmd::cargo::cargo_bin("runbook");
    let child = Command::new(bin)
        .arg("-serve")
        .current_dir(temp.path())
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn runbook -serve");
    ServeGuard { child }
}

#[test]
fn bare_invocation_proxies_to_a_live_server() {
    let temp = Project::empty();
    temp.with_sleep_runbook();

    let _guard = spawn_serve(&temp);

    let registered = wait_for(SPEC_WAIT_MAX_MS, || {
        temp.state_path().join("server.json").is_file()
    });
    assert!(registered, "-serve should register a server.json record");

    let record = std::fs::read_to_string(temp.state_path().join("server.json"))
        .expect("read server.json");
    let record: serde_json::Value = serde_json::from_str(&record).expect("parse server.json");
    let addr = record["addr"].as_str().expect("addr field").to_string();

    let reachable = wait_for(SPEC_WAIT_MAX_MS, || {
        std::net::TcpStream::connect(addr.trim_start_matches("http://")).is_ok()
    });
    assert!(reachable, "registered server should accept connections");

    temp.runbook()
        .stdin("")
        .passes()
        .stderr_has(&format!("Proxying stdio to server at {addr}"));
}

#[test]
fn local_flag_forces_a_local_server_instead_of_proxying() {
    let temp = Project::empty();
    temp.with_sleep_runbook();

    let _guard = spawn_serve(&temp);
    let registered = wait_for(SPEC_WAIT_MAX_MS, || {
        temp.state_path().join("server.json").is_file()
    });
    assert!(registered, "-serve should register a server.json record");

    // `--local` skips the proxy path entirely even though a server is
    // registered and reachable; it should serve stdio directly instead,
    // so no "Proxying" line should appear. `initialize` is the first
    // MCP message a stdio client sends, which is enough to make the
    // local stdio server exit cleanly once stdin closes.
    temp.runbook()
        .args(&["--local"])
        .stdin("")
        .passes()
        .stderr_lacks("Proxying stdio to server at");
}
