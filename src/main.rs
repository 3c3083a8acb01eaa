mod backup;
mod calc;
mod cart;
mod config;
mod db;
mod error;
mod ipc;
mod model;
mod repo;
mod resolve;
mod roster;
mod store;

use std::io::{self, BufRead, Write};

fn main() {
    let cfg = config::Config::from_env();
    // stdout carries the protocol, so logs go to stderr.
    env_logger::Builder::new()
        .parse_filters(&cfg.log_filter)
        .target(env_logger::Target::Stderr)
        .init();

    let mut state = ipc::AppState::default();
    if let Some(path) = cfg.workspace.as_deref() {
        if let Err(e) = ipc::open_workspace(&mut state, path) {
            log::error!(
                "could not open workspace {}: {e:#}",
                path.to_string_lossy()
            );
        }
    }
    log::info!("gradebookd {} ready", env!("CARGO_PKG_VERSION"));

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(e) => {
                log::error!("stdin read failed: {e}");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // No id to echo back.
                log::warn!("unparseable request: {e}");
                let resp = serde_json::json!({
                    "ok": false,
                    "error": { "code": "bad_json", "message": e.to_string() }
                });
                let _ = writeln!(stdout, "{resp}");
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }
    log::info!("stdin closed, exiting");
}
