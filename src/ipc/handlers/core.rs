use crate::ipc::error::{err, ok};
use crate::ipc::params::str_param;
use crate::ipc::types::{AppState, Request};
use crate::repo::Repository;
use crate::store::SqliteStore;
use serde_json::json;
use std::path::{Path, PathBuf};

/// Opens (creating if needed) the workspace store and makes it current.
/// The admin account is seeded here so a fresh workspace can log in at once.
pub fn open_workspace(state: &mut AppState, path: &Path) -> anyhow::Result<()> {
    let repo = Repository::new(SqliteStore::open(path)?);
    repo.users()?;
    state.workspace = Some(path.to_path_buf());
    state.repo = Some(repo);
    state.cart = Default::default();
    log::info!("workspace opened: {}", path.to_string_lossy());
    Ok(())
}

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string())
        }),
    )
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let path = match str_param(req, "path") {
        Ok(v) if !v.trim().is_empty() => PathBuf::from(v.trim()),
        Ok(_) => return err(&req.id, "bad_params", "path must not be empty", None),
        Err(resp) => return resp,
    };

    match open_workspace(state, &path) {
        Ok(()) => ok(&req.id, json!({ "workspacePath": path.to_string_lossy() })),
        Err(e) => {
            log::error!("failed to open workspace {}: {e:#}", path.to_string_lossy());
            err(
                &req.id,
                "db_open_failed",
                format!("{e:#}"),
                Some(json!({ "path": path.to_string_lossy() })),
            )
        }
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        _ => None,
    }
}

