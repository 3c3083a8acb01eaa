use crate::backup;
use crate::ipc::error::{err, no_workspace, ok};
use crate::ipc::params::str_param;
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::path::PathBuf;

fn path_param(req: &Request, key: &str) -> Result<PathBuf, serde_json::Value> {
    match str_param(req, key) {
        Ok(v) if !v.trim().is_empty() => Ok(PathBuf::from(v.trim())),
        Ok(_) => Err(err(&req.id, "bad_params", format!("missing {key}"), None)),
        Err(resp) => Err(resp),
    }
}

fn handle_backup_export_workspace_bundle(state: &mut AppState, req: &Request) -> serde_json::Value {
    let out_path = match path_param(req, "outPath") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Some(repo) = state.repo.as_ref() else {
        return no_workspace(&req.id);
    };

    match backup::export_bundle(repo.store(), &out_path) {
        Ok(export) => ok(
            &req.id,
            json!({
                "path": out_path.to_string_lossy(),
                "bundleFormat": export.bundle_format,
                "entryCount": export.entry_count
            }),
        ),
        Err(e) => {
            log::error!("bundle export failed: {e:#}");
            err(
                &req.id,
                "io_failed",
                format!("{e:#}"),
                Some(json!({ "path": out_path.to_string_lossy() })),
            )
        }
    }
}

/// Restores into the open workspace. The cart is dropped since the subjects
/// it names may no longer exist.
fn handle_backup_import_workspace_bundle(state: &mut AppState, req: &Request) -> serde_json::Value {
    let in_path = match path_param(req, "inPath") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Some(repo) = state.repo.as_ref() else {
        return no_workspace(&req.id);
    };
    if !in_path.is_file() {
        return err(
            &req.id,
            "not_found",
            "bundle file not found",
            Some(json!({ "path": in_path.to_string_lossy() })),
        );
    }

    match backup::import_bundle(repo.store(), &in_path) {
        Ok(summary) => {
            state.cart = Default::default();
            ok(
                &req.id,
                json!({
                    "bundleFormat": summary.bundle_format,
                    "collections": summary.collections,
                }),
            )
        }
        Err(e) => {
            log::error!("bundle import failed: {e:#}");
            err(
                &req.id,
                "io_failed",
                format!("{e:#}"),
                Some(json!({ "path": in_path.to_string_lossy() })),
            )
        }
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "backup.exportWorkspaceBundle" => Some(handle_backup_export_workspace_bundle(state, req)),
        "backup.importWorkspaceBundle" => Some(handle_backup_import_workspace_bundle(state, req)),
        _ => None,
    }
}
