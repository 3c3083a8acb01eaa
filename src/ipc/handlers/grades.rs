use crate::error::CoreError;
use crate::ipc::error::{core_err, no_workspace, ok};
use crate::ipc::params::{decode_field, respond, str_param};
use crate::ipc::types::{AppState, Request};
use crate::repo::GradeEntry;
use crate::resolve;
use serde_json::json;

fn handle_grades_sheet(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(repo) = state.repo.as_ref() else {
        return no_workspace(&req.id);
    };
    let assignment_id = match str_param(req, "assignmentId") {
        Ok(v) => v.trim(),
        Err(resp) => return resp,
    };
    if assignment_id.is_empty() {
        return core_err(&req.id, &CoreError::SelectionRequired("assignment"));
    }
    let sheet = repo.snapshot().and_then(|snap| {
        resolve::grade_sheet(&snap, assignment_id)
            .ok_or_else(|| CoreError::not_found("assignment", assignment_id))
    });
    respond(req, "sheet", sheet)
}

/// Grades outside the scale are rejected while decoding, before anything is
/// written.
fn handle_grades_save(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(repo) = state.repo.as_ref() else {
        return no_workspace(&req.id);
    };
    let assignment_id = match str_param(req, "assignmentId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let entries: Vec<GradeEntry> = match decode_field(req, "grades") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match repo.save_assignment_grades(assignment_id, entries) {
        Ok(saved) => ok(&req.id, json!({ "saved": saved })),
        Err(e) => core_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "grades.sheet" => Some(handle_grades_sheet(state, req)),
        "grades.save" => Some(handle_grades_save(state, req)),
        _ => None,
    }
}
