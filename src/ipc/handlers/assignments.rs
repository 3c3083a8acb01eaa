use crate::ipc::error::{core_err, no_workspace, ok};
use crate::ipc::params::{opt_str, respond, str_param};
use crate::ipc::types::{AppState, Request};
use crate::resolve;
use serde_json::json;

fn handle_assignments_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(repo) = state.repo.as_ref() else {
        return ok(&req.id, json!({ "assignments": [] }));
    };
    let views = repo.snapshot().and_then(|snap| {
        let rows = match opt_str(req, "teacherId") {
            Some(teacher_id) => repo.assignments_for_teacher(teacher_id)?,
            None => snap.assignments.clone(),
        };
        Ok(resolve::assignment_views(&snap, &rows))
    });
    respond(req, "assignments", views)
}

fn handle_assignments_by_class(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(repo) = state.repo.as_ref() else {
        return ok(&req.id, json!({ "groups": [] }));
    };
    let groups = repo
        .snapshot()
        .map(|snap| resolve::assignments_by_class(&snap));
    respond(req, "groups", groups)
}

fn handle_assignments_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(repo) = state.repo.as_ref() else {
        return no_workspace(&req.id);
    };
    let assignment_id = match str_param(req, "assignmentId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match repo.delete_assignment(assignment_id) {
        Ok(()) => ok(&req.id, json!({ "deleted": assignment_id })),
        Err(e) => core_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "assignments.list" => Some(handle_assignments_list(state, req)),
        "assignments.byClass" => Some(handle_assignments_by_class(state, req)),
        "assignments.delete" => Some(handle_assignments_delete(state, req)),
        _ => None,
    }
}
