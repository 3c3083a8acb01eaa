use crate::ipc::error::{core_err, no_workspace, ok};
use crate::ipc::params::{respond, str_param};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_staff_login(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(repo) = state.repo.as_ref() else {
        return no_workspace(&req.id);
    };
    let username = match str_param(req, "username") {
        Ok(v) => v.trim(),
        Err(resp) => return resp,
    };
    let password = match str_param(req, "password") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match repo.find_staff_login(username, password) {
        Ok(user) => {
            log::info!("staff login: {}", user.id);
            ok(&req.id, json!({ "user": user.public_json() }))
        }
        Err(e) => core_err(&req.id, &e),
    }
}

/// Students sign in with their school-assigned code alone.
fn handle_student_lookup(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(repo) = state.repo.as_ref() else {
        return no_workspace(&req.id);
    };
    let code = match str_param(req, "studentId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(req, "student", repo.find_student_by_code(code))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "auth.staffLogin" => Some(handle_staff_login(state, req)),
        "auth.studentLookup" => Some(handle_student_lookup(state, req)),
        _ => None,
    }
}
