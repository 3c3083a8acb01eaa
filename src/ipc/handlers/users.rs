use crate::ipc::error::{core_err, no_workspace, ok};
use crate::ipc::params::{decode_field, decode_params, opt_str, str_param};
use crate::ipc::types::{AppState, Request};
use crate::repo::{NewUser, UserPatch};
use serde_json::json;

// Passwords never leave the sidecar: every user goes out through public_json.

fn handle_users_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(repo) = state.repo.as_ref() else {
        return ok(&req.id, json!({ "users": [] }));
    };
    match repo.search_users(opt_str(req, "search")) {
        Ok(users) => {
            let users: Vec<serde_json::Value> = users.iter().map(|u| u.public_json()).collect();
            ok(&req.id, json!({ "users": users }))
        }
        Err(e) => core_err(&req.id, &e),
    }
}

fn handle_users_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(repo) = state.repo.as_ref() else {
        return no_workspace(&req.id);
    };
    let input: NewUser = match decode_params(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match repo.create_user(input) {
        Ok(user) => ok(&req.id, json!({ "user": user.public_json() })),
        Err(e) => core_err(&req.id, &e),
    }
}

fn handle_users_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(repo) = state.repo.as_ref() else {
        return no_workspace(&req.id);
    };
    let user_id = match str_param(req, "userId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let patch: UserPatch = match decode_field(req, "patch") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match repo.update_user(user_id, patch) {
        Ok(user) => ok(&req.id, json!({ "user": user.public_json() })),
        Err(e) => core_err(&req.id, &e),
    }
}

fn handle_users_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(repo) = state.repo.as_ref() else {
        return no_workspace(&req.id);
    };
    let user_id = match str_param(req, "userId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match repo.delete_user(user_id) {
        Ok(()) => ok(&req.id, json!({ "deleted": user_id })),
        Err(e) => core_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "users.list" => Some(handle_users_list(state, req)),
        "users.create" => Some(handle_users_create(state, req)),
        "users.update" => Some(handle_users_update(state, req)),
        "users.delete" => Some(handle_users_delete(state, req)),
        _ => None,
    }
}
