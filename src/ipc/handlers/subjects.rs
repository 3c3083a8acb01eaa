use crate::ipc::error::{core_err, no_workspace, ok};
use crate::ipc::params::{decode_field, decode_params, opt_str, respond, str_param};
use crate::ipc::types::{AppState, Request};
use crate::repo::{NewSubject, SubjectPatch};
use serde_json::json;

fn handle_subjects_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(repo) = state.repo.as_ref() else {
        return ok(&req.id, json!({ "subjects": [] }));
    };
    respond(req, "subjects", repo.search_subjects(opt_str(req, "search")))
}

fn handle_subjects_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(repo) = state.repo.as_ref() else {
        return no_workspace(&req.id);
    };
    let input: NewSubject = match decode_params(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(req, "subject", repo.create_subject(input))
}

fn handle_subjects_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(repo) = state.repo.as_ref() else {
        return no_workspace(&req.id);
    };
    let subject_id = match str_param(req, "subjectId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let patch: SubjectPatch = match decode_field(req, "patch") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(req, "subject", repo.update_subject(subject_id, patch))
}

fn handle_subjects_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(repo) = state.repo.as_ref() else {
        return no_workspace(&req.id);
    };
    let subject_id = match str_param(req, "subjectId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match repo.delete_subject(subject_id) {
        Ok(()) => ok(&req.id, json!({ "deleted": subject_id })),
        Err(e) => core_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "subjects.list" => Some(handle_subjects_list(state, req)),
        "subjects.create" => Some(handle_subjects_create(state, req)),
        "subjects.update" => Some(handle_subjects_update(state, req)),
        "subjects.delete" => Some(handle_subjects_delete(state, req)),
        _ => None,
    }
}
