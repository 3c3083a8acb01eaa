use crate::error::CoreError;
use crate::ipc::error::{core_err, no_workspace, ok};
use crate::ipc::params::{decode_field, decode_params, opt_str, respond, str_param};
use crate::ipc::types::{AppState, Request};
use crate::repo::{NewStudent, StudentPatch};
use crate::roster;
use serde_json::json;

fn handle_students_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(repo) = state.repo.as_ref() else {
        return ok(&req.id, json!({ "students": [] }));
    };
    let students = match opt_str(req, "classId") {
        Some(class_id) => repo.class_roster(class_id),
        None => repo.students(),
    };
    respond(req, "students", students)
}

fn handle_students_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(repo) = state.repo.as_ref() else {
        return no_workspace(&req.id);
    };
    let input: NewStudent = match decode_params(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(req, "student", repo.create_student(input))
}

fn handle_students_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(repo) = state.repo.as_ref() else {
        return no_workspace(&req.id);
    };
    let id = match str_param(req, "id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let patch: StudentPatch = match decode_field(req, "patch") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(req, "student", repo.update_student(id, patch))
}

fn handle_students_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(repo) = state.repo.as_ref() else {
        return no_workspace(&req.id);
    };
    let id = match str_param(req, "id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match repo.delete_student(id) {
        Ok(()) => ok(&req.id, json!({ "deleted": id })),
        Err(e) => core_err(&req.id, &e),
    }
}

fn handle_students_import_bulk(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(repo) = state.repo.as_ref() else {
        return no_workspace(&req.id);
    };
    let class_id = opt_str(req, "classId").unwrap_or("");
    let text = req
        .params
        .get("text")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    match roster::import_roster(repo, class_id, text) {
        Ok(outcome) => match serde_json::to_value(&outcome) {
            Ok(v) => ok(&req.id, v),
            Err(e) => core_err(&req.id, &CoreError::from(e)),
        },
        Err(e) => core_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.list" => Some(handle_students_list(state, req)),
        "students.create" => Some(handle_students_create(state, req)),
        "students.update" => Some(handle_students_update(state, req)),
        "students.delete" => Some(handle_students_delete(state, req)),
        "students.importBulk" => Some(handle_students_import_bulk(state, req)),
        _ => None,
    }
}
