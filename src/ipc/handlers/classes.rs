use crate::error::CoreResult;
use crate::ipc::error::{core_err, no_workspace, ok};
use crate::ipc::params::{respond, str_param};
use crate::ipc::types::{AppState, Request};
use crate::repo::Repository;
use crate::store::CollectionStore;
use serde_json::json;

/// Classes with their current head count, so the UI can show a dashboard.
fn class_rows<S: CollectionStore>(repo: &Repository<S>) -> CoreResult<Vec<serde_json::Value>> {
    let students = repo.students()?;
    Ok(repo
        .classes()?
        .into_iter()
        .map(|c| {
            let count = students.iter().filter(|s| s.class_id == c.id).count();
            json!({ "id": c.id, "name": c.name, "studentCount": count })
        })
        .collect())
}

fn handle_classes_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(repo) = state.repo.as_ref() else {
        return ok(&req.id, json!({ "classes": [] }));
    };
    respond(req, "classes", class_rows(repo))
}

fn handle_classes_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(repo) = state.repo.as_ref() else {
        return no_workspace(&req.id);
    };
    let name = match str_param(req, "name") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(req, "class", repo.create_class(name))
}

fn handle_classes_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(repo) = state.repo.as_ref() else {
        return no_workspace(&req.id);
    };
    let (class_id, name) = match (str_param(req, "classId"), str_param(req, "name")) {
        (Ok(c), Ok(n)) => (c, n),
        (Err(resp), _) | (_, Err(resp)) => return resp,
    };
    respond(req, "class", repo.rename_class(class_id, name))
}

fn handle_classes_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(repo) = state.repo.as_ref() else {
        return no_workspace(&req.id);
    };
    let class_id = match str_param(req, "classId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match repo.delete_class(class_id) {
        Ok(()) => ok(&req.id, json!({ "deleted": class_id })),
        Err(e) => core_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "classes.list" => Some(handle_classes_list(state, req)),
        "classes.create" => Some(handle_classes_create(state, req)),
        "classes.update" => Some(handle_classes_update(state, req)),
        "classes.delete" => Some(handle_classes_delete(state, req)),
        _ => None,
    }
}
