use crate::ipc::error::{core_err, no_workspace, ok};
use crate::ipc::params::str_param;
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn cart_json(state: &AppState) -> serde_json::Value {
    json!(state.cart)
}

fn handle_cart_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(&req.id, json!({ "cart": cart_json(state) }))
}

fn handle_cart_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (teacher_id, class_id) = match (str_param(req, "teacherId"), str_param(req, "classId")) {
        (Ok(t), Ok(c)) => (t, c),
        (Err(resp), _) | (_, Err(resp)) => return resp,
    };
    state.cart.select(teacher_id, class_id);
    ok(&req.id, json!({ "cart": cart_json(state) }))
}

fn handle_cart_add(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(repo) = state.repo.as_ref() else {
        return no_workspace(&req.id);
    };
    let subject_id = match str_param(req, "subjectId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match state.cart.add(repo, subject_id) {
        Ok(outcome) => {
            if outcome.duplicate {
                log::info!("subject {} already staged", subject_id.trim());
            }
            ok(
                &req.id,
                json!({
                    "added": outcome.added,
                    "duplicate": outcome.duplicate,
                    "cart": cart_json(state),
                }),
            )
        }
        Err(e) => core_err(&req.id, &e),
    }
}

fn handle_cart_remove(state: &mut AppState, req: &Request) -> serde_json::Value {
    let subject_id = match str_param(req, "subjectId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let removed = state.cart.remove(subject_id.trim());
    ok(
        &req.id,
        json!({ "removed": removed, "cart": cart_json(state) }),
    )
}

fn handle_cart_commit(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(repo) = state.repo.as_ref() else {
        return no_workspace(&req.id);
    };
    match state.cart.commit(repo) {
        Ok(outcome) => ok(
            &req.id,
            json!({
                "created": outcome.created,
                "duplicatesSkipped": outcome.duplicates_skipped,
                "cart": cart_json(state),
            }),
        ),
        Err(e) => core_err(&req.id, &e),
    }
}

fn handle_cart_discard(state: &mut AppState, req: &Request) -> serde_json::Value {
    state.cart.discard();
    ok(&req.id, json!({ "cart": cart_json(state) }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "cart.get" => Some(handle_cart_get(state, req)),
        "cart.select" => Some(handle_cart_select(state, req)),
        "cart.add" => Some(handle_cart_add(state, req)),
        "cart.remove" => Some(handle_cart_remove(state, req)),
        "cart.commit" => Some(handle_cart_commit(state, req)),
        "cart.discard" => Some(handle_cart_discard(state, req)),
        _ => None,
    }
}
