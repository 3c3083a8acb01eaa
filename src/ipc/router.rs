use super::handlers;
use super::types::{AppState, Request};
use crate::ipc::error::err;

pub fn handle_request(state: &mut AppState, req: Request) -> serde_json::Value {
    log::debug!("request {} {}", req.id, req.method);
    let families: [fn(&mut AppState, &Request) -> Option<serde_json::Value>; 11] = [
        handlers::core::try_handle,
        handlers::auth::try_handle,
        handlers::users::try_handle,
        handlers::classes::try_handle,
        handlers::students::try_handle,
        handlers::subjects::try_handle,
        handlers::assignments::try_handle,
        handlers::cart::try_handle,
        handlers::grades::try_handle,
        handlers::stats::try_handle,
        handlers::backup::try_handle,
    ];
    for try_handle in families {
        if let Some(resp) = try_handle(state, &req) {
            return resp;
        }
    }

    log::warn!("unknown method: {}", req.method);
    err(
        &req.id,
        "not_implemented",
        format!("unknown method: {}", req.method),
        None,
    )
}
