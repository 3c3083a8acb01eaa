use super::error::{core_err, err, ok};
use super::types::Request;
use crate::error::{CoreError, CoreResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Optional string param; blank counts as absent.
pub fn opt_str<'a>(req: &'a Request, key: &str) -> Option<&'a str> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Required string param. Present-but-blank values are passed through so the
/// core can report them as a validation or selection failure.
pub fn str_param<'a>(req: &'a Request, key: &str) -> Result<&'a str, Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {key}"), None))
}

/// Decodes the whole params object.
pub fn decode_params<T: DeserializeOwned>(req: &Request) -> Result<T, Value> {
    serde_json::from_value(req.params.clone())
        .map_err(|e| err(&req.id, "bad_params", e.to_string(), None))
}

/// Decodes one field of the params object; a missing field decodes from null.
pub fn decode_field<T: DeserializeOwned>(req: &Request, key: &str) -> Result<T, Value> {
    let v = req.params.get(key).cloned().unwrap_or(Value::Null);
    serde_json::from_value(v).map_err(|e| {
        err(
            &req.id,
            "bad_params",
            format!("{key}: {e}"),
            Some(serde_json::json!({ "field": key })),
        )
    })
}

/// `{ key: value }` on success, the mapped core error otherwise.
pub fn respond<T: Serialize>(req: &Request, key: &str, result: CoreResult<T>) -> Value {
    match result.and_then(|v| serde_json::to_value(v).map_err(CoreError::from)) {
        Ok(v) => {
            let mut body = serde_json::Map::new();
            body.insert(key.to_string(), v);
            ok(&req.id, Value::Object(body))
        }
        Err(e) => core_err(&req.id, &e),
    }
}
