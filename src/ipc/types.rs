use crate::cart::AssignmentCart;
use crate::repo::Repository;
use crate::store::SqliteStore;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Session state shared by every handler. The cart belongs to the open
/// workspace and is reset whenever a different one is selected.
#[derive(Default)]
pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub repo: Option<Repository<SqliteStore>>,
    pub cart: AssignmentCart,
}
