use std::path::PathBuf;

pub const WORKSPACE_VAR: &str = "GRADEBOOKD_WORKSPACE";
pub const LOG_VAR: &str = "GRADEBOOKD_LOG";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Workspace to open before the first request, if any.
    pub workspace: Option<PathBuf>,
    pub log_filter: String,
}

impl Config {
    /// Reads the process environment, after loading a `.env` file if present.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let workspace = get(WORKSPACE_VAR)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        let log_filter = get(LOG_VAR)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| "info".to_string());
        Self {
            workspace,
            log_filter,
        }
    }
}
