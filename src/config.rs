//! Runtime settings collected from the command line and environment

use std::path::PathBuf;

pub const DEFAULT_DB_PATH: &str = "hybrid-master.db";
pub const DEFAULT_LOG_PATH: &str = "hybrid-master.log";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub db_path: PathBuf,
    /// JSON program; the built-in one when absent
    pub plan_path: Option<PathBuf>,
    pub log_path: PathBuf,
    pub sound: bool,
    pub notifications: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            plan_path: None,
            log_path: PathBuf::from(DEFAULT_LOG_PATH),
            sound: true,
            notifications: true,
        }
    }
}
