//! Core configuration loaded from environment (`.env` via the gateway).
//!
//! | Env | Default | Description |
//! |-----|---------|-------------|
//! | TASKHIVE_DB_PATH | data/taskhive.db | SQLite database file. |
//! | TASKHIVE_BIND_ADDR | 127.0.0.1:8787 | Gateway listen address. |
//! | TASKHIVE_ADMIN_TOKEN | (unset) | Required for pool-key admin endpoints; unset disables them. |
//! | TASKHIVE_ASSIST_MODEL | (bridge default) | Override the assist model. |
//! | TASKHIVE_ASSIST_ENABLED | true | Master toggle for outbound assist calls. |

use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub bind_addr: String,
    /// Unset means the admin surface rejects every request.
    pub admin_token: Option<String>,
    pub assist_model: Option<String>,
    pub assist_enabled: bool,
}

impl CoreConfig {
    /// Load from environment. Unset or invalid values fall back to the
    /// defaults in the table above.
    pub fn from_env() -> Self {
        Self {
            db_path: PathBuf::from(
                env_opt_string("TASKHIVE_DB_PATH")
                    .unwrap_or_else(|| "data/taskhive.db".to_string()),
            ),
            bind_addr: env_opt_string("TASKHIVE_BIND_ADDR")
                .unwrap_or_else(|| "127.0.0.1:8787".to_string()),
            admin_token: env_opt_string("TASKHIVE_ADMIN_TOKEN"),
            assist_model: env_opt_string("TASKHIVE_ASSIST_MODEL"),
            assist_enabled: env_bool("TASKHIVE_ASSIST_ENABLED", true),
        }
    }
}

fn env_bool(name: &str, default: bool) -> bool {
    match std::env::var(name) {
        Ok(v) => {
            let v = v.trim();
            if v.is_empty() {
                default
            } else {
                v.eq_ignore_ascii_case("true") || v == "1"
            }
        }
        Err(_) => default,
    }
}

fn env_opt_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
