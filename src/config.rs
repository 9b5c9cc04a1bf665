use std::env;
use std::time::Duration;

use anyhow::Context;

use crate::models::Catalog;

pub const DEFAULT_ADMIN_TOKEN: &str = "changeme";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub admin_token: String,
    pub automation_url: Option<String>,
    pub automation_timeout_secs: u64,
    pub catalog_path: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "salonbook.db".to_string()),
            admin_token: env::var("ADMIN_TOKEN").unwrap_or_else(|_| DEFAULT_ADMIN_TOKEN.to_string()),
            automation_url: env::var("AUTOMATION_URL").ok().filter(|v| !v.trim().is_empty()),
            automation_timeout_secs: env::var("AUTOMATION_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),
            catalog_path: env::var("CATALOG_PATH").ok().filter(|v| !v.trim().is_empty()),
        }
    }

    pub fn uses_default_admin_token(&self) -> bool {
        self.admin_token == DEFAULT_ADMIN_TOKEN
    }

    pub fn automation_timeout(&self) -> Duration {
        Duration::from_secs(self.automation_timeout_secs)
    }

    /// The configured service catalog, or the salon's default menu.
    pub fn load_catalog(&self) -> anyhow::Result<Catalog> {
        match &self.catalog_path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read catalog file: {path}"))?;
                Catalog::from_json(&raw).with_context(|| format!("invalid catalog file: {path}"))
            }
            None => Ok(Catalog::salon_default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(admin_token: &str) -> AppConfig {
        AppConfig {
            port: 3000,
            database_url: ":memory:".to_string(),
            admin_token: admin_token.to_string(),
            automation_url: None,
            automation_timeout_secs: 5,
            catalog_path: None,
        }
    }

    #[test]
    fn test_default_admin_token_is_detected() {
        assert!(config(DEFAULT_ADMIN_TOKEN).uses_default_admin_token());
        assert!(!config("s3cret").uses_default_admin_token());
    }
}
