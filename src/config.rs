use anyhow::{Context, Result};
use std::env;

use crate::service::DEFAULT_MAX_PAGE_SIZE;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Hard cap on the page size the row listing accepts.
    pub max_page_size: u64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let host = env::var("FLEXDB_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let port = env::var("FLEXDB_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()
            .context("FLEXDB_PORT must be a valid u16")?;

        let max_page_size = env::var("FLEXDB_MAX_PAGE_SIZE")
            .unwrap_or_else(|_| DEFAULT_MAX_PAGE_SIZE.to_string())
            .parse::<u64>()
            .context("FLEXDB_MAX_PAGE_SIZE must be a valid u64")?;

        Ok(Self {
            host,
            port,
            max_page_size,
        })
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
