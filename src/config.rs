use anyhow::{Context, Result};
use std::path::PathBuf;

const DEFAULT_API_URL: &str = "https://aggiespirit.ts.tamu.edu";
const DEFAULT_DATA_DIR: &str = "./data";
const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub api_url: String,
    pub data_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let port = match lookup("PORT") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("Invalid PORT env variable: {:?}", raw))?,
            None => DEFAULT_PORT,
        };
        Ok(Self {
            port,
            api_url: lookup("SPIRIT_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            data_dir: lookup("DATA_DIR")
                .unwrap_or_else(|| DEFAULT_DATA_DIR.to_string())
                .into(),
        })
    }
}
