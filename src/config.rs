use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use std::{fs, net::IpAddr, path::PathBuf};

use crate::load::LoadOptions;

const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Command-line args; every flag falls back to an environment variable.
#[derive(Parser, Debug, Clone)]
#[command(name = "symptom-ingest", about = "Business symptom diagnostic records over HTTP")]
pub struct Args {
    /// DuckDB database file, or `:memory:`
    #[arg(long, env = "DATABASE_URL", default_value = "business_symptom.duckdb")]
    pub database_url: String,

    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Optional YAML file with a `loader:` section
    #[arg(long, env = "LOADER_CONFIG")]
    pub config: Option<PathBuf>,

    #[arg(long, env = "MAX_UPLOAD_BYTES", default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    pub max_upload_bytes: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    loader: LoadOptions,
}

/// Everything the service needs at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: IpAddr,
    pub port: u16,
    pub max_upload_bytes: u64,
    pub loader: LoadOptions,
}

impl AppConfig {
    pub fn load(args: Args) -> Result<Self> {
        let file = match &args.config {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("reading loader config {}", path.display()))?;
                parse_file_config(&text)
                    .with_context(|| format!("parsing loader config {}", path.display()))?
            }
            None => FileConfig::default(),
        };

        Ok(Self {
            database_url: args.database_url,
            host: args.host,
            port: args.port,
            max_upload_bytes: args.max_upload_bytes,
            loader: file.loader,
        })
    }
}

fn parse_file_config(text: &str) -> Result<FileConfig> {
    if text.trim().is_empty() {
        return Ok(FileConfig::default());
    }
    Ok(serde_yaml::from_str(text)?)
}
