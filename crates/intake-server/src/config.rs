//! Command line and environment configuration

use clap::{Parser, ValueEnum};
use intake_classifier::LlmConfig;
use intake_storage::{DriveConfig, StorageConfig};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

/// Student document intake server
#[derive(Debug, Clone, Parser)]
#[command(name = "intake-server", version, about)]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Student register JSON file
    #[arg(long, env = "DATA_FILE", default_value = "data/students.json")]
    pub data_file: PathBuf,

    /// Directory for locally stored uploads
    #[arg(long, env = "UPLOAD_DIR", default_value = "uploads")]
    pub upload_dir: PathBuf,

    /// Directory holding the static frontend
    #[arg(long, env = "PUBLIC_DIR", default_value = "public")]
    pub public_dir: PathBuf,

    /// Public URL of this server, used in local file links
    #[arg(long, env = "PUBLIC_URL")]
    pub public_url: Option<String>,

    /// Pre-issued drive access token
    #[arg(long, env = "DRIVE_ACCESS_TOKEN", hide_env_values = true)]
    pub drive_access_token: Option<String>,

    /// Drive OAuth refresh-token credential file
    #[arg(long, env = "DRIVE_CREDENTIALS_FILE")]
    pub drive_credentials_file: Option<PathBuf>,

    /// Drive folder holding the student folders
    #[arg(long, env = "DRIVE_ROOT_FOLDER_ID")]
    pub drive_root_folder_id: Option<String>,

    /// Drive API base URL
    #[arg(long, env = "DRIVE_API_BASE", default_value = intake_storage::config::DEFAULT_API_BASE)]
    pub drive_api_base: String,

    /// Hosted LLM API key; without it the rule classifier is used
    #[arg(long, env = "LLM_API_KEY", hide_env_values = true)]
    pub llm_api_key: Option<String>,

    /// Chat completions endpoint
    #[arg(long, env = "LLM_ENDPOINT", default_value = intake_classifier::config::DEFAULT_ENDPOINT)]
    pub llm_endpoint: String,

    /// Completion model
    #[arg(long, env = "LLM_MODEL", default_value = intake_classifier::config::DEFAULT_MODEL)]
    pub llm_model: String,

    /// Bearer token required on /api and /upload
    #[arg(long, env = "API_TOKEN", hide_env_values = true)]
    pub api_token: Option<String>,

    /// Timeout for outbound requests, in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    pub request_timeout_secs: u64,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

/// Resolved server configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Listen address
    pub addr: SocketAddr,
    /// Student register file
    pub data_file: PathBuf,
    /// Static frontend directory
    pub public_dir: PathBuf,
    /// Storage settings
    pub storage: StorageConfig,
    /// Classifier settings
    pub llm: LlmConfig,
    /// Bearer token for `/api` and `/upload`
    pub api_token: Option<String>,
    /// Log output format
    pub log_format: LogFormat,
}

impl From<Args> for AppConfig {
    fn from(args: Args) -> Self {
        let timeout = Duration::from_secs(args.request_timeout_secs.max(1));
        let public_url = args
            .public_url
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| format!("http://localhost:{}", args.port));

        let mut drive = DriveConfig::new()
            .with_api_base(args.drive_api_base)
            .with_request_timeout(timeout);
        if let Some(token) = args.drive_access_token {
            drive = drive.with_access_token(token);
        }
        if let Some(path) = args.drive_credentials_file {
            drive = drive.with_credentials_file(path);
        }
        if let Some(root) = args.drive_root_folder_id {
            drive = drive.with_root_folder(root);
        }

        let mut llm = LlmConfig::new()
            .with_endpoint(args.llm_endpoint)
            .with_model(args.llm_model)
            .with_timeout(timeout);
        if let Some(key) = args.llm_api_key {
            llm = llm.with_api_key(key);
        }

        Self {
            addr: SocketAddr::new(args.host, args.port),
            data_file: args.data_file,
            public_dir: args.public_dir,
            storage: StorageConfig::new()
                .with_upload_dir(args.upload_dir)
                .with_public_base_url(public_url)
                .with_drive(drive),
            llm,
            api_token: args.api_token.filter(|t| !t.trim().is_empty()),
            log_format: args.log_format,
        }
    }
}
