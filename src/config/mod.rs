//! Configuration module for the employee notes backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_MAX_UPLOAD_MB: usize = 100;
const DEFAULT_MAX_ENTRY_MB: usize = 100;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the JSON dataset file
    pub data_path: PathBuf,
    /// Directory holding uploaded attachments
    pub resources_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Largest accepted request body, in bytes
    pub max_upload_bytes: usize,
    /// Largest decompressed size of a single archive entry, in bytes
    pub max_entry_bytes: u64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let data_path = env::var("EMPLOYEE_NOTES_DATA_PATH")
            .unwrap_or_else(|_| "./data/employees.json".to_string())
            .into();

        let resources_path = env::var("EMPLOYEE_NOTES_RESOURCES_PATH")
            .unwrap_or_else(|_| "./data/resources".to_string())
            .into();

        let bind_addr = parse_bind_addr(env::var("EMPLOYEE_NOTES_BIND_ADDR").ok());

        let log_level = env::var("EMPLOYEE_NOTES_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let max_upload_mb = parse_megabytes("EMPLOYEE_NOTES_MAX_UPLOAD_MB", DEFAULT_MAX_UPLOAD_MB);
        let max_entry_mb = parse_megabytes("EMPLOYEE_NOTES_MAX_ENTRY_MB", DEFAULT_MAX_ENTRY_MB);

        Self {
            data_path,
            resources_path,
            bind_addr,
            log_level,
            max_upload_bytes: max_upload_mb * 1024 * 1024,
            max_entry_bytes: (max_entry_mb as u64) * 1024 * 1024,
        }
    }
}

fn parse_megabytes(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|v| match v.parse::<usize>() {
            Ok(mb) if mb > 0 => Some(mb),
            _ => {
                eprintln!("Ignoring invalid {} value: {}", name, v);
                None
            }
        })
        .unwrap_or(default)
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 3000))
}

// Logging is not initialized yet when configuration loads, hence eprintln.
fn parse_bind_addr(raw: Option<String>) -> SocketAddr {
    match raw {
        Some(value) => value.parse().unwrap_or_else(|_| {
            eprintln!(
                "Ignoring invalid EMPLOYEE_NOTES_BIND_ADDR value {}, using {}",
                value, DEFAULT_BIND_ADDR
            );
            default_bind_addr()
        }),
        None => default_bind_addr(),
    }
}
