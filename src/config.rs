//! Configuration for the relay server and client.
//!
//! Supports both command-line arguments and a TOML configuration file.
//! CLI arguments take precedence over config file values, which take
//! precedence over the built-in defaults.

use clap::Parser;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Default size of the per-connection message buffer, newline included.
pub const DEFAULT_BUFFER_SIZE: usize = 1024;

/// Command-line arguments for the relay server
#[derive(Parser, Debug)]
#[command(name = "relay-server")]
#[command(version = "0.1.0")]
#[command(about = "Accepts one client and prints the lines it sends", long_about = None)]
pub struct ServerArgs {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Address to bind to (e.g., 0.0.0.0:4000)
    #[arg(short = 'l', long)]
    pub listen: Option<String>,

    /// Maximum number of pending connections
    #[arg(short = 'b', long)]
    pub backlog: Option<i32>,

    /// Message buffer size in bytes, newline included
    #[arg(long)]
    pub buffer_size: Option<usize>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,
}

/// Command-line arguments for the relay client
#[derive(Parser, Debug)]
#[command(name = "relay-client")]
#[command(version = "0.1.0")]
#[command(about = "Sends typed lines to the relay server until \"exit\"", long_about = None)]
pub struct ClientArgs {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Server address to connect to (e.g., 127.0.0.1:4000)
    #[arg(short = 'a', long)]
    pub connect: Option<String>,

    /// Maximum line size in bytes, newline included
    #[arg(long)]
    pub buffer_size: Option<usize>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,
}

/// TOML configuration file structure
#[derive(Debug, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub client: ClientSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// `[server]` table
#[derive(Debug, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,
    #[serde(default = "default_backlog")]
    pub backlog: i32,
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            backlog: default_backlog(),
            buffer_size: default_buffer_size(),
        }
    }
}

/// `[client]` table
#[derive(Debug, Deserialize)]
pub struct ClientSection {
    #[serde(default = "default_connect")]
    pub connect: String,
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
}

impl Default for ClientSection {
    fn default() -> Self {
        Self {
            connect: default_connect(),
            buffer_size: default_buffer_size(),
        }
    }
}

/// `[logging]` table
#[derive(Debug, Deserialize)]
pub struct LoggingSection {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_listen() -> String {
    "0.0.0.0:4000".to_string()
}

fn default_connect() -> String {
    "127.0.0.1:4000".to_string()
}

fn default_backlog() -> i32 {
    1
}

fn default_buffer_size() -> usize {
    DEFAULT_BUFFER_SIZE
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Final resolved server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen: SocketAddr,
    pub backlog: i32,
    pub buffer_size: usize,
    pub log_level: String,
}

impl ServerConfig {
    /// Load configuration from the process arguments and optional TOML file.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_args(ServerArgs::parse())
    }

    /// Merge already-parsed arguments with the TOML file they point at.
    pub fn from_args(args: ServerArgs) -> Result<Self, ConfigError> {
        let file = read_toml(args.config.as_deref())?;

        let listen = args.listen.unwrap_or(file.server.listen);
        Ok(ServerConfig {
            listen: parse_addr(&listen)?,
            backlog: check_backlog(args.backlog.unwrap_or(file.server.backlog))?,
            buffer_size: check_buffer_size(
                args.buffer_size.unwrap_or(file.server.buffer_size),
            )?,
            log_level: args.log_level.unwrap_or(file.logging.level),
        })
    }
}

/// Final resolved client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub connect: SocketAddr,
    pub buffer_size: usize,
    pub log_level: String,
}

impl ClientConfig {
    /// Load configuration from the process arguments and optional TOML file.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_args(ClientArgs::parse())
    }

    /// Merge already-parsed arguments with the TOML file they point at.
    pub fn from_args(args: ClientArgs) -> Result<Self, ConfigError> {
        let file = read_toml(args.config.as_deref())?;

        let connect = args.connect.unwrap_or(file.client.connect);
        Ok(ClientConfig {
            connect: parse_addr(&connect)?,
            buffer_size: check_buffer_size(
                args.buffer_size.unwrap_or(file.client.buffer_size),
            )?,
            log_level: args.log_level.unwrap_or(file.logging.level),
        })
    }
}

fn read_toml(path: Option<&Path>) -> Result<TomlConfig, ConfigError> {
    let Some(path) = path else {
        return Ok(TomlConfig::default());
    };
    let contents = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::FileRead(path.to_path_buf(), e))?;
    toml::from_str(&contents).map_err(|e| ConfigError::TomlParse(path.to_path_buf(), e))
}

fn parse_addr(addr: &str) -> Result<SocketAddr, ConfigError> {
    addr.parse()
        .map_err(|_| ConfigError::InvalidAddress(addr.to_string()))
}

// One byte of content plus the newline is the smallest usable line.
fn check_buffer_size(size: usize) -> Result<usize, ConfigError> {
    if size < 2 {
        return Err(ConfigError::InvalidBufferSize(size));
    }
    Ok(size)
}

fn check_backlog(backlog: i32) -> Result<i32, ConfigError> {
    if backlog < 1 {
        return Err(ConfigError::InvalidBacklog(backlog));
    }
    Ok(backlog)
}

/// Configuration loading errors
#[derive(Debug)]
pub enum ConfigError {
    FileRead(PathBuf, std::io::Error),
    TomlParse(PathBuf, toml::de::Error),
    InvalidAddress(String),
    InvalidBufferSize(usize),
    InvalidBacklog(i32),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::FileRead(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::TomlParse(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::InvalidAddress(addr) => {
                write!(f, "Invalid socket address '{addr}'")
            }
            ConfigError::InvalidBufferSize(size) => {
                write!(f, "Buffer size must be at least 2 bytes, got {size}")
            }
            ConfigError::InvalidBacklog(backlog) => {
                write!(f, "Backlog must be at least 1, got {backlog}")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::FileRead(_, e) => Some(e),
            ConfigError::TomlParse(_, e) => Some(e),
            _ => None,
        }
    }
}
