use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::env;
use std::fs;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use crate::manifest::Browser;

const DEFAULT_DATABASE: &str = "bookmarks.db";
const DEFAULT_PORT: u16 = 8765;
const DEFAULT_NATIVE_LOG: &str = "/tmp/bookmark-native-host.log";
const DEFAULT_MAX_MESSAGE_BYTES: usize = 64 * 1024 * 1024;

#[derive(Parser, Debug)]
#[command(name = "bookmark-host")]
#[command(about = "Runs the local bookmark companion service", long_about = None)]
pub struct Cli {
    #[arg(short = 'c', long = "config", env = "BOOKMARK_HOST_CONFIG", global = true)]
    pub config_path: Option<String>,

    /// Store file, overrides `app.database`
    #[arg(long = "database", global = true)]
    pub database: Option<String>,

    /// Loopback port, overrides `app.port`
    #[arg(short = 'p', long = "port", global = true)]
    pub port: Option<u16>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the HTTP ingestion endpoint (default)
    Serve,
    /// Print the native-messaging manifest for a browser
    Manifest {
        #[arg(long, value_enum, default_value_t = Browser::Chrome)]
        browser: Browser,
        /// Extension ids allowed to launch the native host
        #[arg(long = "allowed", required = true)]
        allowed: Vec<String>,
        /// Path of the native host binary
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

pub fn default_config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".bookmarks")
}

pub fn default_config_path() -> PathBuf {
    default_config_dir().join("config.yaml")
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct App {
    database: String,
    port: u16,
    max_concurrent_requests: usize,
}

impl Default for App {
    fn default() -> Self {
        App {
            database: DEFAULT_DATABASE.to_string(),
            port: DEFAULT_PORT,
            max_concurrent_requests: 1,
        }
    }
}

impl App {
    pub fn get_db(&self) -> &str {
        &self.database
    }

    pub fn get_port(&self) -> u16 {
        self.port
    }

    pub fn get_max_concurrent_requests(&self) -> usize {
        self.max_concurrent_requests
    }

    /// Always loopback; the port is the only configurable part.
    pub fn address(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::LOCALHOST, self.port))
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Native {
    pub log_path: PathBuf,
    pub max_message_bytes: usize,
}

impl Default for Native {
    fn default() -> Self {
        Native {
            log_path: PathBuf::from(DEFAULT_NATIVE_LOG),
            max_message_bytes: DEFAULT_MAX_MESSAGE_BYTES,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    pub app: App,
    pub native: Native,
    #[serde(skip)]
    data_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            app: App::default(),
            native: Native::default(),
            data_dir: default_config_dir(),
        }
    }
}

impl Config {
    /// Loads `path`, or the default config file when `path` is `None`.
    ///
    /// A missing default file yields the built-in defaults; a missing file
    /// that was asked for by name is an error. The data directory is the
    /// directory holding the config file.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let (config_path, required) = match path {
            Some(p) => (PathBuf::from(p), true),
            None => (default_config_path(), false),
        };
        let data_dir = config_path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        if !required && !config_path.exists() {
            return Ok(Config {
                data_dir,
                ..Config::default()
            });
        }

        let mut cfg = Config::load_config(&config_path)
            .with_context(|| format!("failed to load config file {}", config_path.display()))?;
        cfg.data_dir = data_dir;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Defaults rooted at `data_dir`, for tests and embedding.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Config {
            data_dir: data_dir.into(),
            ..Config::default()
        }
    }

    fn load_config(path: &Path) -> Result<Config> {
        let yaml_str = fs::read_to_string(path)?;
        let yaml_with_env = Config::substitute_env_vars(&yaml_str)?;
        if yaml_with_env.trim().is_empty() {
            return Ok(Config::default());
        }
        let config: Config = serde_yaml::from_str(&yaml_with_env)?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.app.max_concurrent_requests == 0 {
            anyhow::bail!("app.max_concurrent_requests must be at least 1");
        }
        if self.native.max_message_bytes == 0 {
            anyhow::bail!("native.max_message_bytes must be at least 1");
        }
        Ok(())
    }

    pub fn override_database(&mut self, database: Option<String>) {
        if let Some(db) = database {
            self.app.database = db;
        }
    }

    pub fn override_port(&mut self, port: Option<u16>) {
        if let Some(port) = port {
            self.app.port = port;
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Store path; relative `app.database` values resolve against the data directory.
    pub fn database_path(&self) -> PathBuf {
        let db = Path::new(self.app.get_db());
        if db.is_absolute() {
            db.to_path_buf()
        } else {
            self.data_dir.join(db)
        }
    }

    fn substitute_env_vars(yaml_str: &str) -> Result<String> {
        let mut result = yaml_str.to_string();
        let mut offset = 0;

        while let Some(start) = result[offset..].find("${") {
            let actual_start = offset + start;
            if let Some(end) = result[actual_start..].find('}') {
                let var_name = &result[actual_start + 2..actual_start + end];

                // ${VAR:-default}
                let env_value = if let Some(default_start) = var_name.find(":-") {
                    let actual_var = &var_name[..default_start];
                    let default_val = &var_name[default_start + 2..];
                    env::var(actual_var).unwrap_or_else(|_| default_val.to_string())
                } else {
                    env::var(var_name).unwrap_or_else(|_| {
                        tracing::warn!("environment variable '{}' not found", var_name);
                        String::new()
                    })
                };

                result.replace_range(actual_start..actual_start + end + 1, &env_value);
                offset = actual_start + env_value.len();
            } else {
                break;
            }
        }

        Ok(result)
    }
}
