use once_cell::sync::OnceCell;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use zeroize::Zeroizing;

static CONF: OnceCell<Conf> = OnceCell::new();

const SMTP_PASSWORD_VAR: &str = "MAILER_SMTP_PASSWORD";

const DEFAULT_SMTP_PORT: u16 = 587;
const DEFAULT_SMTP_IDLE_TIMEOUT_SECS: u64 = 25;
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Deserialize)]
pub struct Conf {
    pub mail: MailConf,
    pub smtp: SmtpConf,
    #[serde(default)]
    pub runtime: RuntimeConf,
}

#[derive(Debug, Deserialize)]
pub struct MailConf {
    pub notification: String,
    pub sender_address: String,
    pub sender_name: Option<String>,
    pub renderer: Option<String>,
    pub templates: String,
}

#[derive(Debug, Deserialize)]
pub struct SmtpConf {
    pub enabled: bool,
    #[serde(default)]
    pub address: String,
    pub port: Option<u16>,
    #[serde(default)]
    pub username: String,
    pub max_connections: Option<u32>,
    pub idle_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RuntimeConf {
    pub worker_threads: Option<usize>,
    pub log_level: Option<String>,
}

impl Conf {
    pub fn from_file(conf_file_path: &str) -> Result<Conf, ConfigError> {
        let contents = std::fs::read_to_string(conf_file_path)
            .map_err(|e| ConfigError::Unreadable(String::from(conf_file_path), e.to_string()))?;

        Self::from_toml(&contents, conf_file_path)
    }

    fn from_toml(contents: &str, conf_file_path: &str) -> Result<Conf, ConfigError> {
        toml::from_str::<Conf>(contents)
            .map_err(|e| ConfigError::Malformed(String::from(conf_file_path), e.to_string()))
    }

    pub fn smtp_port(&self) -> u16 {
        self.smtp.port.unwrap_or(DEFAULT_SMTP_PORT)
    }

    pub fn max_smtp_connections(&self) -> u32 {
        self.smtp
            .max_connections
            .unwrap_or((2 * num_cpus::get()).try_into().unwrap_or(u32::MAX))
    }

    pub fn smtp_idle_timeout(&self) -> Duration {
        Duration::from_secs(
            self.smtp
                .idle_timeout_secs
                .unwrap_or(DEFAULT_SMTP_IDLE_TIMEOUT_SECS),
        )
    }

    pub fn worker_threads(&self) -> usize {
        self.runtime.worker_threads.unwrap_or_else(num_cpus::get)
    }

    pub fn log_level(&self) -> &str {
        self.runtime.log_level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }
}

/// Loads the configuration file once. Later calls return the already loaded
/// configuration regardless of the path given.
pub fn initialize(conf_file_path: &str) -> Result<&'static Conf, ConfigError> {
    CONF.get_or_try_init(|| Conf::from_file(conf_file_path))
}

pub fn smtp_password() -> Result<Zeroizing<String>, ConfigError> {
    let password = std::env::var(SMTP_PASSWORD_VAR)
        .map(Zeroizing::new)
        .map_err(|_| ConfigError::MissingVar(SMTP_PASSWORD_VAR))?;

    if password.is_empty() {
        return Err(ConfigError::InvalidVar(SMTP_PASSWORD_VAR));
    }

    Ok(password)
}

#[derive(Clone, Debug)]
pub enum ConfigError {
    MissingVar(&'static str),
    InvalidVar(&'static str),
    Unreadable(String, String),
    Malformed(String, String),
}

impl std::error::Error for ConfigError {}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingVar(key) => write!(f, "Missing environment variable '{}'", key),
            Self::InvalidVar(key) => write!(f, "Environment variable '{}' is invalid", key),
            Self::Unreadable(path, e) => {
                write!(f, "Expected configuration file at '{}': {}", path, e)
            }
            Self::Malformed(path, e) => write!(f, "Parsing '{}' failed: {}", path, e),
        }
    }
}
