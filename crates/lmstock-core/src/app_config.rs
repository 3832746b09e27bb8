use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl Environment {
    /// Log level used when `LMSTOCK_LOG_LEVEL` is not set.
    #[must_use]
    pub fn default_log_level(&self) -> &'static str {
        match self {
            Environment::Development => "info",
            Environment::Test | Environment::Production => "warn",
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// How the fetch client picks a header profile for each attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderRotation {
    RoundRobin,
    Random,
}

/// Export artifact formats written at the end of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(format!("unknown export format '{other}' (expected json or csv)")),
        }
    }
}

/// Telegram bot credentials. Only present when both the token and the chat id
/// are configured.
#[derive(Clone)]
pub struct TelegramCredentials {
    pub bot_token: String,
    pub chat_id: String,
}

impl std::fmt::Debug for TelegramCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramCredentials")
            .field("bot_token", &"[redacted]")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    pub base_url: String,
    pub branches_path: Option<PathBuf>,
    pub request_timeout_secs: u64,
    pub max_attempts: u32,
    pub retry_base_delay_ms: u64,
    pub retry_max_delay_ms: u64,
    pub retry_jitter: bool,
    pub header_rotation: HeaderRotation,
    /// Extra lowercase substrings that mark a challenge page, on top of the
    /// built-in signatures.
    pub extra_block_markers: Vec<String>,
    pub max_concurrent_branches: usize,
    pub min_request_spacing_ms: u64,
    pub run_timeout_secs: Option<u64>,
    pub export_dir: PathBuf,
    pub export_formats: Vec<ExportFormat>,
    pub alerts_enabled: bool,
    pub error_notifications: bool,
    pub summary_reports: bool,
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,
}

impl AppConfig {
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    #[must_use]
    pub fn run_timeout(&self) -> Option<Duration> {
        self.run_timeout_secs.map(Duration::from_secs)
    }

    /// Returns the Telegram credentials, failing when either the bot token or
    /// the chat id is not configured.
    ///
    /// Callers must invoke this before any network activity so a run with
    /// notifications enabled never starts without a usable notifier.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ConfigError::MissingEnvVar`] naming the first missing
    /// variable.
    pub fn require_telegram(&self) -> Result<TelegramCredentials, crate::ConfigError> {
        let bot_token = self
            .telegram_bot_token
            .clone()
            .ok_or_else(|| crate::ConfigError::MissingEnvVar("TELEGRAM_BOT_TOKEN".to_string()))?;
        let chat_id = self
            .telegram_chat_id
            .clone()
            .ok_or_else(|| crate::ConfigError::MissingEnvVar("TELEGRAM_CHAT_ID".to_string()))?;
        Ok(TelegramCredentials { bot_token, chat_id })
    }

    /// Whether any Telegram message kind is switched on.
    #[must_use]
    pub fn notifications_wanted(&self) -> bool {
        self.alerts_enabled || self.error_notifications || self.summary_reports
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("base_url", &self.base_url)
            .field("branches_path", &self.branches_path)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_attempts", &self.max_attempts)
            .field("retry_base_delay_ms", &self.retry_base_delay_ms)
            .field("retry_max_delay_ms", &self.retry_max_delay_ms)
            .field("retry_jitter", &self.retry_jitter)
            .field("header_rotation", &self.header_rotation)
            .field("extra_block_markers", &self.extra_block_markers)
            .field("max_concurrent_branches", &self.max_concurrent_branches)
            .field("min_request_spacing_ms", &self.min_request_spacing_ms)
            .field("run_timeout_secs", &self.run_timeout_secs)
            .field("export_dir", &self.export_dir)
            .field("export_formats", &self.export_formats)
            .field("alerts_enabled", &self.alerts_enabled)
            .field("error_notifications", &self.error_notifications)
            .field("summary_reports", &self.summary_reports)
            .field(
                "telegram_bot_token",
                &self.telegram_bot_token.as_ref().map(|_| "[redacted]"),
            )
            .field("telegram_chat_id", &self.telegram_chat_id)
            .finish()
    }
}
