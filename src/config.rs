//! Configuration management for the Discord bot.

use std::env;

use tracing::Level;

/// Role assigned to new members when `MEMBER_ROLE_NAME` is not set.
pub const DEFAULT_ROLE_NAME: &str = "member";

/// Welcome DM template. Placeholders: `{member}`, `{guild}`, `{role}`.
pub const DEFAULT_WELCOME_MESSAGE: &str =
    "Welcome to {guild}, {member}! You have been automatically assigned the \"{role}\" role.";

pub const DEFAULT_COMMAND_PREFIX: &str = "!";

/// Name of the admin-only diagnostic command.
pub const COMMAND_CHECK_PERMISSIONS: &str = "check_permissions";

/// Audit log reason attached to every automatic role assignment.
pub const ASSIGN_ROLE_REASON: &str = "Auto-assigned member role on join";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("MEMBER_ROLE_NAME cannot be empty")]
    EmptyRoleName,
    #[error("BOT_TOKEN must be set")]
    MissingBotToken,
    #[error("HEALTH_CHECK_PORT must be a valid port number, got {0:?}")]
    InvalidHealthCheckPort(String),
}

/// Log verbosity accepted in `LOG_LEVEL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    /// Parses a level name case-insensitively. Unknown names fall back to `Info`.
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_uppercase().as_str() {
            "DEBUG" => Self::Debug,
            "INFO" => Self::Info,
            "WARNING" => Self::Warning,
            "ERROR" => Self::Error,
            "CRITICAL" => Self::Critical,
            _ => Self::Info,
        }
    }

    /// tracing has no level above ERROR, so `Critical` shares it.
    pub fn as_tracing_level(self) -> Level {
        match self {
            Self::Debug => Level::DEBUG,
            Self::Info => Level::INFO,
            Self::Warning => Level::WARN,
            Self::Error | Self::Critical => Level::ERROR,
        }
    }
}

/// Settings resolved once at startup and shared read-only by every handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub role_name: String,
    pub send_welcome_message: bool,
    pub welcome_message: String,
    pub command_prefix: String,
    pub log_level: LogLevel,
    pub health_check_port: Option<u16>,
}

impl Config {
    /// Loads configuration from the process environment.
    ///
    /// # Environment Variables
    /// - `MEMBER_ROLE_NAME`: defaults to `member`, must not be blank
    /// - `SEND_WELCOME_MESSAGE`: `true` (any case) enables the welcome DM
    /// - `WELCOME_MESSAGE`: template with `{member}`, `{guild}`, `{role}`
    /// - `COMMAND_PREFIX`: defaults to `!`
    /// - `LOG_LEVEL`: `DEBUG`, `INFO`, `WARNING`, `ERROR` or `CRITICAL`
    /// - `HEALTH_CHECK_PORT`: optional, starts the health check endpoint
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let role_name = lookup("MEMBER_ROLE_NAME").unwrap_or_else(|| DEFAULT_ROLE_NAME.to_string());
        if role_name.trim().is_empty() {
            return Err(ConfigError::EmptyRoleName);
        }

        let send_welcome_message = lookup("SEND_WELCOME_MESSAGE")
            .is_some_and(|value| value.eq_ignore_ascii_case("true"));

        let health_check_port = match lookup("HEALTH_CHECK_PORT") {
            Some(raw) => Some(
                raw.trim()
                    .parse::<u16>()
                    .map_err(|_| ConfigError::InvalidHealthCheckPort(raw))?,
            ),
            None => None,
        };

        Ok(Self {
            role_name,
            send_welcome_message,
            welcome_message: lookup("WELCOME_MESSAGE")
                .unwrap_or_else(|| DEFAULT_WELCOME_MESSAGE.to_string()),
            command_prefix: lookup("COMMAND_PREFIX")
                .unwrap_or_else(|| DEFAULT_COMMAND_PREFIX.to_string()),
            log_level: lookup("LOG_LEVEL")
                .map(|name| LogLevel::parse(&name))
                .unwrap_or_default(),
            health_check_port,
        })
    }
}

/// Retrieves Discord bot token from environment variable.
pub fn bot_token_from_env() -> Result<String, ConfigError> {
    bot_token(|key| env::var(key).ok())
}

/// Reads `BOT_TOKEN` through `lookup`. Missing or blank tokens are rejected.
pub fn bot_token<F>(lookup: F) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup("BOT_TOKEN")
        .filter(|token| !token.trim().is_empty())
        .ok_or(ConfigError::MissingBotToken)
}
