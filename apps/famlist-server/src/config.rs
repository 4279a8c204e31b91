//! Server configuration module for invitation emails.
//!
//! Supports configuration via environment variables:
//!
//! ```bash
//! # Provider: SMTP
//! FAMLIST_EMAIL_PROVIDER=smtp
//! SMTP_HOST=smtp.gmail.com
//! SMTP_PORT=587
//! SMTP_USERNAME=user@example.com
//! SMTP_PASSWORD=app_password
//! SMTP_USE_TLS=true
//!
//! # Sender config
//! FAMLIST_EMAIL_FROM=noreply@famlist.dev
//! FAMLIST_EMAIL_FROM_NAME="Famlist"
//! ```
//!
//! When no provider is configured, invitation emails are skipped and
//! invitations are delivered in-app only.

use std::env;
use thiserror::Error;

/// Server configuration
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
    pub email: Option<EmailConfig>,
}

/// Email configuration for invitation delivery
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// Email provider configuration
    pub provider: EmailProviderConfig,
    /// From email address
    pub from_address: String,
    /// Optional from name
    pub from_name: Option<String>,
}

/// Email provider configuration
#[derive(Debug, Clone)]
pub enum EmailProviderConfig {
    /// SMTP email provider
    Smtp {
        /// SMTP host
        host: String,
        /// SMTP port
        port: u16,
        /// Optional username
        username: Option<String>,
        /// Optional password
        password: Option<String>,
        /// Whether to use TLS
        use_tls: bool,
    },
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid email provider: {0}. Expected 'smtp'")]
    InvalidProvider(String),

    #[error("Invalid port number: {0}")]
    InvalidPort(String),

    #[error("Missing from address: FAMLIST_EMAIL_FROM is required when email is configured")]
    MissingFromAddress,

    #[error("SMTP provider requires SMTP_HOST")]
    SmtpMissingHost,
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let provider_type = match env::var("FAMLIST_EMAIL_PROVIDER") {
            Ok(v) => v,
            Err(_) => return Ok(Self { email: None }),
        };

        let provider = match provider_type.to_lowercase().as_str() {
            "smtp" => {
                let host = env::var("SMTP_HOST").map_err(|_| ConfigError::SmtpMissingHost)?;
                let port = env::var("SMTP_PORT")
                    .unwrap_or_else(|_| "587".to_string())
                    .parse::<u16>()
                    .map_err(|_| {
                        ConfigError::InvalidPort(
                            env::var("SMTP_PORT").unwrap_or_else(|_| "invalid".to_string()),
                        )
                    })?;
                let username = env::var("SMTP_USERNAME").ok();
                let password = env::var("SMTP_PASSWORD").ok();
                let use_tls = env::var("SMTP_USE_TLS")
                    .map(|v| v.to_lowercase() == "true" || v == "1")
                    .unwrap_or(true); // TLS by default

                EmailProviderConfig::Smtp {
                    host,
                    port,
                    username,
                    password,
                    use_tls,
                }
            }
            other => return Err(ConfigError::InvalidProvider(other.to_string())),
        };

        let from_address =
            env::var("FAMLIST_EMAIL_FROM").map_err(|_| ConfigError::MissingFromAddress)?;
        let from_name = env::var("FAMLIST_EMAIL_FROM_NAME").ok();

        Ok(Self {
            email: Some(EmailConfig {
                provider,
                from_address,
                from_name,
            }),
        })
    }
}
