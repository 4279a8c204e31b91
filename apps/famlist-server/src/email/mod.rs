//! Email module for invitation delivery.
//!
//! Sending is best-effort: a failed email never fails the invitation it
//! announces.

mod smtp;
mod templates;

pub use templates::InvitationEmailContent;

use crate::config::{EmailConfig, EmailProviderConfig};
use async_trait::async_trait;
use thiserror::Error;

/// Email sending error
#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Failed to send email: {0}")]
    SendFailed(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Trait for email providers
#[async_trait]
pub trait EmailProvider: Send + Sync {
    /// Send an invitation email.
    async fn send_invitation(
        &self,
        to: &str,
        content: &InvitationEmailContent,
        from_address: &str,
        from_name: Option<&str>,
    ) -> Result<(), EmailError>;
}

/// Create an email provider from configuration
pub fn create_provider(config: &EmailConfig) -> Result<Box<dyn EmailProvider>, EmailError> {
    match &config.provider {
        EmailProviderConfig::Smtp {
            host,
            port,
            username,
            password,
            use_tls,
        } => {
            let provider = smtp::SmtpProvider::new(
                host.clone(),
                *port,
                username.clone(),
                password.clone(),
                *use_tls,
            )?;
            Ok(Box::new(provider))
        }
    }
}
