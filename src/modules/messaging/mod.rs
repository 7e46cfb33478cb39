// Messaging module: outbound notifications after payment capture

use async_trait::async_trait;

use crate::core::Result;

#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_email(&self, to: &str, subject: &str, body_html: &str) -> Result<()>;
}

/// Messenger that records outgoing mail in the log instead of delivering it
///
/// SMTP delivery lives outside the ledger; deployments swap in their own `Messenger`.
#[derive(Debug, Default, Clone)]
pub struct LogMessenger;

#[async_trait]
impl Messenger for LogMessenger {
    async fn send_email(&self, to: &str, subject: &str, body_html: &str) -> Result<()> {
        tracing::warn!(
            to = %to,
            subject = %subject,
            body_len = body_html.len(),
            "Email not delivered (log-only messenger)"
        );
        Ok(())
    }
}
