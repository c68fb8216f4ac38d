//! Outbound mail seam.
//!
//! The core only composes messages; delivery is a collaborator behind a
//! trait. [`LogMailer`] writes messages to the log instead of a wire, which
//! is what the dev server and the tests run with.

use tracing::info;

#[derive(Clone, Debug)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

pub trait MailTransport: Send + Sync {
    /// # Errors
    /// Returns an error when the message could not be handed to the
    /// transport; the caller decides whether that fails the operation.
    fn send(&self, message: &MailMessage) -> anyhow::Result<()>;
}

pub struct LogMailer;

impl MailTransport for LogMailer {
    fn send(&self, message: &MailMessage) -> anyhow::Result<()> {
        info!(
            to = %message.to,
            subject = %message.subject,
            "mail (log transport): {}",
            message.html_body
        );
        Ok(())
    }
}
